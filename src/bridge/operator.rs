//! Operator registry and vote aggregation
//!
//! Operators are the only accounts allowed to cast votes. A vote is keyed by
//! the action hash of the exact call the operator submitted, so operators that
//! disagree on any argument end up on different keys and never add up.

use alloy_primitives::{Address, B256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::protocol::VoteKind;

/// Whitelist of operators plus the confirmation threshold per vote kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRegistry {
    // Registration order is kept for `getOperatorList`.
    operators: Vec<Address>,
    thresholds: BTreeMap<VoteKind, u64>,
}

impl Default for OperatorRegistry {
    /// No operators; every threshold starts at 1.
    fn default() -> Self {
        Self {
            operators: Vec::new(),
            thresholds: VoteKind::ALL.iter().map(|kind| (*kind, 1)).collect(),
        }
    }
}

impl OperatorRegistry {
    /// Adds `operator`. Returns `false` if it was already registered.
    pub fn register(&mut self, operator: Address) -> bool {
        if self.is_operator(operator) {
            return false;
        }
        self.operators.push(operator);
        true
    }

    /// Removes `operator`. Returns `false` if it was not registered.
    pub fn deregister(&mut self, operator: Address) -> bool {
        let before = self.operators.len();
        self.operators.retain(|registered| *registered != operator);
        self.operators.len() != before
    }

    pub fn is_operator(&self, account: Address) -> bool {
        self.operators.contains(&account)
    }

    pub fn operators(&self) -> &[Address] {
        &self.operators
    }

    /// Stores `threshold` verbatim, even above the current operator count.
    pub fn set_threshold(&mut self, kind: VoteKind, threshold: u64) {
        self.thresholds.insert(kind, threshold);
    }

    pub fn threshold(&self, kind: VoteKind) -> u64 {
        self.thresholds.get(&kind).copied().unwrap_or(1)
    }
}

/// Result of casting one vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote was counted but the threshold is not reached yet.
    Recorded { count: u64, threshold: u64 },
    /// This vote reached the threshold; the caller must execute the action.
    Finalized { count: u64 },
    /// The operator had already voted for this exact action.
    AlreadyVoted,
    /// The nonce was finalized earlier; nothing changed.
    Closed,
}

impl VoteOutcome {
    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized { .. })
    }
}

/// Per-action vote sets and the finalized nonces of both vote kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteBook {
    votes: HashMap<B256, BTreeSet<Address>>,
    closed_value_transfers: HashSet<u64>,
    handled_configurations: HashSet<u64>,
    configuration_nonce: u64,
}

impl VoteBook {
    /// Adds `operator` to the vote set of `action_hash`.
    ///
    /// Returns the new tally, or `None` if the operator was already counted.
    pub fn record(&mut self, action_hash: B256, operator: Address) -> Option<u64> {
        let voters = self.votes.entry(action_hash).or_default();
        if !voters.insert(operator) {
            return None;
        }
        Some(voters.len() as u64)
    }

    /// Number of distinct operators that voted for `action_hash`.
    pub fn count(&self, action_hash: &B256) -> u64 {
        self.votes.get(action_hash).map_or(0, |v| v.len() as u64)
    }

    pub fn has_voted(&self, action_hash: &B256, operator: &Address) -> bool {
        self.votes
            .get(action_hash)
            .is_some_and(|voters| voters.contains(operator))
    }

    pub fn voters(&self, action_hash: &B256) -> Vec<Address> {
        self.votes
            .get(action_hash)
            .map(|voters| voters.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_closed(&self, kind: VoteKind, nonce: u64) -> bool {
        match kind {
            VoteKind::ValueTransfer => self.closed_value_transfers.contains(&nonce),
            VoteKind::Configuration => self.handled_configurations.contains(&nonce),
        }
    }

    /// Marks `nonce` finalized. Closing a configuration nonce also moves the
    /// configuration nonce past it.
    pub fn close(&mut self, kind: VoteKind, nonce: u64) {
        match kind {
            VoteKind::ValueTransfer => {
                self.closed_value_transfers.insert(nonce);
            }
            VoteKind::Configuration => {
                self.handled_configurations.insert(nonce);
                self.configuration_nonce = self.configuration_nonce.max(nonce + 1);
            }
        }
    }

    /// Reverses [`VoteBook::record`]. An action left without voters is
    /// forgotten.
    pub(crate) fn unrecord(&mut self, action_hash: &B256, operator: &Address) {
        if let Some(voters) = self.votes.get_mut(action_hash) {
            voters.remove(operator);
            if voters.is_empty() {
                self.votes.remove(action_hash);
            }
        }
    }

    /// Reverses [`VoteBook::close`], restoring the configuration nonce held
    /// before the close.
    pub(crate) fn reopen(&mut self, kind: VoteKind, nonce: u64, configuration_nonce: u64) {
        match kind {
            VoteKind::ValueTransfer => {
                self.closed_value_transfers.remove(&nonce);
            }
            VoteKind::Configuration => {
                self.handled_configurations.remove(&nonce);
                self.configuration_nonce = configuration_nonce;
            }
        }
    }

    pub fn configuration_nonce(&self) -> u64 {
        self.configuration_nonce
    }

    /// Every action hash that has votes but no finalization yet is still
    /// visible here; there is no expiry.
    pub fn pending_actions(&self) -> usize {
        self.votes.len()
    }
}
