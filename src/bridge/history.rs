//! Vote and delivery records with an undo journal
//!
//! These records only ever grow, so a failing transaction rolls them back by
//! replaying its own journal entries in reverse instead of restoring a copy.

use alloy_primitives::{Address, B256};
use std::collections::HashSet;

use super::VoteBook;
use crate::protocol::VoteKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Undo {
    Vote { action_hash: B256, operator: Address },
    Close { kind: VoteKind, nonce: u64, configuration_nonce: u64 },
    HandledRequestTx(B256),
}

/// Position in the journal a transaction can roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Savepoint(usize);

#[derive(Debug, Default)]
pub(crate) struct History {
    votes: VoteBook,
    handled_request_txs: HashSet<B256>,
    journal: Vec<Undo>,
    open_savepoints: usize,
}

impl History {
    pub(crate) fn votes(&self) -> &VoteBook {
        &self.votes
    }

    pub(crate) fn is_handled_request_tx(&self, tx_hash: &B256) -> bool {
        self.handled_request_txs.contains(tx_hash)
    }

    /// See [`VoteBook::record`].
    pub(crate) fn record_vote(&mut self, action_hash: B256, operator: Address) -> Option<u64> {
        let count = self.votes.record(action_hash, operator)?;
        self.journal.push(Undo::Vote {
            action_hash,
            operator,
        });
        Some(count)
    }

    pub(crate) fn close(&mut self, kind: VoteKind, nonce: u64) {
        if self.votes.is_closed(kind, nonce) {
            return;
        }
        let configuration_nonce = self.votes.configuration_nonce();
        self.votes.close(kind, nonce);
        self.journal.push(Undo::Close {
            kind,
            nonce,
            configuration_nonce,
        });
    }

    pub(crate) fn mark_handled_request_tx(&mut self, tx_hash: B256) {
        if self.handled_request_txs.insert(tx_hash) {
            self.journal.push(Undo::HandledRequestTx(tx_hash));
        }
    }

    /// Every savepoint must be released by exactly one `commit` or `rollback`.
    pub(crate) fn savepoint(&mut self) -> Savepoint {
        self.open_savepoints += 1;
        Savepoint(self.journal.len())
    }

    /// Keeps every change since `savepoint`. The journal is dropped once the
    /// outermost savepoint commits.
    pub(crate) fn commit(&mut self, _savepoint: Savepoint) {
        self.open_savepoints = self.open_savepoints.saturating_sub(1);
        if self.open_savepoints == 0 {
            self.journal.clear();
        }
    }

    /// Undoes every change since `savepoint`, newest first.
    pub(crate) fn rollback(&mut self, savepoint: Savepoint) {
        self.open_savepoints = self.open_savepoints.saturating_sub(1);
        while self.journal.len() > savepoint.0 {
            let Some(undo) = self.journal.pop() else {
                break;
            };
            match undo {
                Undo::Vote {
                    action_hash,
                    operator,
                } => self.votes.unrecord(&action_hash, &operator),
                Undo::Close {
                    kind,
                    nonce,
                    configuration_nonce,
                } => self.votes.reopen(kind, nonce, configuration_nonce),
                Undo::HandledRequestTx(tx_hash) => {
                    self.handled_request_txs.remove(&tx_hash);
                }
            }
        }
    }

    #[cfg(test)]
    fn journal_len(&self) -> usize {
        self.journal.len()
    }
}
