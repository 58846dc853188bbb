// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Bridge instance
//!
//! [`Bridge`] is one side of a bridge pair: the operator registry, the vote
//! aggregator, the token registry, the fee policy and the request and handle
//! pipelines, executing against a host chain reached through [`Ledger`].
//!
//! Every state-changing entry point runs as one bridge transaction. The
//! bounded part of the bridge state and the ledger are snapshotted before the
//! call, while the vote and delivery records are journaled, and all of it is
//! restored if the call fails. A call either takes full effect or none at all.

mod admin;
mod config;
mod dispatch;
mod fee;
mod handle;
mod history;
mod operator;
mod request;
mod tokens;

pub use config::BridgeSettings;
pub use fee::{FeePolicy, FeeSettlement};
pub use operator::{OperatorRegistry, VoteBook, VoteOutcome};
pub use tokens::TokenRegistry;

use alloy_primitives::{Address, Log, B256, U256};
use bon::bon;
use tracing::{debug, info, warn};

use history::History;

use crate::error::{BridgeError, Result};
use crate::protocol::{event, Action, BridgeEvent, VoteKind};
use crate::spans;
use crate::traits::Ledger;

/// Contract version reported by `VERSION`.
pub const VERSION: u64 = 1;

/// Caller and attached native coin of one bridge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tx {
    pub sender: Address,
    pub value: U256,
}

impl Tx {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            value: U256::ZERO,
        }
    }

    pub fn with_value(sender: Address, value: U256) -> Self {
        Self { sender, value }
    }
}

/// Outcome of a successful bridge call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt<T> {
    pub output: T,
    /// Events in emission order.
    pub events: Vec<BridgeEvent>,
    pub block_number: u64,
}

impl<T> Receipt<T> {
    /// The events as the logs the contract at `address` emits.
    pub fn logs(&self, address: Address) -> Vec<Log> {
        self.events
            .iter()
            .map(|e| event::to_log(address, e))
            .collect()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Receipt<U> {
        Receipt {
            output: f(self.output),
            events: self.events,
            block_number: self.block_number,
        }
    }
}

#[derive(Debug, Clone)]
struct BridgeState {
    owner: Address,
    running: bool,
    settings: BridgeSettings,
    counterpart_bridge: Address,
    request_nonce: u64,
    sequential_handled_nonce: u64,
    max_requested_nonce: u64,
    last_handled_request_block_number: u64,
    operators: OperatorRegistry,
    tokens: TokenRegistry,
    fees: FeePolicy,
    callback: Address,
}

/// One side of a bridge pair.
///
/// # Example
///
/// ```rust
/// use klay_bridge::testing::InMemoryLedger;
/// use klay_bridge::{Bridge, BridgeSettings, Tx};
/// use alloy_primitives::{address, U256};
///
/// # fn example() -> klay_bridge::Result<()> {
/// let owner = address!("00000000000000000000000000000000000000aa");
/// let user = address!("00000000000000000000000000000000000000bb");
/// let mut ledger = InMemoryLedger::new();
/// ledger.set_balance(user, U256::from(100));
///
/// let mut bridge = Bridge::builder()
///     .address(address!("00000000000000000000000000000000000000b1"))
///     .owner(owner)
///     .ledger(ledger)
///     .settings(BridgeSettings::default())
///     .build()?;
///
/// let receipt = bridge.request_klay_transfer(Tx::with_value(user, U256::from(10)), user, U256::from(10))?;
/// assert_eq!(receipt.output, 0);
/// assert_eq!(bridge.request_nonce(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Bridge<L: Ledger> {
    address: Address,
    ledger: L,
    state: BridgeState,
    history: History,
}

#[bon]
impl<L: Ledger> Bridge<L> {
    /// Deploys a bridge at `address`, running, with `owner` as owner.
    ///
    /// A non-zero `charge` is moved from `owner` to the bridge at deployment.
    #[builder]
    pub fn new(
        address: Address,
        owner: Address,
        ledger: L,
        #[builder(default)] settings: BridgeSettings,
        #[builder(default)] charge: U256,
    ) -> Result<Self> {
        let mut ledger = ledger;
        if !charge.is_zero() {
            ledger.transfer(owner, address, charge)?;
        }

        info!(
            bridge = %address,
            owner = %owner,
            mode_mint_burn = settings.mode_mint_burn,
            callback_enabled = settings.callback_enabled,
            charge = %charge,
            event = "bridge_deployed"
        );

        Ok(Self {
            address,
            ledger,
            state: BridgeState {
                owner,
                running: true,
                settings,
                counterpart_bridge: Address::ZERO,
                request_nonce: 0,
                sequential_handled_nonce: 0,
                max_requested_nonce: 0,
                last_handled_request_block_number: 0,
                operators: OperatorRegistry::default(),
                tokens: TokenRegistry::default(),
                fees: FeePolicy::default(),
                callback: Address::ZERO,
            },
            history: History::default(),
        })
    }
}

impl<L: Ledger> Bridge<L> {
    /// Runs `body` as one atomic bridge transaction.
    ///
    /// Attached value moves to the bridge before `body` runs. On error the
    /// bridge state and the ledger are restored to what they were before the
    /// call and no events are returned.
    fn transact<T>(
        &mut self,
        tx: Tx,
        payable: bool,
        body: impl FnOnce(&mut Self, &Tx, &mut Vec<BridgeEvent>) -> Result<T>,
    ) -> Result<Receipt<T>> {
        let checkpoint = self.ledger.checkpoint();
        let snapshot = self.state.clone();
        let savepoint = self.history.savepoint();
        let mut events = Vec::new();

        let outcome = self
            .attach_value(&tx, payable)
            .and_then(|()| body(self, &tx, &mut events));

        match outcome {
            Ok(output) => {
                self.history.commit(savepoint);
                Ok(Receipt {
                    output,
                    events,
                    block_number: self.ledger.block_number(),
                })
            }
            Err(err) => {
                self.ledger.revert_to(checkpoint);
                self.state = snapshot;
                self.history.rollback(savepoint);
                spans::record_error(&err);
                warn!(
                    bridge = %self.address,
                    sender = %tx.sender,
                    value = %tx.value,
                    error = %err,
                    event = "transaction_reverted"
                );
                Err(err)
            }
        }
    }

    fn attach_value(&mut self, tx: &Tx, payable: bool) -> Result<()> {
        if tx.value.is_zero() {
            return Ok(());
        }
        if !payable {
            return Err(BridgeError::NonPayable);
        }
        self.ledger.transfer(tx.sender, self.address, tx.value)?;
        Ok(())
    }

    fn only_owner(&self, tx: &Tx) -> Result<()> {
        if tx.sender != self.state.owner {
            return Err(BridgeError::Unauthorized { caller: tx.sender });
        }
        Ok(())
    }

    fn require_running(&self) -> Result<()> {
        if !self.state.running {
            return Err(BridgeError::Stopped);
        }
        Ok(())
    }

    fn require_allowed(&self, token: Address) -> Result<()> {
        if !self.state.tokens.is_allowed(token) {
            return Err(BridgeError::InvalidToken { token });
        }
        Ok(())
    }

    /// Casts `operator`'s vote for `action`.
    ///
    /// Finalization closes the action's nonce before returning, so the caller
    /// only has to execute the action body.
    fn vote<A: Action>(&mut self, operator: Address, action: &A) -> Result<VoteOutcome> {
        let action_hash = action.action_hash();
        let nonce = action.nonce();
        let span = spans::vote(A::KIND, operator, &action_hash, nonce);
        let _guard = span.enter();

        if !self.state.operators.is_operator(operator) {
            return Err(BridgeError::NotOperator { caller: operator });
        }

        if A::KIND == VoteKind::Configuration {
            let expected = self.history.votes().configuration_nonce();
            if nonce != expected {
                return Err(BridgeError::NonceMismatch {
                    expected,
                    got: nonce,
                });
            }
        }

        if self.history.votes().is_closed(A::KIND, nonce) {
            debug!(
                vote_kind = %A::KIND,
                nonce = nonce,
                event = "vote_on_closed_nonce_ignored"
            );
            return Ok(VoteOutcome::Closed);
        }

        let Some(count) = self.history.record_vote(action_hash, operator) else {
            debug!(
                vote_kind = %A::KIND,
                action_hash = %action_hash,
                event = "duplicate_vote_ignored"
            );
            return Ok(VoteOutcome::AlreadyVoted);
        };
        span.record("vote_count", count);

        let threshold = self.state.operators.threshold(A::KIND);
        if count < threshold {
            debug!(
                vote_kind = %A::KIND,
                count = count,
                threshold = threshold,
                event = "vote_recorded"
            );
            return Ok(VoteOutcome::Recorded { count, threshold });
        }

        self.history.close(A::KIND, nonce);
        info!(
            vote_kind = %A::KIND,
            nonce = nonce,
            count = count,
            threshold = threshold,
            event = "vote_finalized"
        );
        Ok(VoteOutcome::Finalized { count })
    }

    /// Address of this bridge instance.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct access to the host chain, outside of any bridge transaction.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn settings(&self) -> BridgeSettings {
        self.state.settings
    }

    pub fn version(&self) -> u64 {
        VERSION
    }

    pub fn owner(&self) -> Address {
        self.state.owner
    }

    pub fn is_owner(&self, account: Address) -> bool {
        account == self.state.owner
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn mode_mint_burn(&self) -> bool {
        self.state.settings.mode_mint_burn
    }

    pub fn counterpart_bridge(&self) -> Address {
        self.state.counterpart_bridge
    }

    pub fn request_nonce(&self) -> u64 {
        self.state.request_nonce
    }

    pub fn sequential_handled_nonce(&self) -> u64 {
        self.state.sequential_handled_nonce
    }

    pub fn max_requested_nonce(&self) -> u64 {
        self.state.max_requested_nonce
    }

    pub fn last_handled_request_block_number(&self) -> u64 {
        self.state.last_handled_request_block_number
    }

    pub fn configuration_nonce(&self) -> u64 {
        self.history.votes().configuration_nonce()
    }

    pub fn is_operator(&self, account: Address) -> bool {
        self.state.operators.is_operator(account)
    }

    pub fn operator_list(&self) -> Vec<Address> {
        self.state.operators.operators().to_vec()
    }

    pub fn operator_threshold(&self, kind: VoteKind) -> u64 {
        self.state.operators.threshold(kind)
    }

    /// Counterpart of `token`, zero when the token is not allowed.
    pub fn allowed_token(&self, token: Address) -> Address {
        self.state.tokens.counterpart(token)
    }

    pub fn registered_tokens(&self) -> Vec<Address> {
        self.state.tokens.registered().to_vec()
    }

    pub fn fee_of_klay(&self) -> U256 {
        self.state.fees.klay_fee()
    }

    pub fn fee_of_erc20(&self, token: Address) -> U256 {
        self.state.fees.erc20_fee(token)
    }

    pub fn fee_receiver(&self) -> Address {
        self.state.fees.receiver()
    }

    /// Whether the incoming request `nonce` is finalized.
    pub fn is_closed(&self, nonce: u64) -> bool {
        self.history.votes().is_closed(VoteKind::ValueTransfer, nonce)
    }

    /// Whether the configuration action at `nonce` is finalized.
    pub fn is_configuration_handled(&self, nonce: u64) -> bool {
        self.history.votes().is_closed(VoteKind::Configuration, nonce)
    }

    pub fn voted_count(&self, action_hash: &B256) -> u64 {
        self.history.votes().count(action_hash)
    }

    pub fn voters(&self, action_hash: &B256) -> Vec<Address> {
        self.history.votes().voters(action_hash)
    }

    pub fn has_voted(&self, action_hash: &B256, operator: &Address) -> bool {
        self.history.votes().has_voted(action_hash, operator)
    }

    /// Number of action hashes that received at least one vote.
    pub fn voted_actions(&self) -> usize {
        self.history.votes().pending_actions()
    }

    pub fn callback(&self) -> Address {
        self.state.callback
    }

    pub fn handled_request_tx(&self, tx_hash: &B256) -> bool {
        self.history.is_handled_request_tx(tx_hash)
    }
}
