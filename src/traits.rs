//! Core trait abstractions for bridge operations.
//!
//! Two seams separate the bridge logic from the outside world:
//!
//! - [`Ledger`] is the host chain seen from inside a bridge transaction:
//!   native balances, the token contracts the bridge calls into, the callback
//!   contract and the checkpoint/revert facility that makes every public
//!   bridge entry point atomic.
//! - [`BridgeChain`] is a deployed bridge seen from an operator: its nonces,
//!   its request logs and the ability to submit handle transactions to it.
//!
//! Both are implemented by fakes in [`crate::testing`] so that the whole
//! request/relay/handle cycle can be exercised without a node.

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;

use crate::contracts::ext_bridge::Callback::registerOfferCall;
use crate::error::{LedgerError, Result};
use crate::relay::{HandleCall, ObservedRequest};

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Host-chain state reachable from a bridge transaction.
///
/// `caller` is always the account on whose behalf the token contract is
/// invoked; for every call the bridge makes that is the bridge itself.
pub trait Ledger {
    /// Opaque snapshot of the whole ledger.
    type Checkpoint;

    /// Captures the current state so that it can be restored by [`Ledger::revert_to`].
    fn checkpoint(&self) -> Self::Checkpoint;

    /// Discards every change made since `checkpoint` was taken.
    fn revert_to(&mut self, checkpoint: Self::Checkpoint);

    /// Number of the block the current transaction executes in.
    fn block_number(&self) -> u64;

    fn balance(&self, account: Address) -> U256;

    /// Moves native coin between two accounts.
    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<()>;

    fn erc20_balance_of(&self, token: Address, account: Address) -> LedgerResult<U256>;

    fn erc20_transfer(
        &mut self,
        token: Address,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()>;

    fn erc20_transfer_from(
        &mut self,
        token: Address,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()>;

    fn erc20_mint(
        &mut self,
        token: Address,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()>;

    /// Burns `amount` out of `caller`'s own balance.
    fn erc20_burn(&mut self, token: Address, caller: Address, amount: U256) -> LedgerResult<()>;

    fn erc721_owner_of(&self, token: Address, token_id: U256) -> LedgerResult<Address>;

    fn erc721_token_uri(&self, token: Address, token_id: U256) -> LedgerResult<String>;

    fn erc721_transfer_from(
        &mut self,
        token: Address,
        caller: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> LedgerResult<()>;

    fn erc721_mint_with_uri(
        &mut self,
        token: Address,
        caller: Address,
        to: Address,
        token_id: U256,
        uri: &str,
    ) -> LedgerResult<()>;

    /// Burns an item owned by `caller`.
    fn erc721_burn(&mut self, token: Address, caller: Address, token_id: U256) -> LedgerResult<()>;

    /// Invokes `registerOffer` on the callback contract at `callback`.
    fn register_offer(
        &mut self,
        callback: Address,
        caller: Address,
        call: &registerOfferCall,
    ) -> LedgerResult<()>;
}

/// A deployed bridge as seen by an operator.
///
/// # Test Scenarios
///
/// Implementing this trait with fakes enables testing:
/// - Request logs arriving out of order or in bursts
/// - Handle submissions that revert
/// - Counterpart bridges that fell behind and need recovery
#[async_trait]
pub trait BridgeChain: Send + Sync {
    /// Current block height of the chain.
    async fn block_number(&self) -> Result<u64>;

    /// Next outgoing request nonce of this bridge.
    async fn request_nonce(&self) -> Result<u64>;

    /// Smallest incoming nonce this bridge has not closed yet.
    async fn sequential_handled_nonce(&self) -> Result<u64>;

    /// Origin-chain block of the most recently finalized incoming request.
    async fn last_handled_request_block_number(&self) -> Result<u64>;

    /// Whether this bridge has finalized the incoming request `nonce`.
    async fn is_closed(&self, nonce: u64) -> Result<bool>;

    /// Counterpart token registered for `token`, zero if not allowed.
    async fn counterpart_token(&self, token: Address) -> Result<Address>;

    /// Request events emitted in `[from_block, to_block]`.
    async fn request_events(&self, from_block: u64, to_block: u64) -> Result<Vec<ObservedRequest>>;

    /// Sends `call` to this bridge on behalf of `operator`.
    async fn submit(&self, operator: Address, call: &HandleCall) -> Result<TxHash>;
}
