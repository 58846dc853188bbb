//! Test utilities and fake implementations for testing bridge pairs
//!
//! This module provides fake implementations of the crate's traits that
//! enable testing the full request / relay / handle cycle, including
//! adversarial scenarios, without a node.
//!
//! - [`InMemoryLedger`] is a host chain: native balances, ERC-20 and ERC-721
//!   token contracts with minter roles, and callback contracts that record
//!   (or refuse) offers.
//! - [`LocalChain`] wraps a [`Bridge`] over an [`InMemoryLedger`] and serves
//!   it to a relay as a [`BridgeChain`], mining one block per transaction and
//!   keeping the request logs it emitted.

use alloy_primitives::{keccak256, Address, TxHash, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::bridge::{Bridge, Receipt, Tx};
use crate::contracts::bridge::Bridge::BridgeEvents;
use crate::contracts::ext_bridge::Callback::registerOfferCall;
use crate::error::{BridgeError, LedgerError, Result};
use crate::relay::{HandleCall, ObservedRequest};
use crate::traits::{BridgeChain, Ledger, LedgerResult};

// ============================================================================
// In-memory host chain
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Erc20State {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    minters: HashSet<Address>,
}

#[derive(Debug, Clone, Default)]
struct Erc721State {
    owners: HashMap<U256, Address>,
    uris: HashMap<U256, String>,
    approvals: HashMap<U256, Address>,
    minters: HashSet<Address>,
}

#[derive(Debug, Clone, Default)]
struct CallbackState {
    offers: Vec<registerOfferCall>,
    reject: bool,
}

/// Full copy of an [`InMemoryLedger`], used as its checkpoint.
#[derive(Debug, Clone, Default)]
pub struct World {
    block_number: u64,
    balances: HashMap<Address, U256>,
    erc20: HashMap<Address, Erc20State>,
    erc721: HashMap<Address, Erc721State>,
    callbacks: HashMap<Address, CallbackState>,
}

/// A fake host chain whose checkpoints are full copies of its state.
///
/// Setup helpers (`set_balance`, `mint_erc20`, ...) bypass every access
/// rule; the [`Ledger`] methods enforce them the way the token contracts do.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    world: World,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&mut self, account: Address, amount: U256) {
        self.world.balances.insert(account, amount);
    }

    pub fn advance_block(&mut self, blocks: u64) {
        self.world.block_number += blocks;
    }

    /// Deploys an empty ERC-20 contract at `token`.
    pub fn deploy_erc20(&mut self, token: Address) {
        self.world.erc20.entry(token).or_default();
    }

    /// Mints without a minter check; fails like the token would when the
    /// supply no longer fits.
    pub fn mint_erc20(&mut self, token: Address, to: Address, amount: U256) -> LedgerResult<()> {
        self.world.erc20.entry(token).or_default().mint(token, to, amount)
    }

    pub fn approve_erc20(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.world
            .erc20
            .entry(token)
            .or_default()
            .allowances
            .insert((owner, spender), amount);
    }

    pub fn add_erc20_minter(&mut self, token: Address, minter: Address) {
        self.world.erc20.entry(token).or_default().minters.insert(minter);
    }

    /// ERC-20 balance, zero for unknown tokens.
    pub fn erc20_balance(&self, token: Address, account: Address) -> U256 {
        self.world
            .erc20
            .get(&token)
            .and_then(|state| state.balances.get(&account))
            .copied()
            .unwrap_or_default()
    }

    pub fn erc20_total_supply(&self, token: Address) -> U256 {
        self.world
            .erc20
            .get(&token)
            .and_then(Erc20State::total_supply)
            .unwrap_or_default()
    }

    pub fn deploy_erc721(&mut self, token: Address) {
        self.world.erc721.entry(token).or_default();
    }

    pub fn mint_erc721(&mut self, token: Address, to: Address, token_id: U256, uri: &str) {
        let state = self.world.erc721.entry(token).or_default();
        state.owners.insert(token_id, to);
        state.uris.insert(token_id, uri.to_string());
    }

    pub fn approve_erc721(&mut self, token: Address, spender: Address, token_id: U256) {
        self.world
            .erc721
            .entry(token)
            .or_default()
            .approvals
            .insert(token_id, spender);
    }

    pub fn add_erc721_minter(&mut self, token: Address, minter: Address) {
        self.world.erc721.entry(token).or_default().minters.insert(minter);
    }

    /// Owner of `token_id`, `None` when it does not exist.
    pub fn erc721_owner(&self, token: Address, token_id: U256) -> Option<Address> {
        self.world
            .erc721
            .get(&token)
            .and_then(|state| state.owners.get(&token_id))
            .copied()
    }

    pub fn deploy_callback(&mut self, callback: Address) {
        self.world.callbacks.entry(callback).or_default();
    }

    /// Makes every later `registerOffer` on `callback` revert.
    pub fn reject_offers(&mut self, callback: Address) {
        self.world.callbacks.entry(callback).or_default().reject = true;
    }

    /// Offers registered on `callback`, in call order.
    pub fn offers(&self, callback: Address) -> Vec<registerOfferCall> {
        self.world
            .callbacks
            .get(&callback)
            .map(|state| state.offers.clone())
            .unwrap_or_default()
    }

    fn erc20_mut(&mut self, token: Address) -> LedgerResult<&mut Erc20State> {
        self.world
            .erc20
            .get_mut(&token)
            .ok_or(LedgerError::UnknownContract(token))
    }

    fn erc721(&self, token: Address) -> LedgerResult<&Erc721State> {
        self.world
            .erc721
            .get(&token)
            .ok_or(LedgerError::UnknownContract(token))
    }

    fn erc721_mut(&mut self, token: Address) -> LedgerResult<&mut Erc721State> {
        self.world
            .erc721
            .get_mut(&token)
            .ok_or(LedgerError::UnknownContract(token))
    }
}

fn debit(balances: &mut HashMap<Address, U256>, account: Address, amount: U256) -> LedgerResult<()> {
    let available = balances.get(&account).copied().unwrap_or_default();
    if available < amount {
        return Err(LedgerError::InsufficientBalance {
            account,
            available,
            required: amount,
        });
    }
    balances.insert(account, available - amount);
    Ok(())
}

fn credit(balances: &mut HashMap<Address, U256>, account: Address, amount: U256) -> LedgerResult<()> {
    let balance = balances.entry(account).or_default();
    *balance = balance
        .checked_add(amount)
        .ok_or(LedgerError::BalanceOverflow { account })?;
    Ok(())
}

impl Erc20State {
    fn total_supply(&self) -> Option<U256> {
        self.balances
            .values()
            .try_fold(U256::ZERO, |total, balance| total.checked_add(*balance))
    }

    fn mint(&mut self, token: Address, to: Address, amount: U256) -> LedgerResult<()> {
        self.total_supply()
            .and_then(|supply| supply.checked_add(amount))
            .ok_or(LedgerError::SupplyOverflow { token })?;
        credit(&mut self.balances, to, amount)
    }
}

impl Erc721State {
    fn owner_of(&self, token: Address, token_id: U256) -> LedgerResult<Address> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(LedgerError::NonexistentToken { token, token_id })
    }

    fn require_approved_or_owner(
        &self,
        token: Address,
        caller: Address,
        token_id: U256,
    ) -> LedgerResult<Address> {
        let owner = self.owner_of(token, token_id)?;
        if caller != owner && self.approvals.get(&token_id) != Some(&caller) {
            return Err(LedgerError::NotApprovedOrOwner { caller, token_id });
        }
        Ok(owner)
    }
}

impl Ledger for InMemoryLedger {
    type Checkpoint = World;

    fn checkpoint(&self) -> World {
        self.world.clone()
    }

    fn revert_to(&mut self, checkpoint: World) {
        self.world = checkpoint;
    }

    fn block_number(&self) -> u64 {
        self.world.block_number
    }

    fn balance(&self, account: Address) -> U256 {
        self.world.balances.get(&account).copied().unwrap_or_default()
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> LedgerResult<()> {
        debit(&mut self.world.balances, from, amount)?;
        credit(&mut self.world.balances, to, amount)
    }

    fn erc20_balance_of(&self, token: Address, account: Address) -> LedgerResult<U256> {
        let state = self
            .world
            .erc20
            .get(&token)
            .ok_or(LedgerError::UnknownContract(token))?;
        Ok(state.balances.get(&account).copied().unwrap_or_default())
    }

    fn erc20_transfer(
        &mut self,
        token: Address,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()> {
        let state = self.erc20_mut(token)?;
        debit(&mut state.balances, caller, amount)?;
        credit(&mut state.balances, to, amount)
    }

    fn erc20_transfer_from(
        &mut self,
        token: Address,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()> {
        let state = self.erc20_mut(token)?;
        if caller != from {
            let allowed = state
                .allowances
                .get(&(from, caller))
                .copied()
                .unwrap_or_default();
            if allowed < amount {
                return Err(LedgerError::InsufficientAllowance {
                    owner: from,
                    spender: caller,
                    allowed,
                    required: amount,
                });
            }
            state.allowances.insert((from, caller), allowed - amount);
        }
        debit(&mut state.balances, from, amount)?;
        credit(&mut state.balances, to, amount)
    }

    fn erc20_mint(
        &mut self,
        token: Address,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> LedgerResult<()> {
        let state = self.erc20_mut(token)?;
        if !state.minters.contains(&caller) {
            return Err(LedgerError::NotMinter { caller, token });
        }
        state.mint(token, to, amount)
    }

    fn erc20_burn(&mut self, token: Address, caller: Address, amount: U256) -> LedgerResult<()> {
        let state = self.erc20_mut(token)?;
        debit(&mut state.balances, caller, amount)
    }

    fn erc721_owner_of(&self, token: Address, token_id: U256) -> LedgerResult<Address> {
        self.erc721(token)?.owner_of(token, token_id)
    }

    fn erc721_token_uri(&self, token: Address, token_id: U256) -> LedgerResult<String> {
        let state = self.erc721(token)?;
        state.owner_of(token, token_id)?;
        Ok(state.uris.get(&token_id).cloned().unwrap_or_default())
    }

    fn erc721_transfer_from(
        &mut self,
        token: Address,
        caller: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> LedgerResult<()> {
        let state = self.erc721_mut(token)?;
        let owner = state.require_approved_or_owner(token, caller, token_id)?;
        if owner != from {
            return Err(LedgerError::Reverted {
                reason: format!("token {token_id} is not owned by {from}"),
            });
        }
        state.approvals.remove(&token_id);
        state.owners.insert(token_id, to);
        Ok(())
    }

    fn erc721_mint_with_uri(
        &mut self,
        token: Address,
        caller: Address,
        to: Address,
        token_id: U256,
        uri: &str,
    ) -> LedgerResult<()> {
        let state = self.erc721_mut(token)?;
        if !state.minters.contains(&caller) {
            return Err(LedgerError::NotMinter { caller, token });
        }
        if state.owners.contains_key(&token_id) {
            return Err(LedgerError::TokenAlreadyMinted { token, token_id });
        }
        state.owners.insert(token_id, to);
        state.uris.insert(token_id, uri.to_string());
        Ok(())
    }

    fn erc721_burn(&mut self, token: Address, caller: Address, token_id: U256) -> LedgerResult<()> {
        let state = self.erc721_mut(token)?;
        state.require_approved_or_owner(token, caller, token_id)?;
        state.owners.remove(&token_id);
        state.uris.remove(&token_id);
        state.approvals.remove(&token_id);
        Ok(())
    }

    fn register_offer(
        &mut self,
        callback: Address,
        _caller: Address,
        call: &registerOfferCall,
    ) -> LedgerResult<()> {
        let state = self
            .world
            .callbacks
            .get_mut(&callback)
            .ok_or(LedgerError::UnknownContract(callback))?;
        if state.reject {
            return Err(LedgerError::Reverted {
                reason: "offer rejected".to_string(),
            });
        }
        state.offers.push(call.clone());
        Ok(())
    }
}

// ============================================================================
// Local bridge chain
// ============================================================================

/// A bridge on an in-memory chain, shared between a test and a relay.
///
/// This allows testing scenarios like:
/// - Requests relayed by several operators to a threshold
/// - Handle submissions that fail at the transport layer
/// - Relays that start past requests and rely on recovery
#[derive(Clone, Debug)]
pub struct LocalChain {
    bridge: Arc<Mutex<Bridge<InMemoryLedger>>>,
    requests: Arc<Mutex<Vec<ObservedRequest>>>,
    failures: Arc<Mutex<HashSet<u64>>>,
    submissions: Arc<Mutex<Vec<(Address, HandleCall)>>>,
}

impl LocalChain {
    pub fn new(bridge: Bridge<InMemoryLedger>) -> Self {
        Self {
            bridge: Arc::new(Mutex::new(bridge)),
            requests: Arc::default(),
            failures: Arc::default(),
            submissions: Arc::default(),
        }
    }

    /// Mines one block holding the transaction `f` executes.
    ///
    /// Request events of a successful transaction become request logs.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&mut Bridge<InMemoryLedger>) -> Result<Receipt<T>>,
    ) -> Result<Receipt<T>> {
        let mut bridge = self.bridge.lock().unwrap();
        bridge.ledger_mut().advance_block(1);
        let receipt = f(&mut bridge)?;

        let tx_hash = fake_tx_hash(bridge.address(), receipt.block_number);
        let mut requests = self.requests.lock().unwrap();
        for event in &receipt.events {
            if let BridgeEvents::RequestValueTransfer(request) = event {
                requests.push(ObservedRequest {
                    event: request.clone(),
                    block_number: receipt.block_number,
                    tx_hash,
                });
            }
        }
        Ok(receipt)
    }

    /// Access to the bridge without mining a block.
    pub fn with_bridge<T>(&self, f: impl FnOnce(&mut Bridge<InMemoryLedger>) -> T) -> T {
        f(&mut self.bridge.lock().unwrap())
    }

    /// Makes every submission of the handle for `nonce` fail.
    pub fn fail_submissions(&self, nonce: u64) {
        self.failures.lock().unwrap().insert(nonce);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Handle calls submitted to this chain, in submission order.
    pub fn submissions(&self) -> Vec<(Address, HandleCall)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn request_logs(&self) -> Vec<ObservedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn fake_tx_hash(bridge: Address, block_number: u64) -> TxHash {
    keccak256([bridge.as_slice(), &block_number.to_be_bytes()].concat())
}

#[async_trait]
impl BridgeChain for LocalChain {
    async fn block_number(&self) -> Result<u64> {
        Ok(self.with_bridge(|bridge| bridge.ledger().block_number()))
    }

    async fn request_nonce(&self) -> Result<u64> {
        Ok(self.with_bridge(|bridge| bridge.request_nonce()))
    }

    async fn sequential_handled_nonce(&self) -> Result<u64> {
        Ok(self.with_bridge(|bridge| bridge.sequential_handled_nonce()))
    }

    async fn last_handled_request_block_number(&self) -> Result<u64> {
        Ok(self.with_bridge(|bridge| bridge.last_handled_request_block_number()))
    }

    async fn is_closed(&self, nonce: u64) -> Result<bool> {
        Ok(self.with_bridge(|bridge| bridge.is_closed(nonce)))
    }

    async fn counterpart_token(&self, token: Address) -> Result<Address> {
        Ok(self.with_bridge(|bridge| bridge.allowed_token(token)))
    }

    async fn request_events(&self, from_block: u64, to_block: u64) -> Result<Vec<ObservedRequest>> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| (from_block..=to_block).contains(&r.block_number))
            .cloned()
            .collect())
    }

    async fn submit(&self, operator: Address, call: &HandleCall) -> Result<TxHash> {
        if self.failures.lock().unwrap().contains(&call.nonce()) {
            return Err(BridgeError::External(LedgerError::Reverted {
                reason: "simulated submission failure".to_string(),
            }));
        }
        self.submissions
            .lock()
            .unwrap()
            .push((operator, call.clone()));

        let receipt = self.transact(|bridge| bridge.execute(Tx::new(operator), &call.calldata()))?;
        let address = self.with_bridge(|bridge| bridge.address());
        Ok(fake_tx_hash(address, receipt.block_number))
    }
}
