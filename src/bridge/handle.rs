//! Handle pipeline: operator-voted deliveries on the incoming side.
//!
//! Handles do not consult the running flag; a stopped bridge still finalizes
//! transfers that were requested on the counterpart chain.

use alloy_primitives::{Address, U256};
use tracing::info;

use super::{Bridge, Receipt, Tx, VoteOutcome};
use crate::contracts::bridge::Bridge::{
    handleERC20TransferCall, handleERC721TransferCall, handleKLAYTransferCall, BridgeEvents,
    HandleValueTransfer,
};
use crate::contracts::ext_bridge::{Callback::registerOfferCall, ExtBridge};
use crate::error::{BridgeError, Result};
use crate::protocol::{BridgeEvent, TokenKind, VoteKind};
use crate::spans;
use crate::traits::Ledger;

impl<L: Ledger> Bridge<L> {
    /// Operator vote to deliver native coin.
    pub fn handle_klay_transfer(
        &mut self,
        tx: Tx,
        call: &handleKLAYTransferCall,
    ) -> Result<Receipt<VoteOutcome>> {
        let span = spans::handle_value_transfer(TokenKind::Klay, tx.sender, call.requestNonce);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            let outcome = bridge.vote(tx.sender, call)?;
            if !outcome.is_finalized() {
                return Ok(outcome);
            }
            bridge.mark_handled(call.requestNonce, call.requestBlockNumber);

            bridge.ledger.transfer(bridge.address, call.to, call.value)?;
            bridge.emit_handle(
                TokenKind::Klay,
                call.from,
                call.to,
                Address::ZERO,
                call.value,
                call.requestNonce,
                events,
            );
            Ok(outcome)
        })
    }

    /// Operator vote to deliver fungible tokens.
    pub fn handle_erc20_transfer(
        &mut self,
        tx: Tx,
        call: &handleERC20TransferCall,
    ) -> Result<Receipt<VoteOutcome>> {
        let span = spans::handle_value_transfer(TokenKind::Erc20, tx.sender, call.requestNonce);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            let outcome = bridge.vote(tx.sender, call)?;
            if !outcome.is_finalized() {
                return Ok(outcome);
            }
            bridge.mark_handled(call.requestNonce, call.requestBlockNumber);

            if bridge.state.settings.mode_mint_burn {
                bridge
                    .ledger
                    .erc20_mint(call.tokenAddress, bridge.address, call.to, call.value)?;
            } else {
                bridge
                    .ledger
                    .erc20_transfer(call.tokenAddress, bridge.address, call.to, call.value)?;
            }
            bridge.emit_handle(
                TokenKind::Erc20,
                call.from,
                call.to,
                call.tokenAddress,
                call.value,
                call.requestNonce,
                events,
            );
            Ok(outcome)
        })
    }

    /// Operator vote to deliver a non-fungible item.
    ///
    /// This arity never invokes the callback, even on an extended bridge.
    pub fn handle_erc721_transfer(
        &mut self,
        tx: Tx,
        call: &handleERC721TransferCall,
    ) -> Result<Receipt<VoteOutcome>> {
        let span = spans::handle_value_transfer(TokenKind::Erc721, tx.sender, call.requestNonce);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            let outcome = bridge.vote(tx.sender, call)?;
            if !outcome.is_finalized() {
                return Ok(outcome);
            }
            bridge.mark_handled(call.requestNonce, call.requestBlockNumber);

            bridge.deliver_erc721(call.tokenAddress, call.to, call.tokenId, &call.tokenURI)?;
            bridge.emit_handle(
                TokenKind::Erc721,
                call.from,
                call.to,
                call.tokenAddress,
                call.tokenId,
                call.requestNonce,
                events,
            );
            Ok(outcome)
        })
    }

    /// Extended-bridge vote to deliver a non-fungible item and notify the
    /// callback contract.
    ///
    /// On finalization the request transaction is recorded as handled and all
    /// bridge state is committed before the callback runs. A failing callback
    /// reverts the whole call.
    pub fn handle_erc721_transfer_with_callback(
        &mut self,
        tx: Tx,
        call: &ExtBridge::handleERC721TransferCall,
    ) -> Result<Receipt<VoteOutcome>> {
        let span = spans::handle_value_transfer(TokenKind::Erc721, tx.sender, call.requestNonce);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            if !bridge.state.settings.callback_enabled {
                return Err(BridgeError::UnsupportedCall("handleERC721Transfer with requestTxHash"));
            }
            let outcome = bridge.vote(tx.sender, call)?;
            if !outcome.is_finalized() {
                return Ok(outcome);
            }
            bridge.mark_handled(call.requestNonce, call.requestBlockNumber);
            bridge.history.mark_handled_request_tx(call.requestTxHash);

            bridge.deliver_erc721(call.tokenAddress, call.to, call.tokenId, &call.tokenURI)?;
            bridge.emit_handle(
                TokenKind::Erc721,
                call.from,
                call.to,
                call.tokenAddress,
                call.tokenId,
                call.requestNonce,
                events,
            );

            let callback = bridge.state.callback;
            if !callback.is_zero() {
                bridge.ledger.register_offer(
                    callback,
                    bridge.address,
                    &registerOfferCall {
                        owner: call.to,
                        tokenId: call.tokenId,
                        tokenAddress: call.tokenAddress,
                        requestTxHash: call.requestTxHash,
                    },
                )?;
                info!(
                    callback = %callback,
                    request_tx_hash = %call.requestTxHash,
                    event = "callback_offer_registered"
                );
            }
            Ok(outcome)
        })
    }

    /// Bookkeeping for a value transfer that was just finalized.
    ///
    /// The closed bit is already set by the vote; this moves the contiguous
    /// handled prefix and the high-water marks.
    fn mark_handled(&mut self, nonce: u64, request_block_number: u64) {
        let votes = self.history.votes();
        let state = &mut self.state;
        if nonce == state.sequential_handled_nonce {
            let mut next = nonce;
            while votes.is_closed(VoteKind::ValueTransfer, next) {
                next += 1;
            }
            state.sequential_handled_nonce = next;
        }
        state.max_requested_nonce = state.max_requested_nonce.max(nonce);
        state.last_handled_request_block_number = request_block_number;
    }

    fn deliver_erc721(&mut self, token: Address, to: Address, token_id: U256, uri: &str) -> Result<()> {
        if self.state.settings.mode_mint_burn {
            self.ledger
                .erc721_mint_with_uri(token, self.address, to, token_id, uri)?;
        } else {
            self.ledger
                .erc721_transfer_from(token, self.address, self.address, to, token_id)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_handle(
        &self,
        kind: TokenKind,
        from: Address,
        to: Address,
        token: Address,
        value_or_token_id: U256,
        handle_nonce: u64,
        events: &mut Vec<BridgeEvent>,
    ) {
        info!(
            bridge = %self.address,
            token_kind = %kind,
            from = %from,
            to = %to,
            token = %token,
            value_or_token_id = %value_or_token_id,
            handle_nonce = handle_nonce,
            sequential_handled_nonce = self.state.sequential_handled_nonce,
            event = "value_transfer_handled"
        );

        events.push(BridgeEvents::HandleValueTransfer(HandleValueTransfer {
            tokenType: kind.as_u8(),
            from,
            to,
            tokenAddress: token,
            valueOrTokenId: value_or_token_id,
            handleNonce: handle_nonce,
        }));
    }
}
