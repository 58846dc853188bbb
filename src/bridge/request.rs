//! Request pipeline: deposits on the outgoing side.

use alloy_primitives::{Address, U256};
use tracing::info;

use super::{Bridge, Receipt, Tx};
use crate::contracts::bridge::Bridge::{BridgeEvents, RequestValueTransfer};
use crate::error::{BridgeError, Result};
use crate::protocol::{BridgeEvent, TokenKind};
use crate::spans;
use crate::traits::Ledger;

impl<L: Ledger> Bridge<L> {
    /// Requests a native-coin transfer of `value` to `to`.
    ///
    /// Whatever is attached on top of `value` is the fee limit: the configured
    /// fee goes to the fee receiver and the rest is refunded. Returns the
    /// request nonce.
    pub fn request_klay_transfer(&mut self, tx: Tx, to: Address, value: U256) -> Result<Receipt<u64>> {
        let span = spans::request_value_transfer(TokenKind::Klay, tx.sender, to, value);
        let _guard = span.enter();

        self.transact(tx, true, |bridge, tx, events| {
            bridge.accept_klay(tx.sender, to, value, tx.value, events)
        })
    }

    /// Accepts native coin silently, without emitting a request.
    pub fn charge_without_event(&mut self, tx: Tx) -> Result<Receipt<()>> {
        self.transact(tx, true, |bridge, tx, _| {
            info!(
                bridge = %bridge.address,
                from = %tx.sender,
                value = %tx.value,
                event = "bridge_charged"
            );
            Ok(())
        })
    }

    /// Plain native-coin transfer to the bridge.
    ///
    /// Refused unless the bridge was deployed with fallback deposits enabled,
    /// in which case the whole amount becomes a request to the sender's own
    /// address with a zero fee limit.
    pub fn fallback(&mut self, tx: Tx) -> Result<Receipt<u64>> {
        self.transact(tx, true, |bridge, tx, events| {
            if !bridge.state.settings.accept_fallback_deposits {
                return Err(BridgeError::FallbackDisabled);
            }
            bridge.accept_klay(tx.sender, tx.sender, tx.value, tx.value, events)
        })
    }

    /// Requests a fungible-token transfer, pulling `value + fee_limit` from
    /// the sender through `transferFrom`.
    pub fn request_erc20_transfer(
        &mut self,
        tx: Tx,
        token: Address,
        to: Address,
        value: U256,
        fee_limit: U256,
    ) -> Result<Receipt<u64>> {
        let span = spans::request_value_transfer(TokenKind::Erc20, tx.sender, to, value);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            bridge.require_running()?;
            bridge.require_allowed(token)?;
            if value.is_zero() {
                return Err(BridgeError::ZeroValue);
            }
            let amount = value
                .checked_add(fee_limit)
                .ok_or(BridgeError::AmountOverflow { value, fee_limit })?;
            bridge.ledger.erc20_transfer_from(
                token,
                bridge.address,
                tx.sender,
                bridge.address,
                amount,
            )?;
            bridge.accept_erc20(token, tx.sender, to, value, fee_limit, events)
        })
    }

    /// Token-initiated request: the token contract (the sender) already moved
    /// `value + fee_limit` of itself to the bridge on behalf of `from`.
    pub fn on_erc20_received(
        &mut self,
        tx: Tx,
        from: Address,
        to: Address,
        value: U256,
        fee_limit: U256,
    ) -> Result<Receipt<u64>> {
        let span = spans::request_value_transfer(TokenKind::Erc20, from, to, value);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            bridge.require_running()?;
            bridge.require_allowed(tx.sender)?;
            if value.is_zero() {
                return Err(BridgeError::ZeroValue);
            }
            bridge.accept_erc20(tx.sender, from, to, value, fee_limit, events)
        })
    }

    /// Requests a non-fungible transfer of `token_id`, pulling the item from
    /// the sender.
    pub fn request_erc721_transfer(
        &mut self,
        tx: Tx,
        token: Address,
        to: Address,
        token_id: U256,
    ) -> Result<Receipt<u64>> {
        let span = spans::request_value_transfer(TokenKind::Erc721, tx.sender, to, token_id);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            bridge.require_running()?;
            bridge.require_allowed(token)?;
            let uri = bridge.ledger.erc721_token_uri(token, token_id)?;
            bridge.ledger.erc721_transfer_from(
                token,
                bridge.address,
                tx.sender,
                bridge.address,
                token_id,
            )?;
            bridge.accept_erc721(token, tx.sender, to, token_id, uri, events)
        })
    }

    /// Token-initiated non-fungible request; the item is already held by the bridge.
    pub fn on_erc721_received(
        &mut self,
        tx: Tx,
        from: Address,
        token_id: U256,
        to: Address,
    ) -> Result<Receipt<u64>> {
        let span = spans::request_value_transfer(TokenKind::Erc721, from, to, token_id);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            bridge.require_running()?;
            bridge.require_allowed(tx.sender)?;
            let uri = bridge.ledger.erc721_token_uri(tx.sender, token_id)?;
            bridge.accept_erc721(tx.sender, from, to, token_id, uri, events)
        })
    }

    fn accept_klay(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
        attached: U256,
        events: &mut Vec<BridgeEvent>,
    ) -> Result<u64> {
        self.require_running()?;
        if value.is_zero() {
            return Err(BridgeError::ZeroValue);
        }
        if attached < value {
            return Err(BridgeError::InsufficientValue {
                attached,
                requested: value,
            });
        }

        let settlement = self
            .state
            .fees
            .settle(self.state.fees.klay_fee(), attached - value)?;
        if !settlement.fee.is_zero() {
            self.ledger
                .transfer(self.address, self.state.fees.receiver(), settlement.fee)?;
        }
        if !settlement.refund.is_zero() {
            self.ledger.transfer(self.address, from, settlement.refund)?;
        }

        Ok(self.emit_request(
            TokenKind::Klay,
            from,
            to,
            Address::ZERO,
            value,
            String::new(),
            settlement.fee,
            events,
        ))
    }

    fn accept_erc20(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        value: U256,
        fee_limit: U256,
        events: &mut Vec<BridgeEvent>,
    ) -> Result<u64> {
        let settlement = self
            .state
            .fees
            .settle(self.state.fees.erc20_fee(token), fee_limit)?;
        if !settlement.fee.is_zero() {
            self.ledger.erc20_transfer(
                token,
                self.address,
                self.state.fees.receiver(),
                settlement.fee,
            )?;
        }
        if !settlement.refund.is_zero() {
            self.ledger
                .erc20_transfer(token, self.address, from, settlement.refund)?;
        }
        if self.state.settings.mode_mint_burn {
            self.ledger.erc20_burn(token, self.address, value)?;
        }

        Ok(self.emit_request(
            TokenKind::Erc20,
            from,
            to,
            token,
            value,
            String::new(),
            settlement.fee,
            events,
        ))
    }

    fn accept_erc721(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        token_id: U256,
        uri: String,
        events: &mut Vec<BridgeEvent>,
    ) -> Result<u64> {
        if self.state.settings.mode_mint_burn {
            self.ledger.erc721_burn(token, self.address, token_id)?;
        }

        Ok(self.emit_request(
            TokenKind::Erc721,
            from,
            to,
            token,
            token_id,
            uri,
            U256::ZERO,
            events,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_request(
        &mut self,
        kind: TokenKind,
        from: Address,
        to: Address,
        token: Address,
        value_or_token_id: U256,
        uri: String,
        fee: U256,
        events: &mut Vec<BridgeEvent>,
    ) -> u64 {
        let nonce = self.state.request_nonce;
        self.state.request_nonce += 1;
        tracing::Span::current().record("request_nonce", nonce);

        info!(
            bridge = %self.address,
            token_kind = %kind,
            from = %from,
            to = %to,
            token = %token,
            value_or_token_id = %value_or_token_id,
            request_nonce = nonce,
            fee = %fee,
            event = "value_transfer_requested"
        );

        events.push(BridgeEvents::RequestValueTransfer(RequestValueTransfer {
            tokenType: kind.as_u8(),
            from,
            to,
            tokenAddress: token,
            valueOrTokenId: value_or_token_id,
            requestNonce: nonce,
            uri,
            fee,
        }));
        nonce
    }
}
