//! Owner-only administration and operator-voted configuration.

use alloy_primitives::{Address, U256};
use tracing::info;

use super::{Bridge, Receipt, Tx, VoteOutcome};
use crate::contracts::bridge::Bridge::{
    setERC20FeeCall, setKLAYFeeCall, BridgeEvents, ERC20FeeChanged, FeeReceiverChanged,
    KLAYFeeChanged, OwnershipTransferred,
};
use crate::error::{BridgeError, Result};
use crate::protocol::{BridgeEvent, VoteKind};
use crate::spans;
use crate::traits::Ledger;

impl<L: Ledger> Bridge<L> {
    pub fn transfer_ownership(&mut self, tx: Tx, new_owner: Address) -> Result<Receipt<()>> {
        let span = spans::admin("transfer_ownership", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            bridge.only_owner(tx)?;
            if new_owner.is_zero() {
                return Err(BridgeError::ZeroAddress);
            }
            bridge.set_owner(new_owner, events);
            Ok(())
        })
    }

    /// Leaves the bridge without an owner. Owner-only calls are impossible afterwards.
    pub fn renounce_ownership(&mut self, tx: Tx) -> Result<Receipt<()>> {
        let span = spans::admin("renounce_ownership", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            bridge.only_owner(tx)?;
            bridge.set_owner(Address::ZERO, events);
            Ok(())
        })
    }

    /// Sets the running flag. Requests are refused while it is `false`.
    pub fn start(&mut self, tx: Tx, running: bool) -> Result<Receipt<()>> {
        let span = spans::admin("start", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, _| {
            bridge.only_owner(tx)?;
            bridge.state.running = running;
            info!(bridge = %bridge.address, running = running, event = "running_changed");
            Ok(())
        })
    }

    pub fn set_counterpart_bridge(&mut self, tx: Tx, counterpart: Address) -> Result<Receipt<()>> {
        let span = spans::admin("set_counterpart_bridge", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, _| {
            bridge.only_owner(tx)?;
            bridge.state.counterpart_bridge = counterpart;
            info!(
                bridge = %bridge.address,
                counterpart = %counterpart,
                event = "counterpart_bridge_changed"
            );
            Ok(())
        })
    }

    pub fn register_operator(&mut self, tx: Tx, operator: Address) -> Result<Receipt<()>> {
        let span = spans::admin("register_operator", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, _| {
            bridge.only_owner(tx)?;
            if bridge.state.operators.register(operator) {
                info!(operator = %operator, event = "operator_registered");
            }
            Ok(())
        })
    }

    pub fn deregister_operator(&mut self, tx: Tx, operator: Address) -> Result<Receipt<()>> {
        let span = spans::admin("deregister_operator", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, _| {
            bridge.only_owner(tx)?;
            if bridge.state.operators.deregister(operator) {
                info!(operator = %operator, event = "operator_deregistered");
            }
            Ok(())
        })
    }

    /// Stores `threshold` for `kind` as given, even if fewer operators exist.
    pub fn set_operator_threshold(
        &mut self,
        tx: Tx,
        kind: VoteKind,
        threshold: u64,
    ) -> Result<Receipt<()>> {
        let span = spans::admin("set_operator_threshold", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, _| {
            bridge.only_owner(tx)?;
            bridge.state.operators.set_threshold(kind, threshold);
            info!(
                vote_kind = %kind,
                threshold = threshold,
                operators = bridge.state.operators.operators().len(),
                event = "operator_threshold_changed"
            );
            Ok(())
        })
    }

    /// Allows `token`, mapped to `counterpart` on the other chain. A zero
    /// counterpart removes the mapping.
    pub fn register_token(
        &mut self,
        tx: Tx,
        token: Address,
        counterpart: Address,
    ) -> Result<Receipt<()>> {
        let span = spans::admin("register_token", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, _| {
            bridge.only_owner(tx)?;
            bridge.state.tokens.register(token, counterpart);
            info!(token = %token, counterpart = %counterpart, event = "token_registered");
            Ok(())
        })
    }

    pub fn deregister_token(&mut self, tx: Tx, token: Address) -> Result<Receipt<()>> {
        let span = spans::admin("deregister_token", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, _| {
            bridge.only_owner(tx)?;
            if bridge.state.tokens.deregister(token) {
                info!(token = %token, event = "token_deregistered");
            }
            Ok(())
        })
    }

    /// Sets the fee receiver; the zero address turns fee collection off.
    pub fn set_fee_receiver(&mut self, tx: Tx, receiver: Address) -> Result<Receipt<()>> {
        let span = spans::admin("set_fee_receiver", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            bridge.only_owner(tx)?;
            bridge.state.fees.set_receiver(receiver);
            info!(fee_receiver = %receiver, event = "fee_receiver_changed");
            events.push(BridgeEvents::FeeReceiverChanged(FeeReceiverChanged {
                feeReceiver: receiver,
            }));
            Ok(())
        })
    }

    /// Sets the callback contract of an extended bridge.
    pub fn set_callback(&mut self, tx: Tx, callback: Address) -> Result<Receipt<()>> {
        let span = spans::admin("set_callback", tx.sender);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, _| {
            if !bridge.state.settings.callback_enabled {
                return Err(BridgeError::UnsupportedCall("setCallback"));
            }
            bridge.only_owner(tx)?;
            bridge.state.callback = callback;
            info!(callback = %callback, event = "callback_changed");
            Ok(())
        })
    }

    /// Operator vote for a new native-coin fee at configuration nonce `nonce`.
    pub fn set_klay_fee(&mut self, tx: Tx, fee: U256, nonce: u64) -> Result<Receipt<VoteOutcome>> {
        let span = spans::configuration("set_klay_fee", tx.sender, nonce);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            let call = setKLAYFeeCall {
                fee,
                requestNonce: nonce,
            };
            let outcome = bridge.vote(tx.sender, &call)?;
            if outcome.is_finalized() {
                bridge.state.fees.set_klay_fee(fee);
                info!(fee = %fee, configuration_nonce = nonce, event = "klay_fee_changed");
                events.push(BridgeEvents::KLAYFeeChanged(KLAYFeeChanged { fee }));
            }
            Ok(outcome)
        })
    }

    /// Operator vote for a new fee of `token` at configuration nonce `nonce`.
    pub fn set_erc20_fee(
        &mut self,
        tx: Tx,
        token: Address,
        fee: U256,
        nonce: u64,
    ) -> Result<Receipt<VoteOutcome>> {
        let span = spans::configuration("set_erc20_fee", tx.sender, nonce);
        let _guard = span.enter();

        self.transact(tx, false, |bridge, tx, events| {
            let call = setERC20FeeCall {
                token,
                fee,
                requestNonce: nonce,
            };
            let outcome = bridge.vote(tx.sender, &call)?;
            if outcome.is_finalized() {
                bridge.state.fees.set_erc20_fee(token, fee);
                info!(
                    token = %token,
                    fee = %fee,
                    configuration_nonce = nonce,
                    event = "erc20_fee_changed"
                );
                events.push(BridgeEvents::ERC20FeeChanged(ERC20FeeChanged { token, fee }));
            }
            Ok(outcome)
        })
    }

    fn set_owner(&mut self, new_owner: Address, events: &mut Vec<BridgeEvent>) {
        let previous = self.state.owner;
        self.state.owner = new_owner;
        info!(
            previous_owner = %previous,
            new_owner = %new_owner,
            event = "ownership_transferred"
        );
        events.push(BridgeEvents::OwnershipTransferred(OwnershipTransferred {
            previousOwner: previous,
            newOwner: new_owner,
        }));
    }
}
