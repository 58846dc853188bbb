//! ABI entry point: routes raw calldata to the matching bridge operation.

use alloy_primitives::Bytes;
use alloy_sol_types::{SolCall, SolInterface};
use tracing::debug;

use super::{Bridge, Receipt, Tx, VERSION};
use crate::contracts::bridge::Bridge as Abi;
use crate::contracts::ext_bridge::ExtBridge as ExtAbi;
use crate::error::{BridgeError, Result};
use crate::protocol::VoteKind;
use crate::traits::Ledger;

use Abi::BridgeCalls;
use ExtAbi::ExtBridgeCalls;

impl<L: Ledger> Bridge<L> {
    /// Executes `calldata` exactly as the deployed contract would.
    ///
    /// Empty calldata goes to the fallback. Selectors of the extended
    /// interface are only accepted by a callback-enabled bridge. View calls
    /// return their ABI-encoded result; state-changing calls return empty
    /// output.
    pub fn execute(&mut self, tx: Tx, calldata: &[u8]) -> Result<Receipt<Bytes>> {
        if calldata.is_empty() {
            return Ok(self.fallback(tx)?.map(|_| Bytes::new()));
        }

        let extended = calldata
            .get(..4)
            .and_then(|selector| <[u8; 4]>::try_from(selector).ok())
            .is_some_and(ExtBridgeCalls::valid_selector);
        if extended {
            if !self.state.settings.callback_enabled {
                return Err(BridgeError::UnsupportedCall("extended bridge interface"));
            }
            return self.execute_extended(tx, ExtBridgeCalls::abi_decode(calldata)?);
        }

        let call = BridgeCalls::abi_decode(calldata)?;
        debug!(
            bridge = %self.address,
            sender = %tx.sender,
            selector = %Bytes::copy_from_slice(&call.selector()),
            event = "call_dispatched"
        );

        match call {
            BridgeCalls::VERSION(_) => self.view(&tx, Abi::VERSIONCall::abi_encode_returns(&VERSION)),
            BridgeCalls::owner(_) => self.view(&tx, Abi::ownerCall::abi_encode_returns(&self.owner())),
            BridgeCalls::isOwner(_) => {
                self.view(&tx, Abi::isOwnerCall::abi_encode_returns(&self.is_owner(tx.sender)))
            }
            BridgeCalls::isRunning(_) => {
                self.view(&tx, Abi::isRunningCall::abi_encode_returns(&self.is_running()))
            }
            BridgeCalls::modeMintBurn(_) => {
                self.view(&tx, Abi::modeMintBurnCall::abi_encode_returns(&self.mode_mint_burn()))
            }
            BridgeCalls::counterpartBridge(_) => self.view(
                &tx,
                Abi::counterpartBridgeCall::abi_encode_returns(&self.counterpart_bridge()),
            ),
            BridgeCalls::requestNonce(_) => {
                self.view(&tx, Abi::requestNonceCall::abi_encode_returns(&self.request_nonce()))
            }
            BridgeCalls::sequentialHandledNonce(_) => self.view(
                &tx,
                Abi::sequentialHandledNonceCall::abi_encode_returns(
                    &self.sequential_handled_nonce(),
                ),
            ),
            BridgeCalls::maxRequestedNonce(_) => self.view(
                &tx,
                Abi::maxRequestedNonceCall::abi_encode_returns(&self.max_requested_nonce()),
            ),
            BridgeCalls::lastHandledRequestBlockNumber(_) => self.view(
                &tx,
                Abi::lastHandledRequestBlockNumberCall::abi_encode_returns(
                    &self.last_handled_request_block_number(),
                ),
            ),
            BridgeCalls::configurationNonce(_) => self.view(
                &tx,
                Abi::configurationNonceCall::abi_encode_returns(&self.configuration_nonce()),
            ),
            BridgeCalls::operators(c) => self.view(
                &tx,
                Abi::operatorsCall::abi_encode_returns(&self.is_operator(c.operator)),
            ),
            BridgeCalls::getOperatorList(_) => self.view(
                &tx,
                Abi::getOperatorListCall::abi_encode_returns(&self.operator_list()),
            ),
            BridgeCalls::operatorThresholds(c) => {
                let kind = vote_kind(c.voteType)?;
                self.view(
                    &tx,
                    Abi::operatorThresholdsCall::abi_encode_returns(&self.operator_threshold(kind)),
                )
            }
            BridgeCalls::allowedTokens(c) => self.view(
                &tx,
                Abi::allowedTokensCall::abi_encode_returns(&self.allowed_token(c.token)),
            ),
            BridgeCalls::getRegisteredTokenList(_) => self.view(
                &tx,
                Abi::getRegisteredTokenListCall::abi_encode_returns(&self.registered_tokens()),
            ),
            BridgeCalls::feeOfKLAY(_) => {
                self.view(&tx, Abi::feeOfKLAYCall::abi_encode_returns(&self.fee_of_klay()))
            }
            BridgeCalls::feeOfERC20(c) => self.view(
                &tx,
                Abi::feeOfERC20Call::abi_encode_returns(&self.fee_of_erc20(c.token)),
            ),
            BridgeCalls::feeReceiver(_) => {
                self.view(&tx, Abi::feeReceiverCall::abi_encode_returns(&self.fee_receiver()))
            }
            BridgeCalls::closedValueTransferVotes(c) => self.view(
                &tx,
                Abi::closedValueTransferVotesCall::abi_encode_returns(&self.is_closed(c.nonce)),
            ),
            BridgeCalls::votedCount(c) => self.view(
                &tx,
                Abi::votedCountCall::abi_encode_returns(&self.voted_count(&c.actionHash)),
            ),

            BridgeCalls::transferOwnership(c) => empty(self.transfer_ownership(tx, c.newOwner)),
            BridgeCalls::renounceOwnership(_) => empty(self.renounce_ownership(tx)),
            BridgeCalls::start(c) => empty(self.start(tx, c.running)),
            BridgeCalls::setCounterPartBridge(c) => empty(self.set_counterpart_bridge(tx, c.bridge)),
            BridgeCalls::registerOperator(c) => empty(self.register_operator(tx, c.operator)),
            BridgeCalls::deregisterOperator(c) => empty(self.deregister_operator(tx, c.operator)),
            BridgeCalls::setOperatorThreshold(c) => {
                let kind = vote_kind(c.voteType)?;
                empty(self.set_operator_threshold(tx, kind, c.threshold))
            }
            BridgeCalls::registerToken(c) => {
                empty(self.register_token(tx, c.token, c.counterpartToken))
            }
            BridgeCalls::deregisterToken(c) => empty(self.deregister_token(tx, c.token)),
            BridgeCalls::setFeeReceiver(c) => empty(self.set_fee_receiver(tx, c.feeReceiver)),
            BridgeCalls::setKLAYFee(c) => empty(self.set_klay_fee(tx, c.fee, c.requestNonce)),
            BridgeCalls::setERC20Fee(c) => {
                empty(self.set_erc20_fee(tx, c.token, c.fee, c.requestNonce))
            }
            BridgeCalls::requestKLAYTransfer(c) => {
                empty(self.request_klay_transfer(tx, c.to, c.value))
            }
            BridgeCalls::requestERC20Transfer(c) => empty(self.request_erc20_transfer(
                tx,
                c.tokenAddress,
                c.to,
                c.value,
                c.feeLimit,
            )),
            BridgeCalls::requestERC721Transfer(c) => {
                empty(self.request_erc721_transfer(tx, c.tokenAddress, c.to, c.tokenId))
            }
            BridgeCalls::onERC20Received(c) => {
                empty(self.on_erc20_received(tx, c.from, c.to, c.value, c.feeLimit))
            }
            BridgeCalls::onERC721Received(c) => {
                empty(self.on_erc721_received(tx, c.from, c.tokenId, c.to))
            }
            BridgeCalls::chargeWithoutEvent(_) => empty(self.charge_without_event(tx)),
            BridgeCalls::handleKLAYTransfer(c) => empty(self.handle_klay_transfer(tx, &c)),
            BridgeCalls::handleERC20Transfer(c) => empty(self.handle_erc20_transfer(tx, &c)),
            BridgeCalls::handleERC721Transfer(c) => empty(self.handle_erc721_transfer(tx, &c)),
        }
    }

    fn execute_extended(&mut self, tx: Tx, call: ExtBridgeCalls) -> Result<Receipt<Bytes>> {
        match call {
            ExtBridgeCalls::callback(_) => {
                self.view(&tx, ExtAbi::callbackCall::abi_encode_returns(&self.callback()))
            }
            ExtBridgeCalls::handledRequestTx(c) => self.view(
                &tx,
                ExtAbi::handledRequestTxCall::abi_encode_returns(
                    &self.handled_request_tx(&c.requestTxHash),
                ),
            ),
            ExtBridgeCalls::setCallback(c) => empty(self.set_callback(tx, c.callback)),
            ExtBridgeCalls::handleERC721Transfer(c) => {
                empty(self.handle_erc721_transfer_with_callback(tx, &c))
            }
        }
    }

    fn view(&self, tx: &Tx, output: Vec<u8>) -> Result<Receipt<Bytes>> {
        if !tx.value.is_zero() {
            return Err(BridgeError::NonPayable);
        }
        Ok(Receipt {
            output: output.into(),
            events: Vec::new(),
            block_number: self.ledger.block_number(),
        })
    }
}

fn empty<T>(receipt: Result<Receipt<T>>) -> Result<Receipt<Bytes>> {
    receipt.map(|r| r.map(|_| Bytes::new()))
}

fn vote_kind(raw: u8) -> Result<VoteKind> {
    VoteKind::try_from(raw).map_err(|e| BridgeError::InvalidConfig(e.to_string()))
}
