//! Extended bridge and callback contract bindings
//!
//! The extended bridge adds an application callback to the non-fungible
//! handle path. It overloads `handleERC721Transfer` with an 8-argument form
//! whose first argument is the hash of the originating request transaction;
//! only that form invokes the callback.

use alloy_network::Ethereum;
use alloy_primitives::{Address, B256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::{debug, info};

use super::bridge::BridgeContract;
use crate::error::Result;
use ExtBridge::{handleERC721TransferCall, ExtBridgeInstance};

/// Extended bridge contract wrapper
///
/// Shares every base-bridge operation through [`ExtBridgeContract::base`].
pub struct ExtBridgeContract<P: Provider<Ethereum> + Clone> {
    base: BridgeContract<P>,
    instance: ExtBridgeInstance<P>,
}

impl<P: Provider<Ethereum> + Clone> ExtBridgeContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "ext_bridge_contract_initialized"
        );
        Self {
            base: BridgeContract::new(address, provider.clone()),
            instance: ExtBridgeInstance::new(address, provider),
        }
    }

    /// The base bridge interface of this contract.
    pub fn base(&self) -> &BridgeContract<P> {
        &self.base
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    /// Callback contract invoked after non-fungible handles, zero if unset.
    pub async fn callback(&self) -> Result<Address> {
        Ok(self.instance.callback().call().await?)
    }

    /// Whether the request transaction `tx_hash` has already been handled.
    pub async fn handled_request_tx(&self, tx_hash: B256) -> Result<bool> {
        Ok(self.instance.handledRequestTx(tx_hash).call().await?)
    }

    pub fn set_callback_transaction(&self, owner: Address, callback: Address) -> TransactionRequest {
        info!(
            owner = %owner,
            callback = %callback,
            contract_address = %self.instance.address(),
            event = "set_callback_transaction_created"
        );

        self.instance
            .setCallback(callback)
            .from(owner)
            .into_transaction_request()
    }

    /// Create the transaction request for the 8-argument `handleERC721Transfer`.
    pub fn handle_erc721_transfer_transaction(
        &self,
        operator: Address,
        call: &handleERC721TransferCall,
    ) -> TransactionRequest {
        info!(
            operator = %operator,
            request_tx_hash = %call.requestTxHash,
            request_nonce = call.requestNonce,
            contract_address = %self.instance.address(),
            event = "ext_handle_erc721_transfer_transaction_created"
        );

        self.instance
            .handleERC721Transfer(
                call.requestTxHash,
                call.from,
                call.to,
                call.tokenAddress,
                call.tokenId,
                call.requestNonce,
                call.requestBlockNumber,
                call.tokenURI.clone(),
            )
            .from(operator)
            .into_transaction_request()
    }
}

sol!(
    #[allow(clippy::too_many_arguments)]
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract ExtBridge {
        function callback() external view returns (address);
        function handledRequestTx(bytes32 requestTxHash) external view returns (bool);
        function setCallback(address callback) external;
        function handleERC721Transfer(
            bytes32 requestTxHash,
            address from,
            address to,
            address tokenAddress,
            uint256 tokenId,
            uint64 requestNonce,
            uint64 requestBlockNumber,
            string tokenURI
        ) external;
    }
);

sol!(
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Callback {
        event RegisteredOffer(address owner, uint256 tokenId, address tokenAddress, bytes32 requestTxHash);

        function registerOffer(address owner, uint256 tokenId, address tokenAddress, bytes32 requestTxHash) external;
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::bridge::Bridge;
    use alloy_sol_types::SolCall;

    #[test]
    fn test_overloads_have_distinct_selectors() {
        insta::assert_snapshot!(
            handleERC721TransferCall::SIGNATURE,
            @"handleERC721Transfer(bytes32,address,address,address,uint256,uint64,uint64,string)"
        );
        assert_ne!(
            handleERC721TransferCall::SELECTOR,
            Bridge::handleERC721TransferCall::SELECTOR
        );
    }

    #[test]
    fn test_register_offer_signature() {
        insta::assert_snapshot!(
            Callback::registerOfferCall::SIGNATURE,
            @"registerOffer(address,uint256,address,bytes32)"
        );
    }
}
