//! ERC721 contract bindings for bridge deposits

use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::{debug, info};

use crate::error::Result;
use Erc721::Erc721Instance;

/// ERC721 contract wrapper
///
/// A non-fungible request pulls the item through `transferFrom`, so the bridge
/// must be approved for the token id first.
pub struct Erc721Contract<P: Provider<Ethereum>> {
    instance: Erc721Instance<P>,
}

impl<P: Provider<Ethereum>> Erc721Contract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "erc721_contract_initialized"
        );
        Self {
            instance: Erc721Instance::new(address, provider),
        }
    }

    pub async fn owner_of(&self, token_id: U256) -> Result<Address> {
        Ok(self.instance.ownerOf(token_id).call().await?)
    }

    /// Metadata URI the bridge forwards in `RequestValueTransfer`.
    pub async fn token_uri(&self, token_id: U256) -> Result<String> {
        Ok(self.instance.tokenURI(token_id).call().await?)
    }

    pub fn approve_transaction(
        &self,
        from: Address,
        spender: Address,
        token_id: U256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            spender = %spender,
            token_id = %token_id,
            contract_address = %self.instance.address(),
            event = "erc721_approve_transaction_created"
        );

        self.instance
            .approve(spender, token_id)
            .from(from)
            .into_transaction_request()
    }

    /// Push-style deposit of `token_id` through the token's own bridge hook.
    pub fn request_value_transfer_transaction(
        &self,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> TransactionRequest {
        self.instance
            .requestValueTransfer(token_id, to)
            .from(from)
            .into_transaction_request()
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

sol!(
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Erc721 {
        function ownerOf(uint256 tokenId) external view returns (address);
        function tokenURI(uint256 tokenId) external view returns (string);
        function approve(address to, uint256 tokenId) external;
        function transferFrom(address from, address to, uint256 tokenId) external;
        function safeTransferFrom(address from, address to, uint256 tokenId) external;
        function mintWithTokenURI(address to, uint256 tokenId, string tokenURI) external returns (bool);
        function burn(uint256 tokenId) external;
        function requestValueTransfer(uint256 uid, address to) external;
    }
);
