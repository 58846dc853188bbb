// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Bridge contract bindings and wrapper
//!
//! This module contains the Alloy-generated bindings for the value-transfer
//! bridge contract deployed on both sides of a bridge pair, and a wrapper that
//! reads its state, builds its transactions and queries its event logs.

use alloy_contract::CallBuilder;
use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::{Log, TransactionRequest};
use alloy_sol_types::sol;
use std::marker::PhantomData;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::protocol::VoteKind;
use Bridge::{
    handleERC20TransferCall, handleERC721TransferCall, handleKLAYTransferCall, BridgeInstance,
    HandleValueTransfer, RequestValueTransfer,
};

/// Value-transfer bridge contract wrapper
///
/// Every read is a single `eth_call`; every state-changing operation returns
/// a [`TransactionRequest`] that the caller signs and sends.
///
/// # Example
///
/// ```rust,no_run
/// use klay_bridge::BridgeContract;
/// use alloy_primitives::{address, U256};
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new().connect("http://localhost:8551").await?;
/// let bridge = BridgeContract::new(address!("1000000000000000000000000000000000000001"), provider);
///
/// let user = address!("2000000000000000000000000000000000000002");
/// let nonce = bridge.request_nonce().await?;
/// let tx = bridge.request_klay_transfer_transaction(user, user, U256::from(10), U256::from(1))?;
/// // Sign and send...
/// # Ok(())
/// # }
/// ```
pub struct BridgeContract<P: Provider<Ethereum>> {
    instance: BridgeInstance<P>,
}

impl<P: Provider<Ethereum>> BridgeContract<P> {
    /// Create a new BridgeContract.
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "bridge_contract_initialized"
        );
        Self {
            instance: BridgeInstance::new(address, provider),
        }
    }

    /// Returns the contract address
    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    /// Contract version constant (`VERSION`).
    pub async fn version(&self) -> Result<u64> {
        Ok(self.instance.VERSION().call().await?)
    }

    pub async fn owner(&self) -> Result<Address> {
        Ok(self.instance.owner().call().await?)
    }

    pub async fn is_running(&self) -> Result<bool> {
        Ok(self.instance.isRunning().call().await?)
    }

    pub async fn mode_mint_burn(&self) -> Result<bool> {
        Ok(self.instance.modeMintBurn().call().await?)
    }

    pub async fn counterpart_bridge(&self) -> Result<Address> {
        Ok(self.instance.counterpartBridge().call().await?)
    }

    /// Nonce the next outgoing request will carry.
    pub async fn request_nonce(&self) -> Result<u64> {
        let nonce = self.instance.requestNonce().call().await?;

        debug!(
            request_nonce = nonce,
            contract_address = %self.instance.address(),
            event = "request_nonce_retrieved"
        );

        Ok(nonce)
    }

    /// Smallest incoming nonce that has not been closed yet.
    pub async fn sequential_handled_nonce(&self) -> Result<u64> {
        let nonce = self.instance.sequentialHandledNonce().call().await?;

        debug!(
            sequential_handled_nonce = nonce,
            contract_address = %self.instance.address(),
            event = "sequential_handled_nonce_retrieved"
        );

        Ok(nonce)
    }

    pub async fn max_requested_nonce(&self) -> Result<u64> {
        Ok(self.instance.maxRequestedNonce().call().await?)
    }

    pub async fn last_handled_request_block_number(&self) -> Result<u64> {
        Ok(self.instance.lastHandledRequestBlockNumber().call().await?)
    }

    pub async fn configuration_nonce(&self) -> Result<u64> {
        Ok(self.instance.configurationNonce().call().await?)
    }

    pub async fn is_operator(&self, account: Address) -> Result<bool> {
        Ok(self.instance.operators(account).call().await?)
    }

    pub async fn operator_list(&self) -> Result<Vec<Address>> {
        Ok(self.instance.getOperatorList().call().await?)
    }

    pub async fn operator_threshold(&self, kind: VoteKind) -> Result<u64> {
        Ok(self
            .instance
            .operatorThresholds(kind.as_u8())
            .call()
            .await?)
    }

    /// Counterpart token registered for `token`, or the zero address.
    pub async fn allowed_token(&self, token: Address) -> Result<Address> {
        Ok(self.instance.allowedTokens(token).call().await?)
    }

    pub async fn registered_tokens(&self) -> Result<Vec<Address>> {
        Ok(self.instance.getRegisteredTokenList().call().await?)
    }

    pub async fn fee_of_klay(&self) -> Result<U256> {
        Ok(self.instance.feeOfKLAY().call().await?)
    }

    pub async fn fee_of_erc20(&self, token: Address) -> Result<U256> {
        Ok(self.instance.feeOfERC20(token).call().await?)
    }

    pub async fn fee_receiver(&self) -> Result<Address> {
        Ok(self.instance.feeReceiver().call().await?)
    }

    /// Whether the incoming request with `nonce` has been finalized.
    pub async fn is_closed(&self, nonce: u64) -> Result<bool> {
        Ok(self
            .instance
            .closedValueTransferVotes(nonce)
            .call()
            .await?)
    }

    /// Create the transaction request for `requestKLAYTransfer`.
    ///
    /// The attached value is `value + fee_limit`; whatever the configured fee
    /// does not consume is refunded by the contract. Fails with
    /// [`BridgeError::AmountOverflow`] when that sum does not fit in 256 bits.
    pub fn request_klay_transfer_transaction(
        &self,
        from: Address,
        to: Address,
        value: U256,
        fee_limit: U256,
    ) -> Result<TransactionRequest> {
        let attached = value
            .checked_add(fee_limit)
            .ok_or(BridgeError::AmountOverflow { value, fee_limit })?;

        info!(
            from = %from,
            to = %to,
            value = %value,
            fee_limit = %fee_limit,
            contract_address = %self.instance.address(),
            event = "request_klay_transfer_transaction_created"
        );

        Ok(self
            .instance
            .requestKLAYTransfer(to, value)
            .from(from)
            .value(attached)
            .into_transaction_request())
    }

    /// Create the transaction request for `requestERC20Transfer`.
    ///
    /// The bridge must be approved for `value + fee_limit` beforehand.
    pub fn request_erc20_transfer_transaction(
        &self,
        from: Address,
        token: Address,
        to: Address,
        value: U256,
        fee_limit: U256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            token = %token,
            to = %to,
            value = %value,
            fee_limit = %fee_limit,
            contract_address = %self.instance.address(),
            event = "request_erc20_transfer_transaction_created"
        );

        self.instance
            .requestERC20Transfer(token, to, value, fee_limit)
            .from(from)
            .into_transaction_request()
    }

    /// Create the transaction request for `requestERC721Transfer`.
    pub fn request_erc721_transfer_transaction(
        &self,
        from: Address,
        token: Address,
        to: Address,
        token_id: U256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            token = %token,
            to = %to,
            token_id = %token_id,
            contract_address = %self.instance.address(),
            event = "request_erc721_transfer_transaction_created"
        );

        self.instance
            .requestERC721Transfer(token, to, token_id)
            .from(from)
            .into_transaction_request()
    }

    /// Create the call builder for `handleKLAYTransfer`.
    pub fn handle_klay_transfer_call_builder(
        &self,
        operator: Address,
        call: &handleKLAYTransferCall,
    ) -> CallBuilder<&P, PhantomData<handleKLAYTransferCall>> {
        self.instance
            .handleKLAYTransfer(
                call.from,
                call.to,
                call.value,
                call.requestNonce,
                call.requestBlockNumber,
            )
            .from(operator)
    }

    pub fn handle_klay_transfer_transaction(
        &self,
        operator: Address,
        call: &handleKLAYTransferCall,
    ) -> TransactionRequest {
        info!(
            operator = %operator,
            request_nonce = call.requestNonce,
            contract_address = %self.instance.address(),
            event = "handle_klay_transfer_transaction_created"
        );

        self.handle_klay_transfer_call_builder(operator, call)
            .into_transaction_request()
    }

    pub fn handle_erc20_transfer_transaction(
        &self,
        operator: Address,
        call: &handleERC20TransferCall,
    ) -> TransactionRequest {
        info!(
            operator = %operator,
            request_nonce = call.requestNonce,
            token = %call.tokenAddress,
            contract_address = %self.instance.address(),
            event = "handle_erc20_transfer_transaction_created"
        );

        self.instance
            .handleERC20Transfer(
                call.from,
                call.to,
                call.tokenAddress,
                call.value,
                call.requestNonce,
                call.requestBlockNumber,
            )
            .from(operator)
            .into_transaction_request()
    }

    pub fn handle_erc721_transfer_transaction(
        &self,
        operator: Address,
        call: &handleERC721TransferCall,
    ) -> TransactionRequest {
        info!(
            operator = %operator,
            request_nonce = call.requestNonce,
            token = %call.tokenAddress,
            contract_address = %self.instance.address(),
            event = "handle_erc721_transfer_transaction_created"
        );

        self.instance
            .handleERC721Transfer(
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

    /// Operator vote for a new native-coin fee at `configuration_nonce`.
    pub fn set_klay_fee_transaction(
        &self,
        operator: Address,
        fee: U256,
        configuration_nonce: u64,
    ) -> TransactionRequest {
        self.instance
            .setKLAYFee(fee, configuration_nonce)
            .from(operator)
            .into_transaction_request()
    }

    /// Operator vote for a new fee of `token` at `configuration_nonce`.
    pub fn set_erc20_fee_transaction(
        &self,
        operator: Address,
        token: Address,
        fee: U256,
        configuration_nonce: u64,
    ) -> TransactionRequest {
        self.instance
            .setERC20Fee(token, fee, configuration_nonce)
            .from(operator)
            .into_transaction_request()
    }

    pub fn start_transaction(&self, owner: Address, running: bool) -> TransactionRequest {
        self.instance
            .start(running)
            .from(owner)
            .into_transaction_request()
    }

    pub fn set_counterpart_bridge_transaction(
        &self,
        owner: Address,
        bridge: Address,
    ) -> TransactionRequest {
        self.instance
            .setCounterPartBridge(bridge)
            .from(owner)
            .into_transaction_request()
    }

    pub fn register_operator_transaction(
        &self,
        owner: Address,
        operator: Address,
    ) -> TransactionRequest {
        self.instance
            .registerOperator(operator)
            .from(owner)
            .into_transaction_request()
    }

    pub fn deregister_operator_transaction(
        &self,
        owner: Address,
        operator: Address,
    ) -> TransactionRequest {
        self.instance
            .deregisterOperator(operator)
            .from(owner)
            .into_transaction_request()
    }

    pub fn set_operator_threshold_transaction(
        &self,
        owner: Address,
        kind: VoteKind,
        threshold: u64,
    ) -> TransactionRequest {
        self.instance
            .setOperatorThreshold(kind.as_u8(), threshold)
            .from(owner)
            .into_transaction_request()
    }

    pub fn register_token_transaction(
        &self,
        owner: Address,
        token: Address,
        counterpart_token: Address,
    ) -> TransactionRequest {
        self.instance
            .registerToken(token, counterpart_token)
            .from(owner)
            .into_transaction_request()
    }

    pub fn deregister_token_transaction(&self, owner: Address, token: Address) -> TransactionRequest {
        self.instance
            .deregisterToken(token)
            .from(owner)
            .into_transaction_request()
    }

    pub fn set_fee_receiver_transaction(
        &self,
        owner: Address,
        receiver: Address,
    ) -> TransactionRequest {
        self.instance
            .setFeeReceiver(receiver)
            .from(owner)
            .into_transaction_request()
    }

    /// Fetch `RequestValueTransfer` logs emitted in `[from_block, to_block]`.
    pub async fn request_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<(RequestValueTransfer, Log)>> {
        let events = self
            .instance
            .RequestValueTransfer_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await?;

        info!(
            from_block = from_block,
            to_block = to_block,
            count = events.len(),
            contract_address = %self.instance.address(),
            event = "request_events_retrieved"
        );

        Ok(events)
    }

    /// Fetch `HandleValueTransfer` logs emitted in `[from_block, to_block]`.
    pub async fn handle_events(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<(HandleValueTransfer, Log)>> {
        let events = self
            .instance
            .HandleValueTransfer_filter()
            .from_block(from_block)
            .to_block(to_block)
            .query()
            .await?;

        info!(
            from_block = from_block,
            to_block = to_block,
            count = events.len(),
            contract_address = %self.instance.address(),
            event = "handle_events_retrieved"
        );

        Ok(events)
    }
}

sol!(
    #[allow(clippy::too_many_arguments)]
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Bridge {
        event RequestValueTransfer(
            uint8 tokenType,
            address from,
            address to,
            address tokenAddress,
            uint256 valueOrTokenId,
            uint64 requestNonce,
            string uri,
            uint256 fee
        );
        event HandleValueTransfer(
            uint8 tokenType,
            address from,
            address to,
            address tokenAddress,
            uint256 valueOrTokenId,
            uint64 handleNonce
        );
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
        event KLAYFeeChanged(uint256 indexed fee);
        event ERC20FeeChanged(address token, uint256 indexed fee);
        event FeeReceiverChanged(address indexed feeReceiver);

        function VERSION() external view returns (uint64);
        function owner() external view returns (address);
        function isOwner() external view returns (bool);
        function isRunning() external view returns (bool);
        function modeMintBurn() external view returns (bool);
        function counterpartBridge() external view returns (address);
        function requestNonce() external view returns (uint64);
        function sequentialHandledNonce() external view returns (uint64);
        function maxRequestedNonce() external view returns (uint64);
        function lastHandledRequestBlockNumber() external view returns (uint64);
        function configurationNonce() external view returns (uint64);
        function operators(address operator) external view returns (bool);
        function getOperatorList() external view returns (address[]);
        function operatorThresholds(uint8 voteType) external view returns (uint64);
        function allowedTokens(address token) external view returns (address);
        function getRegisteredTokenList() external view returns (address[]);
        function feeOfKLAY() external view returns (uint256);
        function feeOfERC20(address token) external view returns (uint256);
        function feeReceiver() external view returns (address);
        function closedValueTransferVotes(uint64 nonce) external view returns (bool);
        function votedCount(bytes32 actionHash) external view returns (uint64);

        function transferOwnership(address newOwner) external;
        function renounceOwnership() external;
        function start(bool running) external;
        function setCounterPartBridge(address bridge) external;
        function registerOperator(address operator) external;
        function deregisterOperator(address operator) external;
        function setOperatorThreshold(uint8 voteType, uint64 threshold) external;
        function registerToken(address token, address counterpartToken) external;
        function deregisterToken(address token) external;
        function setFeeReceiver(address feeReceiver) external;
        function setKLAYFee(uint256 fee, uint64 requestNonce) external;
        function setERC20Fee(address token, uint256 fee, uint64 requestNonce) external;

        function requestKLAYTransfer(address to, uint256 value) external payable;
        function requestERC20Transfer(address tokenAddress, address to, uint256 value, uint256 feeLimit) external;
        function requestERC721Transfer(address tokenAddress, address to, uint256 tokenId) external;
        function onERC20Received(address from, address to, uint256 value, uint256 feeLimit) external;
        function onERC721Received(address from, uint256 tokenId, address to) external;
        function chargeWithoutEvent() external payable;

        function handleKLAYTransfer(
            address from,
            address to,
            uint256 value,
            uint64 requestNonce,
            uint64 requestBlockNumber
        ) external;
        function handleERC20Transfer(
            address from,
            address to,
            address tokenAddress,
            uint256 value,
            uint64 requestNonce,
            uint64 requestBlockNumber
        ) external;
        function handleERC721Transfer(
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
