// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! ERC20 contract bindings for bridge deposits
//!
//! A fungible request pulls `value + feeLimit` from the requester, so the
//! bridge has to be approved for that amount first. Bridge-aware service-chain
//! tokens can instead push themselves to the bridge through
//! `requestValueTransfer`, which ends in the bridge's `onERC20Received`.

use alloy_network::Ethereum;
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::sol;
use tracing::{debug, info};

use crate::error::Result;
use Erc20::Erc20Instance;

/// ERC20 contract wrapper for approval and deposit operations
///
/// # Example
///
/// ```rust,no_run
/// use klay_bridge::Erc20Contract;
/// use alloy_primitives::{address, U256};
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new().connect("http://localhost:8551").await?;
/// let token = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
/// let bridge = address!("0987654321098765432109876543210987654321");
/// let owner = address!("1234567890123456789012345678901234567890");
///
/// let erc20 = Erc20Contract::new(token, provider);
/// let needed = U256::from(105u64); // value + feeLimit
/// if erc20.allowance(owner, bridge).await? < needed {
///     let tx = erc20.approve_transaction(owner, bridge, needed);
///     // Send transaction...
/// }
/// # Ok(())
/// # }
/// ```
pub struct Erc20Contract<P: Provider<Ethereum>> {
    instance: Erc20Instance<P>,
}

impl<P: Provider<Ethereum>> Erc20Contract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "erc20_contract_initialized"
        );
        Self {
            instance: Erc20Instance::new(address, provider),
        }
    }

    /// Amount of tokens `spender` may still pull from `owner`.
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let result = self.instance.allowance(owner, spender).call().await?;

        debug!(
            owner = %owner,
            spender = %spender,
            allowance = %result,
            contract_address = %self.instance.address(),
            event = "allowance_retrieved"
        );

        Ok(result)
    }

    /// Create a transaction request approving `spender` for `amount`.
    ///
    /// The caller is responsible for signing and sending the transaction.
    pub fn approve_transaction(
        &self,
        from: Address,
        spender: Address,
        amount: U256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            spender = %spender,
            amount = %amount,
            contract_address = %self.instance.address(),
            event = "approve_transaction_created"
        );

        self.instance
            .approve(spender, amount)
            .from(from)
            .into_transaction_request()
    }

    /// Create a push-style deposit: the token moves `amount + fee_limit` to
    /// its bridge and notifies it through `onERC20Received`.
    pub fn request_value_transfer_transaction(
        &self,
        from: Address,
        to: Address,
        amount: U256,
        fee_limit: U256,
    ) -> TransactionRequest {
        info!(
            from = %from,
            to = %to,
            amount = %amount,
            fee_limit = %fee_limit,
            contract_address = %self.instance.address(),
            event = "token_request_value_transfer_transaction_created"
        );

        self.instance
            .requestValueTransfer(amount, to, fee_limit)
            .from(from)
            .into_transaction_request()
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        let result = self.instance.balanceOf(account).call().await?;

        debug!(
            account = %account,
            balance = %result,
            contract_address = %self.instance.address(),
            event = "balance_retrieved"
        );

        Ok(result)
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

sol!(
    #[allow(missing_docs)]
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function mint(address to, uint256 amount) external returns (bool);
        function burn(uint256 amount) external;
        function requestValueTransfer(uint256 amount, address to, uint256 feeLimit) external;
    }
);
