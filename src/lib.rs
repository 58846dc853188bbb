//! # klay-bridge
//!
//! Value-transfer bridge protocol for Klaytn-family chains, with typed
//! bindings for the deployed bridge contracts.
//!
//! A bridge pair moves native coin, fungible tokens and non-fungible items
//! between two chains. A user deposits on one side ("request"); a set of
//! operators watches the request logs and votes on the other side
//! ("handle"); once a threshold of operators has voted for the same
//! delivery, the counterpart bridge releases or mints the value.
//!
//! ## Quick Start
//!
//! ```rust
//! use klay_bridge::testing::InMemoryLedger;
//! use klay_bridge::traits::Ledger;
//! use klay_bridge::{Bridge, Tx, VoteKind, VoteOutcome};
//! use klay_bridge::contracts::bridge::Bridge::handleKLAYTransferCall;
//! use alloy_primitives::{address, U256};
//!
//! # fn example() -> klay_bridge::Result<()> {
//! let owner = address!("00000000000000000000000000000000000000aa");
//! let operator = address!("00000000000000000000000000000000000000cc");
//! let user = address!("00000000000000000000000000000000000000bb");
//!
//! let mut ledger = InMemoryLedger::new();
//! ledger.set_balance(owner, U256::from(1_000));
//!
//! // Counterpart side, funded at deployment
//! let mut bridge = Bridge::builder()
//!     .address(address!("00000000000000000000000000000000000000b2"))
//!     .owner(owner)
//!     .ledger(ledger)
//!     .charge(U256::from(1_000))
//!     .build()?;
//! bridge.register_operator(Tx::new(owner), operator)?;
//! bridge.set_operator_threshold(Tx::new(owner), VoteKind::ValueTransfer, 1)?;
//!
//! let receipt = bridge.handle_klay_transfer(
//!     Tx::new(operator),
//!     &handleKLAYTransferCall {
//!         from: user,
//!         to: user,
//!         value: U256::from(100),
//!         requestNonce: 0,
//!         requestBlockNumber: 1,
//!     },
//! )?;
//! assert!(receipt.output.is_finalized());
//! assert_eq!(bridge.ledger().balance(user), U256::from(100));
//! # Ok(())
//! # }
//! ```
//!
//! ## Relaying
//!
//! An operator runs a [`ValueTransferRelay`] per direction. Over a live node
//! each side is an [`AlloyBridgeChain`]:
//!
//! ```rust,no_run
//! use klay_bridge::{AlloyBridgeChain, RelayConfig, ValueTransferRelay};
//! use alloy_primitives::address;
//! use alloy_provider::ProviderBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let parent = ProviderBuilder::new().connect("http://localhost:8551").await?;
//! let child = ProviderBuilder::new().connect("http://localhost:7551").await?;
//!
//! let mut relay = ValueTransferRelay::builder()
//!     .source(AlloyBridgeChain::new(address!("1000000000000000000000000000000000000001"), parent))
//!     .destination(AlloyBridgeChain::new(address!("2000000000000000000000000000000000000002"), child))
//!     .operator(address!("3000000000000000000000000000000000000003"))
//!     .config(RelayConfig::high_throughput())
//!     .build();
//! let report = relay.poll().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Public API
//!
//! - [`Bridge`] - one side of a bridge pair, executing against a [`traits::Ledger`]
//! - [`BridgeSettings`] - deployment-time settings (mint-burn mode, fallback deposits, callback)
//! - [`ValueTransferRelay`] and [`ValueTransferRecovery`] - operator-side relaying
//! - [`BridgeError`] and [`Result`] - Error types for error handling
//! - Contract wrappers for direct contract interaction:
//!   [`BridgeContract`], [`ExtBridgeContract`], [`Erc20Contract`], [`Erc721Contract`]

mod bridge;
pub mod contracts;
mod error;
pub mod protocol;
pub mod providers;
pub mod relay;
pub mod testing;
pub mod traits;

pub use bridge::{
    Bridge, BridgeSettings, FeePolicy, FeeSettlement, OperatorRegistry, Receipt, TokenRegistry,
    Tx, VoteBook, VoteOutcome, VERSION,
};
pub use contracts::{
    bridge::BridgeContract, erc20::Erc20Contract, erc721::Erc721Contract,
    ext_bridge::ExtBridgeContract,
};
pub use error::{BridgeError, LedgerError, Result};
pub use protocol::{Action, BridgeEvent, InvalidTokenKind, InvalidVoteKind, TokenKind, VoteKind};
pub use providers::AlloyBridgeChain;
pub use relay::{
    HandleCall, ObservedRequest, RecoveryHint, RelayConfig, RelayReport, ValueTransferRecovery,
    ValueTransferRelay,
};

// Public module for advanced users who need custom instrumentation
pub mod spans;
