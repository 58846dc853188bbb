//! Bridge contract bindings
//!
//! This module contains Alloy-generated contract bindings for the on-chain
//! value-transfer bridge and the token contracts it moves.
//!
//! ## Public API
//!
//! Contract wrappers provide type-safe, instrumented interfaces:
//!
//! - [`BridgeContract`](bridge::BridgeContract): views, requests, handles, admin and fee votes
//! - [`ExtBridgeContract`](ext_bridge::ExtBridgeContract): callback-enabled bridge
//! - [`Erc20Contract`](erc20::Erc20Contract), [`Erc721Contract`](erc721::Erc721Contract): approvals and push deposits

pub mod bridge;
pub mod erc20;
pub mod erc721;
pub mod ext_bridge;
