//! Production implementations of the crate's trait abstractions.
//!
//! [`AlloyBridgeChain`] serves a deployed bridge to a relay over JSON-RPC.
//! Test code uses [`crate::testing::LocalChain`] instead.

mod alloy;

pub use self::alloy::AlloyBridgeChain;
