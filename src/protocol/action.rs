//! Operator-voted actions and their vote keys
//!
//! Every operator vote is cast on one concrete call. The key under which the
//! vote is tallied is the keccak-256 of the call's ABI encoding, that is the
//! 4-byte selector (the kind tag) followed by every argument. Two operators
//! that disagree on any argument therefore vote on different keys.

use alloy_primitives::{keccak256, B256};
use alloy_sol_types::SolCall;

use super::VoteKind;
use crate::contracts::bridge::Bridge::{
    handleERC20TransferCall, handleERC721TransferCall, handleKLAYTransferCall, setERC20FeeCall,
    setKLAYFeeCall,
};
use crate::contracts::ext_bridge::ExtBridge;

/// A call that only takes effect once enough operators submitted it verbatim.
pub trait Action: SolCall {
    /// Threshold class this action is counted against.
    const KIND: VoteKind;

    /// Nonce the action is bound to: the incoming request nonce for value
    /// transfers, the configuration nonce for configuration changes.
    fn nonce(&self) -> u64;

    /// Vote key of this exact call.
    fn action_hash(&self) -> B256 {
        keccak256(self.abi_encode())
    }
}

impl Action for handleKLAYTransferCall {
    const KIND: VoteKind = VoteKind::ValueTransfer;

    fn nonce(&self) -> u64 {
        self.requestNonce
    }
}

impl Action for handleERC20TransferCall {
    const KIND: VoteKind = VoteKind::ValueTransfer;

    fn nonce(&self) -> u64 {
        self.requestNonce
    }
}

impl Action for handleERC721TransferCall {
    const KIND: VoteKind = VoteKind::ValueTransfer;

    fn nonce(&self) -> u64 {
        self.requestNonce
    }
}

impl Action for ExtBridge::handleERC721TransferCall {
    const KIND: VoteKind = VoteKind::ValueTransfer;

    fn nonce(&self) -> u64 {
        self.requestNonce
    }
}

impl Action for setKLAYFeeCall {
    const KIND: VoteKind = VoteKind::Configuration;

    fn nonce(&self) -> u64 {
        self.requestNonce
    }
}

impl Action for setERC20FeeCall {
    const KIND: VoteKind = VoteKind::Configuration;

    fn nonce(&self) -> u64 {
        self.requestNonce
    }
}
