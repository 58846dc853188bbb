//! Request fees
//!
//! The fee of a request is fixed by operator vote and collected out of the
//! requester's declared fee limit. Collection is off while the fee receiver
//! is the zero address.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;

use crate::error::{BridgeError, Result};

/// Configured fees and their receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeePolicy {
    klay_fee: U256,
    erc20_fees: HashMap<Address, U256>,
    receiver: Address,
}

/// Split of a requester's fee limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSettlement {
    /// Amount sent to the fee receiver.
    pub fee: U256,
    /// Amount returned to the requester.
    pub refund: U256,
}

impl FeePolicy {
    pub fn klay_fee(&self) -> U256 {
        self.klay_fee
    }

    pub fn erc20_fee(&self, token: Address) -> U256 {
        self.erc20_fees.get(&token).copied().unwrap_or_default()
    }

    pub fn receiver(&self) -> Address {
        self.receiver
    }

    pub fn set_klay_fee(&mut self, fee: U256) {
        self.klay_fee = fee;
    }

    pub fn set_erc20_fee(&mut self, token: Address, fee: U256) {
        self.erc20_fees.insert(token, fee);
    }

    pub fn set_receiver(&mut self, receiver: Address) {
        self.receiver = receiver;
    }

    /// Whether requests currently pay anything.
    pub fn is_collecting(&self, fee: U256) -> bool {
        !self.receiver.is_zero() && !fee.is_zero()
    }

    /// Splits `fee_limit` into the collected fee and the refund.
    ///
    /// Fails with `insufficient feeLimit` when collection is on and the limit
    /// is below `fee`.
    pub fn settle(&self, fee: U256, fee_limit: U256) -> Result<FeeSettlement> {
        if !self.is_collecting(fee) {
            return Ok(FeeSettlement {
                fee: U256::ZERO,
                refund: fee_limit,
            });
        }
        if fee_limit < fee {
            return Err(BridgeError::InsufficientFeeLimit { fee, fee_limit });
        }
        Ok(FeeSettlement {
            fee,
            refund: fee_limit - fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use rstest::rstest;

    const RECEIVER: Address = address!("00000000000000000000000000000000000000fe");

    fn collecting(fee: u64) -> FeePolicy {
        let mut policy = FeePolicy::default();
        policy.set_receiver(RECEIVER);
        policy.set_klay_fee(U256::from(fee));
        policy
    }

    #[rstest]
    #[case(2, 5, 2, 3)]
    #[case(2, 2, 2, 0)]
    #[case(0, 5, 0, 5)]
    fn test_settle_with_receiver(
        #[case] fee: u64,
        #[case] limit: u64,
        #[case] charged: u64,
        #[case] refund: u64,
    ) {
        let policy = collecting(fee);
        let settlement = policy.settle(policy.klay_fee(), U256::from(limit)).unwrap();
        assert_eq!(settlement.fee, U256::from(charged));
        assert_eq!(settlement.refund, U256::from(refund));
    }

    #[test]
    fn test_limit_below_fee_is_refused() {
        let policy = collecting(2);
        let err = policy.settle(U256::from(2), U256::from(1)).unwrap_err();
        assert_eq!(err.revert_reason().as_deref(), Some("insufficient feeLimit"));
    }

    #[test]
    fn test_no_receiver_refunds_everything() {
        let mut policy = FeePolicy::default();
        policy.set_erc20_fee(RECEIVER, U256::from(10));
        let settlement = policy.settle(U256::from(10), U256::from(3)).unwrap();
        assert_eq!(settlement.fee, U256::ZERO);
        assert_eq!(settlement.refund, U256::from(3));
        assert_eq!(policy.erc20_fee(RECEIVER), U256::from(10));
        assert_eq!(policy.erc20_fee(Address::ZERO), U256::ZERO);
    }
}
