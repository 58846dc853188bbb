use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Failure raised by the host chain while the bridge calls out to it.
///
/// These mirror a reverted external call (token transfer, mint, callback).
/// They are never swallowed: the whole bridge transaction reverts with them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: {account} holds {available}, needs {required}")]
    InsufficientBalance {
        account: Address,
        available: U256,
        required: U256,
    },

    #[error("insufficient allowance: {spender} may spend {allowed} of {owner}, needs {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        allowed: U256,
        required: U256,
    },

    #[error("unknown contract: {0}")]
    UnknownContract(Address),

    #[error("token {token_id} of {token} does not exist")]
    NonexistentToken { token: Address, token_id: U256 },

    #[error("token {token_id} of {token} already exists")]
    TokenAlreadyMinted { token: Address, token_id: U256 },

    #[error("{caller} is not owner nor approved for token {token_id}")]
    NotApprovedOrOwner { caller: Address, token_id: U256 },

    #[error("{caller} is not a minter of {token}")]
    NotMinter { caller: Address, token: Address },

    #[error("balance of {account} overflows")]
    BalanceOverflow { account: Address },

    #[error("total supply of {token} overflows")]
    SupplyOverflow { token: Address },

    #[error("call reverted: {reason}")]
    Reverted { reason: String },
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("msg.sender is not the owner")]
    Unauthorized { caller: Address },

    #[error("msg.sender is not an operator")]
    NotOperator { caller: Address },

    #[error("stopped bridge")]
    Stopped,

    #[error("invalid token")]
    InvalidToken { token: Address },

    #[error("nonce mismatch")]
    NonceMismatch { expected: u64, got: u64 },

    #[error("insufficient feeLimit")]
    InsufficientFeeLimit { fee: U256, fee_limit: U256 },

    #[error("zero msg.value")]
    ZeroValue,

    #[error("insufficient msg.value: attached {attached}, requested {requested}")]
    InsufficientValue { attached: U256, requested: U256 },

    #[error("function is not payable")]
    NonPayable,

    #[error("fallback deposits are disabled")]
    FallbackDisabled,

    #[error("new owner is the zero address")]
    ZeroAddress,

    #[error("SafeMath: addition overflow")]
    AmountOverflow { value: U256, fee_limit: U256 },

    #[error("{0} is not supported by this bridge")]
    UnsupportedCall(&'static str),

    #[error("external call failed: {0}")]
    External(#[from] LedgerError),

    #[error("Malformed request event: {0}")]
    InvalidEvent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Contract call failed: {0}")]
    Contract(#[from] alloy_contract::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex conversion error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),
}

impl BridgeError {
    /// The revert string the on-chain contract reports for this failure.
    ///
    /// Binding errors have no on-chain counterpart and return `None`.
    pub fn revert_reason(&self) -> Option<String> {
        match self {
            Self::Unauthorized { .. }
            | Self::NotOperator { .. }
            | Self::Stopped
            | Self::InvalidToken { .. }
            | Self::NonceMismatch { .. }
            | Self::InsufficientFeeLimit { .. }
            | Self::ZeroValue
            | Self::NonPayable
            | Self::FallbackDisabled
            | Self::ZeroAddress
            | Self::AmountOverflow { .. }
            | Self::UnsupportedCall(_) => Some(self.to_string()),
            Self::InsufficientValue { .. } => Some("insufficient msg.value".to_string()),
            Self::External(inner) => Some(inner.to_string()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_reasons_match_contract_strings() {
        assert_eq!(
            BridgeError::Stopped.revert_reason().as_deref(),
            Some("stopped bridge")
        );
        assert_eq!(
            BridgeError::InvalidToken {
                token: Address::ZERO
            }
            .revert_reason()
            .as_deref(),
            Some("invalid token")
        );
        assert_eq!(
            BridgeError::NonceMismatch {
                expected: 1,
                got: 2
            }
            .revert_reason()
            .as_deref(),
            Some("nonce mismatch")
        );
        assert_eq!(
            BridgeError::InsufficientFeeLimit {
                fee: U256::from(2),
                fee_limit: U256::from(1)
            }
            .revert_reason()
            .as_deref(),
            Some("insufficient feeLimit")
        );
    }

    #[test]
    fn amount_overflow_reverts_like_safemath() {
        let err = BridgeError::AmountOverflow {
            value: U256::MAX,
            fee_limit: U256::from(1),
        };
        assert_eq!(
            err.revert_reason().as_deref(),
            Some("SafeMath: addition overflow")
        );
    }

    #[test]
    fn binding_errors_have_no_revert_reason() {
        let err = BridgeError::InvalidConfig("bad".to_string());
        assert!(err.revert_reason().is_none());
    }

    #[test]
    fn ledger_errors_propagate_through_bridge_error() {
        let err: BridgeError = LedgerError::Reverted {
            reason: "callback refused".to_string(),
        }
        .into();
        assert!(matches!(err, BridgeError::External(_)));
        assert_eq!(
            err.revert_reason().as_deref(),
            Some("call reverted: callback refused")
        );
    }
}
