use serde::{Deserialize, Serialize};
use std::fmt;

/// Class of operator vote, each with its own confirmation threshold
///
/// The discriminant is the `uint8 voteType` argument of
/// `setOperatorThreshold` and `operatorThresholds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum VoteKind {
    /// Handling of an incoming value transfer, keyed by request nonce.
    ValueTransfer = 0,
    /// Configuration change, keyed by the configuration nonce.
    Configuration = 1,
}

impl VoteKind {
    pub const ALL: [VoteKind; 2] = [VoteKind::ValueTransfer, VoteKind::Configuration];

    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::ValueTransfer),
            1 => Some(Self::Configuration),
            _ => None,
        }
    }
}

impl TryFrom<u8> for VoteKind {
    type Error = InvalidVoteKind;

    #[inline]
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(InvalidVoteKind(value))
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueTransfer => f.write_str("value_transfer"),
            Self::Configuration => f.write_str("configuration"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidVoteKind(pub u8);

impl fmt::Display for InvalidVoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid vote type: {}", self.0)
    }
}

impl std::error::Error for InvalidVoteKind {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_kind_values() {
        assert_eq!(VoteKind::ValueTransfer.as_u8(), 0);
        assert_eq!(VoteKind::Configuration.as_u8(), 1);
        assert_eq!(VoteKind::try_from(1u8), Ok(VoteKind::Configuration));
        assert_eq!(VoteKind::try_from(2u8), Err(InvalidVoteKind(2)));
    }

    #[test]
    fn test_display() {
        assert_eq!(VoteKind::ValueTransfer.to_string(), "value_transfer");
        assert_eq!(VoteKind::Configuration.to_string(), "configuration");
    }
}
