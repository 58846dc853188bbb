//! Asset class carried by a value transfer
//!
//! Both bridge events encode the asset class as the `uint8 tokenType` field.
//! This module gives that byte a strongly-typed form so that relays and
//! handlers cannot confuse a token id with an amount.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset class of a value transfer
///
/// # Example
///
/// ```rust
/// use klay_bridge::TokenKind;
///
/// assert_eq!(TokenKind::Erc20.as_u8(), 1);
/// assert_eq!(TokenKind::try_from(2u8), Ok(TokenKind::Erc721));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TokenKind {
    /// Native coin of the chain (`tokenType = 0`)
    Klay = 0,
    /// Fungible token (`tokenType = 1`)
    Erc20 = 1,
    /// Non-fungible token (`tokenType = 2`)
    Erc721 = 2,
}

impl TokenKind {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Klay),
            1 => Some(Self::Erc20),
            2 => Some(Self::Erc721),
            _ => None,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Klay => "KLAY",
            Self::Erc20 => "ERC20",
            Self::Erc721 => "ERC721",
        }
    }

    /// Whether `valueOrTokenId` is a token id rather than an amount.
    #[inline]
    pub const fn is_non_fungible(self) -> bool {
        matches!(self, Self::Erc721)
    }
}

impl From<TokenKind> for u8 {
    #[inline]
    fn from(kind: TokenKind) -> Self {
        kind.as_u8()
    }
}

impl TryFrom<u8> for TokenKind {
    type Error = InvalidTokenKind;

    #[inline]
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(InvalidTokenKind(value))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u8())
    }
}

/// Error returned when a `tokenType` byte names no known asset class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTokenKind(pub u8);

impl fmt::Display for InvalidTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid token type: {}", self.0)
    }
}

impl std::error::Error for InvalidTokenKind {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, TokenKind::Klay)]
    #[case(1, TokenKind::Erc20)]
    #[case(2, TokenKind::Erc721)]
    fn test_wire_values(#[case] raw: u8, #[case] kind: TokenKind) {
        assert_eq!(kind.as_u8(), raw);
        assert_eq!(TokenKind::try_from(raw), Ok(kind));
    }

    #[test]
    fn test_unknown_token_type() {
        assert_eq!(TokenKind::try_from(3u8), Err(InvalidTokenKind(3)));
        assert_eq!(
            InvalidTokenKind(255).to_string(),
            "invalid token type: 255"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::Klay.to_string(), "KLAY (0)");
        assert_eq!(TokenKind::Erc721.to_string(), "ERC721 (2)");
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&TokenKind::Erc20).unwrap();
        assert_eq!(json, "\"erc20\"");
        let kind: TokenKind = serde_json::from_str("\"klay\"").unwrap();
        assert_eq!(kind, TokenKind::Klay);
    }
}
