use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Construction-time settings of a bridge instance.
///
/// All fields are fixed for the lifetime of the instance.
///
/// # Examples
///
/// ```rust
/// use klay_bridge::BridgeSettings;
///
/// // Lock-and-release bridge without callback, refusing bare coin deposits
/// let settings = BridgeSettings::default();
/// assert!(!settings.mode_mint_burn);
///
/// let settings = BridgeSettings::builder()
///     .mode_mint_burn(true)
///     .callback_enabled(true)
///     .build();
/// assert!(settings.callback_enabled);
/// ```
#[derive(Builder, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeSettings {
    /// Burn deposits and mint deliveries instead of locking and releasing.
    #[builder(default)]
    pub mode_mint_burn: bool,
    /// Treat plain native-coin transfers to the bridge as self-addressed
    /// requests. Off unless explicitly opted in.
    #[builder(default)]
    pub accept_fallback_deposits: bool,
    /// Extended variant: `setCallback` and the 8-argument non-fungible handle.
    #[builder(default)]
    pub callback_enabled: bool,
}

impl BridgeSettings {
    /// Lock-and-release settings, the default.
    pub fn lock_release() -> Self {
        Self::default()
    }

    /// Mint-and-burn settings.
    pub fn mint_burn() -> Self {
        Self {
            mode_mint_burn: true,
            ..Self::default()
        }
    }

    pub fn with_fallback_deposits(mut self, accept: bool) -> Self {
        self.accept_fallback_deposits = accept;
        self
    }

    pub fn with_callback(mut self, enabled: bool) -> Self {
        self.callback_enabled = enabled;
        self
    }

    /// Parses settings from JSON, missing fields taking their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
