use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of an operator relay.
///
/// # Examples
///
/// ```rust
/// use klay_bridge::RelayConfig;
///
/// // Use defaults (1 second polls, 100 submissions per pass)
/// let config = RelayConfig::default();
///
/// // Customize
/// let config = RelayConfig::default()
///     .with_batch_size(10)
///     .with_recovery_interval_blocks(60);
/// assert_eq!(config.batch_size, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Upper bound on queued, not yet submitted handle calls.
    pub max_pending_events: usize,
    /// Handle calls submitted per relay pass.
    pub batch_size: usize,
    /// Widest block range fetched by one log query.
    pub max_block_range: u64,
    /// Seconds between relay passes when running continuously.
    pub poll_interval_secs: u64,
    /// Blocks between two recovery checks; zero disables recovery.
    pub recovery_interval_blocks: u64,
}

impl Default for RelayConfig {
    /// - `max_pending_events`: 1000
    /// - `batch_size`: 100
    /// - `max_block_range`: 1000
    /// - `poll_interval_secs`: 1
    /// - `recovery_interval_blocks`: 300
    fn default() -> Self {
        Self {
            max_pending_events: 1000,
            batch_size: 100,
            max_block_range: 1000,
            poll_interval_secs: 1,
            recovery_interval_blocks: 300,
        }
    }
}

impl RelayConfig {
    /// Preset for a chain with one-second blocks and bursty traffic.
    pub fn high_throughput() -> Self {
        Self {
            max_pending_events: 10_000,
            batch_size: 500,
            ..Self::default()
        }
    }

    pub fn with_max_pending_events(mut self, max: usize) -> Self {
        self.max_pending_events = max;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_max_block_range(mut self, blocks: u64) -> Self {
        self.max_block_range = blocks;
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    pub fn with_recovery_interval_blocks(mut self, blocks: u64) -> Self {
        self.recovery_interval_blocks = blocks;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn recovery_enabled(&self) -> bool {
        self.recovery_interval_blocks > 0
    }
}
