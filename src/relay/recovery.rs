//! Value-transfer recovery
//!
//! Compares how far the source bridge has requested with how far the
//! destination bridge has handled. A gap alone is normal (requests in
//! flight); a gap that did not shrink over a whole recovery interval, seen on
//! two consecutive checks, means requests were lost and have to be relayed
//! again.

use tracing::{debug, warn, Instrument};

use super::ObservedRequest;
use crate::error::Result;
use crate::spans;
use crate::traits::BridgeChain;

/// State carried between two recovery checks of one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryHint {
    /// Source block to search request logs from.
    pub block_number: u64,
    /// Source bridge's next request nonce.
    pub request_nonce: u64,
    /// Destination bridge's sequential handled nonce.
    pub handle_nonce: u64,
    /// `handle_nonce` at the previous check.
    pub prev_handle_nonce: u64,
    /// Set after one stalled check; a second stalled check triggers recovery.
    pub candidate: bool,
}

impl RecoveryHint {
    /// The hint following `prev`. Without a previous hint the destination is
    /// treated as already stalled once, so a gap found at startup is
    /// recovered immediately.
    pub fn next(
        prev: Option<&RecoveryHint>,
        block_number: u64,
        request_nonce: u64,
        handle_nonce: u64,
    ) -> Self {
        let (prev_handle_nonce, candidate) = match prev {
            Some(prev) => (prev.handle_nonce, prev.candidate),
            None => (handle_nonce, true),
        };
        Self {
            block_number,
            request_nonce,
            handle_nonce,
            prev_handle_nonce,
            candidate,
        }
    }

    /// Every request has been handled.
    pub fn is_settled(&self) -> bool {
        self.request_nonce == self.handle_nonce
    }

    /// Requests are outstanding and the destination made no progress.
    pub fn is_stalled(&self) -> bool {
        !self.is_settled() && self.prev_handle_nonce == self.handle_nonce
    }

    /// Decides whether to recover now, updating `candidate`.
    ///
    /// | check | request | handle | result |
    /// |-------|---------|--------|--------|
    /// | 1     | 10      | 10     | no     |
    /// | 2     | 1000    | 10     | no, candidate (a burst may be in flight) |
    /// | 3     | 2000    | 10     | yes    |
    pub fn should_recover(&mut self) -> bool {
        if !self.is_stalled() {
            self.candidate = false;
            return false;
        }
        if self.candidate {
            self.candidate = false;
            return true;
        }
        self.candidate = true;
        false
    }

    /// Nonces the destination has not closed in sequence.
    pub fn unhandled_nonces(&self) -> std::ops::Range<u64> {
        self.handle_nonce..self.request_nonce.max(self.handle_nonce)
    }
}

/// Recovery check for one direction of a bridge pair.
///
/// Logs are searched from the destination's last handled request block. A
/// request older than that block which never finalized is not found here;
/// only a relay scanning its block picks it up.
#[derive(Debug, Clone, Default)]
pub struct ValueTransferRecovery {
    hint: Option<RecoveryHint>,
}

impl ValueTransferRecovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hint(&self) -> Option<RecoveryHint> {
        self.hint
    }

    /// Refreshes the hint from both bridges.
    pub async fn update_hint<S, D>(&mut self, source: &S, destination: &D) -> Result<RecoveryHint>
    where
        S: BridgeChain + ?Sized,
        D: BridgeChain + ?Sized,
    {
        let block_number = destination.last_handled_request_block_number().await?;
        let request_nonce = source.request_nonce().await?;
        let handle_nonce = destination.sequential_handled_nonce().await?;

        let hint = RecoveryHint::next(self.hint.as_ref(), block_number, request_nonce, handle_nonce);
        debug!(
            request_nonce = hint.request_nonce,
            handle_nonce = hint.handle_nonce,
            prev_handle_nonce = hint.prev_handle_nonce,
            candidate = hint.candidate,
            event = "recovery_hint_updated"
        );
        self.hint = Some(hint);
        Ok(hint)
    }

    /// Request logs that have to be relayed again, if recovery is due.
    pub async fn pending_events<S, D>(
        &mut self,
        source: &S,
        destination: &D,
    ) -> Result<Vec<ObservedRequest>>
    where
        S: BridgeChain + ?Sized,
        D: BridgeChain + ?Sized,
    {
        let Some(hint) = self.hint.as_mut() else {
            return Ok(Vec::new());
        };
        if hint.is_settled() || !hint.should_recover() {
            return Ok(Vec::new());
        }
        let hint = *hint;

        let head = source.block_number().await?;
        let mut pending = Vec::new();
        for request in source.request_events(hint.block_number, head).await? {
            if request.nonce() < hint.handle_nonce {
                continue;
            }
            if destination.is_closed(request.nonce()).await? {
                continue;
            }
            pending.push(request);
        }
        Ok(pending)
    }

    /// Updates the hint and returns the requests to relay again.
    pub async fn recover<S, D>(&mut self, source: &S, destination: &D) -> Result<Vec<ObservedRequest>>
    where
        S: BridgeChain + ?Sized,
        D: BridgeChain + ?Sized,
    {
        let hint = self.update_hint(source, destination).await?;
        let span = spans::recovery(hint.request_nonce, hint.handle_nonce);

        let pending = self
            .pending_events(source, destination)
            .instrument(span.clone())
            .await?;
        span.record("unhandled", pending.len());

        if !pending.is_empty() {
            warn!(
                parent: &span,
                events = pending.len(),
                first_nonce = pending.first().map(ObservedRequest::nonce),
                event = "recovering_request_events"
            );
        }
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_hint_is_candidate() {
        let hint = RecoveryHint::next(None, 0, 5, 2);
        assert_eq!(hint.prev_handle_nonce, 2);
        assert!(hint.candidate);
        assert!(hint.is_stalled());
        assert_eq!(hint.unhandled_nonces(), 2..5);
    }

    #[test]
    fn test_burst_needs_two_stalled_checks() {
        let mut first = RecoveryHint::next(None, 0, 10, 10);
        assert!(first.is_settled());
        assert!(!first.should_recover());

        let mut second = RecoveryHint::next(Some(&first), 0, 1000, 10);
        assert!(!second.should_recover());
        assert!(second.candidate);

        let mut third = RecoveryHint::next(Some(&second), 0, 2000, 10);
        assert!(third.should_recover());
        assert!(!third.candidate);
    }

    #[test]
    fn test_progress_resets_candidate() {
        let prev = RecoveryHint {
            block_number: 0,
            request_nonce: 10,
            handle_nonce: 4,
            prev_handle_nonce: 4,
            candidate: true,
        };
        let mut hint = RecoveryHint::next(Some(&prev), 0, 12, 8);
        assert!(!hint.should_recover());
        assert!(!hint.candidate);
    }
}
