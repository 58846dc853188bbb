//! OpenTelemetry span helpers for bridge operations
//!
//! Every public bridge entry point and every relay pass opens one of these
//! spans. Span names are static; the varying parts are structured attributes.
//! When a transaction reverts, [`record_error`] fills in the `error.*` fields
//! and flips `otel.status_code`.
//!
//! # Example
//!
//! ```rust,no_run
//! use klay_bridge::spans;
//! use alloy_primitives::Address;
//!
//! let span = spans::admin("start", Address::ZERO);
//! let _guard = span.enter();
//! // Your custom admin logic here
//! ```

use alloy_primitives::{Address, B256, U256};
use tracing::Span;

use crate::protocol::{TokenKind, VoteKind};

/// Create span for a user request on the outgoing side.
///
/// Children: ledger calls performed by the request
#[inline]
pub fn request_value_transfer(kind: TokenKind, from: Address, to: Address, value: U256) -> Span {
    tracing::info_span!(
        "klay_bridge.request_value_transfer",
        token_kind = %kind,
        from = %from,
        to = %to,
        value_or_token_id = %value,
        request_nonce = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for an operator handle on the incoming side.
///
/// Children: klay_bridge.vote
#[inline]
pub fn handle_value_transfer(kind: TokenKind, operator: Address, request_nonce: u64) -> Span {
    tracing::info_span!(
        "klay_bridge.handle_value_transfer",
        token_kind = %kind,
        operator = %operator,
        request_nonce = request_nonce,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for a single operator vote.
///
/// Parent: klay_bridge.handle_value_transfer or klay_bridge.configuration
#[inline]
pub fn vote(kind: VoteKind, operator: Address, action_hash: &B256, nonce: u64) -> Span {
    tracing::debug_span!(
        "klay_bridge.vote",
        vote_kind = %kind,
        operator = %operator,
        action_hash = %action_hash,
        nonce = nonce,
        vote_count = tracing::field::Empty,
    )
}

/// Create span for an operator-voted configuration change.
#[inline]
pub fn configuration(action: &'static str, operator: Address, configuration_nonce: u64) -> Span {
    tracing::info_span!(
        "klay_bridge.configuration",
        action = action,
        operator = %operator,
        configuration_nonce = configuration_nonce,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for an owner-only administrative call.
#[inline]
pub fn admin(action: &'static str, caller: Address) -> Span {
    tracing::info_span!(
        "klay_bridge.admin",
        action = action,
        caller = %caller,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for one relay pass over a block range.
///
/// Children: klay_bridge.relay.submit (one per handle call)
#[inline]
pub fn relay(operator: Address, from_block: u64, to_block: u64) -> Span {
    tracing::info_span!(
        "klay_bridge.relay",
        operator = %operator,
        from_block = from_block,
        to_block = to_block,
        events = tracing::field::Empty,
        submitted = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.source = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for submitting one handle call to the counterpart bridge.
#[inline]
pub fn relay_submit(kind: TokenKind, request_nonce: u64) -> Span {
    tracing::debug_span!(
        "klay_bridge.relay.submit",
        token_kind = %kind,
        request_nonce = request_nonce,
    )
}

/// Create span for a value-transfer recovery check.
#[inline]
pub fn recovery(request_nonce: u64, handle_nonce: u64) -> Span {
    tracing::info_span!(
        "klay_bridge.recovery",
        request_nonce = request_nonce,
        handle_nonce = handle_nonce,
        unhandled = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Record error attributes on the current span.
///
/// Follows OpenTelemetry semantic conventions:
/// - error.type: the error variant, taken from the message prefix
/// - error.message: human-readable error message
/// - error.source: the wrapped error, if any
pub fn record_error<E: std::error::Error>(error: &E) {
    let current_span = tracing::Span::current();
    let message = error.to_string();
    current_span.record(
        "error.type",
        message.split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", message.as_str());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.source", source.to_string());
    }
}
