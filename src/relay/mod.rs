//! Operator relay
//!
//! An operator watches `RequestValueTransfer` logs of one bridge and submits
//! the matching handle call to the counterpart bridge. [`ValueTransferRelay`]
//! does this in passes: fetch a block range of request logs, turn each into a
//! [`HandleCall`], queue it by nonce, submit a batch. Requests that were
//! missed entirely (a relay restarted past them, a submission that never
//! landed) are picked up again by [`ValueTransferRecovery`].

mod config;
mod recovery;

pub use config::RelayConfig;
pub use recovery::{RecoveryHint, ValueTransferRecovery};

use alloy_primitives::{Address, Bytes, TxHash, B256};
use alloy_sol_types::SolCall;
use bon::Builder;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn, Instrument};

use crate::contracts::bridge::Bridge::{
    handleERC20TransferCall, handleERC721TransferCall, handleKLAYTransferCall,
    RequestValueTransfer,
};
use crate::contracts::ext_bridge::ExtBridge;
use crate::error::{BridgeError, Result};
use crate::protocol::{Action, TokenKind};
use crate::spans;
use crate::traits::BridgeChain;

/// A request log together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedRequest {
    pub event: RequestValueTransfer,
    pub block_number: u64,
    pub tx_hash: TxHash,
}

impl ObservedRequest {
    /// Pairs a decoded event with the metadata of its RPC log.
    pub fn from_rpc_log(event: RequestValueTransfer, log: &alloy_rpc_types::Log) -> Result<Self> {
        let block_number = log.block_number.ok_or_else(|| {
            BridgeError::InvalidEvent(format!(
                "request {} has no block number",
                event.requestNonce
            ))
        })?;
        let tx_hash = log.transaction_hash.ok_or_else(|| {
            BridgeError::InvalidEvent(format!(
                "request {} has no transaction hash",
                event.requestNonce
            ))
        })?;
        Ok(Self {
            event,
            block_number,
            tx_hash,
        })
    }

    pub fn nonce(&self) -> u64 {
        self.event.requestNonce
    }
}

/// The handle call an operator submits for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleCall {
    Klay(handleKLAYTransferCall),
    Erc20(handleERC20TransferCall),
    Erc721(handleERC721TransferCall),
    /// 8-argument form of an extended counterpart, carrying the request tx hash.
    Erc721WithCallback(ExtBridge::handleERC721TransferCall),
}

impl HandleCall {
    /// Builds the handle call for `request`.
    ///
    /// `counterpart_token` is the token registered for the request's token on
    /// the origin bridge; it is ignored for native-coin requests.
    pub fn from_request(
        request: &ObservedRequest,
        counterpart_token: Address,
        with_callback: bool,
    ) -> Result<Self> {
        let event = &request.event;
        let kind = TokenKind::try_from(event.tokenType)
            .map_err(|e| BridgeError::InvalidEvent(e.to_string()))?;

        if kind != TokenKind::Klay && counterpart_token.is_zero() {
            return Err(BridgeError::InvalidToken {
                token: event.tokenAddress,
            });
        }

        Ok(match kind {
            TokenKind::Klay => Self::Klay(handleKLAYTransferCall {
                from: event.from,
                to: event.to,
                value: event.valueOrTokenId,
                requestNonce: event.requestNonce,
                requestBlockNumber: request.block_number,
            }),
            TokenKind::Erc20 => Self::Erc20(handleERC20TransferCall {
                from: event.from,
                to: event.to,
                tokenAddress: counterpart_token,
                value: event.valueOrTokenId,
                requestNonce: event.requestNonce,
                requestBlockNumber: request.block_number,
            }),
            TokenKind::Erc721 if with_callback => {
                Self::Erc721WithCallback(ExtBridge::handleERC721TransferCall {
                    requestTxHash: request.tx_hash,
                    from: event.from,
                    to: event.to,
                    tokenAddress: counterpart_token,
                    tokenId: event.valueOrTokenId,
                    requestNonce: event.requestNonce,
                    requestBlockNumber: request.block_number,
                    tokenURI: event.uri.clone(),
                })
            }
            TokenKind::Erc721 => Self::Erc721(handleERC721TransferCall {
                from: event.from,
                to: event.to,
                tokenAddress: counterpart_token,
                tokenId: event.valueOrTokenId,
                requestNonce: event.requestNonce,
                requestBlockNumber: request.block_number,
                tokenURI: event.uri.clone(),
            }),
        })
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Klay(_) => TokenKind::Klay,
            Self::Erc20(_) => TokenKind::Erc20,
            Self::Erc721(_) | Self::Erc721WithCallback(_) => TokenKind::Erc721,
        }
    }

    pub fn nonce(&self) -> u64 {
        match self {
            Self::Klay(call) => call.nonce(),
            Self::Erc20(call) => call.nonce(),
            Self::Erc721(call) => call.nonce(),
            Self::Erc721WithCallback(call) => call.nonce(),
        }
    }

    /// Vote key the counterpart bridge tallies this call under.
    pub fn action_hash(&self) -> B256 {
        match self {
            Self::Klay(call) => call.action_hash(),
            Self::Erc20(call) => call.action_hash(),
            Self::Erc721(call) => call.action_hash(),
            Self::Erc721WithCallback(call) => call.action_hash(),
        }
    }

    /// ABI-encoded calldata, selector included.
    pub fn calldata(&self) -> Bytes {
        match self {
            Self::Klay(call) => call.abi_encode().into(),
            Self::Erc20(call) => call.abi_encode().into(),
            Self::Erc721(call) => call.abi_encode().into(),
            Self::Erc721WithCallback(call) => call.abi_encode().into(),
        }
    }
}

/// What one relay pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    /// Request logs fetched from the source bridge.
    pub observed: usize,
    /// Requests queued by the recovery check.
    pub recovered: usize,
    pub submitted: usize,
    pub failed: usize,
    /// Handle calls still queued after the pass.
    pub pending: usize,
}

/// Relays requests of `source` to `destination` as `operator`.
///
/// # Example
///
/// ```rust,no_run
/// use klay_bridge::{AlloyBridgeChain, RelayConfig, ValueTransferRelay};
/// use alloy_primitives::address;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let parent = ProviderBuilder::new().connect("http://localhost:8551").await?;
/// let child = ProviderBuilder::new().connect("http://localhost:7551").await?;
///
/// let mut relay = ValueTransferRelay::builder()
///     .source(AlloyBridgeChain::new(address!("1000000000000000000000000000000000000001"), parent))
///     .destination(AlloyBridgeChain::new(address!("2000000000000000000000000000000000000002"), child))
///     .operator(address!("3000000000000000000000000000000000000003"))
///     .config(RelayConfig::default())
///     .build();
///
/// relay.run(None).await;
/// # Ok(())
/// # }
/// ```
#[derive(Builder)]
pub struct ValueTransferRelay<S: BridgeChain, D: BridgeChain> {
    source: S,
    destination: D,
    operator: Address,
    #[builder(default)]
    config: RelayConfig,
    /// Submit the 8-argument non-fungible handle of an extended counterpart.
    #[builder(default)]
    with_callback: bool,
    /// First source block to scan.
    #[builder(default)]
    start_block: u64,
    #[builder(skip)]
    pending: BTreeMap<u64, HandleCall>,
    #[builder(skip)]
    recovery: ValueTransferRecovery,
    #[builder(skip)]
    last_recovery_block: Option<u64>,
}

impl<S: BridgeChain, D: BridgeChain> ValueTransferRelay<S, D> {
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    /// Next source block a pass will scan from.
    pub fn next_block(&self) -> u64 {
        self.start_block
    }

    /// Nonces queued for submission, in submission order.
    pub fn pending_nonces(&self) -> Vec<u64> {
        self.pending.keys().copied().collect()
    }

    pub fn recovery_hint(&self) -> Option<RecoveryHint> {
        self.recovery.hint()
    }

    /// Queues the handle call for `request`.
    ///
    /// Returns `false` when the request is already queued, already finalized
    /// on the destination, or cannot be turned into a handle call.
    pub async fn enqueue(&mut self, request: ObservedRequest) -> Result<bool> {
        let nonce = request.nonce();
        if self.pending.contains_key(&nonce) {
            return Ok(false);
        }
        if self.destination.is_closed(nonce).await? {
            debug!(request_nonce = nonce, event = "request_already_handled");
            return Ok(false);
        }

        let counterpart = if request.event.tokenType == TokenKind::Klay.as_u8() {
            Address::ZERO
        } else {
            self.source
                .counterpart_token(request.event.tokenAddress)
                .await?
        };

        match HandleCall::from_request(&request, counterpart, self.with_callback) {
            Ok(call) => {
                debug!(
                    request_nonce = nonce,
                    token_kind = %call.kind(),
                    tx_hash = %request.tx_hash,
                    event = "handle_call_queued"
                );
                self.pending.insert(nonce, call);
                Ok(true)
            }
            Err(err) => {
                warn!(
                    request_nonce = nonce,
                    token = %request.event.tokenAddress,
                    error = %err,
                    event = "request_not_relayable"
                );
                Ok(false)
            }
        }
    }

    /// Runs one relay pass: scan, recover if due, submit.
    pub async fn poll(&mut self) -> Result<RelayReport> {
        let head = self.source.block_number().await?;
        let to_block = head.min(
            self.start_block
                .saturating_add(self.config.max_block_range.saturating_sub(1)),
        );
        let span = spans::relay(self.operator, self.start_block, to_block);

        let result = self.poll_range(head, to_block).instrument(span.clone()).await;
        if let Err(ref err) = result {
            let _guard = span.enter();
            spans::record_error(err);
            error!(error = %err, event = "relay_pass_failed");
        }
        result
    }

    async fn poll_range(&mut self, head: u64, to_block: u64) -> Result<RelayReport> {
        let mut report = RelayReport::default();

        if self.start_block <= head {
            let observed = self
                .source
                .request_events(self.start_block, to_block)
                .await?;
            report.observed = observed.len();

            let mut next_block = to_block + 1;
            for request in observed {
                if self.pending.len() >= self.config.max_pending_events
                    && !self.pending.contains_key(&request.nonce())
                {
                    warn!(
                        pending = self.pending.len(),
                        resume_block = request.block_number,
                        event = "pending_queue_full"
                    );
                    next_block = request.block_number;
                    break;
                }
                self.enqueue(request).await?;
            }
            self.start_block = next_block;
        }

        report.recovered = self.recover_if_due(head).await?;

        let (submitted, failed) = self.flush().await;
        report.submitted = submitted;
        report.failed = failed;
        report.pending = self.pending.len();

        let span = tracing::Span::current();
        span.record("events", report.observed);
        span.record("submitted", report.submitted);

        info!(
            observed = report.observed,
            recovered = report.recovered,
            submitted = report.submitted,
            failed = report.failed,
            pending = report.pending,
            next_block = self.start_block,
            event = "relay_pass_completed"
        );
        Ok(report)
    }

    async fn recover_if_due(&mut self, head: u64) -> Result<usize> {
        if !self.config.recovery_enabled() {
            return Ok(0);
        }
        if let Some(last) = self.last_recovery_block {
            if head < last.saturating_add(self.config.recovery_interval_blocks) {
                return Ok(0);
            }
        }
        self.last_recovery_block = Some(head);

        let missed = self
            .recovery
            .recover(&self.source, &self.destination)
            .await?;
        let mut queued = 0;
        for request in missed {
            if self.enqueue(request).await? {
                queued += 1;
            }
        }
        Ok(queued)
    }

    /// Submits up to `batch_size` queued calls in nonce order.
    ///
    /// A call stays queued when its submission fails and is retried on the
    /// next pass.
    async fn flush(&mut self) -> (usize, usize) {
        let nonces: Vec<u64> = self
            .pending
            .keys()
            .take(self.config.batch_size)
            .copied()
            .collect();

        let mut submitted = 0;
        let mut failed = 0;
        for nonce in nonces {
            let Some(call) = self.pending.get(&nonce) else {
                continue;
            };
            let span = spans::relay_submit(call.kind(), nonce);
            let result = self
                .destination
                .submit(self.operator, call)
                .instrument(span)
                .await;

            match result {
                Ok(tx_hash) => {
                    info!(
                        request_nonce = nonce,
                        tx_hash = %tx_hash,
                        event = "handle_call_submitted"
                    );
                    self.pending.remove(&nonce);
                    submitted += 1;
                }
                Err(err) => {
                    error!(
                        request_nonce = nonce,
                        error = %err,
                        event = "handle_call_failed"
                    );
                    failed += 1;
                }
            }
        }
        (submitted, failed)
    }

    /// Relays continuously, sleeping `poll_interval` between passes.
    ///
    /// A failed pass is logged and retried on the next tick. With
    /// `max_passes` set, returns after that many passes.
    pub async fn run(&mut self, max_passes: Option<u64>) {
        let mut passes = 0u64;
        loop {
            if let Ok(report) = self.poll().await {
                debug!(pending = report.pending, event = "relay_tick");
            }
            passes += 1;
            if max_passes.is_some_and(|max| passes >= max) {
                return;
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, U256};
    use rstest::rstest;

    const USER: Address = address!("00000000000000000000000000000000000000bb");
    const TOKEN: Address = address!("000000000000000000000000000000000000e20a");
    const COUNTERPART: Address = address!("000000000000000000000000000000000000e20b");
    const TX: TxHash = b256!("2222222222222222222222222222222222222222222222222222222222222222");

    fn observed(token_type: u8, token: Address) -> ObservedRequest {
        ObservedRequest {
            event: RequestValueTransfer {
                tokenType: token_type,
                from: USER,
                to: USER,
                tokenAddress: token,
                valueOrTokenId: U256::from(5),
                requestNonce: 3,
                uri: "ipfs://five".to_string(),
                fee: U256::ZERO,
            },
            block_number: 40,
            tx_hash: TX,
        }
    }

    #[test]
    fn test_klay_request_ignores_counterpart() {
        let call = HandleCall::from_request(&observed(0, Address::ZERO), Address::ZERO, true).unwrap();

        assert_eq!(call.kind(), TokenKind::Klay);
        assert_eq!(call.nonce(), 3);
        let HandleCall::Klay(handle) = &call else {
            panic!("expected a klay handle, got {call:?}");
        };
        assert_eq!(handle.requestBlockNumber, 40);
        assert_eq!(handle.value, U256::from(5));
        assert_eq!(&call.calldata()[..4], handleKLAYTransferCall::SELECTOR.as_slice());
    }

    #[rstest]
    #[case::erc20(1)]
    #[case::erc721(2)]
    fn test_token_request_needs_counterpart(#[case] token_type: u8) {
        let err = HandleCall::from_request(&observed(token_type, TOKEN), Address::ZERO, false)
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidToken { token } if token == TOKEN));
    }

    #[test]
    fn test_unknown_token_type_is_invalid_event() {
        let err = HandleCall::from_request(&observed(7, TOKEN), COUNTERPART, false).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidEvent(_)));
    }

    #[test]
    fn test_erc721_arity_follows_callback_flag() {
        let request = observed(2, TOKEN);

        let short = HandleCall::from_request(&request, COUNTERPART, false).unwrap();
        assert!(matches!(&short, HandleCall::Erc721(h) if h.tokenAddress == COUNTERPART));

        let long = HandleCall::from_request(&request, COUNTERPART, true).unwrap();
        let HandleCall::Erc721WithCallback(handle) = &long else {
            panic!("expected the callback handle, got {long:?}");
        };
        assert_eq!(handle.requestTxHash, TX);
        assert_eq!(handle.tokenURI, "ipfs://five");
        assert_eq!(long.kind(), TokenKind::Erc721);
        assert_ne!(short.action_hash(), long.action_hash());
    }
}
