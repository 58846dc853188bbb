//! Alloy-based bridge chain implementation.

use alloy_network::Ethereum;
use alloy_primitives::{Address, TxHash};
use alloy_provider::Provider;
use alloy_rpc_types::{TransactionInput, TransactionRequest};
use async_trait::async_trait;
use tracing::{debug, info, instrument, trace};

use crate::contracts::bridge::BridgeContract;
use crate::error::Result;
use crate::relay::{HandleCall, ObservedRequest};
use crate::traits::BridgeChain;

/// A deployed bridge reached through an Alloy [`Provider`].
///
/// Handle calls are sent with `eth_sendTransaction` from the operator
/// account, so the provider must be able to sign for it (a wallet filler or
/// a node holding the key).
///
/// # Examples
///
/// ```rust,no_run
/// use klay_bridge::AlloyBridgeChain;
/// use alloy_primitives::address;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new().connect("http://localhost:8551").await?;
/// let chain = AlloyBridgeChain::new(address!("1000000000000000000000000000000000000001"), provider);
/// # Ok(())
/// # }
/// ```
pub struct AlloyBridgeChain<P>
where
    P: Provider<Ethereum> + Clone,
{
    contract: BridgeContract<P>,
    provider: P,
}

impl<P> AlloyBridgeChain<P>
where
    P: Provider<Ethereum> + Clone,
{
    pub fn new(bridge: Address, provider: P) -> Self {
        Self {
            contract: BridgeContract::new(bridge, provider.clone()),
            provider,
        }
    }

    /// Typed bindings of the bridge.
    pub fn contract(&self) -> &BridgeContract<P> {
        &self.contract
    }

    /// Returns a reference to the underlying Alloy provider.
    pub fn inner(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> BridgeChain for AlloyBridgeChain<P>
where
    P: Provider<Ethereum> + Clone + Send + Sync,
{
    #[instrument(skip(self))]
    async fn block_number(&self) -> Result<u64> {
        trace!("Fetching current block number");
        let block_number = self.provider.get_block_number().await?;
        debug!(block_number = block_number, event = "block_number_retrieved");
        Ok(block_number)
    }

    async fn request_nonce(&self) -> Result<u64> {
        self.contract.request_nonce().await
    }

    async fn sequential_handled_nonce(&self) -> Result<u64> {
        self.contract.sequential_handled_nonce().await
    }

    async fn last_handled_request_block_number(&self) -> Result<u64> {
        self.contract.last_handled_request_block_number().await
    }

    async fn is_closed(&self, nonce: u64) -> Result<bool> {
        self.contract.is_closed(nonce).await
    }

    async fn counterpart_token(&self, token: Address) -> Result<Address> {
        self.contract.allowed_token(token).await
    }

    async fn request_events(&self, from_block: u64, to_block: u64) -> Result<Vec<ObservedRequest>> {
        self.contract
            .request_events(from_block, to_block)
            .await?
            .into_iter()
            .map(|(event, log)| ObservedRequest::from_rpc_log(event, &log))
            .collect()
    }

    #[instrument(skip(self, call), fields(request_nonce = call.nonce()))]
    async fn submit(&self, operator: Address, call: &HandleCall) -> Result<TxHash> {
        let tx = TransactionRequest::default()
            .from(operator)
            .to(self.contract.address())
            .input(TransactionInput::new(call.calldata()));

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();

        info!(
            operator = %operator,
            token_kind = %call.kind(),
            action_hash = %call.action_hash(),
            tx_hash = %tx_hash,
            event = "handle_transaction_sent"
        );
        Ok(tx_hash)
    }
}
