//! Two in-process bridges and two operator relays
//!
//! A user locks native coin on the parent bridge; each operator relays the
//! request to the child bridge, which releases it once both votes are in.
//!
//! Run with tracing enabled:
//! ```bash
//! RUST_LOG=klay_bridge=debug cargo run --example local_relay
//! ```

use alloy_primitives::{address, Address, U256};
use klay_bridge::testing::{InMemoryLedger, LocalChain};
use klay_bridge::traits::{BridgeChain, Ledger};
use klay_bridge::{Bridge, BridgeError, BridgeSettings, RelayConfig, Tx, ValueTransferRelay, VoteKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const OWNER: Address = address!("00000000000000000000000000000000000000aa");
const USER: Address = address!("00000000000000000000000000000000000000bb");
const OPERATORS: [Address; 2] = [
    address!("0000000000000000000000000000000000000a01"),
    address!("0000000000000000000000000000000000000a02"),
];

fn deploy(address: Address) -> Result<LocalChain, BridgeError> {
    let mut ledger = InMemoryLedger::new();
    ledger.set_balance(OWNER, U256::from(10_000));
    ledger.set_balance(USER, U256::from(1_000));

    let mut bridge = Bridge::builder()
        .address(address)
        .owner(OWNER)
        .ledger(ledger)
        .settings(BridgeSettings::lock_release())
        .charge(U256::from(10_000))
        .build()?;
    for operator in OPERATORS {
        bridge.register_operator(Tx::new(OWNER), operator)?;
    }
    bridge.set_operator_threshold(Tx::new(OWNER), VoteKind::ValueTransfer, 2)?;
    Ok(LocalChain::new(bridge))
}

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let parent = deploy(address!("000000000000000000000000000000000000b00a"))?;
    let child = deploy(address!("000000000000000000000000000000000000b00b"))?;

    let value = U256::from(250);
    parent.transact(|bridge| bridge.request_klay_transfer(Tx::with_value(USER, value), USER, value))?;
    tracing::info!(event = "request_submitted", value = %value);

    for operator in OPERATORS {
        let mut relay = ValueTransferRelay::builder()
            .source(parent.clone())
            .destination(child.clone())
            .operator(operator)
            .config(RelayConfig::default().with_recovery_interval_blocks(0))
            .build();
        let report = relay.poll().await?;
        tracing::info!(
            operator = %operator,
            submitted = report.submitted,
            event = "operator_pass_completed"
        );
    }

    println!("request 0 closed on child: {}", child.is_closed(0).await?);
    println!(
        "user balance on child: {}",
        child.with_bridge(|bridge| bridge.ledger().balance(USER))
    );
    Ok(())
}
