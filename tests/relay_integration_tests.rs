//! Integration tests for operator relaying using local bridge chains
//!
//! Both sides are [`LocalChain`]s: requests are made on the source chain,
//! relays run as operators and submit handle calls to the destination chain.

use alloy_primitives::{address, Address, U256};
use klay_bridge::testing::{InMemoryLedger, LocalChain};
use klay_bridge::traits::{BridgeChain, Ledger};
use klay_bridge::{
    Bridge, BridgeSettings, HandleCall, RelayConfig, TokenKind, Tx, ValueTransferRelay, VoteKind,
};

const OWNER: Address = address!("00000000000000000000000000000000000000aa");
const USER: Address = address!("00000000000000000000000000000000000000bb");
const RECIPIENT: Address = address!("00000000000000000000000000000000000000bc");
const OP1: Address = address!("0000000000000000000000000000000000000a01");
const OP2: Address = address!("0000000000000000000000000000000000000a02");

const BRIDGE_A: Address = address!("000000000000000000000000000000000000b00a");
const BRIDGE_B: Address = address!("000000000000000000000000000000000000b00b");
const TOKEN_A: Address = address!("000000000000000000000000000000000000e20a");
const TOKEN_B: Address = address!("000000000000000000000000000000000000e20b");
const NFT_A: Address = address!("000000000000000000000000000000000000e72a");
const NFT_B: Address = address!("000000000000000000000000000000000000e72b");
const CALLBACK: Address = address!("00000000000000000000000000000000000000cb");

fn u(value: u64) -> U256 {
    U256::from(value)
}

fn chain(address: Address, settings: BridgeSettings, threshold: u64) -> LocalChain {
    let mut ledger = InMemoryLedger::new();
    ledger.set_balance(OWNER, u(10_000));
    ledger.set_balance(USER, u(1_000));
    ledger.mint_erc20(TOKEN_A, USER, u(1_000)).unwrap();
    ledger.mint_erc20(TOKEN_B, address, u(1_000)).unwrap();
    ledger.deploy_erc721(NFT_A);
    ledger.deploy_erc721(NFT_B);
    ledger.add_erc721_minter(NFT_B, address);
    ledger.deploy_callback(CALLBACK);

    let mut bridge = Bridge::builder()
        .address(address)
        .owner(OWNER)
        .ledger(ledger)
        .settings(settings)
        .charge(u(1_000))
        .build()
        .unwrap();

    let owner = Tx::new(OWNER);
    bridge.register_operator(owner, OP1).unwrap();
    bridge.register_operator(owner, OP2).unwrap();
    bridge
        .set_operator_threshold(owner, VoteKind::ValueTransfer, threshold)
        .unwrap();
    bridge.register_token(owner, TOKEN_A, TOKEN_B).unwrap();
    bridge.register_token(owner, TOKEN_B, TOKEN_A).unwrap();
    bridge.register_token(owner, NFT_A, NFT_B).unwrap();
    bridge.register_token(owner, NFT_B, NFT_A).unwrap();
    LocalChain::new(bridge)
}

fn relay(
    source: &LocalChain,
    destination: &LocalChain,
    operator: Address,
) -> ValueTransferRelay<LocalChain, LocalChain> {
    ValueTransferRelay::builder()
        .source(source.clone())
        .destination(destination.clone())
        .operator(operator)
        .config(RelayConfig::default().with_recovery_interval_blocks(0))
        .build()
}

fn request_klay(source: &LocalChain, value: u64) -> u64 {
    source
        .transact(|bridge| bridge.request_klay_transfer(Tx::with_value(USER, u(value)), RECIPIENT, u(value)))
        .unwrap()
        .output
}

#[tokio::test]
async fn test_two_operators_finalize_a_transfer() {
    let source = chain(BRIDGE_A, BridgeSettings::lock_release(), 2);
    let destination = chain(BRIDGE_B, BridgeSettings::lock_release(), 2);
    request_klay(&source, 25);

    let mut first = relay(&source, &destination, OP1);
    let report = first.poll().await.unwrap();
    assert_eq!(report.observed, 1);
    assert_eq!(report.submitted, 1);
    assert_eq!(report.pending, 0);
    assert!(!destination.is_closed(0).await.unwrap());

    let mut second = relay(&source, &destination, OP2);
    second.poll().await.unwrap();

    assert!(destination.is_closed(0).await.unwrap());
    assert_eq!(
        destination.with_bridge(|bridge| bridge.ledger().balance(RECIPIENT)),
        u(25)
    );
    assert_eq!(destination.sequential_handled_nonce().await.unwrap(), 1);

    // nothing new on a later pass
    let report = first.poll().await.unwrap();
    assert_eq!(report.observed, 0);
    assert_eq!(report.submitted, 0);
}

#[tokio::test]
async fn test_handle_uses_counterpart_token() {
    let source = chain(BRIDGE_A, BridgeSettings::lock_release(), 1);
    let destination = chain(BRIDGE_B, BridgeSettings::lock_release(), 1);
    source.with_bridge(|bridge| {
        bridge
            .ledger_mut()
            .approve_erc20(TOKEN_A, USER, BRIDGE_A, u(40))
    });
    source
        .transact(|bridge| {
            bridge.request_erc20_transfer(Tx::new(USER), TOKEN_A, RECIPIENT, u(40), U256::ZERO)
        })
        .unwrap();

    relay(&source, &destination, OP1).poll().await.unwrap();

    let submissions = destination.submissions();
    assert_eq!(submissions.len(), 1);
    let (operator, call) = &submissions[0];
    assert_eq!(*operator, OP1);
    assert_eq!(call.kind(), TokenKind::Erc20);
    let HandleCall::Erc20(handle) = call else {
        panic!("expected an ERC-20 handle, got {call:?}");
    };
    assert_eq!(handle.tokenAddress, TOKEN_B);
    assert_eq!(
        destination.with_bridge(|bridge| bridge.ledger().erc20_balance(TOKEN_B, RECIPIENT)),
        u(40)
    );
}

#[tokio::test]
async fn test_failed_submission_is_retried() {
    let source = chain(BRIDGE_A, BridgeSettings::lock_release(), 1);
    let destination = chain(BRIDGE_B, BridgeSettings::lock_release(), 1);
    request_klay(&source, 5);
    request_klay(&source, 6);
    destination.fail_submissions(0);

    let mut relay = relay(&source, &destination, OP1);
    let report = relay.poll().await.unwrap();
    assert_eq!(report.submitted, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(relay.pending_nonces(), vec![0]);
    assert_eq!(destination.sequential_handled_nonce().await.unwrap(), 0);

    destination.clear_failures();
    let report = relay.poll().await.unwrap();
    assert_eq!(report.submitted, 1);
    assert!(relay.pending_nonces().is_empty());
    assert_eq!(destination.sequential_handled_nonce().await.unwrap(), 2);
}

#[tokio::test]
async fn test_batch_size_limits_submissions() {
    let source = chain(BRIDGE_A, BridgeSettings::lock_release(), 1);
    let destination = chain(BRIDGE_B, BridgeSettings::lock_release(), 1);
    for value in 1..=5 {
        request_klay(&source, value);
    }

    let mut relay = ValueTransferRelay::builder()
        .source(source.clone())
        .destination(destination.clone())
        .operator(OP1)
        .config(
            RelayConfig::default()
                .with_batch_size(2)
                .with_recovery_interval_blocks(0),
        )
        .build();

    let report = relay.poll().await.unwrap();
    assert_eq!(report.observed, 5);
    assert_eq!(report.submitted, 2);
    assert_eq!(relay.pending_nonces(), vec![2, 3, 4]);

    relay.poll().await.unwrap();
    relay.poll().await.unwrap();
    assert!(relay.pending_nonces().is_empty());
    assert_eq!(destination.sequential_handled_nonce().await.unwrap(), 5);
}

#[tokio::test]
async fn test_recovery_relays_missed_requests() {
    let source = chain(BRIDGE_A, BridgeSettings::lock_release(), 1);
    let destination = chain(BRIDGE_B, BridgeSettings::lock_release(), 1);
    request_klay(&source, 11);
    request_klay(&source, 12);
    let head = source.block_number().await.unwrap();

    // a relay started after the requests never scans their blocks
    let mut relay = ValueTransferRelay::builder()
        .source(source.clone())
        .destination(destination.clone())
        .operator(OP1)
        .start_block(head + 1)
        .config(RelayConfig::default().with_recovery_interval_blocks(1))
        .build();

    let report = relay.poll().await.unwrap();
    assert_eq!(report.observed, 0);
    assert_eq!(report.recovered, 2);
    assert_eq!(report.submitted, 2);
    assert_eq!(destination.sequential_handled_nonce().await.unwrap(), 2);

    let hint = relay.recovery_hint().unwrap();
    assert_eq!(hint.request_nonce, 2);
    assert_eq!(hint.handle_nonce, 0);
}

#[tokio::test]
async fn test_recovery_without_gap_is_idle() {
    let source = chain(BRIDGE_A, BridgeSettings::lock_release(), 1);
    let destination = chain(BRIDGE_B, BridgeSettings::lock_release(), 1);
    request_klay(&source, 3);

    let mut relay = ValueTransferRelay::builder()
        .source(source.clone())
        .destination(destination.clone())
        .operator(OP1)
        .config(RelayConfig::default().with_recovery_interval_blocks(1))
        .build();

    let report = relay.poll().await.unwrap();
    assert_eq!(report.submitted, 1);
    assert_eq!(report.recovered, 0);

    source.with_bridge(|bridge| bridge.ledger_mut().advance_block(1));
    let report = relay.poll().await.unwrap();
    assert_eq!(report.recovered, 0);
    assert!(relay.recovery_hint().unwrap().is_settled());
}

#[tokio::test]
async fn test_callback_relay_carries_request_tx_hash() {
    let source = chain(BRIDGE_A, BridgeSettings::lock_release(), 1);
    let destination = chain(BRIDGE_B, BridgeSettings::mint_burn().with_callback(true), 1);
    destination
        .transact(|bridge| bridge.set_callback(Tx::new(OWNER), CALLBACK))
        .unwrap();
    source.with_bridge(|bridge| {
        let ledger = bridge.ledger_mut();
        ledger.mint_erc721(NFT_A, USER, u(77), "ipfs://77");
        ledger.approve_erc721(NFT_A, BRIDGE_A, u(77));
    });
    source
        .transact(|bridge| bridge.request_erc721_transfer(Tx::new(USER), NFT_A, RECIPIENT, u(77)))
        .unwrap();
    let request_tx = source.request_logs()[0].tx_hash;

    let mut relay = ValueTransferRelay::builder()
        .source(source.clone())
        .destination(destination.clone())
        .operator(OP2)
        .with_callback(true)
        .config(RelayConfig::default().with_recovery_interval_blocks(0))
        .build();
    relay.poll().await.unwrap();

    destination.with_bridge(|bridge| {
        assert!(bridge.handled_request_tx(&request_tx));
        assert_eq!(bridge.ledger().erc721_owner(NFT_B, u(77)), Some(RECIPIENT));
        assert_eq!(bridge.ledger().offers(CALLBACK)[0].requestTxHash, request_tx);
    });
}

#[tokio::test(start_paused = true)]
async fn test_run_stops_after_max_passes() {
    let source = chain(BRIDGE_A, BridgeSettings::lock_release(), 1);
    let destination = chain(BRIDGE_B, BridgeSettings::lock_release(), 1);
    request_klay(&source, 9);

    let mut relay = relay(&source, &destination, OP1);
    relay.run(Some(3)).await;

    assert_eq!(destination.submissions().len(), 1);
    assert!(destination.is_closed(0).await.unwrap());
    assert!(relay.next_block() > source.block_number().await.unwrap());
}
