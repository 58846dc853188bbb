//! Integration tests for the callback-enabled bridge variant

use alloy_primitives::{address, b256, Address, B256, U256};
use alloy_sol_types::SolCall;
use klay_bridge::contracts::bridge::Bridge::handleERC721TransferCall as ShortHandle;
use klay_bridge::contracts::ext_bridge::Callback::registerOfferCall;
use klay_bridge::contracts::ext_bridge::ExtBridge;
use klay_bridge::testing::InMemoryLedger;
use klay_bridge::{Action, Bridge, BridgeError, BridgeSettings, LedgerError, Tx, VoteKind};

const OWNER: Address = address!("00000000000000000000000000000000000000aa");
const USER: Address = address!("00000000000000000000000000000000000000bb");
const RECIPIENT: Address = address!("00000000000000000000000000000000000000bc");
const OP1: Address = address!("0000000000000000000000000000000000000a01");
const OP2: Address = address!("0000000000000000000000000000000000000a02");
const BRIDGE: Address = address!("000000000000000000000000000000000000b00b");
const NFT: Address = address!("000000000000000000000000000000000000e72b");
const CALLBACK: Address = address!("00000000000000000000000000000000000000cb");
const REQUEST_TX: B256 =
    b256!("1111111111111111111111111111111111111111111111111111111111111111");

fn deploy(settings: BridgeSettings) -> Bridge<InMemoryLedger> {
    let mut ledger = InMemoryLedger::new();
    ledger.deploy_erc721(NFT);
    ledger.add_erc721_minter(NFT, BRIDGE);
    ledger.deploy_callback(CALLBACK);

    let mut bridge = Bridge::builder()
        .address(BRIDGE)
        .owner(OWNER)
        .ledger(ledger)
        .settings(settings)
        .build()
        .unwrap();
    bridge.register_operator(Tx::new(OWNER), OP1).unwrap();
    bridge.register_operator(Tx::new(OWNER), OP2).unwrap();
    bridge
        .set_operator_threshold(Tx::new(OWNER), VoteKind::ValueTransfer, 2)
        .unwrap();
    bridge
}

fn extended() -> Bridge<InMemoryLedger> {
    let mut bridge = deploy(BridgeSettings::mint_burn().with_callback(true));
    bridge.set_callback(Tx::new(OWNER), CALLBACK).unwrap();
    bridge
}

fn handle(nonce: u64, token_id: u64) -> ExtBridge::handleERC721TransferCall {
    ExtBridge::handleERC721TransferCall {
        requestTxHash: REQUEST_TX,
        from: USER,
        to: RECIPIENT,
        tokenAddress: NFT,
        tokenId: U256::from(token_id),
        requestNonce: nonce,
        requestBlockNumber: 12,
        tokenURI: "ipfs://offer".to_string(),
    }
}

#[test]
fn test_callback_receives_offer_after_threshold() {
    let mut bridge = extended();
    let call = handle(0, 42);

    bridge
        .handle_erc721_transfer_with_callback(Tx::new(OP1), &call)
        .unwrap();
    assert!(bridge.ledger().offers(CALLBACK).is_empty());
    assert!(!bridge.handled_request_tx(&REQUEST_TX));

    let receipt = bridge
        .handle_erc721_transfer_with_callback(Tx::new(OP2), &call)
        .unwrap();

    assert!(receipt.output.is_finalized());
    assert!(bridge.handled_request_tx(&REQUEST_TX));
    assert_eq!(bridge.ledger().erc721_owner(NFT, U256::from(42)), Some(RECIPIENT));
    assert_eq!(
        bridge.ledger().offers(CALLBACK),
        vec![registerOfferCall {
            owner: RECIPIENT,
            tokenId: U256::from(42),
            tokenAddress: NFT,
            requestTxHash: REQUEST_TX,
        }]
    );
}

#[test]
fn test_rejecting_callback_reverts_the_handle() {
    let mut bridge = extended();
    bridge.ledger_mut().reject_offers(CALLBACK);
    let call = handle(0, 42);

    bridge
        .handle_erc721_transfer_with_callback(Tx::new(OP1), &call)
        .unwrap();
    let err = bridge
        .handle_erc721_transfer_with_callback(Tx::new(OP2), &call)
        .unwrap_err();

    assert!(matches!(
        err,
        BridgeError::External(LedgerError::Reverted { .. })
    ));
    assert!(!bridge.is_closed(0));
    assert!(!bridge.handled_request_tx(&REQUEST_TX));
    assert_eq!(bridge.ledger().erc721_owner(NFT, U256::from(42)), None);

    assert_eq!(bridge.voters(&call.action_hash()), vec![OP1]);
    assert_eq!(bridge.sequential_handled_nonce(), 0);

    // the rolled back vote is cast again rather than ignored as a duplicate
    let err = bridge
        .handle_erc721_transfer_with_callback(Tx::new(OP2), &call)
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::External(LedgerError::Reverted { .. })
    ));
    assert!(!bridge.is_closed(0));
}

#[test]
fn test_short_handle_skips_callback() {
    let mut bridge = extended();
    let call = ShortHandle {
        from: USER,
        to: RECIPIENT,
        tokenAddress: NFT,
        tokenId: U256::from(7),
        requestNonce: 0,
        requestBlockNumber: 12,
        tokenURI: "ipfs://seven".to_string(),
    };

    bridge.handle_erc721_transfer(Tx::new(OP1), &call).unwrap();
    bridge.handle_erc721_transfer(Tx::new(OP2), &call).unwrap();

    assert_eq!(bridge.ledger().erc721_owner(NFT, U256::from(7)), Some(RECIPIENT));
    assert!(bridge.ledger().offers(CALLBACK).is_empty());
}

#[test]
fn test_unset_callback_is_skipped() {
    let mut bridge = deploy(BridgeSettings::mint_burn().with_callback(true));
    let call = handle(0, 3);

    bridge
        .handle_erc721_transfer_with_callback(Tx::new(OP1), &call)
        .unwrap();
    bridge
        .handle_erc721_transfer_with_callback(Tx::new(OP2), &call)
        .unwrap();

    assert_eq!(bridge.callback(), Address::ZERO);
    assert!(bridge.handled_request_tx(&REQUEST_TX));
    assert_eq!(bridge.ledger().erc721_owner(NFT, U256::from(3)), Some(RECIPIENT));
}

#[test]
fn test_plain_bridge_refuses_extended_calls() {
    let mut bridge = deploy(BridgeSettings::mint_burn());

    let err = bridge.set_callback(Tx::new(OWNER), CALLBACK).unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedCall(_)));

    let err = bridge
        .handle_erc721_transfer_with_callback(Tx::new(OP1), &handle(0, 1))
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedCall(_)));

    let calldata = handle(0, 1).abi_encode();
    let err = bridge.execute(Tx::new(OP1), &calldata).unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedCall(_)));
}

#[test]
fn test_set_callback_is_owner_only() {
    let mut bridge = deploy(BridgeSettings::mint_burn().with_callback(true));
    let err = bridge.set_callback(Tx::new(OP1), CALLBACK).unwrap_err();
    assert!(matches!(err, BridgeError::Unauthorized { caller } if caller == OP1));
}

#[test]
fn test_execute_routes_both_arities() {
    let mut bridge = extended();

    let long = handle(0, 1);
    bridge.execute(Tx::new(OP1), &long.abi_encode()).unwrap();
    bridge.execute(Tx::new(OP2), &long.abi_encode()).unwrap();
    assert_eq!(bridge.ledger().offers(CALLBACK).len(), 1);

    let short = ShortHandle {
        from: USER,
        to: RECIPIENT,
        tokenAddress: NFT,
        tokenId: U256::from(2),
        requestNonce: 1,
        requestBlockNumber: 13,
        tokenURI: String::new(),
    };
    bridge.execute(Tx::new(OP1), &short.abi_encode()).unwrap();
    bridge.execute(Tx::new(OP2), &short.abi_encode()).unwrap();
    assert_eq!(bridge.ledger().offers(CALLBACK).len(), 1);
    assert_eq!(bridge.sequential_handled_nonce(), 2);

    let output = bridge
        .execute(
            Tx::new(USER),
            &ExtBridge::handledRequestTxCall {
                requestTxHash: REQUEST_TX,
            }
            .abi_encode(),
        )
        .unwrap()
        .output;
    assert!(ExtBridge::handledRequestTxCall::abi_decode_returns(&output).unwrap());

    let output = bridge
        .execute(Tx::new(USER), &ExtBridge::callbackCall {}.abi_encode())
        .unwrap()
        .output;
    assert_eq!(
        ExtBridge::callbackCall::abi_decode_returns(&output).unwrap(),
        CALLBACK
    );
}
