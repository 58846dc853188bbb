//! Calldata-level tests: the bridge driven exactly as a node would drive it

use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::SolCall;
use klay_bridge::contracts::bridge::Bridge as Abi;
use klay_bridge::testing::InMemoryLedger;
use klay_bridge::traits::Ledger;
use klay_bridge::{Bridge, BridgeError, BridgeSettings, Tx, VoteKind, VERSION};
use rstest::rstest;

const OWNER: Address = address!("00000000000000000000000000000000000000aa");
const USER: Address = address!("00000000000000000000000000000000000000bb");
const OP1: Address = address!("0000000000000000000000000000000000000a01");
const BRIDGE: Address = address!("000000000000000000000000000000000000b00a");
const TOKEN: Address = address!("000000000000000000000000000000000000e20a");
const COUNTERPART: Address = address!("000000000000000000000000000000000000e20b");

fn bridge(settings: BridgeSettings) -> Bridge<InMemoryLedger> {
    let mut ledger = InMemoryLedger::new();
    ledger.set_balance(USER, U256::from(100));
    Bridge::builder()
        .address(BRIDGE)
        .owner(OWNER)
        .ledger(ledger)
        .settings(settings)
        .build()
        .unwrap()
}

fn call<C: SolCall>(bridge: &mut Bridge<InMemoryLedger>, sender: Address, call: C) -> Bytes {
    bridge
        .execute(Tx::new(sender), &call.abi_encode())
        .unwrap()
        .output
}

#[test]
fn test_admin_calls_and_views() {
    let mut bridge = bridge(BridgeSettings::default());

    call(&mut bridge, OWNER, Abi::registerOperatorCall { operator: OP1 });
    call(
        &mut bridge,
        OWNER,
        Abi::setOperatorThresholdCall {
            voteType: VoteKind::Configuration.as_u8(),
            threshold: 3,
        },
    );
    call(
        &mut bridge,
        OWNER,
        Abi::registerTokenCall {
            token: TOKEN,
            counterpartToken: COUNTERPART,
        },
    );

    let output = call(&mut bridge, USER, Abi::VERSIONCall {});
    assert_eq!(Abi::VERSIONCall::abi_decode_returns(&output).unwrap(), VERSION);

    let output = call(&mut bridge, USER, Abi::getOperatorListCall {});
    assert_eq!(
        Abi::getOperatorListCall::abi_decode_returns(&output).unwrap(),
        vec![OP1]
    );

    let output = call(&mut bridge, USER, Abi::operatorThresholdsCall { voteType: 1 });
    assert_eq!(Abi::operatorThresholdsCall::abi_decode_returns(&output).unwrap(), 3);

    let output = call(&mut bridge, USER, Abi::allowedTokensCall { token: TOKEN });
    assert_eq!(
        Abi::allowedTokensCall::abi_decode_returns(&output).unwrap(),
        COUNTERPART
    );

    let output = call(&mut bridge, USER, Abi::isOwnerCall {});
    assert!(!Abi::isOwnerCall::abi_decode_returns(&output).unwrap());
    let output = call(&mut bridge, OWNER, Abi::isOwnerCall {});
    assert!(Abi::isOwnerCall::abi_decode_returns(&output).unwrap());
}

#[test]
fn test_payable_request_through_calldata() {
    let mut bridge = bridge(BridgeSettings::default());
    let calldata = Abi::requestKLAYTransferCall {
        to: USER,
        value: U256::from(40),
    }
    .abi_encode();

    let receipt = bridge
        .execute(Tx::with_value(USER, U256::from(40)), &calldata)
        .unwrap();

    assert!(receipt.output.is_empty());
    assert_eq!(receipt.events.len(), 1);
    assert_eq!(bridge.ledger().balance(BRIDGE), U256::from(40));

    let output = call(&mut bridge, USER, Abi::requestNonceCall {});
    assert_eq!(Abi::requestNonceCall::abi_decode_returns(&output).unwrap(), 1);
}

#[rstest]
#[case::view(Abi::ownerCall {}.abi_encode())]
#[case::admin(Abi::startCall { running: false }.abi_encode())]
fn test_non_payable_calls_refuse_value(#[case] calldata: Vec<u8>) {
    let mut bridge = bridge(BridgeSettings::default());

    let err = bridge
        .execute(Tx::with_value(OWNER, U256::from(1)), &calldata)
        .unwrap_err();

    assert!(matches!(err, BridgeError::NonPayable));
    assert!(bridge.is_running());
}

#[test]
fn test_empty_calldata_is_the_fallback() {
    let mut refusing = bridge(BridgeSettings::default());
    let err = refusing
        .execute(Tx::with_value(USER, U256::from(5)), &[])
        .unwrap_err();
    assert!(matches!(err, BridgeError::FallbackDisabled));

    let mut accepting = bridge(BridgeSettings::default().with_fallback_deposits(true));
    let receipt = accepting
        .execute(Tx::with_value(USER, U256::from(5)), &[])
        .unwrap();
    assert_eq!(receipt.events.len(), 1);
    assert_eq!(accepting.request_nonce(), 1);
}

#[test]
fn test_malformed_calldata() {
    let mut bridge = bridge(BridgeSettings::default());

    let err = bridge
        .execute(Tx::new(USER), &[0xde, 0xad, 0xbe, 0xef])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Abi(_)));
    assert!(err.revert_reason().is_none());

    let err = bridge
        .execute(
            Tx::new(USER),
            &Abi::operatorThresholdsCall { voteType: 9 }.abi_encode(),
        )
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidConfig(_)));
}
