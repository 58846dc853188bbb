//! Transaction requests built by the contract wrappers
//!
//! No node is contacted: building a request only encodes calldata.

use alloy_primitives::{address, Address, TxKind, U256};
use alloy_provider::ProviderBuilder;
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use klay_bridge::contracts::bridge::Bridge::{
    handleKLAYTransferCall, registerOperatorCall, requestERC20TransferCall,
    requestKLAYTransferCall, setKLAYFeeCall,
};
use klay_bridge::contracts::erc20::Erc20::approveCall;
use klay_bridge::contracts::erc721::Erc721;
use klay_bridge::contracts::ext_bridge::ExtBridge;
use klay_bridge::{BridgeContract, BridgeError, Erc20Contract, Erc721Contract, ExtBridgeContract};

const BRIDGE: Address = address!("1000000000000000000000000000000000000001");
const TOKEN: Address = address!("2000000000000000000000000000000000000002");
const USER: Address = address!("3000000000000000000000000000000000000003");
const OPERATOR: Address = address!("4000000000000000000000000000000000000004");

fn calldata(tx: &TransactionRequest) -> &[u8] {
    tx.input.input().map(|input| &input[..]).unwrap_or_default()
}

#[test]
fn test_request_transactions() {
    let provider = ProviderBuilder::new().connect_http("http://localhost:8551".parse().unwrap());
    let bridge = BridgeContract::new(BRIDGE, provider);

    let tx = bridge
        .request_klay_transfer_transaction(USER, USER, U256::from(10), U256::from(2))
        .unwrap();
    assert_eq!(tx.from, Some(USER));
    assert_eq!(tx.to, Some(TxKind::Call(BRIDGE)));
    assert_eq!(tx.value, Some(U256::from(12)));
    let call = requestKLAYTransferCall::abi_decode(calldata(&tx)).unwrap();
    assert_eq!(call.to, USER);
    assert_eq!(call.value, U256::from(10));

    let tx = bridge.request_erc20_transfer_transaction(USER, TOKEN, USER, U256::from(5), U256::from(1));
    let call = requestERC20TransferCall::abi_decode(calldata(&tx)).unwrap();
    assert_eq!(call.tokenAddress, TOKEN);
    assert_eq!(call.feeLimit, U256::from(1));
}

#[test]
fn test_klay_request_attachment_must_fit() {
    let provider = ProviderBuilder::new().connect_http("http://localhost:8551".parse().unwrap());
    let bridge = BridgeContract::new(BRIDGE, provider);

    let err = bridge
        .request_klay_transfer_transaction(USER, USER, U256::MAX, U256::from(1))
        .unwrap_err();
    assert!(matches!(err, BridgeError::AmountOverflow { .. }));
}

#[test]
fn test_operator_and_owner_transactions() {
    let provider = ProviderBuilder::new().connect_http("http://localhost:8551".parse().unwrap());
    let bridge = BridgeContract::new(BRIDGE, provider);

    let handle = handleKLAYTransferCall {
        from: USER,
        to: USER,
        value: U256::from(3),
        requestNonce: 4,
        requestBlockNumber: 99,
    };
    let tx = bridge.handle_klay_transfer_transaction(OPERATOR, &handle);
    assert_eq!(tx.from, Some(OPERATOR));
    assert_eq!(handleKLAYTransferCall::abi_decode(calldata(&tx)).unwrap(), handle);

    let tx = bridge.set_klay_fee_transaction(OPERATOR, U256::from(7), 2);
    let call = setKLAYFeeCall::abi_decode(calldata(&tx)).unwrap();
    assert_eq!(call.requestNonce, 2);

    let tx = bridge.register_operator_transaction(USER, OPERATOR);
    assert_eq!(
        registerOperatorCall::abi_decode(calldata(&tx)).unwrap().operator,
        OPERATOR
    );
}

#[test]
fn test_token_and_extended_transactions() {
    let provider = ProviderBuilder::new().connect_http("http://localhost:8551".parse().unwrap());

    let token = Erc20Contract::new(TOKEN, provider.clone());
    let tx = token.approve_transaction(USER, BRIDGE, U256::from(100));
    assert_eq!(tx.to, Some(TxKind::Call(TOKEN)));
    assert_eq!(approveCall::abi_decode(calldata(&tx)).unwrap().spender, BRIDGE);

    let nft = Erc721Contract::new(TOKEN, provider.clone());
    let tx = nft.request_value_transfer_transaction(USER, BRIDGE, U256::from(77));
    assert_eq!(nft.address(), TOKEN);
    let call = Erc721::requestValueTransferCall::abi_decode(calldata(&tx)).unwrap();
    assert_eq!(call.uid, U256::from(77));
    assert_eq!(call.to, BRIDGE);

    let ext = ExtBridgeContract::new(BRIDGE, provider);
    let tx = ext.set_callback_transaction(USER, TOKEN);
    assert_eq!(
        ExtBridge::setCallbackCall::abi_decode(calldata(&tx))
            .unwrap()
            .callback,
        TOKEN
    );
    assert_eq!(ext.base().address(), BRIDGE);
}
