//! Events emitted by a bridge instance

use alloy_primitives::{Address, IntoLogData, Log};
use alloy_sol_types::SolEventInterface;

use crate::contracts::bridge::Bridge::{BridgeEvents, HandleValueTransfer, RequestValueTransfer};
use crate::error::Result;

/// Any event a bridge instance can emit.
pub type BridgeEvent = BridgeEvents;

/// Wraps an event into the log the contract at `address` would emit.
pub fn to_log(address: Address, event: &BridgeEvent) -> Log {
    Log {
        address,
        data: event.to_log_data(),
    }
}

/// Decodes a raw bridge log back into its typed event.
pub fn decode_log(log: &Log) -> Result<BridgeEvent> {
    Ok(BridgeEvents::decode_raw_log(log.topics(), &log.data.data)?)
}

/// Every `RequestValueTransfer` in `events`, in emission order.
pub fn requests(events: &[BridgeEvent]) -> impl Iterator<Item = &RequestValueTransfer> {
    events.iter().filter_map(|event| match event {
        BridgeEvents::RequestValueTransfer(request) => Some(request),
        _ => None,
    })
}

/// Every `HandleValueTransfer` in `events`, in emission order.
pub fn handles(events: &[BridgeEvent]) -> impl Iterator<Item = &HandleValueTransfer> {
    events.iter().filter_map(|event| match event {
        BridgeEvents::HandleValueTransfer(handle) => Some(handle),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::bridge::Bridge::KLAYFeeChanged;
    use alloy_primitives::{address, keccak256, U256};

    #[test]
    fn test_request_log_roundtrips_through_raw_topics() {
        let bridge = address!("00000000000000000000000000000000000000b1");
        let event = BridgeEvents::RequestValueTransfer(RequestValueTransfer {
            tokenType: 1,
            from: address!("1111111111111111111111111111111111111111"),
            to: address!("2222222222222222222222222222222222222222"),
            tokenAddress: address!("3333333333333333333333333333333333333333"),
            valueOrTokenId: U256::from(100),
            requestNonce: 0,
            uri: String::new(),
            fee: U256::from(2),
        });

        let log = to_log(bridge, &event);
        assert_eq!(log.address, bridge);
        assert_eq!(
            log.topics()[0],
            keccak256(b"RequestValueTransfer(uint8,address,address,address,uint256,uint64,string,uint256)")
        );
        assert_eq!(decode_log(&log).unwrap(), event);
    }

    #[test]
    fn test_indexed_fee_lands_in_topics() {
        let event = BridgeEvents::KLAYFeeChanged(KLAYFeeChanged {
            fee: U256::from(7),
        });
        let log = to_log(Address::ZERO, &event);
        assert_eq!(log.topics().len(), 2);
        assert_eq!(U256::from_be_bytes(log.topics()[1].0), U256::from(7));
        assert!(log.data.data.is_empty());
    }

    #[test]
    fn test_filters_keep_emission_order() {
        let events = vec![
            BridgeEvents::KLAYFeeChanged(KLAYFeeChanged { fee: U256::ZERO }),
            BridgeEvents::HandleValueTransfer(HandleValueTransfer {
                tokenType: 0,
                from: Address::ZERO,
                to: Address::ZERO,
                tokenAddress: Address::ZERO,
                valueOrTokenId: U256::from(1),
                handleNonce: 3,
            }),
        ];
        assert_eq!(requests(&events).count(), 0);
        assert_eq!(handles(&events).map(|h| h.handleNonce).collect::<Vec<_>>(), vec![3]);
    }
}
