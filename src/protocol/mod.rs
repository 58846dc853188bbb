//! Bridge protocol types
//!
//! This module contains the protocol-level vocabulary shared by the bridge
//! state machine, the contract bindings and the operator relay: asset classes,
//! vote classes, vote keys of operator actions and the emitted events.

mod action;
pub mod event;
mod token_kind;
mod vote_kind;

pub use action::Action;
pub use event::BridgeEvent;
pub use token_kind::{InvalidTokenKind, TokenKind};
pub use vote_kind::{InvalidVoteKind, VoteKind};
