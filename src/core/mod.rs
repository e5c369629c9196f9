//! Core protocol state: configuration, reserves and user positions.

pub mod config;
pub mod position;
pub mod reserve;

pub use config::{PriceFailurePolicy, ProtocolConfig, ReserveConfig};
pub use position::UserReservePosition;
pub use reserve::{Reserve, StateUpdate};
