//! # mLend Protocol
//!
//! A collateralized lending pool with interest-accruing reserves, stable and
//! variable debt, and close-factor liquidations.
//!
//! ## Architecture
//!
//! The protocol consists of several core modules:
//!
//! - **Core**: Configuration, reserve accounting and user positions
//! - **Oracle**: Price feed interface consumed through a trait
//! - **Rates**: Utilization-driven interest-rate models
//! - **Health**: Account aggregation and liquidation sizing
//! - **Boost**: Yield-boost stakes and banker NFT bindings
//! - **Pool**: The owned state store plus deposit/withdraw/borrow/repay
//! - **Liquidation**: Debt resolution, collateral seizure and orchestration
//!
//! ## Example
//!
//! ```rust,ignore
//! use mlend::prelude::*;
//!
//! let mut pool = LendingPool::new(ProtocolConfig::default())?;
//! pool.list_reserve(AssetId::new("USDC"), ReserveConfig::default(), now)?;
//!
//! let outcome = liquidation_call(&mut pool, &oracle, &model, &params, now)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    unused_lifetimes,
    unused_qualifications
)]

pub mod boost;
pub mod core;
pub mod error;
pub mod events;
pub mod health;
pub mod ledger;
pub mod liquidation;
pub mod oracle;
pub mod pool;
pub mod rates;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::boost::{NftAction, NftBindingRegistry, NftTier, YieldBoostLedger};
    pub use crate::core::{
        config::{PriceFailurePolicy, ProtocolConfig, ReserveConfig},
        position::UserReservePosition,
        reserve::Reserve,
    };
    pub use crate::error::{Error, Result};
    pub use crate::events::{EventLog, ProtocolEvent};
    pub use crate::health::AccountData;
    pub use crate::liquidation::{
        liquidation_call, liquidation_dry_run, CollateralDisposition, LiquidationOutcome,
        LiquidationParams,
    };
    pub use crate::oracle::{AssetPrice, PriceOracle, StaticPriceOracle};
    pub use crate::pool::{InterestRateMode, LendingPool};
    pub use crate::rates::{DefaultInterestRateModel, FlatInterestRateModel, InterestRateModel};
    pub use crate::utils::{
        constants::{MAX_AMOUNT, RAY},
        ids::{AssetId, UserId},
    };
}

/// Protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Protocol name
pub const PROTOCOL_NAME: &str = "mLend";
