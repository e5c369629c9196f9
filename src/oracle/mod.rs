//! Price oracle interface consumed by health and liquidation math.

pub mod price_feed;

pub use price_feed::{AssetPrice, PriceOracle, StaticPriceOracle};
