//! Price feed interface and a static in-memory implementation.
//!
//! The pool consumes prices through the [`PriceOracle`] trait. Every price
//! carries a validity flag; callers must check it before using the value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::ids::AssetId;

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE DATA
// ═══════════════════════════════════════════════════════════════════════════════

/// A price quote for one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPrice {
    /// Base-currency value of one whole token, scaled by `PRICE_PRECISION`
    pub price: u128,
    /// Whether the quote can be trusted
    pub is_valid: bool,
}

impl AssetPrice {
    /// Create a valid price quote
    pub fn valid(price: u128) -> Self {
        Self { price, is_valid: true }
    }

    /// Create an invalid quote (asset unknown or feed down)
    pub fn invalid() -> Self {
        Self { price: 0, is_valid: false }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of asset prices for health-factor and liquidation math
pub trait PriceOracle {
    /// Return the current price quote for `asset`. Unknown assets return an
    /// invalid quote, never a default price.
    fn asset_price(&self, asset: &AssetId) -> AssetPrice;
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATIC ORACLE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory oracle with caller-controlled prices.
///
/// Used by tests and by integrators that pin prices externally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticPriceOracle {
    prices: HashMap<AssetId, AssetPrice>,
}

impl StaticPriceOracle {
    /// Create an empty oracle
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the price for an asset
    pub fn set_price(&mut self, asset: AssetId, price: u128) {
        self.prices.insert(asset, AssetPrice::valid(price));
    }

    /// Mark an asset's price as invalid (feed failure)
    pub fn invalidate(&mut self, asset: &AssetId) {
        self.prices.insert(asset.clone(), AssetPrice::invalid());
    }
}

impl PriceOracle for StaticPriceOracle {
    fn asset_price(&self, asset: &AssetId) -> AssetPrice {
        self.prices
            .get(asset)
            .copied()
            .unwrap_or_else(AssetPrice::invalid)
    }
}
