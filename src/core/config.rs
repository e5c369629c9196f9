//! Protocol and per-reserve configuration.
//!
//! Configuration is plain data: protocol-wide parameters in
//! [`ProtocolConfig`], per-asset risk parameters in [`ReserveConfig`].
//! Builder-style `with_*` helpers keep test setup terse.

use serde::{Deserialize, Serialize};

use crate::boost::nft::BoostMultiplierTable;
use crate::utils::constants::{
    DEFAULT_LIQUIDATION_BONUS_BPS, HEALTH_FACTOR_LIQUIDATION_THRESHOLD,
    LIQUIDATION_CLOSE_FACTOR_BPS, PERCENT_FACTOR,
};
use crate::utils::ids::UserId;

// ═══════════════════════════════════════════════════════════════════════════════
// PRICE FAILURE POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// What account-data aggregation does when the oracle reports an invalid
/// price for an asset with a nonzero relevant balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceFailurePolicy {
    /// Fail the whole computation with `Error::InvalidAssetPrice`
    Fail,
    /// Report the account as unhealthy (health factor zero) and flag
    /// `price_ok = false` instead of failing
    AssumeUnhealthy,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESERVE CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Risk and fee parameters of a single reserve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveConfig {
    /// Token decimals of the underlying asset
    pub decimals: u32,
    /// Share of accrued interest minted to the treasury (bps)
    pub reserve_factor_bps: u64,
    /// Collateral valuation multiplier granted to liquidators (bps, > 100%)
    pub liquidation_bonus_bps: u64,
    /// Liquidation threshold (bps); zero means the asset can never be
    /// seized as collateral
    pub liquidation_threshold_bps: u64,
    /// Share of seized collateral taken as protocol fee (bps)
    pub liquidation_protocol_fee_bps: u64,
    /// Whether the reserve accepts any operation
    pub active: bool,
    /// Whether deposits and borrows are suspended
    pub frozen: bool,
    /// Whether balances in this asset earn yield-boost stakes
    pub yield_boost_enabled: bool,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            decimals: 18,
            reserve_factor_bps: 1_000,
            liquidation_bonus_bps: DEFAULT_LIQUIDATION_BONUS_BPS,
            liquidation_threshold_bps: 8_000,
            liquidation_protocol_fee_bps: 1_000,
            active: true,
            frozen: false,
            yield_boost_enabled: false,
        }
    }
}

impl ReserveConfig {
    /// Set the token decimals
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Set the liquidation bonus (bps, > 100%)
    pub fn with_liquidation_bonus(mut self, bps: u64) -> Self {
        self.liquidation_bonus_bps = bps;
        self
    }

    /// Set the liquidation threshold (bps); zero disables collateral use
    pub fn with_liquidation_threshold(mut self, bps: u64) -> Self {
        self.liquidation_threshold_bps = bps;
        self
    }

    /// Set the liquidation protocol fee (bps)
    pub fn with_protocol_fee(mut self, bps: u64) -> Self {
        self.liquidation_protocol_fee_bps = bps;
        self
    }

    /// Set the reserve factor (bps)
    pub fn with_reserve_factor(mut self, bps: u64) -> Self {
        self.reserve_factor_bps = bps;
        self
    }

    /// Enable yield-boost staking for this asset
    pub fn with_yield_boost(mut self) -> Self {
        self.yield_boost_enabled = true;
        self
    }

    /// An asset with a zero liquidation threshold can never be seized
    pub fn collateral_eligible(&self) -> bool {
        self.liquidation_threshold_bps > 0
    }

    /// Validate parameter consistency
    pub fn validate(&self) -> bool {
        self.liquidation_bonus_bps as u128 > PERCENT_FACTOR
            && (self.liquidation_threshold_bps as u128) <= PERCENT_FACTOR
            && (self.liquidation_protocol_fee_bps as u128) <= PERCENT_FACTOR
            && (self.reserve_factor_bps as u128) <= PERCENT_FACTOR
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROTOCOL CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Protocol-wide parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Maximum share of total debt liquidatable in one call (bps)
    pub close_factor_bps: u64,
    /// Health factor below which a position is liquidatable (ray)
    pub health_factor_threshold: u128,
    /// Combined debt at or below this (native debt-asset units) waives the
    /// close factor; zero disables the waiver
    pub dust_debt_threshold: u128,
    /// Behavior on invalid oracle prices
    pub price_failure_policy: PriceFailurePolicy,
    /// Account credited with protocol fees and the interest skim
    pub treasury: UserId,
    /// Yield-boost stake multipliers keyed by (tier, action)
    pub boost_multipliers: BoostMultiplierTable,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            close_factor_bps: LIQUIDATION_CLOSE_FACTOR_BPS,
            health_factor_threshold: HEALTH_FACTOR_LIQUIDATION_THRESHOLD,
            dust_debt_threshold: 0,
            price_failure_policy: PriceFailurePolicy::Fail,
            treasury: UserId::new("treasury"),
            boost_multipliers: BoostMultiplierTable::default(),
        }
    }
}

impl ProtocolConfig {
    /// Set the close factor (for testing)
    pub fn with_close_factor(mut self, bps: u64) -> Self {
        self.close_factor_bps = bps;
        self
    }

    /// Set the dust waiver threshold (for testing)
    pub fn with_dust_threshold(mut self, threshold: u128) -> Self {
        self.dust_debt_threshold = threshold;
        self
    }

    /// Set the price failure policy
    pub fn with_price_failure_policy(mut self, policy: PriceFailurePolicy) -> Self {
        self.price_failure_policy = policy;
        self
    }

    /// Validate parameter consistency
    pub fn validate(&self) -> bool {
        (self.close_factor_bps as u128) <= PERCENT_FACTOR
            && self.close_factor_bps > 0
            && !self.treasury.is_null()
    }
}
