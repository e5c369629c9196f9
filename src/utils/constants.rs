//! Protocol constants and magic numbers.
//!
//! All protocol-wide constants are defined here for easy auditing and
//! modification.

// ═══════════════════════════════════════════════════════════════════════════════
// FIXED-POINT SCALES
// ═══════════════════════════════════════════════════════════════════════════════

/// Ray scale: 10^27, used for indices, rates and health factors
pub const RAY: u128 = 1_000_000_000_000_000_000_000_000_000;

/// Half a ray, used for half-up rounding
pub const HALF_RAY: u128 = RAY / 2;

/// Percentage scale in basis points (10000 = 100.00%)
pub const PERCENT_FACTOR: u128 = 10_000;

/// Half of the percentage scale, used for half-up rounding
pub const HALF_PERCENT: u128 = PERCENT_FACTOR / 2;

/// Oracle price precision: prices quote the base-currency value of one
/// whole token, scaled by 10^8
pub const PRICE_PRECISION: u128 = 100_000_000;

// ═══════════════════════════════════════════════════════════════════════════════
// TIME
// ═══════════════════════════════════════════════════════════════════════════════

/// Seconds in a year, used to convert annual rates to per-second rates
pub const SECONDS_PER_YEAR: u128 = 31_536_000;

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum share of a position's total debt liquidatable in one call - 50%
pub const LIQUIDATION_CLOSE_FACTOR_BPS: u64 = 5_000;

/// Health factor below which a position becomes liquidatable (1.0 in ray)
pub const HEALTH_FACTOR_LIQUIDATION_THRESHOLD: u128 = RAY;

/// Sentinel health factor for positions with no debt
pub const MAX_HEALTH_FACTOR: u128 = u128::MAX;

/// Sentinel amount meaning "as much as the protocol allows"
pub const MAX_AMOUNT: u128 = u128::MAX;

/// Default liquidation bonus - 105% (liquidator receives a 5% discount)
pub const DEFAULT_LIQUIDATION_BONUS_BPS: u64 = 10_500;

// ═══════════════════════════════════════════════════════════════════════════════
// YIELD BOOST
// ═══════════════════════════════════════════════════════════════════════════════

/// Stake multiplier for users without an NFT binding - 100% (1x)
pub const BOOST_MULTIPLIER_NONE_BPS: u64 = 10_000;

/// Stake multiplier for the Banker tier - 200% (2x)
pub const BOOST_MULTIPLIER_BANKER_BPS: u64 = 20_000;

/// Stake multiplier for the Golden tier - 1000% (10x)
pub const BOOST_MULTIPLIER_GOLDEN_BPS: u64 = 100_000;
