//! Interest-rate model interface and standard implementations.
//!
//! Rates are per-second, ray-scaled. The default model is a two-slope curve
//! around an optimal utilization point; the flat model pins rates for
//! deterministic tests and fixed-rate deployments.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::constants::{RAY, SECONDS_PER_YEAR};
use crate::utils::math::{percent_mul, ray_div, ray_mul, safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// MODEL INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// Reserve figures the model derives rates from
#[derive(Debug, Clone, Copy)]
pub struct RateInput {
    /// Underlying liquidity held by the reserve after the operation
    pub available_liquidity: u128,
    /// Total stable debt principal
    pub total_stable_debt: u128,
    /// Total variable debt at the current index
    pub total_variable_debt: u128,
    /// Current average stable borrow rate (ray per second)
    pub average_stable_rate: u128,
    /// Share of accrued interest skimmed to the treasury (bps)
    pub reserve_factor_bps: u64,
}

/// Rates produced by the model (all ray per second)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedRates {
    /// Supply-side rate earned by depositors
    pub liquidity_rate: u128,
    /// Rate charged on variable debt
    pub variable_borrow_rate: u128,
    /// Rate offered for new stable debt
    pub stable_borrow_rate: u128,
}

/// Computes reserve rates from post-operation utilization
pub trait InterestRateModel {
    /// Derive the new liquidity, variable and stable rates
    fn calculate_rates(&self, input: &RateInput) -> Result<ComputedRates>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFAULT TWO-SLOPE MODEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Two-slope utilization curve.
///
/// Below `optimal_utilization` rates climb along slope 1; above it they climb
/// along the steeper slope 2. Parameters are annual ray rates; outputs are
/// converted to per-second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultInterestRateModel {
    /// Utilization at the kink (ray)
    pub optimal_utilization: u128,
    /// Variable rate at zero utilization (annual ray)
    pub base_variable_rate: u128,
    /// Variable slope below the kink (annual ray)
    pub variable_slope1: u128,
    /// Variable slope above the kink (annual ray)
    pub variable_slope2: u128,
    /// Stable premium below the kink (annual ray)
    pub stable_slope1: u128,
    /// Stable premium above the kink (annual ray)
    pub stable_slope2: u128,
}

impl Default for DefaultInterestRateModel {
    fn default() -> Self {
        Self {
            optimal_utilization: RAY * 8 / 10, // 80%
            base_variable_rate: 0,
            variable_slope1: RAY * 4 / 100,  // 4%
            variable_slope2: RAY * 75 / 100, // 75%
            stable_slope1: RAY * 2 / 100,    // 2%
            stable_slope2: RAY,              // 100%
        }
    }
}

impl InterestRateModel for DefaultInterestRateModel {
    fn calculate_rates(&self, input: &RateInput) -> Result<ComputedRates> {
        let total_debt = safe_add(input.total_stable_debt, input.total_variable_debt)?;
        if total_debt == 0 {
            return Ok(ComputedRates {
                liquidity_rate: 0,
                variable_borrow_rate: per_second(self.base_variable_rate),
                stable_borrow_rate: per_second(safe_add(
                    self.base_variable_rate,
                    self.stable_slope1,
                )?),
            });
        }

        let utilization = ray_div(
            total_debt,
            safe_add(input.available_liquidity, total_debt)?,
        )?;

        let (variable_annual, stable_annual) = if utilization <= self.optimal_utilization {
            let scaled = ray_div(utilization, self.optimal_utilization)?;
            (
                safe_add(self.base_variable_rate, ray_mul(self.variable_slope1, scaled)?)?,
                safe_add(
                    safe_add(self.base_variable_rate, self.variable_slope1)?,
                    ray_mul(self.stable_slope1, scaled)?,
                )?,
            )
        } else {
            let excess = ray_div(
                safe_sub(utilization, self.optimal_utilization)?,
                safe_sub(RAY, self.optimal_utilization)?,
            )?;
            (
                safe_add(
                    safe_add(self.base_variable_rate, self.variable_slope1)?,
                    ray_mul(self.variable_slope2, excess)?,
                )?,
                safe_add(
                    safe_add(
                        safe_add(self.base_variable_rate, self.variable_slope1)?,
                        self.stable_slope1,
                    )?,
                    ray_mul(self.stable_slope2, excess)?,
                )?,
            )
        };

        // Overall borrow rate weighted across both debt kinds, then the
        // supply side receives it scaled by utilization net of reserve factor.
        let variable_rate = per_second(variable_annual);
        let stable_rate = per_second(stable_annual);

        let weighted = safe_add(
            ray_mul(input.total_variable_debt, variable_rate)?,
            ray_mul(input.total_stable_debt, input.average_stable_rate)?,
        )?;
        let overall_rate = ray_div(weighted, total_debt)?;
        let gross_liquidity = ray_mul(overall_rate, utilization)?;
        let keep_bps = 10_000u64.saturating_sub(input.reserve_factor_bps);
        let liquidity_rate = percent_mul(gross_liquidity, keep_bps)?;

        Ok(ComputedRates {
            liquidity_rate,
            variable_borrow_rate: variable_rate,
            stable_borrow_rate: stable_rate,
        })
    }
}

/// Convert an annual ray rate to per-second
fn per_second(annual: u128) -> u128 {
    annual / SECONDS_PER_YEAR
}

// ═══════════════════════════════════════════════════════════════════════════════
// FLAT MODEL
// ═══════════════════════════════════════════════════════════════════════════════

/// Model returning fixed per-second rates regardless of utilization
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FlatInterestRateModel {
    /// Fixed rates to return
    pub rates: ComputedRates,
}

impl FlatInterestRateModel {
    /// A model with every rate pinned at zero (indices never move)
    pub fn zero() -> Self {
        Self {
            rates: ComputedRates {
                liquidity_rate: 0,
                variable_borrow_rate: 0,
                stable_borrow_rate: 0,
            },
        }
    }

    /// A model with fixed annual rates, converted to per-second
    pub fn annual(liquidity: u128, variable: u128, stable: u128) -> Self {
        Self {
            rates: ComputedRates {
                liquidity_rate: per_second(liquidity),
                variable_borrow_rate: per_second(variable),
                stable_borrow_rate: per_second(stable),
            },
        }
    }
}

impl Default for ComputedRates {
    fn default() -> Self {
        Self {
            liquidity_rate: 0,
            variable_borrow_rate: 0,
            stable_borrow_rate: 0,
        }
    }
}

impl InterestRateModel for FlatInterestRateModel {
    fn calculate_rates(&self, _input: &RateInput) -> Result<ComputedRates> {
        Ok(self.rates)
    }
}
