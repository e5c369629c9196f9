//! Per-asset reserve accounting.
//!
//! A [`Reserve`] tracks the liquidity index, variable borrow index, current
//! rates and debt totals of one listed asset. `update_state` accrues interest
//! up to a timestamp (idempotently) and computes the treasury skim;
//! `update_interest_rates` re-derives rates from post-operation utilization.
//! Both indices are monotonic non-decreasing; a decrease is an invariant
//! violation.

use serde::{Deserialize, Serialize};

use crate::core::config::ReserveConfig;
use crate::error::{Error, Result};
use crate::rates::{ComputedRates, InterestRateModel, RateInput};
use crate::utils::constants::RAY;
use crate::utils::math::{
    compounded_interest, linear_interest, percent_mul, ray_mul, safe_add, safe_mul, safe_sub,
};
use crate::utils::ids::AssetId;

// ═══════════════════════════════════════════════════════════════════════════════
// STATE UPDATE RESULT
// ═══════════════════════════════════════════════════════════════════════════════

/// Outcome of an interest-accrual step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateUpdate {
    /// Liquidity index before accrual (ray)
    pub prev_liquidity_index: u128,
    /// Liquidity index after accrual (ray)
    pub new_liquidity_index: u128,
    /// Variable borrow index before accrual (ray)
    pub prev_variable_borrow_index: u128,
    /// Variable borrow index after accrual (ray)
    pub new_variable_borrow_index: u128,
    /// Underlying amount of the interest skim owed to the treasury
    pub treasury_accrual: u128,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESERVE
// ═══════════════════════════════════════════════════════════════════════════════

/// Accounting state of one listed asset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reserve {
    /// Asset this reserve tracks
    pub asset: AssetId,
    /// Risk and fee parameters
    pub config: ReserveConfig,
    /// Cumulative supply-side interest index (ray, monotonic)
    pub liquidity_index: u128,
    /// Cumulative variable-debt interest index (ray, monotonic)
    pub variable_borrow_index: u128,
    /// Current supply rate (ray per second)
    pub current_liquidity_rate: u128,
    /// Current variable borrow rate (ray per second)
    pub current_variable_borrow_rate: u128,
    /// Rate offered for new stable debt (ray per second)
    pub current_stable_borrow_rate: u128,
    /// Principal-weighted average rate of outstanding stable debt
    /// (ray per second)
    pub average_stable_borrow_rate: u128,
    /// Sum of stable debt principals
    pub total_principal_stable_debt: u128,
    /// Sum of scaled variable debt balances
    pub total_scaled_variable_debt: u128,
    /// Underlying tokens held by the pool for this reserve
    pub available_liquidity: u128,
    /// Timestamp of the last accrual
    pub last_update_timestamp: u64,
}

impl Reserve {
    /// Create a reserve with fresh (1.0 ray) indices
    pub fn new(asset: AssetId, config: ReserveConfig, now: u64) -> Self {
        Self {
            asset,
            config,
            liquidity_index: RAY,
            variable_borrow_index: RAY,
            current_liquidity_rate: 0,
            current_variable_borrow_rate: 0,
            current_stable_borrow_rate: 0,
            average_stable_borrow_rate: 0,
            total_principal_stable_debt: 0,
            total_scaled_variable_debt: 0,
            available_liquidity: 0,
            last_update_timestamp: now,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PROJECTED INDICES (read-only accrual)
    // ═══════════════════════════════════════════════════════════════════════════

    /// Liquidity index as it would be after accruing to `now`, without
    /// mutating the reserve
    pub fn projected_liquidity_index(&self, now: u64) -> Result<u128> {
        if now == self.last_update_timestamp || self.current_liquidity_rate == 0 {
            return Ok(self.liquidity_index);
        }
        let elapsed = now.saturating_sub(self.last_update_timestamp);
        let factor = linear_interest(self.current_liquidity_rate, elapsed)?;
        ray_mul(self.liquidity_index, factor)
    }

    /// Variable borrow index as it would be after accruing to `now`, without
    /// mutating the reserve
    pub fn projected_variable_borrow_index(&self, now: u64) -> Result<u128> {
        if now == self.last_update_timestamp || self.total_scaled_variable_debt == 0 {
            return Ok(self.variable_borrow_index);
        }
        let elapsed = now.saturating_sub(self.last_update_timestamp);
        let factor = compounded_interest(self.current_variable_borrow_rate, elapsed)?;
        ray_mul(self.variable_borrow_index, factor)
    }

    /// Total variable debt at the projected index
    pub fn total_variable_debt(&self, now: u64) -> Result<u128> {
        ray_mul(
            self.total_scaled_variable_debt,
            self.projected_variable_borrow_index(now)?,
        )
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATE UPDATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Accrue interest up to `now`. Returns `None` when `now` equals the
    /// last update timestamp (idempotent no-op). Advances both indices and
    /// computes the treasury interest skim; the caller mints the returned
    /// `treasury_accrual` as collateral shares at the new liquidity index.
    pub fn update_state(&mut self, now: u64) -> Result<Option<StateUpdate>> {
        if now == self.last_update_timestamp {
            return Ok(None);
        }
        if now < self.last_update_timestamp {
            return Err(Error::InvariantViolation(format!(
                "reserve {} clock moved backwards: {} < {}",
                self.asset, now, self.last_update_timestamp
            )));
        }
        let elapsed = now - self.last_update_timestamp;

        let prev_liquidity_index = self.liquidity_index;
        let prev_variable_borrow_index = self.variable_borrow_index;

        let new_liquidity_index = if self.current_liquidity_rate > 0 {
            ray_mul(
                prev_liquidity_index,
                linear_interest(self.current_liquidity_rate, elapsed)?,
            )?
        } else {
            prev_liquidity_index
        };
        let new_variable_borrow_index = if self.total_scaled_variable_debt > 0 {
            ray_mul(
                prev_variable_borrow_index,
                compounded_interest(self.current_variable_borrow_rate, elapsed)?,
            )?
        } else {
            prev_variable_borrow_index
        };

        if new_liquidity_index < prev_liquidity_index
            || new_variable_borrow_index < prev_variable_borrow_index
        {
            return Err(Error::InvariantViolation(format!(
                "reserve {} index decreased",
                self.asset
            )));
        }

        self.liquidity_index = new_liquidity_index;
        self.variable_borrow_index = new_variable_borrow_index;
        self.last_update_timestamp = now;

        let treasury_accrual = self.accrued_to_treasury(
            prev_variable_borrow_index,
            new_variable_borrow_index,
            elapsed,
        )?;

        tracing::debug!(
            asset = %self.asset,
            liquidity_index = new_liquidity_index,
            variable_borrow_index = new_variable_borrow_index,
            treasury_accrual,
            "reserve state updated"
        );

        Ok(Some(StateUpdate {
            prev_liquidity_index,
            new_liquidity_index,
            prev_variable_borrow_index,
            new_variable_borrow_index,
            treasury_accrual,
        }))
    }

    /// Interest skim: `reserve_factor%` of the debt accrued over the step
    fn accrued_to_treasury(
        &self,
        prev_variable_index: u128,
        new_variable_index: u128,
        elapsed: u64,
    ) -> Result<u128> {
        if self.config.reserve_factor_bps == 0 {
            return Ok(0);
        }

        let prev_variable = ray_mul(self.total_scaled_variable_debt, prev_variable_index)?;
        let new_variable = ray_mul(self.total_scaled_variable_debt, new_variable_index)?;
        let variable_accrued = safe_sub(new_variable, prev_variable)?;

        let stable_accrued = if self.total_principal_stable_debt > 0 {
            let factor = compounded_interest(self.average_stable_borrow_rate, elapsed)?;
            safe_sub(
                ray_mul(self.total_principal_stable_debt, factor)?,
                self.total_principal_stable_debt,
            )?
        } else {
            0
        };

        let total_debt_accrued = safe_add(variable_accrued, stable_accrued)?;
        percent_mul(total_debt_accrued, self.config.reserve_factor_bps)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // RATE UPDATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Apply the liquidity delta of an operation and re-derive rates from
    /// the resulting utilization. Must run after `update_state`.
    pub fn update_interest_rates(
        &mut self,
        model: &dyn InterestRateModel,
        liquidity_added: u128,
        liquidity_taken: u128,
    ) -> Result<ComputedRates> {
        let after_add = safe_add(self.available_liquidity, liquidity_added)?;
        self.available_liquidity =
            after_add
                .checked_sub(liquidity_taken)
                .ok_or(Error::InsufficientLiquidity {
                    required: liquidity_taken,
                    available: after_add,
                })?;

        let total_variable = ray_mul(self.total_scaled_variable_debt, self.variable_borrow_index)?;
        let rates = model.calculate_rates(&RateInput {
            available_liquidity: self.available_liquidity,
            total_stable_debt: self.total_principal_stable_debt,
            total_variable_debt: total_variable,
            average_stable_rate: self.average_stable_borrow_rate,
            reserve_factor_bps: self.config.reserve_factor_bps,
        })?;

        self.current_liquidity_rate = rates.liquidity_rate;
        self.current_variable_borrow_rate = rates.variable_borrow_rate;
        self.current_stable_borrow_rate = rates.stable_borrow_rate;

        Ok(rates)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STABLE DEBT BOOKKEEPING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Fold newly minted stable principal into the average stable rate.
    /// Weights are raw `principal * rate` products; per-second ray rates are
    /// far below RAY, so ray-scaled products would truncate to zero.
    pub fn add_stable_debt(&mut self, principal: u128, rate: u128) -> Result<()> {
        let prev_total = self.total_principal_stable_debt;
        let new_total = safe_add(prev_total, principal)?;
        if new_total == 0 {
            return Ok(());
        }
        let weighted = safe_add(
            safe_mul(prev_total, self.average_stable_borrow_rate)?,
            safe_mul(principal, rate)?,
        )?;
        self.average_stable_borrow_rate = weighted / new_total;
        self.total_principal_stable_debt = new_total;
        Ok(())
    }

    /// Remove burned stable principal from the average stable rate.
    /// `rate` is the burned position's rate snapshot.
    pub fn remove_stable_debt(&mut self, principal: u128, rate: u128) -> Result<()> {
        let prev_total = self.total_principal_stable_debt;
        let new_total = prev_total.saturating_sub(principal);
        if new_total == 0 {
            self.average_stable_borrow_rate = 0;
            self.total_principal_stable_debt = 0;
            return Ok(());
        }
        let prev_weighted = safe_mul(prev_total, self.average_stable_borrow_rate)?;
        let removed = safe_mul(principal.min(prev_total), rate)?;
        // rounding can leave the removed weight a hair above the total
        let weighted = prev_weighted.saturating_sub(removed);
        self.average_stable_borrow_rate = weighted / new_total;
        self.total_principal_stable_debt = new_total;
        Ok(())
    }
}
