//! Per-user, per-asset position state.
//!
//! A [`UserReservePosition`] stores scaled principals; current balances are
//! always derived by combining the principal with the reserve's live indices
//! (never stored). Stable debt compounds at the position's own rate snapshot
//! from its last stable update.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::utils::math::{compounded_interest, ray_mul};
use crate::utils::ids::{AssetId, UserId};

// ═══════════════════════════════════════════════════════════════════════════════
// USER RESERVE POSITION
// ═══════════════════════════════════════════════════════════════════════════════

/// State of one user in one reserve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReservePosition {
    /// Position owner
    pub user: UserId,
    /// Reserve asset
    pub asset: AssetId,
    /// Scaled collateral balance; multiply by the liquidity index for the
    /// current balance
    pub scaled_collateral: u128,
    /// Scaled variable debt; multiply by the variable borrow index for the
    /// current debt
    pub scaled_variable_debt: u128,
    /// Stable debt principal at the last stable update
    pub principal_stable_debt: u128,
    /// Stable rate snapshot (ray per second) taken at the last update
    pub stable_rate: u128,
    /// Timestamp of the last stable-debt update
    pub last_stable_update: u64,
    /// Whether the collateral balance counts toward the health factor
    pub usage_as_collateral: bool,
}

impl UserReservePosition {
    /// Create an empty position
    pub fn new(user: UserId, asset: AssetId) -> Self {
        Self {
            user,
            asset,
            scaled_collateral: 0,
            scaled_variable_debt: 0,
            principal_stable_debt: 0,
            stable_rate: 0,
            last_stable_update: 0,
            usage_as_collateral: false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BALANCE VIEWS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current collateral balance at the given liquidity index
    pub fn collateral_balance(&self, liquidity_index: u128) -> Result<u128> {
        ray_mul(self.scaled_collateral, liquidity_index)
    }

    /// Current variable debt at the given variable borrow index
    pub fn variable_debt(&self, variable_borrow_index: u128) -> Result<u128> {
        ray_mul(self.scaled_variable_debt, variable_borrow_index)
    }

    /// Current stable debt, compounding the principal at the position's
    /// rate snapshot since the last stable update. Never below the
    /// principal: interest only accrues upward between updates.
    pub fn stable_debt(&self, now: u64) -> Result<u128> {
        if self.principal_stable_debt == 0 {
            return Ok(0);
        }
        let elapsed = now.saturating_sub(self.last_stable_update);
        let factor = compounded_interest(self.stable_rate, elapsed)?;
        ray_mul(self.principal_stable_debt, factor)
    }

    /// Combined stable and variable debt
    pub fn total_debt(&self, variable_borrow_index: u128, now: u64) -> Result<u128> {
        Ok(self.variable_debt(variable_borrow_index)? + self.stable_debt(now)?)
    }

    /// Whether the position still holds any balance or debt
    pub fn is_empty(&self) -> bool {
        self.scaled_collateral == 0
            && self.scaled_variable_debt == 0
            && self.principal_stable_debt == 0
    }

    /// Whether the position carries any debt
    pub fn has_debt(&self) -> bool {
        self.scaled_variable_debt > 0 || self.principal_stable_debt > 0
    }
}
