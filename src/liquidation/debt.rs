//! Debt resolution: close-factor sizing and variable-then-stable payoff.
//!
//! The ordering rule is an invariant: variable debt is always extinguished
//! before any stable debt is touched. Stable burns split the burned amount
//! into principal reduction and the interest accrued since the position's
//! last stable update.

use serde::{Deserialize, Serialize};

use crate::core::position::UserReservePosition;
use crate::core::reserve::Reserve;
use crate::error::{Error, Result};
use crate::events::{EventLog, ProtocolEvent, StableDebtEvent, VariableDebtEvent};
use crate::utils::constants::MAX_AMOUNT;
use crate::utils::math::{percent_mul, ray_div, safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// SIZING
// ═══════════════════════════════════════════════════════════════════════════════

/// Debt actually liquidatable for a request of `debt_to_cover`.
///
/// The close factor caps the take at a share of the combined debt; positions
/// at or below `dust_debt_threshold` (when nonzero) may be taken whole. The
/// `MAX_AMOUNT` sentinel requests the full allowed amount.
pub fn resolve_debt_amount(
    variable_debt: u128,
    stable_debt: u128,
    debt_to_cover: u128,
    close_factor_bps: u64,
    dust_debt_threshold: u128,
) -> Result<u128> {
    let total_debt = safe_add(variable_debt, stable_debt)?;
    if total_debt == 0 {
        return Ok(0);
    }

    let max_liquidatable = if dust_debt_threshold > 0 && total_debt <= dust_debt_threshold {
        total_debt
    } else {
        percent_mul(total_debt, close_factor_bps)?
    };

    if debt_to_cover == MAX_AMOUNT {
        Ok(max_liquidatable)
    } else {
        Ok(debt_to_cover.min(max_liquidatable))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PAYOFF PLAN
// ═══════════════════════════════════════════════════════════════════════════════

/// How a payoff amount distributes across the two debt modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtPayoffPlan {
    /// Amount burned from variable debt
    pub variable_portion: u128,
    /// Amount burned from stable debt
    pub stable_portion: u128,
}

impl DebtPayoffPlan {
    /// Total amount the plan pays off
    pub fn total(&self) -> u128 {
        self.variable_portion + self.stable_portion
    }
}

/// Split `amount` across the user's debt: variable first, stable for the
/// remainder. `amount` must not exceed the combined debt.
pub fn plan_debt_payoff(
    variable_debt: u128,
    stable_debt: u128,
    amount: u128,
) -> Result<DebtPayoffPlan> {
    let total = safe_add(variable_debt, stable_debt)?;
    if amount > total {
        return Err(Error::InvariantViolation(format!(
            "debt payoff {} exceeds combined debt {}",
            amount, total
        )));
    }

    if amount <= variable_debt {
        Ok(DebtPayoffPlan {
            variable_portion: amount,
            stable_portion: 0,
        })
    } else {
        Ok(DebtPayoffPlan {
            variable_portion: variable_debt,
            stable_portion: amount - variable_debt,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BURN
// ═══════════════════════════════════════════════════════════════════════════════

/// Apply a payoff plan to a position and its reserve, emitting debt events.
///
/// The reserve must already be accrued to `now`. A burn covering the whole
/// variable debt zeroes the scaled balance exactly. Stable burns capitalize
/// the accrued interest into the new principal before reducing it, so the
/// position's rate snapshot stays valid.
pub fn burn_debt(
    reserve: &mut Reserve,
    position: &mut UserReservePosition,
    plan: &DebtPayoffPlan,
    now: u64,
    events: &mut EventLog,
) -> Result<()> {
    if plan.variable_portion > 0 {
        let current_variable = position.variable_debt(reserve.variable_borrow_index)?;
        let scaled_burn = if plan.variable_portion >= current_variable {
            position.scaled_variable_debt
        } else {
            ray_div(plan.variable_portion, reserve.variable_borrow_index)?
        };

        position.scaled_variable_debt = safe_sub(position.scaled_variable_debt, scaled_burn)?;
        reserve.total_scaled_variable_debt =
            safe_sub(reserve.total_scaled_variable_debt, scaled_burn)?;

        events.push(ProtocolEvent::VariableDebtBurned(VariableDebtEvent {
            asset: reserve.asset.clone(),
            user: position.user.clone(),
            amount: plan.variable_portion,
            index: reserve.variable_borrow_index,
            timestamp: now,
        }));
    }

    if plan.stable_portion > 0 {
        let current_stable = position.stable_debt(now)?;
        if plan.stable_portion > current_stable {
            return Err(Error::InvariantViolation(format!(
                "stable burn {} exceeds stable debt {}",
                plan.stable_portion, current_stable
            )));
        }
        let interest_accrued = safe_sub(current_stable, position.principal_stable_debt)?;
        let new_principal = safe_sub(current_stable, plan.stable_portion)?;
        let rate = position.stable_rate;

        reserve.remove_stable_debt(position.principal_stable_debt, position.stable_rate)?;
        if new_principal > 0 {
            reserve.add_stable_debt(new_principal, position.stable_rate)?;
            position.principal_stable_debt = new_principal;
            position.last_stable_update = now;
        } else {
            position.principal_stable_debt = 0;
            position.stable_rate = 0;
            position.last_stable_update = now;
        }

        tracing::debug!(
            asset = %reserve.asset,
            user = %position.user,
            burned = plan.stable_portion,
            interest_accrued,
            new_principal,
            "stable debt burned"
        );
        events.push(ProtocolEvent::StableDebtBurned(StableDebtEvent {
            asset: reserve.asset.clone(),
            user: position.user.clone(),
            amount: plan.stable_portion,
            interest_accrued,
            rate,
            timestamp: now,
        }));
    }

    Ok(())
}
