//! Account-level health aggregation and liquidation sizing math.
//!
//! [`compute_account_data`] walks every position of a user, projects reserve
//! indices to the call timestamp and aggregates collateral value, debt value
//! and the collateral-weighted liquidation threshold into a health factor.
//! The sizing helpers convert between debt covered and collateral seized,
//! bonus included, across the two assets' prices and decimals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::config::{PriceFailurePolicy, ProtocolConfig};
use crate::core::reserve::Reserve;
use crate::error::{Error, Result};
use crate::ledger::TokenLedger;
use crate::oracle::PriceOracle;
use crate::utils::constants::MAX_HEALTH_FACTOR;
use crate::utils::ids::{AssetId, UserId};
use crate::utils::math::{
    percent_div, percent_mul, ray_ratio, safe_add, safe_div, safe_mul,
};

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT DATA
// ═══════════════════════════════════════════════════════════════════════════════

/// Aggregate view of one user's account, computed on demand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    /// Collateral value in base-currency units (price precision)
    pub total_collateral_value: u128,
    /// Debt value in base-currency units (price precision)
    pub total_debt_value: u128,
    /// Collateral-weighted average liquidation threshold (bps)
    pub avg_liquidation_threshold_bps: u64,
    /// Health factor (ray); `MAX_HEALTH_FACTOR` when debt-free
    pub health_factor: u128,
    /// False when an invalid price was tolerated under
    /// `PriceFailurePolicy::AssumeUnhealthy`
    pub price_ok: bool,
}

impl AccountData {
    /// Whether the account is liquidatable under the given threshold
    pub fn is_liquidatable(&self, health_factor_threshold: u128) -> bool {
        self.health_factor < health_factor_threshold
    }
}

/// One whole token in native units
fn asset_unit(decimals: u32) -> u128 {
    10u128.pow(decimals)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACCOUNT AGGREGATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Aggregate collateral value, debt value and health factor for a user at
/// `now`, using projected (non-mutating) reserve indices.
///
/// An invalid oracle price on an asset with a relevant nonzero balance either
/// fails the whole computation or zeroes the health factor, depending on
/// `ProtocolConfig::price_failure_policy`.
pub fn compute_account_data(
    reserves: &HashMap<AssetId, Reserve>,
    ledger: &TokenLedger,
    config: &ProtocolConfig,
    oracle: &dyn PriceOracle,
    user: &UserId,
    now: u64,
) -> Result<AccountData> {
    let mut total_collateral_value: u128 = 0;
    let mut total_debt_value: u128 = 0;
    let mut weighted_threshold: u128 = 0;

    for asset in ledger.user_assets(user) {
        let reserve = reserves
            .get(&asset)
            .ok_or_else(|| Error::ReserveNotListed(asset.to_string()))?;
        let position = match ledger.position(user, &asset) {
            Some(p) => p,
            None => continue,
        };

        let liquidity_index = reserve.projected_liquidity_index(now)?;
        let variable_index = reserve.projected_variable_borrow_index(now)?;

        let counts_as_collateral =
            position.usage_as_collateral && reserve.config.collateral_eligible();
        let collateral_balance = if counts_as_collateral {
            position.collateral_balance(liquidity_index)?
        } else {
            0
        };
        let debt = position.total_debt(variable_index, now)?;

        if collateral_balance == 0 && debt == 0 {
            continue;
        }

        let quote = oracle.asset_price(&asset);
        if !quote.is_valid {
            match config.price_failure_policy {
                PriceFailurePolicy::Fail => {
                    return Err(Error::InvalidAssetPrice(asset.to_string()));
                }
                PriceFailurePolicy::AssumeUnhealthy => {
                    tracing::warn!(asset = %asset, user = %user, "invalid price, assuming unhealthy");
                    return Ok(AccountData {
                        total_collateral_value: 0,
                        total_debt_value: 0,
                        avg_liquidation_threshold_bps: 0,
                        health_factor: 0,
                        price_ok: false,
                    });
                }
            }
        }

        let unit = asset_unit(reserve.config.decimals);
        if collateral_balance > 0 {
            let value = safe_div(safe_mul(collateral_balance, quote.price)?, unit)?;
            total_collateral_value = safe_add(total_collateral_value, value)?;
            weighted_threshold = safe_add(
                weighted_threshold,
                safe_mul(value, reserve.config.liquidation_threshold_bps as u128)?,
            )?;
        }
        if debt > 0 {
            let value = safe_div(safe_mul(debt, quote.price)?, unit)?;
            total_debt_value = safe_add(total_debt_value, value)?;
        }
    }

    let avg_liquidation_threshold_bps = if total_collateral_value > 0 {
        (weighted_threshold / total_collateral_value) as u64
    } else {
        0
    };

    let health_factor = if total_debt_value == 0 {
        MAX_HEALTH_FACTOR
    } else {
        ray_ratio(
            percent_mul(total_collateral_value, avg_liquidation_threshold_bps)?,
            total_debt_value,
        )?
    };

    Ok(AccountData {
        total_collateral_value,
        total_debt_value,
        avg_liquidation_threshold_bps,
        health_factor,
        price_ok: true,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION SIZING
// ═══════════════════════════════════════════════════════════════════════════════

/// Collateral amount, bonus included, a liquidator is entitled to for
/// covering `debt_to_cover` of debt:
/// `debt_to_cover * debt_price * bonus% / collateral_price`, converted
/// between the two assets' native units.
pub fn calc_max_liquidatable_collateral(
    collateral_price: u128,
    collateral_decimals: u32,
    debt_price: u128,
    debt_decimals: u32,
    liquidation_bonus_bps: u64,
    debt_to_cover: u128,
) -> Result<u128> {
    let debt_value = safe_mul(debt_to_cover, debt_price)?;
    let boosted = percent_mul(debt_value, liquidation_bonus_bps)?;
    let numerator = safe_mul(boosted, asset_unit(collateral_decimals))?;
    safe_div(
        numerator,
        safe_mul(collateral_price, asset_unit(debt_decimals))?,
    )
}

/// Inverse of [`calc_max_liquidatable_collateral`]: the debt a capped
/// collateral amount justifies covering
pub fn calc_debt_needed_for_collateral(
    collateral_price: u128,
    collateral_decimals: u32,
    debt_price: u128,
    debt_decimals: u32,
    liquidation_bonus_bps: u64,
    collateral_amount: u128,
) -> Result<u128> {
    let collateral_value = safe_mul(collateral_amount, collateral_price)?;
    let numerator = safe_mul(collateral_value, asset_unit(debt_decimals))?;
    let raw = safe_div(
        numerator,
        safe_mul(debt_price, asset_unit(collateral_decimals))?,
    )?;
    percent_div(raw, liquidation_bonus_bps)
}
