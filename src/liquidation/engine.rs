//! Liquidation orchestration.
//!
//! `liquidation_call` runs the full state machine: validate against live
//! state, resolve the debt amount under the close factor, size and cap the
//! collateral seizure, burn debt, move collateral, apply yield-boost and NFT
//! side effects, and emit the summary event. Execution happens on a working
//! clone committed only on success; `liquidation_dry_run` is the same
//! executor without the commit.

use serde::{Deserialize, Serialize};

use crate::boost::nft::NftAction;
use crate::error::{Error, Result};
use crate::events::{EventLog, LiquidationCallEvent, ProtocolEvent, UnderlyingTransferredEvent};
use crate::health::{calc_debt_needed_for_collateral, calc_max_liquidatable_collateral};
use crate::liquidation::collateral::{split_collateral, transfer_collateral, CollateralDisposition};
use crate::liquidation::debt::{burn_debt, plan_debt_payoff, resolve_debt_amount};
use crate::oracle::PriceOracle;
use crate::pool::{pool_account, LendingPool};
use crate::rates::InterestRateModel;
use crate::utils::ids::{AssetId, UserId};

// ═══════════════════════════════════════════════════════════════════════════════
// PARAMETERS AND OUTCOME
// ═══════════════════════════════════════════════════════════════════════════════

/// Inputs of one liquidation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationParams {
    /// Asset to seize from the borrower
    pub collateral_asset: AssetId,
    /// Asset whose debt the liquidator repays
    pub debt_asset: AssetId,
    /// Borrower under liquidation
    pub borrower: UserId,
    /// Caller paying the debt
    pub liquidator: UserId,
    /// Debt to cover in debt-asset units; `MAX_AMOUNT` takes the most the
    /// close factor allows
    pub debt_to_cover: u128,
    /// Keep the seized collateral as mTokens instead of the underlying
    pub receive_mtoken: bool,
}

/// Result of one liquidation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationOutcome {
    /// Debt actually repaid, in debt-asset units
    pub debt_liquidated: u128,
    /// Collateral actually seized, bonus included, in collateral-asset units
    pub collateral_liquidated: u128,
    /// Portion of the seizure taken as protocol fee
    pub protocol_fee: u128,
    /// What happened to the seized collateral
    pub disposition: CollateralDisposition,
    /// Everything the call did
    pub events: EventLog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Liquidate an unhealthy borrower. Commits only on success; any failure
/// leaves the pool exactly as it was, accrued interest included.
pub fn liquidation_call(
    pool: &mut LendingPool,
    oracle: &dyn PriceOracle,
    model: &dyn InterestRateModel,
    params: &LiquidationParams,
    now: u64,
) -> Result<LiquidationOutcome> {
    let health_factor = validate(pool, oracle, params, now)?;
    let mut working = pool.clone();
    let outcome = execute(&mut working, oracle, model, params, health_factor, now)?;
    *pool = working;
    Ok(outcome)
}

/// Estimate a liquidation without mutating state. Runs the exact executor on
/// a clone and discards it, so the returned tuple and events match what the
/// real call would produce.
pub fn liquidation_dry_run(
    pool: &LendingPool,
    oracle: &dyn PriceOracle,
    model: &dyn InterestRateModel,
    params: &LiquidationParams,
    now: u64,
) -> Result<LiquidationOutcome> {
    let health_factor = validate(pool, oracle, params, now)?;
    let mut working = pool.clone();
    execute(&mut working, oracle, model, params, health_factor, now)
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Check every precondition against live state. Returns the borrower's
/// health factor for the summary event.
fn validate(
    pool: &LendingPool,
    oracle: &dyn PriceOracle,
    params: &LiquidationParams,
    now: u64,
) -> Result<u128> {
    if params.collateral_asset.is_null() {
        return Err(Error::NullAddress("collateral asset".into()));
    }
    if params.debt_asset.is_null() {
        return Err(Error::NullAddress("debt asset".into()));
    }
    pool.require_active_reserve(&params.debt_asset)?;
    let collateral_reserve = pool.require_active_reserve(&params.collateral_asset)?;

    if params.borrower.is_null() {
        return Err(Error::NullAddress("borrower".into()));
    }
    if params.liquidator.is_null() {
        return Err(Error::NullAddress("liquidator".into()));
    }
    if params.debt_to_cover == 0 {
        return Err(Error::InvalidAmount);
    }

    let usage_enabled = pool
        .ledger
        .position(&params.borrower, &params.collateral_asset)
        .map(|p| p.usage_as_collateral)
        .unwrap_or(false);
    if !collateral_reserve.config.collateral_eligible() || !usage_enabled {
        return Err(Error::CollateralCannotBeLiquidated(
            params.collateral_asset.to_string(),
        ));
    }

    let debt_reserve = pool.reserve(&params.debt_asset)?;
    let variable_index = debt_reserve.projected_variable_borrow_index(now)?;
    let has_debt = pool
        .ledger
        .position(&params.borrower, &params.debt_asset)
        .map(|p| -> Result<bool> { Ok(p.total_debt(variable_index, now)? > 0) })
        .transpose()?
        .unwrap_or(false);
    if !has_debt {
        return Err(Error::SpecifiedCurrencyNotBorrowedByUser(
            params.debt_asset.to_string(),
        ));
    }

    let data = pool.account_data(oracle, &params.borrower, now)?;
    if !data.is_liquidatable(pool.config.health_factor_threshold) {
        return Err(Error::HealthFactorNotBelowThreshold {
            health_factor: data.health_factor,
        });
    }
    Ok(data.health_factor)
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXECUTION
// ═══════════════════════════════════════════════════════════════════════════════

fn execute(
    working: &mut LendingPool,
    oracle: &dyn PriceOracle,
    model: &dyn InterestRateModel,
    params: &LiquidationParams,
    health_factor: u128,
    now: u64,
) -> Result<LiquidationOutcome> {
    let mut events = EventLog::new();

    working.refresh_reserve_state(&params.debt_asset, now, &mut events)?;
    if params.collateral_asset != params.debt_asset {
        working.refresh_reserve_state(&params.collateral_asset, now, &mut events)?;
    }

    // debt sizing under the close factor, at the freshly accrued indices
    let variable_index = working.reserve(&params.debt_asset)?.variable_borrow_index;
    let (variable_debt, stable_debt) = working
        .ledger
        .position(&params.borrower, &params.debt_asset)
        .map(|p| -> Result<(u128, u128)> {
            Ok((p.variable_debt(variable_index)?, p.stable_debt(now)?))
        })
        .transpose()?
        .unwrap_or((0, 0));
    let mut actual_debt = resolve_debt_amount(
        variable_debt,
        stable_debt,
        params.debt_to_cover,
        working.config.close_factor_bps,
        working.config.dust_debt_threshold,
    )?;

    let collateral_quote = oracle.asset_price(&params.collateral_asset);
    if !collateral_quote.is_valid {
        return Err(Error::InvalidAssetPrice(params.collateral_asset.to_string()));
    }
    let debt_quote = oracle.asset_price(&params.debt_asset);
    if !debt_quote.is_valid {
        return Err(Error::InvalidAssetPrice(params.debt_asset.to_string()));
    }

    let collateral_config = working.reserve(&params.collateral_asset)?.config.clone();
    let liquidity_index = working.reserve(&params.collateral_asset)?.liquidity_index;

    let entitled_collateral = calc_max_liquidatable_collateral(
        collateral_quote.price,
        collateral_config.decimals,
        debt_quote.price,
        working.reserve(&params.debt_asset)?.config.decimals,
        collateral_config.liquidation_bonus_bps,
        actual_debt,
    )?;

    let borrower_collateral = working
        .ledger
        .position(&params.borrower, &params.collateral_asset)
        .map(|p| p.collateral_balance(liquidity_index))
        .transpose()?
        .unwrap_or(0);

    // never seize more than exists: cap, then back-solve the debt covered
    let actual_collateral = if entitled_collateral > borrower_collateral {
        let capped_debt = calc_debt_needed_for_collateral(
            collateral_quote.price,
            collateral_config.decimals,
            debt_quote.price,
            working.reserve(&params.debt_asset)?.config.decimals,
            collateral_config.liquidation_bonus_bps,
            borrower_collateral,
        )?;
        actual_debt = capped_debt.min(actual_debt);
        tracing::debug!(
            borrower = %params.borrower,
            capped_debt,
            "collateral capped to borrower balance"
        );
        borrower_collateral
    } else {
        entitled_collateral
    };

    // burn debt: variable first, stable for the remainder
    let plan = plan_debt_payoff(variable_debt, stable_debt, actual_debt)?;
    {
        let mut position = working
            .ledger
            .position(&params.borrower, &params.debt_asset)
            .cloned()
            .ok_or_else(|| {
                Error::SpecifiedCurrencyNotBorrowedByUser(params.debt_asset.to_string())
            })?;
        let reserve = working.reserve_mut(&params.debt_asset)?;
        burn_debt(reserve, &mut position, &plan, now, &mut events)?;
        *working
            .ledger
            .position_mut(&params.borrower, &params.debt_asset) = position;
    }

    // the liquidator pays the covered debt into the pool
    working
        .ledger
        .debit_underlying(&params.liquidator, &params.debt_asset, actual_debt)?;
    events.push(ProtocolEvent::UnderlyingTransferred(
        UnderlyingTransferredEvent {
            asset: params.debt_asset.clone(),
            from: params.liquidator.clone(),
            to: pool_account(),
            amount: actual_debt,
            timestamp: now,
        },
    ));
    working.refresh_interest_rates(&params.debt_asset, model, actual_debt, 0, now, &mut events)?;

    // seize collateral
    let split = split_collateral(
        actual_collateral,
        collateral_config.liquidation_protocol_fee_bps,
    )?;
    let disposition = transfer_collateral(
        working,
        &params.collateral_asset,
        &params.borrower,
        &params.liquidator,
        &split,
        params.receive_mtoken,
        model,
        now,
        &mut events,
    )?;

    // NFT unlocks fire only on exact (asset, action) zeroing
    let collateral_zeroed = working
        .ledger
        .position(&params.borrower, &params.collateral_asset)
        .map(|p| p.scaled_collateral == 0)
        .unwrap_or(true);
    if collateral_zeroed {
        working.unlock_nft_if_match(
            &params.borrower,
            &params.collateral_asset,
            NftAction::Deposit,
            now,
            &mut events,
        );
    }
    let debt_zeroed = working
        .ledger
        .position(&params.borrower, &params.debt_asset)
        .map(|p| !p.has_debt())
        .unwrap_or(true);
    if debt_zeroed {
        working.unlock_nft_if_match(
            &params.borrower,
            &params.debt_asset,
            NftAction::Borrow,
            now,
            &mut events,
        );
    }

    // yield-boost stakes follow every balance that moved
    let treasury = working.config.treasury.clone();
    working.refresh_yield_boost(&params.borrower, &params.collateral_asset, now, &mut events)?;
    working.refresh_yield_boost(&params.borrower, &params.debt_asset, now, &mut events)?;
    if disposition == CollateralDisposition::Retained {
        working.refresh_yield_boost(
            &params.liquidator,
            &params.collateral_asset,
            now,
            &mut events,
        )?;
        working.refresh_yield_boost(&treasury, &params.collateral_asset, now, &mut events)?;
    }

    events.push(ProtocolEvent::LiquidationCall(LiquidationCallEvent {
        collateral_asset: params.collateral_asset.clone(),
        debt_asset: params.debt_asset.clone(),
        borrower: params.borrower.clone(),
        liquidator: params.liquidator.clone(),
        debt_covered: actual_debt,
        collateral_seized: actual_collateral,
        protocol_fee: split.protocol_fee,
        receive_mtoken: params.receive_mtoken,
        health_factor,
        timestamp: now,
    }));

    tracing::debug!(
        borrower = %params.borrower,
        debt_covered = actual_debt,
        collateral_seized = actual_collateral,
        ?disposition,
        "liquidation executed"
    );

    Ok(LiquidationOutcome {
        debt_liquidated: actual_debt,
        collateral_liquidated: actual_collateral,
        protocol_fee: split.protocol_fee,
        disposition,
        events,
    })
}
