//! Pool operations: deposit, withdraw, borrow, repay.
//!
//! Every operation validates against live state, executes on a working clone
//! and commits the clone on success, so a failure anywhere (including in
//! interest accrual) leaves the pool untouched. Repay shares the
//! variable-then-stable payoff engine with liquidation.

use serde::{Deserialize, Serialize};

use crate::boost::nft::NftAction;
use crate::error::{Error, Result};
use crate::events::{
    CollateralDepositedEvent, CollateralWithdrawnEvent, EventLog, NftBoundEvent, ProtocolEvent,
    StableDebtEvent, UnderlyingTransferredEvent, VariableDebtEvent,
};
use crate::liquidation::debt::{burn_debt, plan_debt_payoff};
use crate::oracle::PriceOracle;
use crate::pool::{pool_account, LendingPool};
use crate::rates::InterestRateModel;
use crate::utils::constants::MAX_AMOUNT;
use crate::utils::ids::{AssetId, UserId};
use crate::utils::math::{ray_div, safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// RATE MODE
// ═══════════════════════════════════════════════════════════════════════════════

/// Which debt mode a borrow opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestRateMode {
    /// Debt accrues at a per-position rate snapshot
    Stable,
    /// Debt accrues with the reserve's variable borrow index
    Variable,
}

impl LendingPool {
    // ═══════════════════════════════════════════════════════════════════════════
    // DEPOSIT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deposit underlying tokens, minting collateral at the current liquidity
    /// index. Presenting an eligible NFT token id opens a Deposit binding.
    pub fn deposit(
        &mut self,
        asset: &AssetId,
        user: &UserId,
        amount: u128,
        nft_token_id: Option<u64>,
        model: &dyn InterestRateModel,
        now: u64,
    ) -> Result<EventLog> {
        if user.is_null() {
            return Err(Error::NullAddress("user".into()));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let reserve = self.require_active_reserve(asset)?;
        if reserve.config.frozen {
            return Err(Error::ReserveFrozen(asset.to_string()));
        }

        let mut working = self.clone();
        let mut events = EventLog::new();

        working.refresh_reserve_state(asset, now, &mut events)?;
        working.ledger.debit_underlying(user, asset, amount)?;
        events.push(ProtocolEvent::UnderlyingTransferred(
            UnderlyingTransferredEvent {
                asset: asset.clone(),
                from: user.clone(),
                to: pool_account(),
                amount,
                timestamp: now,
            },
        ));

        let liquidity_index = working.reserve(asset)?.liquidity_index;
        let scaled = ray_div(amount, liquidity_index)?;
        let was_zero = working
            .ledger
            .position(user, asset)
            .map(|p| p.scaled_collateral == 0)
            .unwrap_or(true);
        working.ledger.mint_scaled_collateral(user, asset, scaled)?;
        events.push(ProtocolEvent::CollateralDeposited(CollateralDepositedEvent {
            asset: asset.clone(),
            user: user.clone(),
            on_behalf_of: user.clone(),
            amount,
            timestamp: now,
        }));
        if was_zero {
            working.set_usage_as_collateral(user, asset, true, now, &mut events);
        }

        if let Some(token_id) = nft_token_id {
            working.bind_nft(user, token_id, asset, NftAction::Deposit, now, &mut events)?;
        }

        working.refresh_interest_rates(asset, model, amount, 0, now, &mut events)?;
        working.refresh_yield_boost(user, asset, now, &mut events)?;

        *self = working;
        Ok(events)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // WITHDRAW
    // ═══════════════════════════════════════════════════════════════════════════

    /// Withdraw collateral back to the underlying. `MAX_AMOUNT` withdraws the
    /// full balance. Returns the amount actually withdrawn.
    pub fn withdraw(
        &mut self,
        asset: &AssetId,
        user: &UserId,
        amount: u128,
        oracle: &dyn PriceOracle,
        model: &dyn InterestRateModel,
        now: u64,
    ) -> Result<(u128, EventLog)> {
        if user.is_null() {
            return Err(Error::NullAddress("user".into()));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        self.require_active_reserve(asset)?;

        let mut working = self.clone();
        let mut events = EventLog::new();

        working.refresh_reserve_state(asset, now, &mut events)?;
        let liquidity_index = working.reserve(asset)?.liquidity_index;

        let (balance, scaled_balance) = working
            .ledger
            .position(user, asset)
            .map(|p| (p.collateral_balance(liquidity_index), p.scaled_collateral))
            .map(|(b, s)| b.map(|b| (b, s)))
            .transpose()?
            .unwrap_or((0, 0));

        let actual = if amount == MAX_AMOUNT { balance } else { amount };
        if actual > balance {
            return Err(Error::InsufficientBalance {
                required: actual,
                available: balance,
            });
        }

        // full withdrawal burns the whole scaled balance, leaving no dust
        let scaled_burn = if actual == balance {
            scaled_balance
        } else {
            ray_div(actual, liquidity_index)?
        };
        working.ledger.burn_scaled_collateral(user, asset, scaled_burn)?;

        let remaining_scaled = working
            .ledger
            .position(user, asset)
            .map(|p| p.scaled_collateral)
            .unwrap_or(0);
        if remaining_scaled == 0 {
            working.set_usage_as_collateral(user, asset, false, now, &mut events);
            working.unlock_nft_if_match(user, asset, NftAction::Deposit, now, &mut events);
        }

        // a borrower cannot withdraw into an unhealthy position
        if working.ledger.user_has_debt(user) {
            let data = working.account_data(oracle, user, now)?;
            if data.health_factor < working.config.health_factor_threshold {
                return Err(Error::HealthFactorTooLow);
            }
        }

        working.refresh_interest_rates(asset, model, 0, actual, now, &mut events)?;
        working.ledger.credit_underlying(user, asset, actual)?;
        events.push(ProtocolEvent::CollateralWithdrawn(CollateralWithdrawnEvent {
            asset: asset.clone(),
            user: user.clone(),
            to: user.clone(),
            amount: actual,
            timestamp: now,
        }));
        events.push(ProtocolEvent::UnderlyingTransferred(
            UnderlyingTransferredEvent {
                asset: asset.clone(),
                from: pool_account(),
                to: user.clone(),
                amount: actual,
                timestamp: now,
            },
        ));
        working.refresh_yield_boost(user, asset, now, &mut events)?;

        *self = working;
        Ok((actual, events))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BORROW
    // ═══════════════════════════════════════════════════════════════════════════

    /// Borrow underlying tokens against collateral, in either rate mode.
    /// Presenting an eligible NFT token id opens a Borrow binding.
    #[allow(clippy::too_many_arguments)]
    pub fn borrow(
        &mut self,
        asset: &AssetId,
        user: &UserId,
        amount: u128,
        mode: InterestRateMode,
        nft_token_id: Option<u64>,
        oracle: &dyn PriceOracle,
        model: &dyn InterestRateModel,
        now: u64,
    ) -> Result<EventLog> {
        if user.is_null() {
            return Err(Error::NullAddress("user".into()));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        let reserve = self.require_active_reserve(asset)?;
        if reserve.config.frozen {
            return Err(Error::ReserveFrozen(asset.to_string()));
        }

        let mut working = self.clone();
        let mut events = EventLog::new();

        working.refresh_reserve_state(asset, now, &mut events)?;

        match mode {
            InterestRateMode::Variable => {
                let reserve = working.reserve_mut(asset)?;
                let index = reserve.variable_borrow_index;
                let scaled = ray_div(amount, index)?;
                reserve.total_scaled_variable_debt =
                    safe_add(reserve.total_scaled_variable_debt, scaled)?;

                let position = working.ledger.position_mut(user, asset);
                position.scaled_variable_debt =
                    safe_add(position.scaled_variable_debt, scaled)?;

                events.push(ProtocolEvent::VariableDebtMinted(VariableDebtEvent {
                    asset: asset.clone(),
                    user: user.clone(),
                    amount,
                    index,
                    timestamp: now,
                }));
            }
            InterestRateMode::Stable => {
                let current_rate = working.reserve(asset)?.current_stable_borrow_rate;
                let position = working.ledger.position_mut(user, asset);
                let old_debt = position.stable_debt(now)?;
                let old_principal = position.principal_stable_debt;
                let old_rate = position.stable_rate;
                let interest_accrued = safe_sub(old_debt, old_principal)?;

                // capitalize accrued interest, then blend the rate snapshot
                let new_principal = safe_add(old_debt, amount)?;
                let new_rate = if old_debt == 0 {
                    current_rate
                } else {
                    (old_debt
                        .checked_mul(old_rate)
                        .and_then(|w| amount.checked_mul(current_rate).map(|n| w + n))
                        .ok_or(Error::Overflow {
                            operation: "stable rate blend".into(),
                        })?)
                        / new_principal
                };
                position.principal_stable_debt = new_principal;
                position.stable_rate = new_rate;
                position.last_stable_update = now;

                let reserve = working.reserve_mut(asset)?;
                reserve.remove_stable_debt(old_principal, old_rate)?;
                reserve.add_stable_debt(new_principal, new_rate)?;

                events.push(ProtocolEvent::StableDebtMinted(StableDebtEvent {
                    asset: asset.clone(),
                    user: user.clone(),
                    amount,
                    interest_accrued,
                    rate: new_rate,
                    timestamp: now,
                }));
            }
        }

        // the new debt must leave the account healthy
        let data = working.account_data(oracle, user, now)?;
        if data.health_factor < working.config.health_factor_threshold {
            return Err(Error::HealthFactorTooLow);
        }

        if let Some(token_id) = nft_token_id {
            working.bind_nft(user, token_id, asset, NftAction::Borrow, now, &mut events)?;
        }

        working.refresh_interest_rates(asset, model, 0, amount, now, &mut events)?;
        working.ledger.credit_underlying(user, asset, amount)?;
        events.push(ProtocolEvent::UnderlyingTransferred(
            UnderlyingTransferredEvent {
                asset: asset.clone(),
                from: pool_account(),
                to: user.clone(),
                amount,
                timestamp: now,
            },
        ));
        working.refresh_yield_boost(user, asset, now, &mut events)?;

        *self = working;
        Ok(events)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REPAY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Repay outstanding debt, variable first then stable. `MAX_AMOUNT`
    /// repays everything. Returns the amount actually repaid.
    pub fn repay(
        &mut self,
        asset: &AssetId,
        user: &UserId,
        amount: u128,
        model: &dyn InterestRateModel,
        now: u64,
    ) -> Result<(u128, EventLog)> {
        if user.is_null() {
            return Err(Error::NullAddress("user".into()));
        }
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        self.require_active_reserve(asset)?;

        let mut working = self.clone();
        let mut events = EventLog::new();

        working.refresh_reserve_state(asset, now, &mut events)?;
        let variable_index = working.reserve(asset)?.variable_borrow_index;

        let (variable_debt, stable_debt) = working
            .ledger
            .position(user, asset)
            .map(|p| -> Result<(u128, u128)> {
                Ok((p.variable_debt(variable_index)?, p.stable_debt(now)?))
            })
            .transpose()?
            .unwrap_or((0, 0));
        let total_debt = safe_add(variable_debt, stable_debt)?;
        if total_debt == 0 {
            return Err(Error::SpecifiedCurrencyNotBorrowedByUser(asset.to_string()));
        }

        let actual = if amount == MAX_AMOUNT {
            total_debt
        } else {
            amount.min(total_debt)
        };

        working.ledger.debit_underlying(user, asset, actual)?;
        events.push(ProtocolEvent::UnderlyingTransferred(
            UnderlyingTransferredEvent {
                asset: asset.clone(),
                from: user.clone(),
                to: pool_account(),
                amount: actual,
                timestamp: now,
            },
        ));

        let plan = plan_debt_payoff(variable_debt, stable_debt, actual)?;
        {
            let mut position = working
                .ledger
                .position(user, asset)
                .cloned()
                .unwrap_or_else(|| {
                    crate::core::position::UserReservePosition::new(user.clone(), asset.clone())
                });
            let reserve = working.reserve_mut(asset)?;
            burn_debt(reserve, &mut position, &plan, now, &mut events)?;
            *working.ledger.position_mut(user, asset) = position;
        }

        let debt_free = working
            .ledger
            .position(user, asset)
            .map(|p| !p.has_debt())
            .unwrap_or(true);
        if debt_free {
            working.unlock_nft_if_match(user, asset, NftAction::Borrow, now, &mut events);
        }

        working.refresh_interest_rates(asset, model, actual, 0, now, &mut events)?;
        working.refresh_yield_boost(user, asset, now, &mut events)?;

        *self = working;
        Ok((actual, events))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // NFT BINDING
    // ═══════════════════════════════════════════════════════════════════════════

    fn bind_nft(
        &mut self,
        user: &UserId,
        token_id: u64,
        asset: &AssetId,
        action: NftAction,
        now: u64,
        events: &mut EventLog,
    ) -> Result<()> {
        let binding = self
            .nft_registry
            .bind(user, token_id, asset, action, now)?;
        events.push(ProtocolEvent::NftBound(NftBoundEvent {
            user: user.clone(),
            token_id,
            tier: binding.tier,
            action: binding.action,
            timestamp: now,
        }));
        Ok(())
    }
}
