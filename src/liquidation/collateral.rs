//! Collateral seizure: protocol-fee split and the two disposition paths.
//!
//! Seized collateral either stays inside the pool as mTokens moved from the
//! borrower to liquidator and treasury (`Retained`), or is burned with the
//! underlying paid out (`Released`). Only the released path drains available
//! liquidity, so only it re-derives interest rates.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::events::{
    CollateralBurnedEvent, CollateralTransferredEvent, EventLog, ProtocolEvent,
    UnderlyingTransferredEvent,
};
use crate::pool::{pool_account, LendingPool};
use crate::rates::InterestRateModel;
use crate::utils::ids::{AssetId, UserId};
use crate::utils::math::{percent_mul, ray_div, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// FEE SPLIT
// ═══════════════════════════════════════════════════════════════════════════════

/// How seized collateral divides between liquidator and treasury
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralSplit {
    /// Total collateral seized
    pub total: u128,
    /// Portion paid to the liquidator
    pub liquidator_amount: u128,
    /// Portion taken as protocol fee
    pub protocol_fee: u128,
}

/// Split a seizure into liquidator and treasury portions. The two portions
/// always sum exactly to the total.
pub fn split_collateral(total: u128, protocol_fee_bps: u64) -> Result<CollateralSplit> {
    let protocol_fee = percent_mul(total, protocol_fee_bps)?;
    let liquidator_amount = safe_sub(total, protocol_fee)?;
    Ok(CollateralSplit {
        total,
        liquidator_amount,
        protocol_fee,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPOSITION
// ═══════════════════════════════════════════════════════════════════════════════

/// What happened to the seized collateral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollateralDisposition {
    /// Scaled balances moved inside the pool; liquidity unchanged
    Retained,
    /// Collateral burned and the underlying paid out; liquidity decreased
    Released,
}

/// Execute a collateral seizure on an already-accrued collateral reserve.
///
/// `receive_mtoken` picks the path. The borrower's usage-as-collateral flag
/// clears when their balance reaches exactly zero; a full seizure burns the
/// entire scaled balance so no dust survives rounding.
#[allow(clippy::too_many_arguments)]
pub fn transfer_collateral(
    pool: &mut LendingPool,
    collateral_asset: &AssetId,
    borrower: &UserId,
    liquidator: &UserId,
    split: &CollateralSplit,
    receive_mtoken: bool,
    model: &dyn InterestRateModel,
    now: u64,
    events: &mut EventLog,
) -> Result<CollateralDisposition> {
    let treasury = pool.config.treasury.clone();
    let reserve = pool.reserve(collateral_asset)?;
    let liquidity_index = reserve.liquidity_index;

    let borrower_scaled = pool
        .ledger
        .position(borrower, collateral_asset)
        .map(|p| p.scaled_collateral)
        .unwrap_or(0);
    let borrower_balance = pool
        .ledger
        .position(borrower, collateral_asset)
        .map(|p| p.collateral_balance(liquidity_index))
        .transpose()?
        .unwrap_or(0);
    if split.total > borrower_balance {
        return Err(Error::InsufficientCollateral {
            required: split.total,
            available: borrower_balance,
        });
    }

    // full seizure takes the whole scaled balance, never leaving rounding dust
    let scaled_total = if split.total == borrower_balance {
        borrower_scaled
    } else {
        ray_div(split.total, liquidity_index)?
    };
    let scaled_fee = ray_div(split.protocol_fee, liquidity_index)?.min(scaled_total);
    let scaled_liquidator = safe_sub(scaled_total, scaled_fee)?;

    let disposition = if receive_mtoken {
        for (recipient, scaled, amount) in [
            (liquidator, scaled_liquidator, split.liquidator_amount),
            (&treasury, scaled_fee, split.protocol_fee),
        ] {
            if scaled == 0 {
                continue;
            }
            let was_zero = pool
                .ledger
                .position(recipient, collateral_asset)
                .map(|p| p.scaled_collateral == 0)
                .unwrap_or(true);
            pool.ledger
                .transfer_scaled_collateral(borrower, recipient, collateral_asset, scaled)?;
            if was_zero {
                pool.set_usage_as_collateral(recipient, collateral_asset, true, now, events);
            }
            events.push(ProtocolEvent::CollateralTransferred(
                CollateralTransferredEvent {
                    asset: collateral_asset.clone(),
                    from: borrower.clone(),
                    to: recipient.clone(),
                    amount,
                    timestamp: now,
                },
            ));
        }
        CollateralDisposition::Retained
    } else {
        pool.ledger
            .burn_scaled_collateral(borrower, collateral_asset, scaled_total)?;
        events.push(ProtocolEvent::CollateralBurned(CollateralBurnedEvent {
            asset: collateral_asset.clone(),
            user: borrower.clone(),
            amount: split.total,
            timestamp: now,
        }));

        // liquidity leaves the pool, so rates must follow
        pool.refresh_interest_rates(collateral_asset, model, 0, split.total, now, events)?;

        for (recipient, amount) in [
            (liquidator, split.liquidator_amount),
            (&treasury, split.protocol_fee),
        ] {
            if amount == 0 {
                continue;
            }
            pool.ledger.credit_underlying(recipient, collateral_asset, amount)?;
            events.push(ProtocolEvent::UnderlyingTransferred(
                UnderlyingTransferredEvent {
                    asset: collateral_asset.clone(),
                    from: pool_account(),
                    to: recipient.clone(),
                    amount,
                    timestamp: now,
                },
            ));
        }
        CollateralDisposition::Released
    };

    let remaining = pool
        .ledger
        .position(borrower, collateral_asset)
        .map(|p| p.scaled_collateral)
        .unwrap_or(0);
    if remaining == 0 {
        pool.set_usage_as_collateral(borrower, collateral_asset, false, now, events);
    }

    Ok(disposition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ProtocolConfig, ReserveConfig};
    use crate::rates::FlatInterestRateModel;
    use proptest::prelude::*;

    fn setup() -> (LendingPool, AssetId, UserId, UserId) {
        let mut pool = LendingPool::new(ProtocolConfig::default()).unwrap();
        let meld = AssetId::new("MELD");
        pool.list_reserve(
            meld.clone(),
            ReserveConfig::default().with_decimals(6),
            0,
        )
        .unwrap();
        (pool, meld, UserId::new("borrower"), UserId::new("liq"))
    }

    fn seed_collateral(pool: &mut LendingPool, asset: &AssetId, user: &UserId, amount: u128) {
        pool.ledger.mint_scaled_collateral(user, asset, amount).unwrap();
        pool.ledger.position_mut(user, asset).usage_as_collateral = true;
        pool.reserve_mut(asset).unwrap().available_liquidity = amount;
    }

    #[test]
    fn test_split_conserves_total() {
        let split = split_collateral(315_000_000, 1_000).unwrap();
        assert_eq!(split.protocol_fee, 31_500_000);
        assert_eq!(split.liquidator_amount, 283_500_000);
        assert_eq!(split.liquidator_amount + split.protocol_fee, split.total);
    }

    #[test]
    fn test_zero_fee_goes_entirely_to_liquidator() {
        let split = split_collateral(315_000_000, 0).unwrap();
        assert_eq!(split.protocol_fee, 0);
        assert_eq!(split.liquidator_amount, 315_000_000);
    }

    #[test]
    fn test_retained_path_moves_mtokens() {
        let (mut pool, meld, borrower, liq) = setup();
        seed_collateral(&mut pool, &meld, &borrower, 1_000_000_000);
        let supply_before = pool.ledger.scaled_collateral_supply(&meld);
        let liquidity_before = pool.reserve(&meld).unwrap().available_liquidity;

        let split = split_collateral(315_000_000, 1_000).unwrap();
        let mut events = EventLog::new();
        let disposition = transfer_collateral(
            &mut pool,
            &meld,
            &borrower,
            &liq,
            &split,
            true,
            &FlatInterestRateModel::zero(),
            10,
            &mut events,
        )
        .unwrap();

        assert_eq!(disposition, CollateralDisposition::Retained);
        // supply and pool liquidity untouched
        assert_eq!(pool.ledger.scaled_collateral_supply(&meld), supply_before);
        assert_eq!(pool.reserve(&meld).unwrap().available_liquidity, liquidity_before);
        // liquidator flag enabled on zero->nonzero
        assert!(pool.ledger.position(&liq, &meld).unwrap().usage_as_collateral);
        assert_eq!(events.filter_by_type("CollateralUsageEnabled").len(), 2);
        assert_eq!(events.filter_by_type("CollateralTransferred").len(), 2);
        assert_eq!(
            pool.ledger.position(&liq, &meld).unwrap().scaled_collateral,
            283_500_000
        );
    }

    #[test]
    fn test_released_path_burns_and_pays_out() {
        let (mut pool, meld, borrower, liq) = setup();
        seed_collateral(&mut pool, &meld, &borrower, 1_000_000_000);

        let split = split_collateral(315_000_000, 1_000).unwrap();
        let mut events = EventLog::new();
        let disposition = transfer_collateral(
            &mut pool,
            &meld,
            &borrower,
            &liq,
            &split,
            false,
            &FlatInterestRateModel::zero(),
            10,
            &mut events,
        )
        .unwrap();

        assert_eq!(disposition, CollateralDisposition::Released);
        assert_eq!(
            pool.ledger.underlying_balance(&liq, &meld),
            283_500_000
        );
        assert_eq!(
            pool.ledger
                .underlying_balance(&pool.config.treasury, &meld),
            31_500_000
        );
        // available liquidity dropped by the full seizure
        assert_eq!(
            pool.reserve(&meld).unwrap().available_liquidity,
            1_000_000_000 - 315_000_000
        );
        assert_eq!(events.filter_by_type("CollateralBurned").len(), 1);
        assert_eq!(events.filter_by_type("ReserveDataUpdated").len(), 1);
    }

    #[test]
    fn test_full_seizure_clears_flag_exactly() {
        let (mut pool, meld, borrower, liq) = setup();
        seed_collateral(&mut pool, &meld, &borrower, 500_000_000);

        let split = split_collateral(500_000_000, 1_000).unwrap();
        let mut events = EventLog::new();
        transfer_collateral(
            &mut pool,
            &meld,
            &borrower,
            &liq,
            &split,
            true,
            &FlatInterestRateModel::zero(),
            10,
            &mut events,
        )
        .unwrap();

        let position = pool.ledger.position(&borrower, &meld).unwrap();
        assert_eq!(position.scaled_collateral, 0);
        assert!(!position.usage_as_collateral);
        assert_eq!(events.filter_by_type("CollateralUsageDisabled").len(), 1);
    }

    #[test]
    fn test_seizure_beyond_balance_rejected() {
        let (mut pool, meld, borrower, liq) = setup();
        seed_collateral(&mut pool, &meld, &borrower, 100_000_000);

        let split = split_collateral(100_000_001, 1_000).unwrap();
        let mut events = EventLog::new();
        let err = transfer_collateral(
            &mut pool,
            &meld,
            &borrower,
            &liq,
            &split,
            true,
            &FlatInterestRateModel::zero(),
            10,
            &mut events,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InsufficientCollateral { .. }));
    }

    proptest! {
        #[test]
        fn prop_split_conservation(total in 0u128..1_000_000_000_000u128,
                                   fee_bps in 0u64..=10_000u64) {
            let split = split_collateral(total, fee_bps).unwrap();
            prop_assert_eq!(split.liquidator_amount + split.protocol_fee, split.total);
            prop_assert!(split.protocol_fee <= total);
        }
    }
}
