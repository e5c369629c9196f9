//! Position ledger.
//!
//! The [`TokenLedger`] owns every [`UserReservePosition`] keyed by
//! `(user, asset)` and tracks the total scaled collateral supply per asset.
//! It is pure bookkeeping: interest indices and validation live with the
//! reserves and the pool operations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::position::UserReservePosition;
use crate::error::{Error, Result};
use crate::utils::ids::{AssetId, UserId};
use crate::utils::math::{safe_add, safe_sub};

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Store of all user positions, per-asset scaled collateral supply and
/// underlying wallet balances
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    positions: HashMap<(UserId, AssetId), UserReservePosition>,
    scaled_collateral_supply: HashMap<AssetId, u128>,
    underlying: HashMap<(UserId, AssetId), u128>,
}

impl TokenLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a position, if it exists
    pub fn position(&self, user: &UserId, asset: &AssetId) -> Option<&UserReservePosition> {
        self.positions.get(&(user.clone(), asset.clone()))
    }

    /// Look up a position mutably, creating an empty one on first touch
    pub fn position_mut(&mut self, user: &UserId, asset: &AssetId) -> &mut UserReservePosition {
        self.positions
            .entry((user.clone(), asset.clone()))
            .or_insert_with(|| UserReservePosition::new(user.clone(), asset.clone()))
    }

    /// All assets in which the user holds any position state
    pub fn user_assets(&self, user: &UserId) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self
            .positions
            .iter()
            .filter(|((owner, _), pos)| owner == user && !pos.is_empty())
            .map(|((_, asset), _)| asset.clone())
            .collect();
        assets.sort();
        assets
    }

    /// Whether the user has any outstanding debt in any asset
    pub fn user_has_debt(&self, user: &UserId) -> bool {
        self.positions
            .iter()
            .any(|((owner, _), pos)| owner == user && pos.has_debt())
    }

    /// Total scaled collateral supply of an asset (the mToken supply)
    pub fn scaled_collateral_supply(&self, asset: &AssetId) -> u128 {
        self.scaled_collateral_supply
            .get(asset)
            .copied()
            .unwrap_or(0)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SCALED COLLATERAL MUTATIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Credit scaled collateral to a position and the asset supply
    pub fn mint_scaled_collateral(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        scaled_amount: u128,
    ) -> Result<()> {
        let supply = self.scaled_collateral_supply(asset);
        let new_supply = safe_add(supply, scaled_amount)?;

        let pos = self.position_mut(user, asset);
        pos.scaled_collateral = safe_add(pos.scaled_collateral, scaled_amount)?;
        self.scaled_collateral_supply
            .insert(asset.clone(), new_supply);
        Ok(())
    }

    /// Debit scaled collateral from a position and the asset supply
    pub fn burn_scaled_collateral(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        scaled_amount: u128,
    ) -> Result<()> {
        let pos = self.position_mut(user, asset);
        pos.scaled_collateral =
            pos.scaled_collateral
                .checked_sub(scaled_amount)
                .ok_or(Error::InsufficientBalance {
                    required: scaled_amount,
                    available: pos.scaled_collateral,
                })?;

        let supply = self.scaled_collateral_supply(asset);
        self.scaled_collateral_supply
            .insert(asset.clone(), safe_sub(supply, scaled_amount)?);
        Ok(())
    }

    /// Move scaled collateral between two positions without touching the
    /// asset supply
    pub fn transfer_scaled_collateral(
        &mut self,
        from: &UserId,
        to: &UserId,
        asset: &AssetId,
        scaled_amount: u128,
    ) -> Result<()> {
        let from_pos = self.position_mut(from, asset);
        from_pos.scaled_collateral = from_pos
            .scaled_collateral
            .checked_sub(scaled_amount)
            .ok_or(Error::InsufficientBalance {
                required: scaled_amount,
                available: from_pos.scaled_collateral,
            })?;

        let to_pos = self.position_mut(to, asset);
        to_pos.scaled_collateral = safe_add(to_pos.scaled_collateral, scaled_amount)?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // UNDERLYING WALLET BALANCES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Underlying wallet balance of a user in an asset
    pub fn underlying_balance(&self, user: &UserId, asset: &AssetId) -> u128 {
        self.underlying
            .get(&(user.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Credit underlying tokens to a wallet (external inflow or pool payout)
    pub fn credit_underlying(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<()> {
        let balance = self.underlying_balance(user, asset);
        self.underlying
            .insert((user.clone(), asset.clone()), safe_add(balance, amount)?);
        Ok(())
    }

    /// Debit underlying tokens from a wallet
    pub fn debit_underlying(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        amount: u128,
    ) -> Result<()> {
        let balance = self.underlying_balance(user, asset);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(Error::InsufficientBalance {
                required: amount,
                available: balance,
            })?;
        self.underlying
            .insert((user.clone(), asset.clone()), remaining);
        Ok(())
    }
}
