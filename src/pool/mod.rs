//! The lending pool: owned store of reserves, positions and side ledgers.
//!
//! [`LendingPool`] is plain owned state plus internal bookkeeping helpers the
//! operations and the liquidation engine share. Collaborators that carry
//! behavior rather than state (the price oracle, the interest-rate model) are
//! passed into each call as trait objects so the pool itself stays cloneable;
//! clone-then-commit is how calls stay atomic.

pub mod operations;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::boost::nft::{NftAction, NftBindingRegistry};
use crate::boost::stake::YieldBoostLedger;
use crate::core::config::{ProtocolConfig, ReserveConfig};
use crate::core::reserve::Reserve;
use crate::error::{Error, Result};
use crate::events::{
    CollateralUsageEvent, EventLog, MintedToTreasuryEvent, NftUnlockedEvent, ProtocolEvent,
    ReserveDataUpdatedEvent,
};
use crate::health::{compute_account_data, AccountData};
use crate::ledger::TokenLedger;
use crate::oracle::PriceOracle;
use crate::rates::InterestRateModel;
use crate::utils::ids::{AssetId, UserId};
use crate::utils::math::{ray_div, safe_add};

pub use operations::InterestRateMode;

/// Account holding the pool's own underlying token balances
pub fn pool_account() -> UserId {
    UserId::new("pool")
}

// ═══════════════════════════════════════════════════════════════════════════════
// LENDING POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Owned state of the whole protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingPool {
    /// Protocol-wide parameters
    pub config: ProtocolConfig,
    /// Listed reserves by asset
    pub reserves: HashMap<AssetId, Reserve>,
    /// Positions and token balances
    pub ledger: TokenLedger,
    /// Yield-boost stakes
    pub boost: YieldBoostLedger,
    /// Banker NFT bindings
    pub nft_registry: NftBindingRegistry,
}

impl LendingPool {
    /// Create a pool with no listed reserves. The configuration must pass
    /// [`ProtocolConfig::validate`].
    pub fn new(config: ProtocolConfig) -> Result<Self> {
        if !config.validate() {
            return Err(Error::InvariantViolation(
                "invalid protocol config".into(),
            ));
        }
        Ok(Self {
            config,
            reserves: HashMap::new(),
            ledger: TokenLedger::new(),
            boost: YieldBoostLedger::new(),
            nft_registry: NftBindingRegistry::new(),
        })
    }

    /// List a new reserve
    pub fn list_reserve(&mut self, asset: AssetId, config: ReserveConfig, now: u64) -> Result<()> {
        if asset.is_null() {
            return Err(Error::NullAddress("asset".into()));
        }
        if !config.validate() {
            return Err(Error::InvariantViolation(format!(
                "invalid reserve config for {}",
                asset
            )));
        }
        if self.reserves.contains_key(&asset) {
            return Err(Error::InvariantViolation(format!(
                "reserve {} already listed",
                asset
            )));
        }
        self.reserves
            .insert(asset.clone(), Reserve::new(asset, config, now));
        Ok(())
    }

    /// Look up a listed reserve
    pub fn reserve(&self, asset: &AssetId) -> Result<&Reserve> {
        self.reserves
            .get(asset)
            .ok_or_else(|| Error::ReserveNotListed(asset.to_string()))
    }

    /// Look up a listed reserve mutably
    pub fn reserve_mut(&mut self, asset: &AssetId) -> Result<&mut Reserve> {
        self.reserves
            .get_mut(asset)
            .ok_or_else(|| Error::ReserveNotListed(asset.to_string()))
    }

    /// A reserve that must be listed and active
    pub fn require_active_reserve(&self, asset: &AssetId) -> Result<&Reserve> {
        let reserve = self.reserve(asset)?;
        if !reserve.config.active {
            return Err(Error::ReserveNotActive(asset.to_string()));
        }
        Ok(reserve)
    }

    /// Aggregate account data for a user at `now`
    pub fn account_data(
        &self,
        oracle: &dyn PriceOracle,
        user: &UserId,
        now: u64,
    ) -> Result<AccountData> {
        compute_account_data(&self.reserves, &self.ledger, &self.config, oracle, user, now)
    }

    /// Credit underlying tokens to a user's wallet (external inflow)
    pub fn fund_wallet(&mut self, user: &UserId, asset: &AssetId, amount: u128) -> Result<()> {
        self.ledger.credit_underlying(user, asset, amount)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SNAPSHOTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Serialize the whole pool for snapshotting
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Restore a pool from a snapshot
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Deserialization(e.to_string()))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SHARED BOOKKEEPING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Accrue a reserve to `now` and mint the interest skim to the treasury
    /// at the new liquidity index.
    pub(crate) fn refresh_reserve_state(
        &mut self,
        asset: &AssetId,
        now: u64,
        events: &mut EventLog,
    ) -> Result<()> {
        let treasury = self.config.treasury.clone();
        let reserve = self.reserve_mut(asset)?;
        let update = match reserve.update_state(now)? {
            Some(update) => update,
            None => return Ok(()),
        };

        if update.treasury_accrual > 0 {
            let scaled = ray_div(update.treasury_accrual, update.new_liquidity_index)?;
            if scaled > 0 {
                let was_zero = self
                    .ledger
                    .position(&treasury, asset)
                    .map(|p| p.scaled_collateral == 0)
                    .unwrap_or(true);
                self.ledger.mint_scaled_collateral(&treasury, asset, scaled)?;
                if was_zero {
                    self.set_usage_as_collateral(&treasury, asset, true, now, events);
                }
                events.push(ProtocolEvent::MintedToTreasury(MintedToTreasuryEvent {
                    asset: asset.clone(),
                    amount: update.treasury_accrual,
                    timestamp: now,
                }));
            }
        }
        Ok(())
    }

    /// Apply a liquidity delta, re-derive rates and emit the reserve update
    pub(crate) fn refresh_interest_rates(
        &mut self,
        asset: &AssetId,
        model: &dyn InterestRateModel,
        liquidity_added: u128,
        liquidity_taken: u128,
        now: u64,
        events: &mut EventLog,
    ) -> Result<()> {
        let reserve = self.reserve_mut(asset)?;
        let rates = reserve.update_interest_rates(model, liquidity_added, liquidity_taken)?;
        events.push(ProtocolEvent::ReserveDataUpdated(ReserveDataUpdatedEvent {
            asset: asset.clone(),
            liquidity_rate: rates.liquidity_rate,
            stable_borrow_rate: rates.stable_borrow_rate,
            variable_borrow_rate: rates.variable_borrow_rate,
            liquidity_index: reserve.liquidity_index,
            variable_borrow_index: reserve.variable_borrow_index,
            timestamp: now,
        }));
        Ok(())
    }

    /// Flip a user's usage-as-collateral flag, emitting the transition event
    /// only on an actual change
    pub(crate) fn set_usage_as_collateral(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        enabled: bool,
        now: u64,
        events: &mut EventLog,
    ) {
        let position = self.ledger.position_mut(user, asset);
        if position.usage_as_collateral == enabled {
            return;
        }
        position.usage_as_collateral = enabled;

        let event = CollateralUsageEvent {
            asset: asset.clone(),
            user: user.clone(),
            timestamp: now,
        };
        if enabled {
            events.push(ProtocolEvent::CollateralUsageEnabled(event));
        } else {
            events.push(ProtocolEvent::CollateralUsageDisabled(event));
        }
    }

    /// Recompute the yield-boost stake of one user in one asset from their
    /// current balances. No-op for reserves without yield boost.
    pub(crate) fn refresh_yield_boost(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        now: u64,
        events: &mut EventLog,
    ) -> Result<()> {
        let reserve = self.reserve(asset)?;
        if !reserve.config.yield_boost_enabled {
            return Ok(());
        }

        let base = match self.ledger.position(user, asset) {
            Some(position) => {
                let collateral = position.collateral_balance(reserve.liquidity_index)?;
                let debt = position.total_debt(reserve.variable_borrow_index, now)?;
                safe_add(collateral, debt)?
            }
            None => 0,
        };

        let (tier, action) = self.nft_registry.effective_tier_action(user, asset);
        let multiplier = self.config.boost_multipliers.multiplier_bps(tier, action);
        self.boost
            .refresh_stake(user, asset, base, multiplier, now, events)?;
        Ok(())
    }

    /// Unlock the user's NFT binding when it matches (asset, action) exactly,
    /// emitting the unlock event
    pub(crate) fn unlock_nft_if_match(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        action: NftAction,
        now: u64,
        events: &mut EventLog,
    ) {
        if let Some(binding) = self.nft_registry.unlock_if_match(user, asset, action) {
            events.push(ProtocolEvent::NftUnlocked(NftUnlockedEvent {
                user: user.clone(),
                token_id: binding.token_id,
                timestamp: now,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_reserve_rejects_duplicates() {
        let mut pool = LendingPool::new(ProtocolConfig::default()).unwrap();
        let usdc = AssetId::new("USDC");

        pool.list_reserve(usdc.clone(), ReserveConfig::default(), 0)
            .unwrap();
        assert!(pool.reserve(&usdc).is_ok());

        let err = pool
            .list_reserve(usdc, ReserveConfig::default(), 0)
            .unwrap_err();
        assert!(err.is_critical());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = LendingPool::new(ProtocolConfig::default().with_close_factor(0)).unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[test]
    fn test_unlisted_reserve_errors() {
        let pool = LendingPool::new(ProtocolConfig::default()).unwrap();
        let err = pool.reserve(&AssetId::new("GHOST")).unwrap_err();
        assert!(matches!(err, Error::ReserveNotListed(_)));
    }

    #[test]
    fn test_null_asset_rejected() {
        let mut pool = LendingPool::new(ProtocolConfig::default()).unwrap();
        let err = pool
            .list_reserve(AssetId::null(), ReserveConfig::default(), 0)
            .unwrap_err();
        assert!(matches!(err, Error::NullAddress(_)));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut pool = LendingPool::new(ProtocolConfig::default()).unwrap();
        pool.list_reserve(AssetId::new("USDC"), ReserveConfig::default(), 0)
            .unwrap();
        pool.fund_wallet(&UserId::new("alice"), &AssetId::new("USDC"), 1_000)
            .unwrap();

        let bytes = pool.to_bytes().unwrap();
        let restored = LendingPool::from_bytes(&bytes).unwrap();
        assert!(restored.reserve(&AssetId::new("USDC")).is_ok());
        assert_eq!(
            restored
                .ledger
                .underlying_balance(&UserId::new("alice"), &AssetId::new("USDC")),
            1_000
        );
    }
}
