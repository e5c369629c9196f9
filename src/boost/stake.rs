//! Yield-boost stake ledger.
//!
//! Stakes mirror pool balances: after every balance-affecting event the stake
//! for (user, asset) is recomputed as `balance * multiplier` and pushed here.
//! The reward stream itself lives outside the pool; this ledger only tracks
//! stake sizes and flushes pending rewards when a position closes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::{
    EventLog, ProtocolEvent, StakeAmountRefreshedEvent, StakePositionEvent,
    StakeRewardsClaimedEvent,
};
use crate::utils::ids::{AssetId, UserId};
use crate::utils::math::{percent_mul, safe_add};

// ═══════════════════════════════════════════════════════════════════════════════
// STAKE POSITION
// ═══════════════════════════════════════════════════════════════════════════════

/// One yield-boost stake for a (user, asset) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    /// Stake owner
    pub user: UserId,
    /// Staked reserve asset
    pub asset: AssetId,
    /// Boosted stake amount (balance times multiplier)
    pub amount: u128,
    /// Rewards credited by the external reward stream, flushed on close
    pub pending_rewards: u128,
    /// Timestamp of the last refresh
    pub last_update: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// YIELD BOOST LEDGER
// ═══════════════════════════════════════════════════════════════════════════════

/// Ledger of all yield-boost stakes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct YieldBoostLedger {
    stakes: HashMap<(UserId, AssetId), StakePosition>,
}

impl YieldBoostLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Current boosted stake for a (user, asset) pair
    pub fn stake_amount(&self, user: &UserId, asset: &AssetId) -> u128 {
        self.stakes
            .get(&(user.clone(), asset.clone()))
            .map(|s| s.amount)
            .unwrap_or(0)
    }

    /// The full stake position, if one exists
    pub fn position(&self, user: &UserId, asset: &AssetId) -> Option<&StakePosition> {
        self.stakes.get(&(user.clone(), asset.clone()))
    }

    /// Credit rewards from the external reward stream onto an open position.
    /// Rewards on a closed position are not representable and are dropped.
    pub fn accrue_rewards(&mut self, user: &UserId, asset: &AssetId, rewards: u128) -> Result<()> {
        if let Some(pos) = self.stakes.get_mut(&(user.clone(), asset.clone())) {
            pos.pending_rewards = safe_add(pos.pending_rewards, rewards)?;
        }
        Ok(())
    }

    /// Recompute the stake for a (user, asset) pair from its base balance and
    /// multiplier, emitting created / updated / removed transitions and always
    /// a refresh notification.
    ///
    /// Returns the rewards flushed if the position closed.
    pub fn refresh_stake(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        base_amount: u128,
        multiplier_bps: u64,
        now: u64,
        events: &mut EventLog,
    ) -> Result<u128> {
        let boosted = percent_mul(base_amount, multiplier_bps)?;
        let key = (user.clone(), asset.clone());
        let old = self.stakes.get(&key).map(|s| s.amount).unwrap_or(0);

        let mut rewards_claimed = 0;
        if old == 0 && boosted > 0 {
            self.stakes.insert(
                key,
                StakePosition {
                    user: user.clone(),
                    asset: asset.clone(),
                    amount: boosted,
                    pending_rewards: 0,
                    last_update: now,
                },
            );
            tracing::debug!(user = %user, asset = %asset, amount = boosted, "stake created");
            events.push(ProtocolEvent::StakePositionCreated(StakePositionEvent {
                user: user.clone(),
                asset: asset.clone(),
                stake_amount: boosted,
                timestamp: now,
            }));
        } else if old > 0 && boosted == 0 {
            // close flushes whatever the reward stream credited
            let closed = self.stakes.remove(&key).unwrap_or(StakePosition {
                user: user.clone(),
                asset: asset.clone(),
                amount: 0,
                pending_rewards: 0,
                last_update: now,
            });
            if closed.pending_rewards > 0 {
                rewards_claimed = closed.pending_rewards;
                events.push(ProtocolEvent::StakeRewardsClaimed(StakeRewardsClaimedEvent {
                    user: user.clone(),
                    asset: asset.clone(),
                    rewards: rewards_claimed,
                    timestamp: now,
                }));
            }
            tracing::debug!(user = %user, asset = %asset, rewards_claimed, "stake removed");
            events.push(ProtocolEvent::StakePositionRemoved(StakePositionEvent {
                user: user.clone(),
                asset: asset.clone(),
                stake_amount: 0,
                timestamp: now,
            }));
        } else if old > 0 && boosted != old {
            if let Some(pos) = self.stakes.get_mut(&key) {
                pos.amount = boosted;
                pos.last_update = now;
            }
            events.push(ProtocolEvent::StakePositionUpdated(StakePositionEvent {
                user: user.clone(),
                asset: asset.clone(),
                stake_amount: boosted,
                timestamp: now,
            }));
        }

        events.push(ProtocolEvent::StakeAmountRefreshed(StakeAmountRefreshedEvent {
            user: user.clone(),
            asset: asset.clone(),
            previous_amount: old,
            new_amount: boosted,
            timestamp: now,
        }));
        Ok(rewards_claimed)
    }
}
