//! Banker NFT bindings and boost multipliers.
//!
//! A user may bind at most one NFT at a time; the binding pins the NFT to a
//! single (asset, action) pair and blocks the token id for anyone else until
//! it unlocks. Unlocking happens only on an exact (asset, action) match when
//! the bound position returns fully to zero, liquidation included.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::constants::{
    BOOST_MULTIPLIER_BANKER_BPS, BOOST_MULTIPLIER_GOLDEN_BPS, BOOST_MULTIPLIER_NONE_BPS,
};
use crate::utils::ids::{AssetId, UserId};

// ═══════════════════════════════════════════════════════════════════════════════
// TIERS AND ACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Boost tier granted by a bound NFT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NftTier {
    /// No boost
    None,
    /// Banker tier
    Banker,
    /// Golden banker tier
    Golden,
}

/// Pool action a binding applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NftAction {
    /// No action
    None,
    /// Boost applies to the deposit (collateral) side
    Deposit,
    /// Boost applies to the borrow (debt) side
    Borrow,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MULTIPLIER TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Stake multipliers in percent bps, keyed by `(tier, action)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostMultiplierTable {
    multipliers: HashMap<(NftTier, NftAction), u64>,
}

impl Default for BoostMultiplierTable {
    fn default() -> Self {
        let mut multipliers = HashMap::new();
        for action in [NftAction::None, NftAction::Deposit, NftAction::Borrow] {
            multipliers.insert((NftTier::None, action), BOOST_MULTIPLIER_NONE_BPS);
        }
        for action in [NftAction::Deposit, NftAction::Borrow] {
            multipliers.insert((NftTier::Banker, action), BOOST_MULTIPLIER_BANKER_BPS);
            multipliers.insert((NftTier::Golden, action), BOOST_MULTIPLIER_GOLDEN_BPS);
        }
        multipliers.insert((NftTier::Banker, NftAction::None), BOOST_MULTIPLIER_NONE_BPS);
        multipliers.insert((NftTier::Golden, NftAction::None), BOOST_MULTIPLIER_NONE_BPS);
        Self { multipliers }
    }
}

impl BoostMultiplierTable {
    /// Multiplier for a tier/action pair; unknown pairs fall back to 1x
    pub fn multiplier_bps(&self, tier: NftTier, action: NftAction) -> u64 {
        self.multipliers
            .get(&(tier, action))
            .copied()
            .unwrap_or(BOOST_MULTIPLIER_NONE_BPS)
    }

    /// Override the multiplier for a tier/action pair
    pub fn set_multiplier(&mut self, tier: NftTier, action: NftAction, bps: u64) {
        self.multipliers.insert((tier, action), bps);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BINDINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// An active NFT binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftBinding {
    /// Binding owner
    pub user: UserId,
    /// Bound NFT token id
    pub token_id: u64,
    /// Asset the boost is pinned to
    pub asset: AssetId,
    /// Boost tier
    pub tier: NftTier,
    /// Action the boost applies to
    pub action: NftAction,
    /// Timestamp the binding was created
    pub bound_at: u64,
}

/// Registry of active bindings, one per user, one per token id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NftBindingRegistry {
    bindings: HashMap<UserId, NftBinding>,
    blocked_tokens: HashSet<u64>,
    token_tiers: HashMap<u64, NftTier>,
}

impl NftBindingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the tier of an NFT token id (collection metadata)
    pub fn register_token(&mut self, token_id: u64, tier: NftTier) {
        self.token_tiers.insert(token_id, tier);
    }

    /// Tier of a token id; unregistered tokens carry no boost
    pub fn token_tier(&self, token_id: u64) -> NftTier {
        self.token_tiers
            .get(&token_id)
            .copied()
            .unwrap_or(NftTier::None)
    }

    /// The user's active binding, if any
    pub fn binding(&self, user: &UserId) -> Option<&NftBinding> {
        self.bindings.get(user)
    }

    /// Whether a token id is currently blocked by an active binding
    pub fn is_blocked(&self, token_id: u64) -> bool {
        self.blocked_tokens.contains(&token_id)
    }

    /// Bind an NFT to a user for one asset/action pair. The tier comes from
    /// the registered token metadata.
    ///
    /// Fails when the user already has a binding, the token id is blocked
    /// by another binding, or the token/action carries no boost.
    pub fn bind(
        &mut self,
        user: &UserId,
        token_id: u64,
        asset: &AssetId,
        action: NftAction,
        now: u64,
    ) -> Result<&NftBinding> {
        let tier = self.token_tier(token_id);
        if tier == NftTier::None || action == NftAction::None {
            return Err(Error::NftTokenNotEligible(token_id));
        }
        if self.blocked_tokens.contains(&token_id) {
            return Err(Error::NftTokenBlocked(token_id));
        }
        if self.bindings.contains_key(user) {
            return Err(Error::NftBindingExists(user.to_string()));
        }

        tracing::debug!(user = %user, token_id, ?tier, ?action, "nft bound");
        self.blocked_tokens.insert(token_id);
        self.bindings.insert(
            user.clone(),
            NftBinding {
                user: user.clone(),
                token_id,
                asset: asset.clone(),
                tier,
                action,
                bound_at: now,
            },
        );
        Ok(&self.bindings[user])
    }

    /// Unlock the user's binding if it matches the given asset and action
    /// exactly. Returns the removed binding; a binding pinned to a different
    /// asset or action stays untouched.
    pub fn unlock_if_match(
        &mut self,
        user: &UserId,
        asset: &AssetId,
        action: NftAction,
    ) -> Option<NftBinding> {
        let matches = self
            .bindings
            .get(user)
            .map(|b| b.asset == *asset && b.action == action)
            .unwrap_or(false);
        if !matches {
            return None;
        }

        let binding = self.bindings.remove(user)?;
        self.blocked_tokens.remove(&binding.token_id);
        tracing::debug!(user = %user, token_id = binding.token_id, "nft unlocked");
        Some(binding)
    }

    /// Tier and action driving the user's stake multiplier for an asset.
    /// Users without a binding for that asset behave like a fresh deposit.
    pub fn effective_tier_action(&self, user: &UserId, asset: &AssetId) -> (NftTier, NftAction) {
        match self.bindings.get(user) {
            Some(b) if b.asset == *asset => (b.tier, b.action),
            _ => (NftTier::None, NftAction::Deposit),
        }
    }
}
