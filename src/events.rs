//! Protocol events for state change notifications.
//!
//! Every state-changing operation appends typed events to an [`EventLog`],
//! letting callers audit exactly what a call did. Dry runs produce the same
//! events as the real execution without committing state.

use serde::{Deserialize, Serialize};

use crate::boost::nft::{NftAction, NftTier};
use crate::error::{Error, Result};
use crate::utils::ids::{AssetId, UserId};

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// All protocol event types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProtocolEvent {
    // Reserve events
    /// Reserve indices and rates were refreshed
    ReserveDataUpdated(ReserveDataUpdatedEvent),
    /// Reserve-factor interest was minted to the treasury
    MintedToTreasury(MintedToTreasuryEvent),

    // Collateral (mToken) events
    /// Collateral was deposited
    CollateralDeposited(CollateralDepositedEvent),
    /// Collateral was withdrawn to the underlying asset
    CollateralWithdrawn(CollateralWithdrawnEvent),
    /// Collateral moved between users without leaving the pool
    CollateralTransferred(CollateralTransferredEvent),
    /// Collateral was burned and the underlying released
    CollateralBurned(CollateralBurnedEvent),
    /// A balance started counting toward the health factor
    CollateralUsageEnabled(CollateralUsageEvent),
    /// A balance stopped counting toward the health factor
    CollateralUsageDisabled(CollateralUsageEvent),

    // Debt events
    /// Variable debt was minted
    VariableDebtMinted(VariableDebtEvent),
    /// Variable debt was burned
    VariableDebtBurned(VariableDebtEvent),
    /// Stable debt was minted
    StableDebtMinted(StableDebtEvent),
    /// Stable debt was burned
    StableDebtBurned(StableDebtEvent),

    // Underlying asset movements
    /// Underlying tokens moved in or out of the pool
    UnderlyingTransferred(UnderlyingTransferredEvent),

    // Yield boost events
    /// A stake position was opened
    StakePositionCreated(StakePositionEvent),
    /// A stake position changed size
    StakePositionUpdated(StakePositionEvent),
    /// A stake position was closed
    StakePositionRemoved(StakePositionEvent),
    /// Pending stake rewards were claimed on position close
    StakeRewardsClaimed(StakeRewardsClaimedEvent),
    /// A stake was recomputed from the user's balances
    StakeAmountRefreshed(StakeAmountRefreshedEvent),

    // NFT binding events
    /// An NFT was bound to a user for boosted multipliers
    NftBound(NftBoundEvent),
    /// A bound NFT was unlocked back to its owner
    NftUnlocked(NftUnlockedEvent),

    // Liquidation events
    /// A borrower was liquidated
    LiquidationCall(LiquidationCallEvent),
}

impl ProtocolEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ReserveDataUpdated(_) => "ReserveDataUpdated",
            Self::MintedToTreasury(_) => "MintedToTreasury",
            Self::CollateralDeposited(_) => "CollateralDeposited",
            Self::CollateralWithdrawn(_) => "CollateralWithdrawn",
            Self::CollateralTransferred(_) => "CollateralTransferred",
            Self::CollateralBurned(_) => "CollateralBurned",
            Self::CollateralUsageEnabled(_) => "CollateralUsageEnabled",
            Self::CollateralUsageDisabled(_) => "CollateralUsageDisabled",
            Self::VariableDebtMinted(_) => "VariableDebtMinted",
            Self::VariableDebtBurned(_) => "VariableDebtBurned",
            Self::StableDebtMinted(_) => "StableDebtMinted",
            Self::StableDebtBurned(_) => "StableDebtBurned",
            Self::UnderlyingTransferred(_) => "UnderlyingTransferred",
            Self::StakePositionCreated(_) => "StakePositionCreated",
            Self::StakePositionUpdated(_) => "StakePositionUpdated",
            Self::StakePositionRemoved(_) => "StakePositionRemoved",
            Self::StakeRewardsClaimed(_) => "StakeRewardsClaimed",
            Self::StakeAmountRefreshed(_) => "StakeAmountRefreshed",
            Self::NftBound(_) => "NftBound",
            Self::NftUnlocked(_) => "NftUnlocked",
            Self::LiquidationCall(_) => "LiquidationCall",
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::ReserveDataUpdated(e) => e.timestamp,
            Self::MintedToTreasury(e) => e.timestamp,
            Self::CollateralDeposited(e) => e.timestamp,
            Self::CollateralWithdrawn(e) => e.timestamp,
            Self::CollateralTransferred(e) => e.timestamp,
            Self::CollateralBurned(e) => e.timestamp,
            Self::CollateralUsageEnabled(e) => e.timestamp,
            Self::CollateralUsageDisabled(e) => e.timestamp,
            Self::VariableDebtMinted(e) => e.timestamp,
            Self::VariableDebtBurned(e) => e.timestamp,
            Self::StableDebtMinted(e) => e.timestamp,
            Self::StableDebtBurned(e) => e.timestamp,
            Self::UnderlyingTransferred(e) => e.timestamp,
            Self::StakePositionCreated(e) => e.timestamp,
            Self::StakePositionUpdated(e) => e.timestamp,
            Self::StakePositionRemoved(e) => e.timestamp,
            Self::StakeRewardsClaimed(e) => e.timestamp,
            Self::StakeAmountRefreshed(e) => e.timestamp,
            Self::NftBound(e) => e.timestamp,
            Self::NftUnlocked(e) => e.timestamp,
            Self::LiquidationCall(e) => e.timestamp,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESERVE EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when reserve indices and rates are refreshed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveDataUpdatedEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// New liquidity rate (ray per second)
    pub liquidity_rate: u128,
    /// New stable borrow rate (ray per second)
    pub stable_borrow_rate: u128,
    /// New variable borrow rate (ray per second)
    pub variable_borrow_rate: u128,
    /// New liquidity index (ray)
    pub liquidity_index: u128,
    /// New variable borrow index (ray)
    pub variable_borrow_index: u128,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when reserve-factor interest is minted to the treasury
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintedToTreasuryEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// Amount minted, in underlying units
    pub amount: u128,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// COLLATERAL EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when collateral is deposited
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralDepositedEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// Depositor
    pub user: UserId,
    /// Account credited with the collateral
    pub on_behalf_of: UserId,
    /// Amount deposited, in underlying units
    pub amount: u128,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when collateral is withdrawn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralWithdrawnEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// Account debited
    pub user: UserId,
    /// Recipient of the underlying
    pub to: UserId,
    /// Amount withdrawn, in underlying units
    pub amount: u128,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when collateral moves between users inside the pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralTransferredEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// Sender
    pub from: UserId,
    /// Recipient
    pub to: UserId,
    /// Amount transferred, in underlying units
    pub amount: u128,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when collateral is burned and the underlying released
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralBurnedEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// Account whose collateral was burned
    pub user: UserId,
    /// Amount burned, in underlying units
    pub amount: u128,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when a balance starts or stops counting as collateral
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralUsageEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// Affected account
    pub user: UserId,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEBT EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when variable debt is minted or burned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDebtEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// Debtor
    pub user: UserId,
    /// Amount minted or burned, in underlying units
    pub amount: u128,
    /// Variable borrow index at the time of the change (ray)
    pub index: u128,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when stable debt is minted or burned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StableDebtEvent {
    /// Reserve asset
    pub asset: AssetId,
    /// Debtor
    pub user: UserId,
    /// Amount minted or burned, in underlying units
    pub amount: u128,
    /// Interest accrued since the last stable update, capitalized into the
    /// principal by this change
    pub interest_accrued: u128,
    /// User stable rate at the time of the change (ray per second)
    pub rate: u128,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// UNDERLYING ASSET EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when underlying tokens enter or leave the pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlyingTransferredEvent {
    /// Asset moved
    pub asset: AssetId,
    /// Sender
    pub from: UserId,
    /// Recipient
    pub to: UserId,
    /// Amount, in underlying units
    pub amount: u128,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// YIELD BOOST EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when a stake position is created, updated or removed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakePositionEvent {
    /// Stake owner
    pub user: UserId,
    /// Staked reserve asset
    pub asset: AssetId,
    /// Boosted stake amount after the change
    pub stake_amount: u128,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when pending rewards are claimed on position close
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeRewardsClaimedEvent {
    /// Stake owner
    pub user: UserId,
    /// Staked reserve asset
    pub asset: AssetId,
    /// Rewards paid out
    pub rewards: u128,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when a stake is recomputed from the user's balances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeAmountRefreshedEvent {
    /// Stake owner
    pub user: UserId,
    /// Staked reserve asset
    pub asset: AssetId,
    /// Boosted stake before the refresh
    pub previous_amount: u128,
    /// Boosted stake after the refresh
    pub new_amount: u128,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// NFT BINDING EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when an NFT is bound to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftBoundEvent {
    /// Binding owner
    pub user: UserId,
    /// NFT token id
    pub token_id: u64,
    /// Boost tier granted
    pub tier: NftTier,
    /// Action the boost applies to
    pub action: NftAction,
    /// Timestamp
    pub timestamp: u64,
}

/// Event emitted when a bound NFT is unlocked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftUnlockedEvent {
    /// Binding owner
    pub user: UserId,
    /// NFT token id returned
    pub token_id: u64,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LIQUIDATION EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Event emitted when a borrower is liquidated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationCallEvent {
    /// Asset seized from the borrower
    pub collateral_asset: AssetId,
    /// Asset whose debt was repaid
    pub debt_asset: AssetId,
    /// Liquidated borrower
    pub borrower: UserId,
    /// Caller who repaid the debt
    pub liquidator: UserId,
    /// Debt actually covered, in debt-asset units
    pub debt_covered: u128,
    /// Total collateral seized, in collateral-asset units
    pub collateral_seized: u128,
    /// Portion of the seizure taken as protocol fee
    pub protocol_fee: u128,
    /// Whether the liquidator kept the collateral as mTokens
    pub receive_mtoken: bool,
    /// Borrower health factor before the call (ray)
    pub health_factor: u128,
    /// Timestamp
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Collection of events from one operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<ProtocolEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn push(&mut self, event: ProtocolEvent) {
        self.events.push(event);
    }

    /// Get all events
    pub fn events(&self) -> &[ProtocolEvent] {
        &self.events
    }

    /// Get events of a specific type
    pub fn filter_by_type(&self, event_type: &str) -> Vec<&ProtocolEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get the number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Merge another event log into this one
    pub fn merge(&mut self, other: EventLog) {
        self.events.extend(other.events);
    }

    /// Clear all events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Serialize the log to pretty JSON for inspection or export
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.events).map_err(|e| Error::Serialization(e.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit_event(timestamp: u64) -> ProtocolEvent {
        ProtocolEvent::CollateralDeposited(CollateralDepositedEvent {
            asset: AssetId::new("USDC"),
            user: UserId::new("alice"),
            on_behalf_of: UserId::new("alice"),
            amount: 1_000_000,
            timestamp,
        })
    }

    #[test]
    fn test_event_type_and_timestamp() {
        let event = deposit_event(1_700_000_000);
        assert_eq!(event.event_type(), "CollateralDeposited");
        assert_eq!(event.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_event_log_filter() {
        let mut log = EventLog::new();
        assert!(log.is_empty());

        log.push(deposit_event(1));
        log.push(ProtocolEvent::VariableDebtMinted(VariableDebtEvent {
            asset: AssetId::new("USDC"),
            user: UserId::new("alice"),
            amount: 400_000_000,
            index: crate::utils::constants::RAY,
            timestamp: 2,
        }));
        log.push(deposit_event(3));

        assert_eq!(log.len(), 3);
        assert_eq!(log.filter_by_type("CollateralDeposited").len(), 2);
        assert_eq!(log.filter_by_type("VariableDebtMinted").len(), 1);
        assert!(log.filter_by_type("LiquidationCall").is_empty());
    }

    #[test]
    fn test_event_log_merge_and_json() {
        let mut log = EventLog::new();
        log.push(deposit_event(1));

        let mut other = EventLog::new();
        other.push(deposit_event(2));
        log.merge(other);
        assert_eq!(log.len(), 2);

        let json = log.to_json().unwrap();
        assert!(json.contains("CollateralDeposited"));
        assert!(json.contains("USDC"));
    }
}
