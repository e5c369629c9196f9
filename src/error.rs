//! Error types for the mlend protocol.
//!
//! This module defines all error types used throughout the protocol,
//! providing clear and actionable error messages. Errors fall into three
//! classes: input validation (caller mistake), precondition (state-dependent,
//! may become valid later), and arithmetic/invariant (fatal).

use thiserror::Error;

/// Result type alias for mlend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the mlend protocol
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Input Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// An identifier was empty where a real address is required
    #[error("Null address for parameter: {0}")]
    NullAddress(String),

    /// Amount is zero or otherwise unusable
    #[error("Invalid amount")]
    InvalidAmount,

    /// The asset has no reserve in the pool
    #[error("Reserve not listed: {0}")]
    ReserveNotListed(String),

    /// The reserve exists but is not active
    #[error("Reserve not active: {0}")]
    ReserveNotActive(String),

    /// The reserve is frozen (deposits and borrows suspended)
    #[error("Reserve frozen: {0}")]
    ReserveFrozen(String),

    // ═══════════════════════════════════════════════════════════════════
    // Precondition Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Health factor is at or above the liquidation threshold
    #[error("Health factor {health_factor} not below liquidation threshold")]
    HealthFactorNotBelowThreshold {
        /// Health factor at the time of the call (ray)
        health_factor: u128,
    },

    /// The operation would push the health factor below the threshold
    #[error("Health factor would fall below liquidation threshold")]
    HealthFactorTooLow,

    /// Collateral asset has a zero liquidation threshold or the user has
    /// not enabled it as collateral
    #[error("Collateral cannot be liquidated: {0}")]
    CollateralCannotBeLiquidated(String),

    /// The user has no debt in the named asset
    #[error("Specified currency not borrowed by user: {0}")]
    SpecifiedCurrencyNotBorrowedByUser(String),

    /// The user has no debt of the requested rate mode
    #[error("No debt of selected rate mode for asset: {0}")]
    NoDebtOfSelectedMode(String),

    /// Not enough underlying liquidity in the reserve
    #[error("Insufficient reserve liquidity: required {required}, available {available}")]
    InsufficientLiquidity {
        /// Underlying amount required
        required: u128,
        /// Underlying amount available
        available: u128,
    },

    /// Ledger balance too small for the operation
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount required
        required: u128,
        /// Amount available
        available: u128,
    },

    /// User collateral balance too small for the operation
    #[error("Insufficient collateral: required {required}, available {available}")]
    InsufficientCollateral {
        /// Amount required
        required: u128,
        /// Amount available
        available: u128,
    },

    /// The NFT token id is already bound elsewhere
    #[error("NFT token {0} is blocked by an active binding")]
    NftTokenBlocked(u64),

    /// The NFT token id is not registered as tier-eligible
    #[error("NFT token {0} is not eligible")]
    NftTokenNotEligible(u64),

    /// The user already has an active NFT binding
    #[error("User already has an active NFT binding: {0}")]
    NftBindingExists(String),

    // ═══════════════════════════════════════════════════════════════════
    // Oracle Errors
    // ═══════════════════════════════════════════════════════════════════

    /// The oracle reported an invalid price for an asset with a nonzero
    /// balance relevant to the computation
    #[error("Invalid oracle price for asset: {0}")]
    InvalidAssetPrice(String),

    // ═══════════════════════════════════════════════════════════════════
    // Arithmetic Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    /// Underflow in calculation
    #[error("Arithmetic underflow in {operation}")]
    Underflow {
        /// Operation that underflowed
        operation: String,
    },

    /// Division by zero
    #[error("Division by zero in {operation}")]
    DivisionByZero {
        /// Operation that divided by zero
        operation: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Invariant Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Invariant violation detected (should never occur in production)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // ═══════════════════════════════════════════════════════════════════
    // Serialization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl Error {
    /// Returns true if this error is recoverable by the caller (state may
    /// change or the caller can retry with corrected input)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NullAddress(_)
                | Error::InvalidAmount
                | Error::ReserveNotListed(_)
                | Error::ReserveNotActive(_)
                | Error::ReserveFrozen(_)
                | Error::HealthFactorNotBelowThreshold { .. }
                | Error::HealthFactorTooLow
                | Error::CollateralCannotBeLiquidated(_)
                | Error::SpecifiedCurrencyNotBorrowedByUser(_)
                | Error::NoDebtOfSelectedMode(_)
                | Error::InsufficientLiquidity { .. }
                | Error::InsufficientBalance { .. }
                | Error::InsufficientCollateral { .. }
                | Error::NftTokenBlocked(_)
                | Error::NftTokenNotEligible(_)
                | Error::NftBindingExists(_)
                | Error::InvalidAssetPrice(_)
        )
    }

    /// Returns true if this is a critical error requiring immediate attention
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Error::Overflow { .. }
                | Error::Underflow { .. }
                | Error::DivisionByZero { .. }
                | Error::InvariantViolation(_)
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Validation errors: 1xxx
            Error::NullAddress(_) => 1001,
            Error::InvalidAmount => 1002,
            Error::ReserveNotListed(_) => 1003,
            Error::ReserveNotActive(_) => 1004,
            Error::ReserveFrozen(_) => 1005,

            // Precondition errors: 2xxx
            Error::HealthFactorNotBelowThreshold { .. } => 2001,
            Error::HealthFactorTooLow => 2002,
            Error::CollateralCannotBeLiquidated(_) => 2003,
            Error::SpecifiedCurrencyNotBorrowedByUser(_) => 2004,
            Error::NoDebtOfSelectedMode(_) => 2005,
            Error::InsufficientLiquidity { .. } => 2006,
            Error::InsufficientBalance { .. } => 2007,
            Error::InsufficientCollateral { .. } => 2008,
            Error::NftTokenBlocked(_) => 2009,
            Error::NftTokenNotEligible(_) => 2010,
            Error::NftBindingExists(_) => 2011,

            // Oracle errors: 3xxx
            Error::InvalidAssetPrice(_) => 3001,

            // Arithmetic errors: 5xxx
            Error::Overflow { .. } => 5001,
            Error::Underflow { .. } => 5002,
            Error::DivisionByZero { .. } => 5003,

            // Invariant errors: 6xxx
            Error::InvariantViolation(_) => 6001,

            // Serialization errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,
        }
    }
}
