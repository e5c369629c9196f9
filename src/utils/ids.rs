//! Identifier newtypes for assets and users.
//!
//! The pool keys all state by these identifiers. The empty identifier plays
//! the role of the null address and is rejected by input validation.

use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// ASSET ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifier of a listed asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    /// Create a new asset identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null asset (empty identifier)
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Check whether this is the null asset
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// USER ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifier of a protocol participant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a new user identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null user (empty identifier)
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Check whether this is the null user
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_detection() {
        assert!(AssetId::null().is_null());
        assert!(UserId::null().is_null());
        assert!(!AssetId::new("USDC").is_null());
        assert!(!UserId::new("alice").is_null());
    }

    #[test]
    fn test_display() {
        assert_eq!(AssetId::new("MELD").to_string(), "MELD");
        assert_eq!(UserId::new("bob").to_string(), "bob");
    }
}
