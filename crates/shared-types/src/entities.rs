//! # Core Primitives
//!
//! Ledger-native value types carried by events and entities.
//!
//! ## Clusters
//!
//! - **Ledger**: `Address`, `TxHash`, `InfraId`, `Amount`
//! - **Graph**: `EntityId`, `EventPosition`

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export fixed-width integers from primitive-types for use across all crates
pub use primitive_types::{H160, H256, U256};

/// A 20-byte ledger account or contract address.
pub type Address = H160;

/// A 32-byte transaction hash.
pub type TxHash = H256;

/// A 32-byte infrastructure (authority) identifier as emitted by the factory.
pub type InfraId = H256;

/// Token amounts, prices and counts. Arbitrary 256-bit unsigned arithmetic.
pub type Amount = U256;

/// Opaque identifier of a persisted entity.
///
/// Built deterministically from ledger-native identifiers via
/// [`crate::keys`]. Ordering is lexicographic so store snapshots are stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an already-constructed key.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns true if this key is namespaced under `prefix` (`prefix-...`).
    pub fn is_namespaced_under(&self, prefix: &EntityId) -> bool {
        self.0
            .strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Position of an event in the transport's total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct EventPosition {
    pub block_number: u64,
    pub log_index: u32,
}

impl EventPosition {
    pub fn new(block_number: u64, log_index: u32) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

impl fmt::Display for EventPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block_number, self.log_index)
    }
}
