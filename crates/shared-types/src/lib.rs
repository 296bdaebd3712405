//! # Shared Types Crate
//!
//! Ledger-native primitives and entity identifiers shared by the sync engine,
//! the runtime and the test suite.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every crate builds entity keys through
//!   [`keys`]; keys double as foreign keys in downstream queries, so the
//!   concatenation order is a published contract.
//! - **No Floating Point**: All amounts are 256-bit unsigned integers.
//! - **Opaque Identifiers**: [`EntityId`] is compared and hashed as an opaque
//!   string; nothing parses it back.

pub mod entities;
pub mod keys;

pub use entities::*;
