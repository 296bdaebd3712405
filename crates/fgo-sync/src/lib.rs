//! # FGO Sync Engine
//!
//! Maintains a derived entity graph (authorities, principals, composite
//! resources, authorization requests, supply coordination, sales) from an ordered
//! stream of ledger events.
//!
//! ## Architecture
//!
//! ```text
//! LedgerEvent ──→ SyncService ──→ dispatch ──→ handler
//!                                                │
//!                    ┌───────────────┬───────────┼──────────────┐
//!                    ↓               ↓           ↓              ↓
//!             Relationships      Gating      Resolver     Authorization
//!                    │               │           │              │
//!                    └───────────────┴─────┬─────┴──────────────┘
//!                                          ↓
//!                                     EntityStore
//! ```
//!
//! ## Guarantees
//!
//! | Property | Description |
//! |----------|-------------|
//! | Idempotent replay | Applying an event twice leaves the store as applying it once |
//! | Symmetric relationships | Every two-sided link is added and removed on both sides |
//! | Gate completeness | After a flip every registry principal reflects the new gate |
//! | Bounded resolution | Cycles, depth overruns, the output budget and overflow truncate, never abort |
//! | Legal transitions | The request state machine ignores illegal decisions |
//!
//! Only store failures surface as errors; every other anomaly is logged and
//! reported as a skipped outcome.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entities, value objects and the four graph algorithms
//! - `ports/` - Inbound engine API, outbound store, ledger, metadata and metrics
//! - `events/` - The inbound event contract
//! - `handlers/` - Per-event-family handlers and the dispatcher
//! - `adapters/` - In-memory store, snapshot ledger, metadata queue
//! - `service.rs` - Application service implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! use fgo_sync::{InMemoryEntityStore, MetadataQueue, NoopMetrics, SnapshotLedger};
//! use fgo_sync::{SyncConfig, SyncEngineApi, SyncService};
//!
//! let mut service = SyncService::new(
//!     InMemoryEntityStore::new(),
//!     SnapshotLedger::from_json(&raw_ledger)?,
//!     MetadataQueue::new(),
//!     NoopMetrics,
//!     SyncConfig::from_env(),
//! );
//! let stats = service.apply_all(&events)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod events;
pub mod handlers;
pub mod ports;
pub mod service;

// Re-export key types for convenience
pub use adapters::{InMemoryEntityStore, MetadataQueue, NoopMetrics, SnapshotLedger, StoreSnapshot};
pub use domain::errors::{LedgerReadError, StoreError, SyncError};
pub use domain::value_objects::{EntityKind, SyncConfig};
pub use events::{EventKind, LedgerEvent};
pub use ports::inbound::{ApplyOutcome, SkipReason, SyncEngineApi, SyncStats};
pub use ports::outbound::{EngineMetrics, EntityStore, EntityStoreExt, LedgerReader, MetadataSink};
pub use service::SyncService;
