//! # Adapters
//!
//! In-memory implementations of the outbound ports.

pub mod memory_store;
pub mod metadata_queue;
pub mod snapshot_ledger;

pub use memory_store::{InMemoryEntityStore, StoreSnapshot};
pub use metadata_queue::{MetadataQueue, PendingFetch};
pub use snapshot_ledger::{PositionRecord, ProfileRecord, RequestRecord, ResourceRecord, SnapshotLedger};

use crate::domain::value_objects::Role;
use crate::ports::outbound::EngineMetrics;

/// `EngineMetrics` that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl EngineMetrics for NoopMetrics {
    fn event_applied(&self, _kind: &'static str) {}

    fn event_skipped(&self, _kind: &'static str, _reason: &'static str) {}

    fn gate_flipped(&self, _role: Role, _gated: bool) {}

    fn resolver_truncated(&self, _count: usize) {}

    fn propagation_fanout(&self, _principals: usize) {}
}
