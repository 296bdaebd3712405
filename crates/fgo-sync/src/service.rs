//! # Sync Service
//!
//! The application service implementing [`SyncEngineApi`].
//!
//! ## Architecture
//!
//! This service:
//! 1. Opens an `apply_event` span per event
//! 2. Optionally drops events positioned before the last applied one
//! 3. Hands the event to the dispatcher with its collaborators borrowed
//! 4. Counts outcomes and reports them through [`EngineMetrics`]

use crate::domain::errors::SyncError;
use crate::domain::value_objects::SyncConfig;
use crate::events::LedgerEvent;
use crate::handlers::{self, HandlerContext};
use crate::ports::inbound::{ApplyOutcome, SkipReason, SyncEngineApi, SyncStats};
use crate::ports::outbound::{EngineMetrics, EntityStore, LedgerReader, MetadataSink};
use tracing::{debug, info_span, warn};

/// The entity-graph sync engine.
pub struct SyncService<S, L, M, X>
where
    S: EntityStore,
    L: LedgerReader,
    M: MetadataSink,
    X: EngineMetrics,
{
    store: S,
    ledger: L,
    metadata: M,
    metrics: X,
    config: SyncConfig,
    stats: SyncStats,
}

impl<S, L, M, X> SyncService<S, L, M, X>
where
    S: EntityStore,
    L: LedgerReader,
    M: MetadataSink,
    X: EngineMetrics,
{
    pub fn new(store: S, ledger: L, metadata: M, metrics: X, config: SyncConfig) -> Self {
        Self {
            store,
            ledger,
            metadata,
            metrics,
            config,
            stats: SyncStats::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Ledger state moves between events in tests and simulations.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut M {
        &mut self.metadata
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    fn record(&mut self, kind: &'static str, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Applied => {
                self.stats.applied += 1;
                self.metrics.event_applied(kind);
            }
            ApplyOutcome::Skipped(reason) => {
                self.stats.skipped += 1;
                self.metrics.event_skipped(kind, reason.as_str());
                debug!(kind, reason = reason.as_str(), "Event skipped");
            }
        }
    }
}

impl<S, L, M, X> SyncEngineApi for SyncService<S, L, M, X>
where
    S: EntityStore,
    L: LedgerReader,
    M: MetadataSink,
    X: EngineMetrics,
{
    fn apply(&mut self, event: &LedgerEvent) -> Result<ApplyOutcome, SyncError> {
        let kind = event.kind.name();
        let span = info_span!(
            "apply_event",
            block = event.block_number,
            log_index = event.log_index,
            kind
        );
        let _enter = span.enter();

        let position = event.position();
        if self.config.enforce_ordering
            && self.stats.last_position.is_some_and(|last| position < last)
        {
            warn!(%position, "Event out of order, skipping");
            let outcome = ApplyOutcome::Skipped(SkipReason::OutOfOrder);
            self.record(kind, outcome);
            return Ok(outcome);
        }

        let mut ctx = HandlerContext {
            store: &mut self.store,
            ledger: &self.ledger,
            metadata: &mut self.metadata,
            metrics: &self.metrics,
            config: &self.config,
        };
        let outcome = handlers::dispatch(&mut ctx, event)?;

        self.record(kind, outcome);
        self.stats.last_position = Some(
            self.stats
                .last_position
                .map_or(position, |last| last.max(position)),
        );
        Ok(outcome)
    }

    fn stats(&self) -> SyncStats {
        self.stats
    }
}
