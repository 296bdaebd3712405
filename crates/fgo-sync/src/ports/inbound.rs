//! # Inbound Ports (Driving Ports)
//!
//! The API the sync engine exposes to the transport that feeds it.

use crate::domain::errors::SyncError;
use crate::events::LedgerEvent;
use shared_types::EventPosition;

/// Why an event left the graph untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Positioned before the last applied event.
    OutOfOrder,
    /// The emitting contract is not bound to any authority.
    UnboundContract,
    /// An entity the event refers to does not exist.
    MissingEntity,
    /// The graph already reflects the event.
    Unchanged,
    /// The request state machine refused the transition.
    IllegalTransition,
    /// The event does not apply to this role or contract kind.
    NotApplicable,
    /// A required ledger read failed and no safe default exists.
    LedgerUnavailable,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::OutOfOrder => "out_of_order",
            SkipReason::UnboundContract => "unbound_contract",
            SkipReason::MissingEntity => "missing_entity",
            SkipReason::Unchanged => "unchanged",
            SkipReason::IllegalTransition => "illegal_transition",
            SkipReason::NotApplicable => "not_applicable",
            SkipReason::LedgerUnavailable => "ledger_unavailable",
        }
    }
}

/// Result of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Skipped(SkipReason),
}

impl ApplyOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied)
    }
}

/// Running counters of a sync session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub applied: u64,
    pub skipped: u64,
    pub last_position: Option<EventPosition>,
}

/// Primary API of the sync engine.
pub trait SyncEngineApi {
    /// Apply one event. Only store failures are errors; everything else is
    /// reported as an outcome.
    fn apply(&mut self, event: &LedgerEvent) -> Result<ApplyOutcome, SyncError>;

    /// Apply events in order, stopping at the first store failure.
    fn apply_all<'a, I>(&mut self, events: I) -> Result<SyncStats, SyncError>
    where
        I: IntoIterator<Item = &'a LedgerEvent>,
    {
        for event in events {
            self.apply(event)?;
        }
        Ok(self.stats())
    }

    fn stats(&self) -> SyncStats;
}
