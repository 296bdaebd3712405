use super::EntityKind;
use shared_types::EntityId;
use thiserror::Error;

/// Failures of the persistent store. The only class of error that aborts an
/// event.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Codec error for {kind} {id}: {message}")]
    Codec {
        kind: EntityKind,
        id: EntityId,
        message: String,
    },

    #[error("Storage I/O error: {0}")]
    Io(String),
}

/// Failures of authoritative ledger reads. Always recovered with a safe
/// default by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerReadError {
    #[error("Ledger call reverted: {0}")]
    Reverted(String),

    #[error("Ledger record not found: {0}")]
    NotFound(String),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by the sync engine's `apply`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
