use crate::ports::outbound::MetadataSink;
use shared_types::EntityId;

/// Content hash queued for background retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub content_hash: String,
    pub owner: EntityId,
}

/// In-memory `MetadataSink`. Each `(hash, owner)` pair is queued once.
#[derive(Debug, Default)]
pub struct MetadataQueue {
    pending: Vec<PendingFetch>,
}

impl MetadataQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[PendingFetch] {
        &self.pending
    }

    /// Hand the queued fetches to a worker.
    pub fn drain(&mut self) -> Vec<PendingFetch> {
        std::mem::take(&mut self.pending)
    }
}

impl MetadataSink for MetadataQueue {
    fn register(&mut self, content_hash: &str, owner: &EntityId) {
        let already_queued = self
            .pending
            .iter()
            .any(|p| p.content_hash == content_hash && &p.owner == owner);
        if !already_queued {
            self.pending.push(PendingFetch {
                content_hash: content_hash.to_string(),
                owner: owner.clone(),
            });
        }
    }
}
