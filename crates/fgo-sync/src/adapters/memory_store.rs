use crate::domain::errors::StoreError;
use crate::domain::value_objects::EntityKind;
use crate::ports::outbound::EntityStore;
use shared_types::EntityId;
use std::collections::BTreeMap;

/// Store snapshot: every entity's encoded bytes by `(kind, id)`.
pub type StoreSnapshot = BTreeMap<(EntityKind, EntityId), Vec<u8>>;

/// In-memory implementation of `EntityStore` for replay and testing.
///
/// Ordered by key so snapshots compare deterministically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    entries: StoreSnapshot,
    writes: u64,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the full store contents.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.entries.clone()
    }

    /// Number of saves and deletes performed so far.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stored entities of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entries.keys().filter(|(k, _)| *k == kind).count()
    }

    /// Iterate over stored entries of one kind in key order.
    pub fn entries_of(&self, kind: EntityKind) -> impl Iterator<Item = (&EntityId, &Vec<u8>)> {
        self.entries
            .iter()
            .filter(move |((k, _), _)| *k == kind)
            .map(|((_, id), bytes)| (id, bytes))
    }
}

impl EntityStore for InMemoryEntityStore {
    fn load_raw(&self, kind: EntityKind, id: &EntityId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(&(kind, id.clone())).cloned())
    }

    fn save_raw(
        &mut self,
        kind: EntityKind,
        id: &EntityId,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.entries.insert((kind, id.clone()), bytes);
        self.writes += 1;
        Ok(())
    }

    fn delete_raw(&mut self, kind: EntityKind, id: &EntityId) -> Result<(), StoreError> {
        self.entries.remove(&(kind, id.clone()));
        self.writes += 1;
        Ok(())
    }
}
