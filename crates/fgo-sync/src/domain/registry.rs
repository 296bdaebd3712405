//! Lazily created global registry, passed explicitly to whoever needs it.

use super::entities::GlobalRegistry;
use super::errors::StoreError;
use super::relationships::insert_unique;
use super::value_objects::Role;
use crate::ports::outbound::{EntityStore, EntityStoreExt};
use shared_types::{keys, EntityId};
use tracing::debug;

/// Load the registry, or an empty one if it has never been written.
///
/// The returned flag is true when the registry was created; the caller saves
/// it only if it also changes it, so a read never writes.
pub fn load_or_create<S: EntityStore + ?Sized>(
    store: &S,
) -> Result<(GlobalRegistry, bool), StoreError> {
    match store.load::<GlobalRegistry>(&keys::registry())? {
        Some(registry) => Ok((registry, false)),
        None => {
            debug!("Global registry missing, starting empty");
            Ok((GlobalRegistry::default(), true))
        }
    }
}

/// Record an authority. Returns true if the registry changed.
pub fn enroll_authority<S: EntityStore + ?Sized>(
    store: &mut S,
    authority: &EntityId,
) -> Result<bool, StoreError> {
    let (mut registry, _) = load_or_create(store)?;
    if !insert_unique(&mut registry.all_authorities, authority) {
        return Ok(false);
    }
    store.save(&registry)?;
    Ok(true)
}

/// Record a principal under its role. Returns true if the registry changed.
pub fn enroll_principal<S: EntityStore + ?Sized>(
    store: &mut S,
    role: Role,
    principal: &EntityId,
) -> Result<bool, StoreError> {
    let (mut registry, _) = load_or_create(store)?;
    if !insert_unique(registry.principals_mut(role), principal) {
        return Ok(false);
    }
    store.save(&registry)?;
    Ok(true)
}
