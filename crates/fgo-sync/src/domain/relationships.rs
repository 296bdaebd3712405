//! # Relationship Maintainer
//!
//! Keeps relationship lists unique and in insertion order.
//!
//! ## Operations
//!
//! - [`add_member`]: load owner, append if absent, save
//! - [`remove_member`]: load owner, rebuild list without the member, save
//!
//! A missing owner is reported as [`MembershipChange::OwnerMissing`], never as
//! an error. Nothing is written when the list does not change.

use super::entities::Entity;
use super::errors::StoreError;
use crate::ports::outbound::{EntityStore, EntityStoreExt};
use shared_types::EntityId;
use tracing::debug;

/// Result of a membership update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipChange {
    Added,
    AlreadyPresent,
    Removed,
    Absent,
    OwnerMissing,
}

impl MembershipChange {
    pub fn is_change(&self) -> bool {
        matches!(self, MembershipChange::Added | MembershipChange::Removed)
    }
}

/// Append `member` unless present. Returns true if the list changed.
pub fn insert_unique(list: &mut Vec<EntityId>, member: &EntityId) -> bool {
    if list.contains(member) {
        return false;
    }
    list.push(member.clone());
    true
}

/// Remove every occurrence of `member`. Returns true if the list changed.
pub fn remove_all(list: &mut Vec<EntityId>, member: &EntityId) -> bool {
    let before = list.len();
    list.retain(|m| m != member);
    list.len() != before
}

/// Union `members` into `list`, preserving order. Returns the number added.
pub fn extend_unique<'a>(
    list: &mut Vec<EntityId>,
    members: impl IntoIterator<Item = &'a EntityId>,
) -> usize {
    members
        .into_iter()
        .filter(|member| insert_unique(list, member))
        .count()
}

/// Remove every id in `members` from `list`. Returns the number removed.
pub fn subtract(list: &mut Vec<EntityId>, members: &[EntityId]) -> usize {
    let before = list.len();
    list.retain(|m| !members.contains(m));
    before - list.len()
}

/// Add `member` to the list of `owner_id` picked by `select`.
pub fn add_member<E, S, F>(
    store: &mut S,
    owner_id: &EntityId,
    select: F,
    member: &EntityId,
) -> Result<MembershipChange, StoreError>
where
    E: Entity,
    S: EntityStore + ?Sized,
    F: FnOnce(&mut E) -> &mut Vec<EntityId>,
{
    let Some(mut owner) = store.load::<E>(owner_id)? else {
        debug!(owner = %owner_id, kind = %E::KIND, "Owner missing, membership unchanged");
        return Ok(MembershipChange::OwnerMissing);
    };

    if !insert_unique(select(&mut owner), member) {
        return Ok(MembershipChange::AlreadyPresent);
    }

    store.save(&owner)?;
    debug!(owner = %owner_id, member = %member, kind = %E::KIND, "Member added");
    Ok(MembershipChange::Added)
}

/// Remove `member` from the list of `owner_id` picked by `select`.
pub fn remove_member<E, S, F>(
    store: &mut S,
    owner_id: &EntityId,
    select: F,
    member: &EntityId,
) -> Result<MembershipChange, StoreError>
where
    E: Entity,
    S: EntityStore + ?Sized,
    F: FnOnce(&mut E) -> &mut Vec<EntityId>,
{
    let Some(mut owner) = store.load::<E>(owner_id)? else {
        debug!(owner = %owner_id, kind = %E::KIND, "Owner missing, membership unchanged");
        return Ok(MembershipChange::OwnerMissing);
    };

    if !remove_all(select(&mut owner), member) {
        return Ok(MembershipChange::Absent);
    }

    store.save(&owner)?;
    debug!(owner = %owner_id, member = %member, kind = %E::KIND, "Member removed");
    Ok(MembershipChange::Removed)
}
