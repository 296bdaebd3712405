//! # Gating Propagator
//!
//! Every authority carries two independent gates, one for designers and one
//! for suppliers. While a role's gate is OFF, every principal of that role in
//! the global registry may use the authority's contracts; while it is ON,
//! only principals enrolled with the authority may.
//!
//! `Principal::authorized_contracts` is a materialised cache of that rule,
//! reconstructable at any time by [`recompute_authorized_contracts`].
//!
//! ## Flip semantics
//!
//! | Transition | Effect on every registry principal of the role |
//! |------------|-----------------------------------------------|
//! | OFF → ON | not enrolled: subtract the authority's role contracts |
//! | ON → OFF | union the authority's role contracts |
//! | same value | nothing (replay) |
//!
//! Cost is O(principals × contracts) per flip and O(authorities × contracts)
//! per onboarding.

use super::entities::{Authority, Principal};
use super::errors::StoreError;
use super::registry;
use super::relationships::{extend_unique, insert_unique, subtract};
use super::value_objects::{ContractKind, Role};
use crate::ports::outbound::{EntityStore, EntityStoreExt};
use shared_types::{Address, EntityId};
use tracing::{debug, info, warn};

/// Result of a gate toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The flag changed; `affected` principals were rewritten.
    Flipped { affected: usize },
    /// The flag already had the requested value.
    Unchanged,
    /// The role has no gate.
    NotGateable,
    AuthorityMissing,
}

/// Flip `role`'s gate on `authority_id` and propagate to the registry.
pub fn toggle_gate<S: EntityStore + ?Sized>(
    store: &mut S,
    authority_id: &EntityId,
    role: Role,
    gated: bool,
) -> Result<GateOutcome, StoreError> {
    if !role.is_gateable() {
        return Ok(GateOutcome::NotGateable);
    }
    let Some(mut authority) = store.load::<Authority>(authority_id)? else {
        warn!(authority = %authority_id, %role, "Gate toggled on unknown authority");
        return Ok(GateOutcome::AuthorityMissing);
    };
    if authority.is_gated(role) == gated {
        debug!(authority = %authority_id, %role, gated, "Gate already in requested state");
        return Ok(GateOutcome::Unchanged);
    }

    authority.set_gated(role, gated);
    store.save(&authority)?;

    let contracts = authority.contracts_for(role);
    let (registry, _) = registry::load_or_create(store)?;
    let mut affected = 0;

    for principal_id in registry.principals(role) {
        let Some(mut principal) = store.load::<Principal>(principal_id)? else {
            debug!(principal = %principal_id, "Registry entry without principal, skipping");
            continue;
        };

        let changed = if gated {
            if authority.has_enrolled(&principal) {
                continue;
            }
            subtract(&mut principal.authorized_contracts, &contracts) > 0
        } else {
            extend_unique(&mut principal.authorized_contracts, &contracts) > 0
        };

        if changed {
            store.save(&principal)?;
            affected += 1;
        }
    }

    info!(
        authority = %authority_id,
        %role,
        gated,
        contracts = contracts.len(),
        affected,
        "Gate flipped"
    );
    Ok(GateOutcome::Flipped { affected })
}

/// Contracts `principal` may currently use: its own authority's role lists,
/// then every other authority that is ungated for the role or has enrolled
/// the principal, in registry order.
pub fn visible_contracts<S: EntityStore + ?Sized>(
    store: &S,
    principal: &Principal,
) -> Result<Vec<EntityId>, StoreError> {
    let role = principal.role;
    let mut visible = Vec::new();

    if let Some(own) = store.load::<Authority>(&principal.authority)? {
        extend_unique(&mut visible, &own.contracts_for(role));
    }
    if !role.is_gateable() {
        return Ok(visible);
    }

    let (registry, _) = registry::load_or_create(store)?;
    for authority_id in &registry.all_authorities {
        if *authority_id == principal.authority {
            continue;
        }
        let Some(authority) = store.load::<Authority>(authority_id)? else {
            continue;
        };
        if !authority.is_gated(role) || authority.has_enrolled(principal) {
            extend_unique(&mut visible, &authority.contracts_for(role));
        }
    }
    Ok(visible)
}

/// Rebuild the cache from current authority state. Returns true if it
/// changed. The caller saves the principal.
pub fn recompute_authorized_contracts<S: EntityStore + ?Sized>(
    store: &S,
    principal: &mut Principal,
) -> Result<bool, StoreError> {
    let visible = visible_contracts(store, principal)?;
    if visible == principal.authorized_contracts {
        return Ok(false);
    }
    principal.authorized_contracts = visible;
    Ok(true)
}

/// Compute the initial cache of a newly created principal and enroll it in
/// the registry. The caller saves the principal.
pub fn onboard_principal<S: EntityStore + ?Sized>(
    store: &mut S,
    principal: &mut Principal,
) -> Result<(), StoreError> {
    recompute_authorized_contracts(store, principal)?;
    registry::enroll_principal(store, principal.role, &principal.id)?;
    debug!(
        principal = %principal.id,
        role = %principal.role,
        contracts = principal.authorized_contracts.len(),
        "Principal onboarded"
    );
    Ok(())
}

/// Rebuild the cache of every registry principal of `role` holding
/// `address`, after the address joined or left an authority's member list.
/// Returns the number of principals rewritten.
pub fn refresh_member<S: EntityStore + ?Sized>(
    store: &mut S,
    role: Role,
    address: &Address,
) -> Result<usize, StoreError> {
    if !role.is_gateable() {
        return Ok(0);
    }
    let (registry, _) = registry::load_or_create(store)?;
    let mut affected = 0;

    for principal_id in registry.principals(role) {
        let Some(mut principal) = store.load::<Principal>(principal_id)? else {
            continue;
        };
        if principal.address != *address {
            continue;
        }
        if recompute_authorized_contracts(store, &mut principal)? {
            store.save(&principal)?;
            affected += 1;
        }
    }
    Ok(affected)
}

/// List a newly deployed contract on `authority` and push it to every
/// principal allowed to see it. Returns the number of principals rewritten.
/// The caller saves the authority.
pub fn propagate_new_contract<S: EntityStore + ?Sized>(
    store: &mut S,
    authority: &mut Authority,
    contract_ref: &EntityId,
    kind: ContractKind,
) -> Result<usize, StoreError> {
    let Some(list) = authority.contracts_mut(kind) else {
        return Ok(0);
    };
    insert_unique(list, contract_ref);

    let Some(role) = kind.visible_to() else {
        return Ok(0);
    };
    let open = !authority.is_gated(role);
    let (registry, _) = registry::load_or_create(store)?;
    let mut affected = 0;

    for principal_id in registry.principals(role) {
        let Some(mut principal) = store.load::<Principal>(principal_id)? else {
            continue;
        };
        let sees_authority = if role.is_gateable() {
            open || authority.has_enrolled(&principal)
        } else {
            principal.authority == authority.id
        };
        if sees_authority && insert_unique(&mut principal.authorized_contracts, contract_ref) {
            store.save(&principal)?;
            affected += 1;
        }
    }

    debug!(
        authority = %authority.id,
        contract = %contract_ref,
        ?kind,
        affected,
        "Contract propagated"
    );
    Ok(affected)
}
