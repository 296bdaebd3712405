use super::{skipped, HandlerContext};
use crate::domain::entities::Principal;
use crate::domain::errors::StoreError;
use crate::domain::gating;
use crate::domain::value_objects::Role;
use crate::events::LedgerEvent;
use crate::ports::inbound::{ApplyOutcome, SkipReason};
use crate::ports::outbound::{EntityStoreExt, PrincipalProfile};
use shared_types::{keys, Address, EntityId, U256};
use tracing::{debug, info, warn};

pub(super) fn principal_created(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    principal: &Address,
    profile_id: &U256,
) -> Result<ApplyOutcome, StoreError> {
    let Some((authority, role)) = registry_binding(ctx, event)? else {
        return skipped(SkipReason::UnboundContract);
    };

    let id = keys::principal(&authority, principal);
    let existing = ctx.store.load::<Principal>(&id)?;
    let is_new = existing.is_none();
    let mut entity = existing
        .unwrap_or_else(|| Principal::new(&authority, role, *principal, *profile_id, event.provenance()));
    entity.profile_id = *profile_id;

    match ctx.ledger.principal_profile(event.contract, role, *profile_id) {
        Ok(profile) => apply_profile(ctx, &mut entity, profile),
        Err(e) => {
            warn!(principal = %id, error = %e, "Profile read failed, principal stays inactive");
            entity.is_active = false;
        }
    }

    if is_new {
        gating::onboard_principal(ctx.store, &mut entity)?;
        info!(principal = %id, %role, contracts = entity.authorized_contracts.len(), "Principal created");
    }
    ctx.store.save(&entity)?;
    Ok(ApplyOutcome::Applied)
}

pub(super) fn principal_updated(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    principal: &Address,
) -> Result<ApplyOutcome, StoreError> {
    let Some((mut entity, role)) = load_principal(ctx, event, principal)? else {
        return skipped(SkipReason::MissingEntity);
    };

    match ctx.ledger.principal_profile(event.contract, role, entity.profile_id) {
        Ok(profile) => {
            let before = entity.clone();
            apply_profile(ctx, &mut entity, profile);
            if entity == before {
                return skipped(SkipReason::Unchanged);
            }
            ctx.store.save(&entity)?;
            debug!(principal = %entity.id, "Profile refreshed");
            Ok(ApplyOutcome::Applied)
        }
        Err(e) => {
            warn!(principal = %entity.id, error = %e, "Profile read failed, keeping stored profile");
            skipped(SkipReason::LedgerUnavailable)
        }
    }
}

/// The key keeps the original address so foreign keys stay valid.
pub(super) fn wallet_transferred(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    old: &Address,
    new: &Address,
) -> Result<ApplyOutcome, StoreError> {
    let Some((mut entity, _)) = load_principal(ctx, event, old)? else {
        return skipped(SkipReason::MissingEntity);
    };

    let moved = entity.address != *new;
    entity.address = *new;
    let recomputed = gating::recompute_authorized_contracts(ctx.store, &mut entity)?;
    if !moved && !recomputed {
        return skipped(SkipReason::Unchanged);
    }

    ctx.store.save(&entity)?;
    info!(
        principal = %entity.id,
        from = %keys::hex_address(old),
        to = %keys::hex_address(new),
        "Wallet transferred"
    );
    Ok(ApplyOutcome::Applied)
}

pub(super) fn status_changed(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    principal: &Address,
    is_active: bool,
) -> Result<ApplyOutcome, StoreError> {
    let Some((mut entity, _)) = load_principal(ctx, event, principal)? else {
        return skipped(SkipReason::MissingEntity);
    };
    if entity.is_active == is_active {
        return skipped(SkipReason::Unchanged);
    }

    entity.is_active = is_active;
    ctx.store.save(&entity)?;
    debug!(principal = %entity.id, is_active, "Principal status changed");
    Ok(ApplyOutcome::Applied)
}

/// Authority and role of a role-registry contract.
fn registry_binding(
    ctx: &HandlerContext<'_>,
    event: &LedgerEvent,
) -> Result<Option<(EntityId, Role)>, StoreError> {
    let Some(binding) = ctx.binding(&event.contract)? else {
        return Ok(None);
    };
    Ok(binding.kind.registry_role().map(|role| (binding.authority, role)))
}

fn load_principal(
    ctx: &HandlerContext<'_>,
    event: &LedgerEvent,
    address: &Address,
) -> Result<Option<(Principal, Role)>, StoreError> {
    let Some((authority, role)) = registry_binding(ctx, event)? else {
        return Ok(None);
    };
    let id = keys::principal(&authority, address);
    let principal = ctx.store.load::<Principal>(&id)?;
    if principal.is_none() {
        debug!(principal = %id, "Event for unknown principal");
    }
    Ok(principal.map(|p| (p, role)))
}

fn apply_profile(ctx: &mut HandlerContext<'_>, principal: &mut Principal, profile: PrincipalProfile) {
    principal.is_active = profile.is_active;
    principal.version = profile.version;
    principal.base_price = profile.base_price;
    principal.vig_basis_points = profile.vig_basis_points;
    principal.metadata = ctx.register_metadata(&profile.uri, &principal.id);
    principal.uri = profile.uri;
}
