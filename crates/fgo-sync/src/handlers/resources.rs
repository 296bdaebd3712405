use super::{skipped, HandlerContext};
use crate::domain::entities::{AuthorizationRequest, CompositeResource, DeployedContract, Principal};
use crate::domain::errors::StoreError;
use crate::domain::relationships::{add_member, remove_member};
use crate::domain::resolver::ReferenceResolver;
use crate::domain::value_objects::ResourceStatus;
use crate::events::LedgerEvent;
use crate::ports::inbound::{ApplyOutcome, SkipReason};
use crate::ports::outbound::{EntityStoreExt, ResourceState};
use shared_types::{keys, EntityId, U256};
use tracing::{debug, info, warn};

pub(super) fn resource_created(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    token_id: &U256,
) -> Result<ApplyOutcome, StoreError> {
    let Some(binding) = ctx.binding(&event.contract)? else {
        return skipped(SkipReason::UnboundContract);
    };
    let Some(kind) = binding.kind.resource_kind() else {
        return skipped(SkipReason::NotApplicable);
    };

    let id = event.resource_id(token_id);
    let mut resource = ctx.store.load::<CompositeResource>(&id)?.unwrap_or_else(|| {
        CompositeResource::new(kind, event.contract, *token_id, binding.authority.clone(), event.provenance())
    });

    let state = ctx.ledger.resource(event.contract, *token_id).unwrap_or_else(|e| {
        warn!(resource = %id, error = %e, "Resource read failed, starting from empty state");
        ResourceState::default()
    });
    apply_state(ctx, &mut resource, state, event);
    refresh_resolution(ctx, &mut resource)?;
    ctx.store.save(&resource)?;

    add_member(
        ctx.store,
        &keys::deployed_contract(&binding.authority, &event.contract),
        |contract: &mut DeployedContract| &mut contract.members,
        &id,
    )?;
    add_member(
        ctx.store,
        &owner_key(&resource),
        |owner: &mut Principal| &mut owner.resources,
        &id,
    )?;

    info!(
        resource = %id,
        ?kind,
        refs = resource.all_nested_refs.len(),
        "Resource created"
    );
    Ok(ApplyOutcome::Applied)
}

pub(super) fn resource_updated(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    token_id: &U256,
) -> Result<ApplyOutcome, StoreError> {
    let id = event.resource_id(token_id);
    let Some(mut resource) = ctx.store.load::<CompositeResource>(&id)? else {
        return skipped(SkipReason::MissingEntity);
    };
    let state = match ctx.ledger.resource(event.contract, *token_id) {
        Ok(state) => state,
        Err(e) => {
            warn!(resource = %id, error = %e, "Resource read failed, keeping stored state");
            return skipped(SkipReason::LedgerUnavailable);
        }
    };

    let previous_owner = resource.owner;
    apply_state(ctx, &mut resource, state, event);
    refresh_resolution(ctx, &mut resource)?;
    ctx.store.save(&resource)?;

    if resource.owner != previous_owner {
        remove_member(
            ctx.store,
            &keys::principal(&resource.authority, &previous_owner),
            |owner: &mut Principal| &mut owner.resources,
            &id,
        )?;
        add_member(
            ctx.store,
            &owner_key(&resource),
            |owner: &mut Principal| &mut owner.resources,
            &id,
        )?;
    }

    debug!(resource = %id, refs = resource.all_nested_refs.len(), "Resource updated");
    Ok(ApplyOutcome::Applied)
}

/// Re-reads the status; an unreadable resource is treated as disabled.
pub(super) fn status_changed(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    token_id: &U256,
) -> Result<ApplyOutcome, StoreError> {
    let id = event.resource_id(token_id);
    let Some(mut resource) = ctx.store.load::<CompositeResource>(&id)? else {
        return skipped(SkipReason::MissingEntity);
    };

    let status = match ctx.ledger.resource(event.contract, *token_id) {
        Ok(state) => state.status,
        Err(e) => {
            warn!(resource = %id, error = %e, "Status read failed, marking disabled");
            ResourceStatus::Disabled
        }
    };
    if resource.status == status {
        return skipped(SkipReason::Unchanged);
    }

    resource.status = status;
    resource.updated_at = event.block_timestamp;
    resource.provenance = event.provenance();
    ctx.store.save(&resource)?;
    debug!(resource = %id, ?status, "Resource status changed");
    Ok(ApplyOutcome::Applied)
}

pub(super) fn usage_changed(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    token_id: &U256,
    usage_count: &U256,
) -> Result<ApplyOutcome, StoreError> {
    let id = event.resource_id(token_id);
    let Some(mut resource) = ctx.store.load::<CompositeResource>(&id)? else {
        return skipped(SkipReason::MissingEntity);
    };
    if resource.usage_count == *usage_count {
        return skipped(SkipReason::Unchanged);
    }

    resource.usage_count = *usage_count;
    resource.updated_at = event.block_timestamp;
    ctx.store.save(&resource)?;
    Ok(ApplyOutcome::Applied)
}

/// Delete a resource and every relationship pointing at it.
pub(super) fn resource_deleted(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    token_id: &U256,
) -> Result<ApplyOutcome, StoreError> {
    let id = event.resource_id(token_id);
    let Some(resource) = ctx.store.load::<CompositeResource>(&id)? else {
        return skipped(SkipReason::MissingEntity);
    };

    remove_member(
        ctx.store,
        &keys::deployed_contract(&resource.authority, &resource.contract),
        |contract: &mut DeployedContract| &mut contract.members,
        &id,
    )?;
    remove_member(
        ctx.store,
        &owner_key(&resource),
        |owner: &mut Principal| &mut owner.resources,
        &id,
    )?;
    for target in &resource.authorized_targets {
        remove_member(
            ctx.store,
            target,
            |parent: &mut CompositeResource| &mut parent.authorized_children,
            &id,
        )?;
    }
    for child in &resource.authorized_children {
        remove_member(
            ctx.store,
            child,
            |child: &mut CompositeResource| &mut child.authorized_targets,
            &id,
        )?;
    }
    for request in &resource.request_history {
        ctx.store.delete::<AuthorizationRequest>(request)?;
    }
    ctx.store.delete::<CompositeResource>(&id)?;

    info!(
        resource = %id,
        requests = resource.request_history.len(),
        "Resource deleted"
    );
    Ok(ApplyOutcome::Applied)
}

/// Copy authoritative ledger state onto a stored resource.
pub(super) fn apply_state(
    ctx: &mut HandlerContext<'_>,
    resource: &mut CompositeResource,
    state: ResourceState,
    event: &LedgerEvent,
) {
    resource.owner = state.owner;
    resource.status = state.status;
    resource.digital_price = state.digital_price;
    resource.physical_price = state.physical_price;
    resource.usage_count = state.usage_count;
    resource.supply_count = state.supply_count;
    resource.current_physical_editions = state.current_physical_editions;
    resource.references = state.references.iter().map(|r| r.to_reference()).collect();
    resource.metadata = ctx.register_metadata(&state.uri, &resource.id);
    resource.uri = state.uri;
    resource.updated_at = event.block_timestamp;
    resource.provenance = event.provenance();
}

/// Re-flatten `resource` against the current store and cache the result.
pub(super) fn refresh_resolution(
    ctx: &mut HandlerContext<'_>,
    resource: &mut CompositeResource,
) -> Result<(), StoreError> {
    let resolution = ReferenceResolver::new(&*ctx.store, ctx.config.max_reference_depth)
        .with_budget(ctx.config.max_flattened_refs)
        .resolve(resource)?;
    if !resolution.is_complete() {
        ctx.metrics.resolver_truncated(resolution.truncations.len());
    }
    resource.accumulated_digital_price = resolution.accumulated_digital;
    resource.accumulated_physical_price = resolution.accumulated_physical;
    resource.all_nested_refs = resolution.flattened;
    Ok(())
}

fn owner_key(resource: &CompositeResource) -> EntityId {
    keys::principal(&resource.authority, &resource.owner)
}
