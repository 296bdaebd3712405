use super::resources::{apply_state, refresh_resolution};
use super::{membership_outcome, skipped, HandlerContext};
use crate::domain::entities::{CompositeResource, SupplierProposal, SupplyRequest};
use crate::domain::errors::StoreError;
use crate::domain::relationships::{add_member, remove_member};
use crate::events::{LedgerEvent, ProposalRef};
use crate::ports::inbound::{ApplyOutcome, SkipReason};
use crate::ports::outbound::{EntityStoreExt, SupplyPosition};
use shared_types::{keys, Amount, EntityId, U256};
use tracing::{debug, info, warn};

pub(super) fn request_registered(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    position_id: &U256,
) -> Result<ApplyOutcome, StoreError> {
    let id = keys::supply_request(&event.contract, position_id);
    let position = match ctx.ledger.supply_position(event.contract, *position_id) {
        Ok(position) => position,
        Err(e) => {
            warn!(request = %id, error = %e, "Position read failed, supply request not recorded");
            return skipped(SkipReason::LedgerUnavailable);
        }
    };

    let parent = keys::resource(&position.parent_contract, &position.parent_id);
    let proposals = ctx
        .store
        .load::<SupplyRequest>(&id)?
        .map(|existing| existing.proposals)
        .unwrap_or_default();
    let mut request = SupplyRequest {
        id: id.clone(),
        coordination: event.contract,
        position_id: *position_id,
        parent: parent.clone(),
        quantity: Amount::zero(),
        preferred_max_price: Amount::zero(),
        deadline: 0,
        is_physical: false,
        paid: false,
        matched_child: None,
        matched_supplier: None,
        proposals,
        provenance: event.provenance(),
    };
    apply_position(&mut request, &position);
    ctx.store.save(&request)?;

    add_member(
        ctx.store,
        &parent,
        |resource: &mut CompositeResource| &mut resource.supply_requests,
        &id,
    )?;
    info!(request = %id, parent = %parent, "Supply request registered");
    Ok(ApplyOutcome::Applied)
}

pub(super) fn proposal_submitted(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    proposal: &ProposalRef,
    price: &Amount,
) -> Result<ApplyOutcome, StoreError> {
    let request_id = keys::supply_request(&event.contract, &proposal.position_id);
    if !ctx.store.exists::<SupplyRequest>(&request_id)? {
        debug!(request = %request_id, "Proposal for unknown supply request");
        return skipped(SkipReason::MissingEntity);
    }

    let id = proposal_key(&request_id, proposal);
    ctx.store.save(&SupplierProposal {
        id: id.clone(),
        supply_request: request_id.clone(),
        supplier: proposal.supplier,
        child: keys::resource(&proposal.child_contract, &proposal.child_id),
        child_contract: proposal.child_contract,
        child_id: proposal.child_id,
        price: *price,
        is_active: true,
        provenance: event.provenance(),
    })?;
    add_member(
        ctx.store,
        &request_id,
        |request: &mut SupplyRequest| &mut request.proposals,
        &id,
    )?;
    debug!(proposal = %id, %price, "Proposal submitted");
    Ok(ApplyOutcome::Applied)
}

/// Cancellation keeps the proposal as inactive; an expired release deletes
/// it. Both drop it from the request's list.
pub(super) fn proposal_withdrawn(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    proposal: &ProposalRef,
    released: bool,
) -> Result<ApplyOutcome, StoreError> {
    let request_id = keys::supply_request(&event.contract, &proposal.position_id);
    let id = proposal_key(&request_id, proposal);
    let Some(mut stored) = ctx.store.load::<SupplierProposal>(&id)? else {
        return skipped(SkipReason::MissingEntity);
    };

    let change = remove_member(
        ctx.store,
        &request_id,
        |request: &mut SupplyRequest| &mut request.proposals,
        &id,
    )?;

    if released {
        ctx.store.delete::<SupplierProposal>(&id)?;
        debug!(proposal = %id, "Expired proposal released");
        return Ok(ApplyOutcome::Applied);
    }
    if !stored.is_active {
        return Ok(membership_outcome(change));
    }
    stored.is_active = false;
    stored.provenance = event.provenance();
    ctx.store.save(&stored)?;
    debug!(proposal = %id, "Proposal cancelled");
    Ok(ApplyOutcome::Applied)
}

/// Marks the request paid and re-derives its parent, whose references now
/// include the matched child.
pub(super) fn request_paid(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    position_id: &U256,
) -> Result<ApplyOutcome, StoreError> {
    let id = keys::supply_request(&event.contract, position_id);
    let Some(mut request) = ctx.store.load::<SupplyRequest>(&id)? else {
        return skipped(SkipReason::MissingEntity);
    };

    match ctx.ledger.supply_position(event.contract, *position_id) {
        Ok(position) => apply_position(&mut request, &position),
        Err(e) => {
            warn!(request = %id, error = %e, "Position read failed, marking paid without match");
        }
    }
    request.paid = true;
    request.provenance = event.provenance();
    ctx.store.save(&request)?;

    let Some(mut parent) = ctx.store.load::<CompositeResource>(&request.parent)? else {
        debug!(request = %id, parent = %request.parent, "Paid request has no stored parent");
        return Ok(ApplyOutcome::Applied);
    };
    match ctx.ledger.resource(parent.contract, parent.token_id) {
        Ok(state) => {
            apply_state(ctx, &mut parent, state, event);
            refresh_resolution(ctx, &mut parent)?;
            ctx.store.save(&parent)?;
        }
        Err(e) => warn!(parent = %parent.id, error = %e, "Parent read failed, references not refreshed"),
    }

    info!(request = %id, matched = ?request.matched_child, "Supply request paid");
    Ok(ApplyOutcome::Applied)
}

fn proposal_key(request_id: &EntityId, proposal: &ProposalRef) -> EntityId {
    keys::supplier_proposal(
        request_id,
        &proposal.supplier,
        &proposal.child_contract,
        &proposal.child_id,
    )
}

fn apply_position(request: &mut SupplyRequest, position: &SupplyPosition) {
    request.quantity = position.quantity;
    request.preferred_max_price = position.preferred_max_price;
    request.deadline = position.deadline;
    request.is_physical = position.is_physical;
    request.paid = position.paid;
    request.matched_child = position
        .matched_child_contract
        .zip(position.matched_child_id)
        .map(|(contract, token_id)| keys::resource(&contract, &token_id));
    request.matched_supplier = position.matched_supplier;
}
