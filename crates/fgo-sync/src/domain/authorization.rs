//! # Authorization Request State Machine
//!
//! One record per `(resource, target, target contract, physical flag)`,
//! created by the first request and mutated in place afterwards.
//!
//! ## Transitions
//!
//! | From | To | Effect on resource | Effect on target |
//! |------|----|--------------------|------------------|
//! | Requested | Approved | `authorized_targets += target` | `authorized_children += resource` |
//! | Requested | Rejected | `authorized_targets -= target` | - |
//! | Approved | Revoked | `authorized_targets -= target` | `authorized_children -= resource` |
//! | any | Requested | - | - |
//!
//! Digital and physical requests for the same target are separate records.
//! A removal is withheld while the other one is still `Approved`, so the
//! target stays listed as long as any of its requests is approved.
//!
//! Every transition appends the request id to the resource's
//! `request_history` once. Replaying the current state changes nothing; any
//! other transition is ignored with a warning.

use super::entities::{AuthorizationRequest, CompositeResource};
use super::errors::StoreError;
use super::relationships::{insert_unique, remove_all};
use super::value_objects::{BlockProvenance, RequestState, TargetKind};
use crate::ports::outbound::{EntityStore, EntityStoreExt};
use shared_types::{keys, Address, Amount, EntityId};
use tracing::{debug, warn};

/// What a request or decision event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Created,
    Applied { from: RequestState, to: RequestState },
    /// The request was already in the target state.
    Unchanged,
    /// The transition is not legal from the current state.
    Ignored { from: RequestState, to: RequestState },
    /// The resource or the request does not exist.
    Missing,
}

/// Data carried by a request event, after ledger re-derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDraft {
    pub id: EntityId,
    pub resource: EntityId,
    pub target: EntityId,
    pub target_kind: TargetKind,
    pub target_contract: Address,
    pub is_physical: bool,
    pub requested_amount: Amount,
    pub timestamp: u64,
    pub provenance: BlockProvenance,
}

/// Upsert a request into the `Requested` state.
pub fn record_request<S: EntityStore + ?Sized>(
    store: &mut S,
    draft: RequestDraft,
) -> Result<TransitionOutcome, StoreError> {
    let Some(mut resource) = store.load::<CompositeResource>(&draft.resource)? else {
        debug!(resource = %draft.resource, "Request for unknown resource, skipping");
        return Ok(TransitionOutcome::Missing);
    };

    let outcome = match store.load::<AuthorizationRequest>(&draft.id)? {
        Some(existing) if existing.state == RequestState::Requested => TransitionOutcome::Unchanged,
        Some(mut existing) => {
            let from = existing.state;
            existing.state = RequestState::Requested;
            existing.requested_amount = draft.requested_amount;
            existing.timestamp = draft.timestamp;
            existing.provenance = draft.provenance;
            store.save(&existing)?;
            TransitionOutcome::Applied {
                from,
                to: RequestState::Requested,
            }
        }
        None => {
            let request = AuthorizationRequest {
                id: draft.id.clone(),
                resource: draft.resource.clone(),
                target: draft.target.clone(),
                target_kind: draft.target_kind,
                target_contract: draft.target_contract,
                is_physical: draft.is_physical,
                state: RequestState::Requested,
                requested_amount: draft.requested_amount,
                approved_amount: Amount::zero(),
                timestamp: draft.timestamp,
                provenance: draft.provenance,
            };
            store.save(&request)?;
            TransitionOutcome::Created
        }
    };

    if insert_unique(&mut resource.request_history, &draft.id) {
        store.save(&resource)?;
    }
    debug!(request = %draft.id, ?outcome, "Authorization requested");
    Ok(outcome)
}

/// Apply an approval, rejection or revocation to an existing request.
pub fn decide<S: EntityStore + ?Sized>(
    store: &mut S,
    request_id: &EntityId,
    decision: RequestState,
    approved_amount: Option<Amount>,
    provenance: BlockProvenance,
) -> Result<TransitionOutcome, StoreError> {
    let Some(mut request) = store.load::<AuthorizationRequest>(request_id)? else {
        debug!(request = %request_id, ?decision, "Decision for unknown request, skipping");
        return Ok(TransitionOutcome::Missing);
    };

    let from = request.state;
    if from == decision {
        return Ok(TransitionOutcome::Unchanged);
    }
    if decision == RequestState::Requested || !from.can_transition_to(decision) {
        warn!(request = %request_id, ?from, to = ?decision, "Illegal request transition ignored");
        return Ok(TransitionOutcome::Ignored { from, to: decision });
    }

    request.state = decision;
    if let Some(amount) = approved_amount {
        request.approved_amount = amount;
    }
    request.provenance = provenance;
    store.save(&request)?;

    let keep_link = decision != RequestState::Approved && sibling_approved(store, &request)?;
    if keep_link {
        debug!(request = %request_id, "Sibling request still approved, keeping target link");
    }

    if let Some(mut resource) = store.load::<CompositeResource>(&request.resource)? {
        let mut changed = insert_unique(&mut resource.request_history, request_id);
        changed |= match decision {
            RequestState::Approved => insert_unique(&mut resource.authorized_targets, &request.target),
            _ if keep_link => false,
            _ => remove_all(&mut resource.authorized_targets, &request.target),
        };
        if changed {
            resource.updated_at = provenance.block_timestamp;
            store.save(&resource)?;
        }
    }

    if request.target_kind.is_resource() {
        if let Some(mut target) = store.load::<CompositeResource>(&request.target)? {
            let changed = match decision {
                RequestState::Approved => insert_unique(&mut target.authorized_children, &request.resource),
                _ if keep_link => false,
                _ => remove_all(&mut target.authorized_children, &request.resource),
            };
            if changed {
                store.save(&target)?;
            }
        }
    }

    debug!(request = %request_id, ?from, to = ?decision, "Request decided");
    Ok(TransitionOutcome::Applied { from, to: decision })
}

/// Whether the request with the opposite physical flag is approved.
fn sibling_approved<S: EntityStore + ?Sized>(
    store: &S,
    request: &AuthorizationRequest,
) -> Result<bool, StoreError> {
    let sibling = keys::request(
        &request.resource,
        &request.target,
        &request.target_contract,
        !request.is_physical,
    );
    Ok(store
        .load::<AuthorizationRequest>(&sibling)?
        .is_some_and(|r| r.state == RequestState::Approved))
}
