use super::{skipped, HandlerContext};
use crate::domain::authorization::{self, RequestDraft, TransitionOutcome};
use crate::domain::errors::StoreError;
use crate::domain::value_objects::RequestState;
use crate::events::{AuthorizationSubject, LedgerEvent};
use crate::ports::inbound::{ApplyOutcome, SkipReason};
use crate::ports::outbound::{RequestData, RequestLookup};
use shared_types::{keys, Amount, EntityId};
use tracing::warn;

pub(super) fn requested(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    subject: &AuthorizationSubject,
) -> Result<ApplyOutcome, StoreError> {
    let (id, resource, target) = request_keys(event, subject);

    let lookup = RequestLookup {
        resource_contract: event.contract,
        resource_token_id: subject.token_id,
        target_kind: subject.target_kind,
        target_contract: subject.target_contract,
        target_token_id: subject.target_token_id,
        is_physical: subject.is_physical,
    };
    let data = ctx.ledger.authorization_request(&lookup).unwrap_or_else(|e| {
        warn!(request = %id, error = %e, "Request read failed, recording without amount");
        RequestData {
            requested_amount: Amount::zero(),
            timestamp: event.block_timestamp,
        }
    });

    let draft = RequestDraft {
        id,
        resource,
        target,
        target_kind: subject.target_kind,
        target_contract: subject.target_contract,
        is_physical: subject.is_physical,
        requested_amount: data.requested_amount,
        timestamp: data.timestamp,
        provenance: event.provenance(),
    };
    transition_outcome(authorization::record_request(ctx.store, draft)?)
}

pub(super) fn approved(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    subject: &AuthorizationSubject,
    approved_amount: &Amount,
) -> Result<ApplyOutcome, StoreError> {
    decide(ctx, event, subject, RequestState::Approved, Some(*approved_amount))
}

pub(super) fn rejected(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    subject: &AuthorizationSubject,
) -> Result<ApplyOutcome, StoreError> {
    decide(ctx, event, subject, RequestState::Rejected, None)
}

pub(super) fn revoked(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    subject: &AuthorizationSubject,
) -> Result<ApplyOutcome, StoreError> {
    decide(ctx, event, subject, RequestState::Revoked, None)
}

fn decide(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    subject: &AuthorizationSubject,
    decision: RequestState,
    approved_amount: Option<Amount>,
) -> Result<ApplyOutcome, StoreError> {
    let (id, _, _) = request_keys(event, subject);
    let outcome = authorization::decide(ctx.store, &id, decision, approved_amount, event.provenance())?;
    transition_outcome(outcome)
}

/// `(request, resource, target)` keys of the subject on the emitting contract.
fn request_keys(event: &LedgerEvent, subject: &AuthorizationSubject) -> (EntityId, EntityId, EntityId) {
    let resource = event.resource_id(&subject.token_id);
    let target = subject.target_id();
    let id = keys::request(&resource, &target, &subject.target_contract, subject.is_physical);
    (id, resource, target)
}

fn transition_outcome(outcome: TransitionOutcome) -> Result<ApplyOutcome, StoreError> {
    match outcome {
        TransitionOutcome::Created | TransitionOutcome::Applied { .. } => Ok(ApplyOutcome::Applied),
        TransitionOutcome::Unchanged => skipped(SkipReason::Unchanged),
        TransitionOutcome::Ignored { .. } => skipped(SkipReason::IllegalTransition),
        TransitionOutcome::Missing => skipped(SkipReason::MissingEntity),
    }
}
