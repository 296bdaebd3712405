//! # Event Dispatcher
//!
//! Routes each [`EventKind`] to its handler. Handlers are pure functions of
//! the event and the current store state: they load what they touch, mutate,
//! save, and report an [`ApplyOutcome`].

mod infrastructure;
mod principals;
mod requests;
mod resources;
mod sales;
mod supply;

use crate::domain::entities::ContractBinding;
use crate::domain::errors::StoreError;
use crate::domain::metadata::content_hash;
use crate::domain::relationships::MembershipChange;
use crate::domain::value_objects::SyncConfig;
use crate::events::{EventKind, LedgerEvent};
use crate::ports::inbound::{ApplyOutcome, SkipReason};
use crate::ports::outbound::{EngineMetrics, EntityStore, EntityStoreExt, LedgerReader, MetadataSink};
use shared_types::{keys, Address, EntityId};
use tracing::debug;

/// Collaborators available to a handler for one event.
pub struct HandlerContext<'a> {
    pub store: &'a mut dyn EntityStore,
    pub ledger: &'a dyn LedgerReader,
    pub metadata: &'a mut dyn MetadataSink,
    pub metrics: &'a dyn EngineMetrics,
    pub config: &'a SyncConfig,
}

impl HandlerContext<'_> {
    /// Binding of an emitting contract, if it was deployed by a known
    /// authority.
    pub fn binding(&self, contract: &Address) -> Result<Option<ContractBinding>, StoreError> {
        let binding = self.store.load::<ContractBinding>(&keys::binding(contract))?;
        if binding.is_none() {
            debug!(contract = %keys::hex_address(contract), "Event from unbound contract");
        }
        Ok(binding)
    }

    /// Register the document behind `uri` for background fetch and return its
    /// content hash.
    pub fn register_metadata(&mut self, uri: &str, owner: &EntityId) -> Option<String> {
        let hash = content_hash(uri)?;
        self.metadata.register(hash, owner);
        Some(hash.to_string())
    }
}

/// Apply one event through its handler.
pub fn dispatch(ctx: &mut HandlerContext<'_>, event: &LedgerEvent) -> Result<ApplyOutcome, StoreError> {
    match &event.kind {
        EventKind::InfrastructureDeployed {
            infra_id,
            deployer,
            access_control,
            designers_contract,
            suppliers_contract,
            fulfillers_contract,
        } => infrastructure::infrastructure_deployed(
            ctx,
            event,
            infra_id,
            deployer,
            [
                access_control,
                designers_contract,
                suppliers_contract,
                fulfillers_contract,
            ],
        ),
        EventKind::ContractDeployed {
            infra_id,
            contract_kind,
            deployed,
            deployer,
        } => infrastructure::contract_deployed(ctx, event, infra_id, *contract_kind, deployed, deployer),
        EventKind::GatingToggled { role, is_gated } => {
            infrastructure::gating_toggled(ctx, event, *role, *is_gated)
        }
        EventKind::MemberAdded { role, member } => {
            infrastructure::member_changed(ctx, event, *role, member, true)
        }
        EventKind::MemberRemoved { role, member } => {
            infrastructure::member_changed(ctx, event, *role, member, false)
        }

        EventKind::PrincipalCreated {
            principal,
            profile_id,
        } => principals::principal_created(ctx, event, principal, profile_id),
        EventKind::PrincipalUpdated { principal } => {
            principals::principal_updated(ctx, event, principal)
        }
        EventKind::WalletTransferred {
            old_address,
            new_address,
        } => principals::wallet_transferred(ctx, event, old_address, new_address),
        EventKind::PrincipalStatusChanged {
            principal,
            is_active,
        } => principals::status_changed(ctx, event, principal, *is_active),

        EventKind::ResourceCreated { token_id } => resources::resource_created(ctx, event, token_id),
        EventKind::ResourceUpdated { token_id } => resources::resource_updated(ctx, event, token_id),
        EventKind::ResourceStatusChanged { token_id } => {
            resources::status_changed(ctx, event, token_id)
        }
        EventKind::ResourceUsageChanged {
            token_id,
            usage_count,
        } => resources::usage_changed(ctx, event, token_id, usage_count),
        EventKind::ResourceDeleted { token_id } => resources::resource_deleted(ctx, event, token_id),

        EventKind::AuthorizationRequested { subject } => requests::requested(ctx, event, subject),
        EventKind::AuthorizationApproved {
            subject,
            approved_amount,
        } => requests::approved(ctx, event, subject, approved_amount),
        EventKind::AuthorizationRejected { subject } => requests::rejected(ctx, event, subject),
        EventKind::AuthorizationRevoked { subject } => requests::revoked(ctx, event, subject),

        EventKind::SupplyRequestRegistered { position_id } => {
            supply::request_registered(ctx, event, position_id)
        }
        EventKind::ProposalSubmitted { proposal, price } => {
            supply::proposal_submitted(ctx, event, proposal, price)
        }
        EventKind::ProposalCancelled { proposal } => supply::proposal_withdrawn(ctx, event, proposal, false),
        EventKind::ExpiredSupplyReleased { proposal } => {
            supply::proposal_withdrawn(ctx, event, proposal, true)
        }
        EventKind::SupplyRequestPaid { position_id } => supply::request_paid(ctx, event, position_id),

        EventKind::ChildMinted {
            token_id,
            amount,
            buyer,
            market,
            is_physical,
        } => sales::child_minted(ctx, event, token_id, amount, buyer, market, *is_physical),
        EventKind::OrderExecuted {
            buyer,
            order_ids,
            total_payments,
        } => sales::order_executed(ctx, event, buyer, order_ids, total_payments),
    }
}

fn skipped(reason: SkipReason) -> Result<ApplyOutcome, StoreError> {
    Ok(ApplyOutcome::Skipped(reason))
}

fn membership_outcome(change: MembershipChange) -> ApplyOutcome {
    match change {
        MembershipChange::Added | MembershipChange::Removed => ApplyOutcome::Applied,
        MembershipChange::AlreadyPresent | MembershipChange::Absent => {
            ApplyOutcome::Skipped(SkipReason::Unchanged)
        }
        MembershipChange::OwnerMissing => ApplyOutcome::Skipped(SkipReason::MissingEntity),
    }
}
