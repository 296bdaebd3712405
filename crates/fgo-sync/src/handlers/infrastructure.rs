use super::{membership_outcome, skipped, HandlerContext};
use crate::domain::entities::{Authority, ContractBinding, DeployedContract};
use crate::domain::errors::StoreError;
use crate::domain::gating::{self, GateOutcome};
use crate::domain::registry;
use crate::domain::relationships::{add_member, remove_member};
use crate::domain::value_objects::{ContractKind, Role};
use crate::events::LedgerEvent;
use crate::ports::inbound::{ApplyOutcome, SkipReason};
use crate::ports::outbound::{EntityStoreExt, GateFlags};
use shared_types::{keys, Address, EntityId, InfraId};
use tracing::{debug, info, warn};

const ROLE_CONTRACTS: [ContractKind; 4] = [
    ContractKind::AccessControl,
    ContractKind::Designers,
    ContractKind::Suppliers,
    ContractKind::Fulfillers,
];

pub(super) fn infrastructure_deployed(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    infra_id: &InfraId,
    deployer: &Address,
    contracts: [&Address; 4],
) -> Result<ApplyOutcome, StoreError> {
    let authority_id = keys::authority(infra_id);
    let mut authority = match ctx.store.load::<Authority>(&authority_id)? {
        Some(existing) => existing,
        None => {
            let mut created = Authority::new(*infra_id, *deployer, event.provenance());
            let gates = initial_gates(ctx, &authority_id, contracts[0]);
            created.set_gated(Role::Designer, gates.designer_gated);
            created.set_gated(Role::Supplier, gates.supplier_gated);
            created
        }
    };

    for (kind, contract) in ROLE_CONTRACTS.iter().zip(contracts) {
        set_role_contract(&mut authority, *kind, *contract);
        bind(ctx, contract, &authority_id, *kind)?;
    }
    ctx.store.save(&authority)?;
    registry::enroll_authority(ctx.store, &authority_id)?;

    info!(authority = %authority_id, deployer = %keys::hex_address(deployer), "Infrastructure deployed");
    Ok(ApplyOutcome::Applied)
}

pub(super) fn contract_deployed(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    infra_id: &InfraId,
    kind: ContractKind,
    deployed: &Address,
    deployer: &Address,
) -> Result<ApplyOutcome, StoreError> {
    let authority_id = keys::authority(infra_id);
    let Some(mut authority) = ctx.store.load::<Authority>(&authority_id)? else {
        warn!(authority = %authority_id, ?kind, "Contract deployed under unknown authority");
        return skipped(SkipReason::MissingEntity);
    };

    let contract_ref = keys::deployed_contract(&authority_id, deployed);
    if !ctx.store.exists::<DeployedContract>(&contract_ref)? {
        ctx.store.save(&DeployedContract {
            id: contract_ref.clone(),
            authority: authority_id.clone(),
            kind,
            address: *deployed,
            deployer: *deployer,
            members: Vec::new(),
            provenance: event.provenance(),
        })?;
    }
    bind(ctx, deployed, &authority_id, kind)?;

    set_role_contract(&mut authority, kind, *deployed);
    let affected = gating::propagate_new_contract(ctx.store, &mut authority, &contract_ref, kind)?;
    ctx.store.save(&authority)?;
    ctx.metrics.propagation_fanout(affected);

    info!(authority = %authority_id, contract = %contract_ref, ?kind, affected, "Contract deployed");
    Ok(ApplyOutcome::Applied)
}

pub(super) fn gating_toggled(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    role: Role,
    gated: bool,
) -> Result<ApplyOutcome, StoreError> {
    let Some(binding) = ctx.binding(&event.contract)? else {
        return skipped(SkipReason::UnboundContract);
    };

    match gating::toggle_gate(ctx.store, &binding.authority, role, gated)? {
        GateOutcome::Flipped { affected } => {
            ctx.metrics.gate_flipped(role, gated);
            ctx.metrics.propagation_fanout(affected);
            Ok(ApplyOutcome::Applied)
        }
        GateOutcome::Unchanged => skipped(SkipReason::Unchanged),
        GateOutcome::NotGateable => skipped(SkipReason::NotApplicable),
        GateOutcome::AuthorityMissing => skipped(SkipReason::MissingEntity),
    }
}

pub(super) fn member_changed(
    ctx: &mut HandlerContext<'_>,
    event: &LedgerEvent,
    role: Role,
    member: &Address,
    added: bool,
) -> Result<ApplyOutcome, StoreError> {
    let Some(binding) = ctx.binding(&event.contract)? else {
        return skipped(SkipReason::UnboundContract);
    };

    let principal_id = keys::principal(&binding.authority, member);
    let change = if added {
        add_member(
            ctx.store,
            &binding.authority,
            |authority: &mut Authority| authority.members_mut(role),
            &principal_id,
        )?
    } else {
        remove_member(
            ctx.store,
            &binding.authority,
            |authority: &mut Authority| authority.members_mut(role),
            &principal_id,
        )?
    };
    if change.is_change() {
        let affected = gating::refresh_member(ctx.store, role, member)?;
        ctx.metrics.propagation_fanout(affected);
        debug!(authority = %binding.authority, member = %principal_id, added, affected, "Membership changed");
    }
    Ok(membership_outcome(change))
}

/// Gate state a new authority starts with. An unreadable ledger gates both
/// roles.
fn initial_gates(ctx: &HandlerContext<'_>, authority: &EntityId, access_control: &Address) -> GateFlags {
    match ctx.ledger.authority_gates(*access_control) {
        Ok(flags) => flags,
        Err(e) => {
            warn!(authority = %authority, error = %e, "Gate read failed, starting gated");
            GateFlags::RESTRICTIVE
        }
    }
}

fn bind(
    ctx: &mut HandlerContext<'_>,
    contract: &Address,
    authority: &EntityId,
    kind: ContractKind,
) -> Result<(), StoreError> {
    let binding = ContractBinding::new(*contract, authority.clone(), kind);
    match ctx.store.load::<ContractBinding>(&binding.id)? {
        Some(existing) if existing == binding => Ok(()),
        _ => ctx.store.save(&binding),
    }
}

fn set_role_contract(authority: &mut Authority, kind: ContractKind, contract: Address) {
    match kind {
        ContractKind::AccessControl => authority.access_control = contract,
        ContractKind::Designers => authority.designers_contract = contract,
        ContractKind::Suppliers => authority.suppliers_contract = contract,
        ContractKind::Fulfillers => authority.fulfillers_contract = contract,
        _ => {}
    }
}
