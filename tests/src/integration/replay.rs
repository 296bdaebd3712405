use crate::fixtures::*;
use fgo_sync::domain::value_objects::{ContractKind, Role, TargetKind};
use fgo_sync::events::{AuthorizationSubject, ProposalRef};
use fgo_sync::domain::entities::OrderLine;
use fgo_sync::ports::outbound::{OrderReceipt, PaymentData, SupplyPosition};
use fgo_sync::{EventKind, LedgerEvent, SnapshotLedger, SyncEngineApi};
use shared_types::{Address, U256};
use std::collections::BTreeSet;

const A: TestAuthority = TestAuthority::new(0xA0);
const B: TestAuthority = TestAuthority::new(0xB0);

fn ledger() -> SnapshotLedger {
    let children = A.contract(ContractKind::Child);
    open_gates(SnapshotLedger::new(), &[A, B])
        .with_profile(B.registry(Role::Designer), U256::one(), profile("ipfs://QmD1"))
        .with_profile(A.registry(Role::Supplier), U256::one(), profile("ipfs://QmE1"))
        .with_resource(children, U256::one(), resource_state(addr(0xE1), 10, vec![]))
        .with_resource(
            children,
            U256::from(2u64),
            resource_state(addr(0xE1), 5, vec![reference(children, 1, 3, 10, true)]),
        )
        .with_resource(
            A.contract(ContractKind::Parent),
            U256::one(),
            resource_state(addr(0xD1), 100, vec![reference(children, 2, 2, 5, true)]),
        )
        .with_position(
            A.contract(ContractKind::SupplyCoordination),
            U256::one(),
            SupplyPosition {
                parent_contract: A.contract(ContractKind::Parent),
                parent_id: U256::one(),
                quantity: amount(1),
                preferred_max_price: amount(30),
                deadline: 0,
                is_physical: false,
                paid: true,
                matched_child_contract: Some(children),
                matched_child_id: Some(U256::one()),
                matched_supplier: Some(addr(0xE1)),
            },
        )
        .with_order(
            A.contract(ContractKind::Market),
            U256::from(3u64),
            OrderReceipt {
                status: 1,
                is_physical: true,
                fulfillment_data: String::new(),
                lines: vec![OrderLine { contract: children, token_id: U256::one(), amount: amount(1) }],
                payments: vec![PaymentData {
                    recipient: addr(0xE2),
                    fulfiller_id: U256::zero(),
                    amount: amount(30),
                    payment_type: 1,
                }],
            },
        )
}

/// A stream touching every handler family.
fn stream() -> Vec<(Address, EventKind)> {
    let subject = AuthorizationSubject {
        token_id: U256::one(),
        target_kind: TargetKind::Parent,
        target_contract: A.contract(ContractKind::Parent),
        target_token_id: Some(U256::one()),
        is_physical: false,
    };
    let proposal = ProposalRef {
        position_id: U256::one(),
        supplier: addr(0xE1),
        child_contract: A.contract(ContractKind::Child),
        child_id: U256::one(),
    };
    let physical = AuthorizationSubject {
        is_physical: true,
        ..subject.clone()
    };
    let expiring = ProposalRef {
        child_id: U256::from(2u64),
        ..proposal.clone()
    };
    let children = A.contract(ContractKind::Child);
    let parents = A.contract(ContractKind::Parent);
    let coordination = A.contract(ContractKind::SupplyCoordination);
    let market = A.contract(ContractKind::Market);
    let access = A.contract(ContractKind::AccessControl);

    vec![
        (addr(FACTORY), A.deployed()),
        (addr(FACTORY), B.deployed()),
        (addr(FACTORY), A.contract_deployed(ContractKind::Parent)),
        (addr(FACTORY), A.contract_deployed(ContractKind::Child)),
        (addr(FACTORY), A.contract_deployed(ContractKind::SupplyCoordination)),
        (addr(FACTORY), A.contract_deployed(ContractKind::Market)),
        (access, EventKind::GatingToggled { role: Role::Designer, is_gated: true }),
        (
            B.registry(Role::Designer),
            EventKind::PrincipalCreated { principal: addr(0xD1), profile_id: U256::one() },
        ),
        (
            A.registry(Role::Supplier),
            EventKind::PrincipalCreated { principal: addr(0xE1), profile_id: U256::one() },
        ),
        (access, EventKind::MemberAdded { role: Role::Designer, member: addr(0xD1) }),
        (
            B.registry(Role::Designer),
            EventKind::PrincipalStatusChanged { principal: addr(0xD1), is_active: false },
        ),
        (B.registry(Role::Designer), EventKind::PrincipalUpdated { principal: addr(0xD1) }),
        (children, EventKind::ResourceCreated { token_id: U256::one() }),
        (children, EventKind::ResourceCreated { token_id: U256::from(2u64) }),
        (parents, EventKind::ResourceCreated { token_id: U256::one() }),
        (parents, EventKind::ResourceUpdated { token_id: U256::one() }),
        (children, EventKind::ResourceCreated { token_id: U256::from(3u64) }),
        (children, EventKind::ResourceStatusChanged { token_id: U256::from(3u64) }),
        (
            children,
            EventKind::ChildMinted {
                token_id: U256::one(),
                amount: amount(1),
                buyer: addr(0xC9),
                market,
                is_physical: true,
            },
        ),
        (
            market,
            EventKind::OrderExecuted {
                buyer: addr(0xC9),
                order_ids: vec![U256::from(3u64)],
                total_payments: amount(30),
            },
        ),
        (children, EventKind::ResourceUsageChanged { token_id: U256::one(), usage_count: U256::from(4u64) }),
        (children, EventKind::AuthorizationRequested { subject: subject.clone() }),
        (
            children,
            EventKind::AuthorizationApproved { subject: subject.clone(), approved_amount: amount(1) },
        ),
        (children, EventKind::AuthorizationRequested { subject: physical.clone() }),
        (children, EventKind::AuthorizationRejected { subject: physical }),
        (coordination, EventKind::SupplyRequestRegistered { position_id: U256::one() }),
        (coordination, EventKind::ProposalSubmitted { proposal: proposal.clone(), price: amount(25) }),
        (coordination, EventKind::ProposalCancelled { proposal }),
        (coordination, EventKind::ProposalSubmitted { proposal: expiring.clone(), price: amount(28) }),
        (coordination, EventKind::ExpiredSupplyReleased { proposal: expiring }),
        (coordination, EventKind::SupplyRequestPaid { position_id: U256::one() }),
        (
            A.registry(Role::Supplier),
            EventKind::WalletTransferred { old_address: addr(0xE1), new_address: addr(0xE2) },
        ),
        (access, EventKind::MemberRemoved { role: Role::Designer, member: addr(0xD1) }),
        (children, EventKind::AuthorizationRevoked { subject }),
        (access, EventKind::GatingToggled { role: Role::Designer, is_gated: false }),
        (children, EventKind::ResourceDeleted { token_id: U256::from(2u64) }),
    ]
}

const HANDLED_KINDS: [&str; 25] = [
    "infrastructure_deployed",
    "contract_deployed",
    "gating_toggled",
    "member_added",
    "member_removed",
    "principal_created",
    "principal_updated",
    "wallet_transferred",
    "principal_status_changed",
    "resource_created",
    "resource_updated",
    "resource_status_changed",
    "resource_usage_changed",
    "resource_deleted",
    "authorization_requested",
    "authorization_approved",
    "authorization_rejected",
    "authorization_revoked",
    "supply_request_registered",
    "proposal_submitted",
    "proposal_cancelled",
    "supply_request_paid",
    "expired_supply_released",
    "child_minted",
    "order_executed",
];

fn stamped(h: &mut Harness) -> Vec<LedgerEvent> {
    stream()
        .into_iter()
        .map(|(contract, kind)| h.event(contract, kind))
        .collect()
}

#[test]
fn test_stream_covers_every_event_kind() {
    let seen: BTreeSet<&str> = stream().iter().map(|(_, kind)| kind.name()).collect();
    let expected: BTreeSet<&str> = HANDLED_KINDS.into_iter().collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_applying_each_event_twice_equals_once() {
    init_test_logging();
    let mut h = Harness::with_ledger(ledger());

    for event in stamped(&mut h) {
        h.service.apply(&event).unwrap();
        let once = h.snapshot();
        h.service.apply(&event).unwrap();
        assert_eq!(h.snapshot(), once, "replaying {} changed the store", event.kind.name());
    }
}

#[test]
fn test_replay_from_scratch_is_deterministic() {
    let mut first = Harness::with_ledger(ledger());
    let mut second = Harness::with_ledger(ledger());
    let events = stamped(&mut first);

    let stats = first.service.apply_all(&events).unwrap();
    second.service.apply_all(&events).unwrap();

    assert_eq!(first.snapshot(), second.snapshot());
    assert_eq!(stats.applied + stats.skipped, events.len() as u64);
}

#[test]
fn test_replay_matches_fresh_graph_after_ungating() {
    let mut h = Harness::with_ledger(ledger());
    let events = stamped(&mut h);
    h.service.apply_all(&events).unwrap();

    let designer: fgo_sync::domain::entities::Principal =
        h.load(&B.principal_id(addr(0xD1))).unwrap();
    assert_eq!(
        designer.authorized_contracts,
        vec![A.contract_ref(ContractKind::Parent)]
    );
}
