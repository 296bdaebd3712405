use crate::fixtures::*;
use fgo_sync::domain::entities::{
    AuthorizationRequest, CompositeResource, DeployedContract, GlobalRegistry, Principal,
};
use fgo_sync::domain::value_objects::{ContractKind, ResourceStatus, Role, TargetKind};
use fgo_sync::events::AuthorizationSubject;
use fgo_sync::ports::outbound::ResourceState;
use fgo_sync::{ApplyOutcome, EventKind, SkipReason, SnapshotLedger};
use shared_types::{keys, U256};

const A: TestAuthority = TestAuthority::new(0xA0);

fn designer() -> shared_types::Address {
    addr(0xD1)
}

fn deployed_with_designer(ledger: SnapshotLedger) -> Harness {
    init_test_logging();
    let ledger = ledger.with_profile(A.registry(Role::Designer), U256::one(), profile("ipfs://QmD1"));
    let mut h = Harness::with_ledger(ledger);
    h.deploy(A, &[ContractKind::Parent, ContractKind::Child]).unwrap();
    h.create_principal(A, Role::Designer, designer()).unwrap();
    h
}

#[test]
fn test_principal_created_is_listed_in_registry() {
    let h = deployed_with_designer(SnapshotLedger::new());

    let registry: GlobalRegistry = h.load(&keys::registry()).unwrap();
    assert_eq!(registry.all_designers, vec![A.principal_id(designer())]);
    assert_eq!(registry.all_authorities, vec![A.id()]);

    let principal: Principal = h.load(&A.principal_id(designer())).unwrap();
    assert!(principal.is_active);
    assert_eq!(principal.metadata.as_deref(), Some("QmD1"));
}

#[test]
fn test_principal_update_rereads_profile() {
    let mut h = deployed_with_designer(SnapshotLedger::new());
    let registry = A.registry(Role::Designer);

    let unchanged = h.apply(registry, EventKind::PrincipalUpdated { principal: designer() }).unwrap();
    assert_eq!(unchanged, ApplyOutcome::Skipped(SkipReason::Unchanged));

    let refreshed = h.ledger_mut().clone().with_profile(registry, U256::one(), profile("ipfs://QmD1v2"));
    *h.ledger_mut() = refreshed;
    let updated = h.apply(registry, EventKind::PrincipalUpdated { principal: designer() }).unwrap();

    assert_eq!(updated, ApplyOutcome::Applied);
    let principal: Principal = h.load(&A.principal_id(designer())).unwrap();
    assert_eq!(principal.uri, "ipfs://QmD1v2");
    assert_eq!(h.service.metadata().pending().len(), 2);
}

#[test]
fn test_wallet_transfer_keeps_the_key() {
    let mut h = deployed_with_designer(SnapshotLedger::new());
    let transfer = EventKind::WalletTransferred {
        old_address: designer(),
        new_address: addr(0xD9),
    };

    assert_eq!(h.apply(A.registry(Role::Designer), transfer.clone()).unwrap(), ApplyOutcome::Applied);
    assert_eq!(
        h.apply(A.registry(Role::Designer), transfer).unwrap(),
        ApplyOutcome::Skipped(SkipReason::Unchanged)
    );

    let principal: Principal = h.load(&A.principal_id(designer())).unwrap();
    assert_eq!(principal.address, addr(0xD9));
    assert!(h.load::<Principal>(&A.principal_id(addr(0xD9))).is_none());
}

#[test]
fn test_principal_status_toggles() {
    let mut h = deployed_with_designer(SnapshotLedger::new());
    let registry = A.registry(Role::Designer);
    let deactivate = EventKind::PrincipalStatusChanged {
        principal: designer(),
        is_active: false,
    };

    assert_eq!(h.apply(registry, deactivate.clone()).unwrap(), ApplyOutcome::Applied);
    assert_eq!(
        h.apply(registry, deactivate).unwrap(),
        ApplyOutcome::Skipped(SkipReason::Unchanged)
    );
    let unknown = h
        .apply(
            registry,
            EventKind::PrincipalStatusChanged {
                principal: addr(0x77),
                is_active: true,
            },
        )
        .unwrap();
    assert_eq!(unknown, ApplyOutcome::Skipped(SkipReason::MissingEntity));
}

#[test]
fn test_resource_is_listed_on_contract_and_owner() {
    let ledger = SnapshotLedger::new().with_resource(
        A.contract(ContractKind::Parent),
        U256::one(),
        ResourceState {
            uri: "ipfs://QmParent".to_string(),
            ..resource_state(designer(), 100, vec![])
        },
    );
    let mut h = deployed_with_designer(ledger);

    h.create_resource(A, ContractKind::Parent, 1).unwrap();

    let id = A.resource_id(ContractKind::Parent, 1);
    let contract: DeployedContract = h.load(&A.contract_ref(ContractKind::Parent)).unwrap();
    assert_eq!(contract.members, vec![id.clone()]);
    let owner: Principal = h.load(&A.principal_id(designer())).unwrap();
    assert_eq!(owner.resources, vec![id.clone()]);
    let resource: CompositeResource = h.load(&id).unwrap();
    assert_eq!(resource.metadata.as_deref(), Some("QmParent"));
    assert_eq!(resource.authority, A.id());
}

#[test]
fn test_ownership_change_moves_resource_between_principals() {
    let ledger = SnapshotLedger::new()
        .with_profile(A.registry(Role::Designer), U256::from(2u64), profile("ipfs://QmD2"))
        .with_resource(
            A.contract(ContractKind::Parent),
            U256::one(),
            resource_state(designer(), 100, vec![]),
        );
    let mut h = deployed_with_designer(ledger);
    h.apply(
        A.registry(Role::Designer),
        EventKind::PrincipalCreated {
            principal: addr(0xD2),
            profile_id: U256::from(2u64),
        },
    )
    .unwrap();
    h.create_resource(A, ContractKind::Parent, 1).unwrap();

    h.ledger_mut().set_resource(
        A.contract(ContractKind::Parent),
        U256::one(),
        resource_state(addr(0xD2), 100, vec![]),
    );
    h.apply(
        A.contract(ContractKind::Parent),
        EventKind::ResourceUpdated { token_id: U256::one() },
    )
    .unwrap();

    let id = A.resource_id(ContractKind::Parent, 1);
    let previous: Principal = h.load(&A.principal_id(designer())).unwrap();
    let current: Principal = h.load(&A.principal_id(addr(0xD2))).unwrap();
    assert!(previous.resources.is_empty());
    assert_eq!(current.resources, vec![id]);
}

#[test]
fn test_usage_and_status_changes() {
    let ledger = SnapshotLedger::new().with_resource(
        A.contract(ContractKind::Child),
        U256::one(),
        ResourceState {
            status: ResourceStatus::Active,
            ..resource_state(addr(0xE1), 10, vec![])
        },
    );
    let mut h = deployed_with_designer(ledger);
    h.create_resource(A, ContractKind::Child, 1).unwrap();
    let children = A.contract(ContractKind::Child);

    let usage = EventKind::ResourceUsageChanged {
        token_id: U256::one(),
        usage_count: U256::from(3u64),
    };
    assert_eq!(h.apply(children, usage.clone()).unwrap(), ApplyOutcome::Applied);
    assert_eq!(
        h.apply(children, usage).unwrap(),
        ApplyOutcome::Skipped(SkipReason::Unchanged)
    );

    let status = EventKind::ResourceStatusChanged { token_id: U256::one() };
    assert_eq!(
        h.apply(children, status.clone()).unwrap(),
        ApplyOutcome::Skipped(SkipReason::Unchanged)
    );
    h.ledger_mut().set_resource(
        children,
        U256::one(),
        ResourceState {
            status: ResourceStatus::Disabled,
            ..resource_state(addr(0xE1), 10, vec![])
        },
    );
    assert_eq!(h.apply(children, status).unwrap(), ApplyOutcome::Applied);

    let resource: CompositeResource = h.load(&A.resource_id(ContractKind::Child, 1)).unwrap();
    assert_eq!(resource.status, ResourceStatus::Disabled);
    assert_eq!(resource.usage_count, U256::from(3u64));
}

#[test]
fn test_deleting_a_resource_cleans_every_relationship() {
    let ledger = SnapshotLedger::new()
        .with_resource(A.contract(ContractKind::Child), U256::one(), resource_state(designer(), 10, vec![]))
        .with_resource(A.contract(ContractKind::Parent), U256::one(), resource_state(designer(), 100, vec![]));
    let mut h = deployed_with_designer(ledger);
    h.create_resource(A, ContractKind::Child, 1).unwrap();
    h.create_resource(A, ContractKind::Parent, 1).unwrap();

    let subject = AuthorizationSubject {
        token_id: U256::one(),
        target_kind: TargetKind::Parent,
        target_contract: A.contract(ContractKind::Parent),
        target_token_id: Some(U256::one()),
        is_physical: false,
    };
    let children = A.contract(ContractKind::Child);
    h.apply(children, EventKind::AuthorizationRequested { subject: subject.clone() })
        .unwrap();
    h.apply(
        children,
        EventKind::AuthorizationApproved {
            subject,
            approved_amount: amount(1),
        },
    )
    .unwrap();

    let child = A.resource_id(ContractKind::Child, 1);
    let parent = A.resource_id(ContractKind::Parent, 1);
    let request = keys::request(&child, &parent, &A.contract(ContractKind::Parent), false);
    assert!(h.load::<AuthorizationRequest>(&request).is_some());

    let deleted = h.apply(children, EventKind::ResourceDeleted { token_id: U256::one() }).unwrap();
    assert_eq!(deleted, ApplyOutcome::Applied);

    assert!(h.load::<CompositeResource>(&child).is_none());
    assert!(h.load::<AuthorizationRequest>(&request).is_none());
    let parent: CompositeResource = h.load(&parent).unwrap();
    assert!(parent.authorized_children.is_empty());
    let contract: DeployedContract = h.load(&A.contract_ref(ContractKind::Child)).unwrap();
    assert!(contract.members.is_empty());
    let owner: Principal = h.load(&A.principal_id(designer())).unwrap();
    assert_eq!(owner.resources, vec![A.resource_id(ContractKind::Parent, 1)]);

    let again = h.apply(children, EventKind::ResourceDeleted { token_id: U256::one() }).unwrap();
    assert_eq!(again, ApplyOutcome::Skipped(SkipReason::MissingEntity));
}
