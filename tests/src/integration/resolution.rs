use crate::fixtures::*;
use fgo_sync::domain::entities::CompositeResource;
use fgo_sync::domain::value_objects::ContractKind;
use fgo_sync::{ApplyOutcome, EventKind, SnapshotLedger, SyncConfig};
use shared_types::U256;

const A: TestAuthority = TestAuthority::new(0xA0);

fn child(token_id: u64) -> shared_types::EntityId {
    A.resource_id(ContractKind::Child, token_id)
}

fn harness(ledger: SnapshotLedger, max_depth: usize) -> Harness {
    init_test_logging();
    let config = SyncConfig {
        max_reference_depth: max_depth,
        ..SyncConfig::default()
    };
    let mut h = Harness::with_config(ledger, config);
    h.deploy(A, &[ContractKind::Parent, ContractKind::Child]).unwrap();
    h
}

#[test]
fn test_nested_leaf_counts_product_of_amounts() {
    let children = A.contract(ContractKind::Child);
    let ledger = SnapshotLedger::new()
        .with_resource(children, U256::from(1u64), resource_state(addr(0xE1), 10, vec![]))
        .with_resource(
            children,
            U256::from(2u64),
            resource_state(addr(0xE1), 0, vec![reference(children, 1, 2, 10, false)]),
        )
        .with_resource(
            A.contract(ContractKind::Parent),
            U256::one(),
            resource_state(addr(0xD1), 100, vec![reference(children, 2, 3, 0, true)]),
        );
    let mut h = harness(ledger, 16);

    h.create_resource(A, ContractKind::Child, 1).unwrap();
    h.create_resource(A, ContractKind::Child, 2).unwrap();
    h.create_resource(A, ContractKind::Parent, 1).unwrap();

    let middle: CompositeResource = h.load(&child(2)).unwrap();
    assert_eq!(middle.accumulated_digital_price, amount(20));

    let parent: CompositeResource = h.load(&A.resource_id(ContractKind::Parent, 1)).unwrap();
    assert_eq!(parent.accumulated_digital_price, amount(160));
    assert_eq!(parent.accumulated_physical_price, amount(0));
    let flattened: Vec<_> = parent.all_nested_refs.iter().map(|r| r.target_id.clone()).collect();
    assert_eq!(flattened, vec![child(2), child(1)]);
}

#[test]
fn test_reference_cycle_truncates_without_failing() {
    let children = A.contract(ContractKind::Child);
    let ledger = SnapshotLedger::new()
        .with_resource(
            children,
            U256::from(1u64),
            resource_state(addr(0xE1), 5, vec![reference(children, 2, 1, 1, true)]),
        )
        .with_resource(
            children,
            U256::from(2u64),
            resource_state(addr(0xE1), 5, vec![reference(children, 1, 1, 1, true)]),
        );
    let mut h = harness(ledger, 16);

    assert_eq!(h.create_resource(A, ContractKind::Child, 1).unwrap(), ApplyOutcome::Applied);
    assert_eq!(h.create_resource(A, ContractKind::Child, 2).unwrap(), ApplyOutcome::Applied);

    let second: CompositeResource = h.load(&child(2)).unwrap();
    let flattened: Vec<_> = second.all_nested_refs.iter().map(|r| r.target_id.clone()).collect();
    assert_eq!(flattened, vec![child(1)]);
    assert_eq!(second.accumulated_digital_price, amount(6));
}

#[test]
fn test_depth_limit_cuts_deep_chains() {
    let children = A.contract(ContractKind::Child);
    let mut ledger = SnapshotLedger::new().with_resource(
        children,
        U256::one(),
        resource_state(addr(0xE1), 1, vec![]),
    );
    for token in 2..=4u64 {
        ledger = ledger.with_resource(
            children,
            U256::from(token),
            resource_state(addr(0xE1), 1, vec![reference(children, token - 1, 1, 1, true)]),
        );
    }
    let mut h = harness(ledger, 2);

    for token in 1..=4 {
        h.create_resource(A, ContractKind::Child, token).unwrap();
    }

    let top: CompositeResource = h.load(&child(4)).unwrap();
    let flattened: Vec<_> = top.all_nested_refs.iter().map(|r| r.target_id.clone()).collect();
    assert_eq!(flattened, vec![child(3), child(2)]);
}

#[test]
fn test_missing_nested_composite_keeps_the_reference() {
    let children = A.contract(ContractKind::Child);
    let ledger = SnapshotLedger::new().with_resource(
        A.contract(ContractKind::Parent),
        U256::one(),
        resource_state(addr(0xD1), 50, vec![reference(children, 9, 4, 5, true)]),
    );
    let mut h = harness(ledger, 16);

    h.create_resource(A, ContractKind::Parent, 1).unwrap();

    let parent: CompositeResource = h.load(&A.resource_id(ContractKind::Parent, 1)).unwrap();
    assert_eq!(parent.all_nested_refs.len(), 1);
    assert_eq!(parent.accumulated_digital_price, amount(70));
}

#[test]
fn test_update_reflattens_against_current_ledger_state() {
    let children = A.contract(ContractKind::Child);
    let ledger = SnapshotLedger::new().with_resource(
        A.contract(ContractKind::Parent),
        U256::one(),
        resource_state(addr(0xD1), 50, vec![]),
    );
    let mut h = harness(ledger, 16);
    h.create_resource(A, ContractKind::Parent, 1).unwrap();

    h.ledger_mut().set_resource(
        A.contract(ContractKind::Parent),
        U256::one(),
        resource_state(addr(0xD1), 50, vec![reference(children, 1, 2, 7, false)]),
    );
    let outcome = h
        .apply(
            A.contract(ContractKind::Parent),
            EventKind::ResourceUpdated { token_id: U256::one() },
        )
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Applied);
    let parent: CompositeResource = h.load(&A.resource_id(ContractKind::Parent, 1)).unwrap();
    assert_eq!(parent.references.len(), 1);
    assert_eq!(parent.accumulated_digital_price, amount(64));
}

#[test]
fn test_fan_out_dag_is_bounded_by_flattened_budget() {
    let children = A.contract(ContractKind::Child);
    let mut ledger = SnapshotLedger::new().with_resource(
        children,
        U256::one(),
        resource_state(addr(0xE1), 1, vec![]),
    );
    for token in 2..=12u64 {
        let refs = (0..4).map(|_| reference(children, token - 1, 1, 0, true)).collect();
        ledger = ledger.with_resource(children, U256::from(token), resource_state(addr(0xE1), 1, refs));
    }
    init_test_logging();
    let config = SyncConfig {
        max_flattened_refs: 256,
        ..SyncConfig::default()
    };
    let mut h = Harness::with_config(ledger, config);
    h.deploy(A, &[ContractKind::Child]).unwrap();

    for token in 1..=12 {
        assert_eq!(h.create_resource(A, ContractKind::Child, token).unwrap(), ApplyOutcome::Applied);
    }

    let small: CompositeResource = h.load(&child(3)).unwrap();
    assert_eq!(small.all_nested_refs.len(), 4 + 16);
    let top: CompositeResource = h.load(&child(12)).unwrap();
    assert_eq!(top.all_nested_refs.len(), 256);
    assert_eq!(top.references.len(), 4);
}
