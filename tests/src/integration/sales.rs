use crate::fixtures::*;
use fgo_sync::domain::entities::{CompositeResource, Order, OrderLine, Payment, PhysicalRights, Principal};
use fgo_sync::domain::value_objects::{ContractKind, Role};
use fgo_sync::ports::outbound::{OrderReceipt, PaymentData, ResourceState};
use fgo_sync::{ApplyOutcome, EventKind, SkipReason, SnapshotLedger, SyncEngineApi};
use shared_types::{keys, Address, EntityId, U256};

const A: TestAuthority = TestAuthority::new(0xA0);

fn buyer() -> Address {
    addr(0xB9)
}

fn market() -> Address {
    A.contract(ContractKind::Market)
}

fn child() -> EntityId {
    A.resource_id(ContractKind::Child, 1)
}

fn editions(supply: u64, physical: u64) -> ResourceState {
    ResourceState {
        supply_count: U256::from(supply),
        current_physical_editions: U256::from(physical),
        ..resource_state(addr(0xE1), 20, vec![])
    }
}

fn minted(count: u64, is_physical: bool) -> EventKind {
    EventKind::ChildMinted {
        token_id: U256::one(),
        amount: amount(count),
        buyer: buyer(),
        market: market(),
        is_physical,
    }
}

fn with_child(ledger: SnapshotLedger) -> Harness {
    init_test_logging();
    let ledger = ledger.with_resource(A.contract(ContractKind::Child), U256::one(), editions(0, 0));
    let mut h = Harness::with_ledger(ledger);
    h.deploy(A, &[ContractKind::Child, ContractKind::Market]).unwrap();
    h.create_resource(A, ContractKind::Child, 1).unwrap();
    h
}

fn rights_id() -> EntityId {
    keys::physical_rights(&child(), &buyer(), &market())
}

#[test]
fn test_physical_mints_accumulate_rights_and_refresh_counts() {
    let mut h = with_child(SnapshotLedger::new());
    let children = A.contract(ContractKind::Child);

    h.ledger_mut().set_resource(children, U256::one(), editions(2, 2));
    assert_eq!(h.apply(children, minted(2, true)).unwrap(), ApplyOutcome::Applied);
    h.ledger_mut().set_resource(children, U256::one(), editions(5, 5));
    assert_eq!(h.apply(children, minted(3, true)).unwrap(), ApplyOutcome::Applied);

    let rights: PhysicalRights = h.load(&rights_id()).unwrap();
    assert_eq!(rights.guaranteed_amount, amount(5));
    assert_eq!(rights.non_guaranteed_amount, amount(0));
    assert_eq!(rights.resource, child());
    let resource: CompositeResource = h.load(&child()).unwrap();
    assert_eq!(resource.supply_count, U256::from(5u64));
    assert_eq!(resource.current_physical_editions, U256::from(5u64));
    assert_eq!(resource.physical_rights, vec![rights_id()]);
}

#[test]
fn test_replayed_mint_is_counted_once() {
    let mut h = with_child(SnapshotLedger::new());
    let event = h.event(A.contract(ContractKind::Child), minted(4, true));

    assert_eq!(h.service.apply(&event).unwrap(), ApplyOutcome::Applied);
    let once = h.snapshot();
    let replayed = h.service.apply(&event).unwrap();

    assert_eq!(replayed, ApplyOutcome::Skipped(SkipReason::Unchanged));
    assert_eq!(h.snapshot(), once);
    let rights: PhysicalRights = h.load(&rights_id()).unwrap();
    assert_eq!(rights.guaranteed_amount, amount(4));
}

#[test]
fn test_digital_mint_only_refreshes_counts() {
    let mut h = with_child(SnapshotLedger::new());
    let children = A.contract(ContractKind::Child);
    h.ledger_mut().set_resource(children, U256::one(), editions(1, 0));

    assert_eq!(h.apply(children, minted(1, false)).unwrap(), ApplyOutcome::Applied);
    assert_eq!(
        h.apply(children, minted(1, false)).unwrap(),
        ApplyOutcome::Skipped(SkipReason::Unchanged)
    );

    assert!(h.load::<PhysicalRights>(&rights_id()).is_none());
    let resource: CompositeResource = h.load(&child()).unwrap();
    assert_eq!(resource.supply_count, U256::one());
    assert!(resource.physical_rights.is_empty());
}

#[test]
fn test_mint_for_unknown_resource_is_skipped() {
    let mut h = with_child(SnapshotLedger::new());
    let outcome = h
        .apply(
            A.contract(ContractKind::Child),
            EventKind::ChildMinted {
                token_id: U256::from(9u64),
                amount: amount(1),
                buyer: buyer(),
                market: market(),
                is_physical: true,
            },
        )
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Skipped(SkipReason::MissingEntity));
}

fn receipt() -> OrderReceipt {
    OrderReceipt {
        status: 1,
        is_physical: true,
        fulfillment_data: "ship to locker 4".to_string(),
        lines: vec![OrderLine {
            contract: A.contract(ContractKind::Child),
            token_id: U256::one(),
            amount: amount(1),
        }],
        payments: vec![
            PaymentData {
                recipient: addr(0xF1),
                fulfiller_id: U256::one(),
                amount: amount(40),
                payment_type: 2,
            },
            PaymentData {
                recipient: addr(0xD9),
                fulfiller_id: U256::zero(),
                amount: amount(10),
                payment_type: 0,
            },
        ],
    }
}

fn executed(order_ids: Vec<u64>) -> EventKind {
    EventKind::OrderExecuted {
        buyer: buyer(),
        order_ids: order_ids.into_iter().map(U256::from).collect(),
        total_payments: amount(50),
    }
}

#[test]
fn test_order_records_payments_and_lists_fulfiller() {
    let mut h = with_child(SnapshotLedger::new().with_order(market(), U256::from(7u64), receipt()));
    h.create_principal(A, Role::Fulfiller, addr(0xF1)).unwrap();

    let event = h.event(market(), executed(vec![7]));
    assert_eq!(h.service.apply(&event).unwrap(), ApplyOutcome::Applied);
    let once = h.snapshot();
    h.service.apply(&event).unwrap();
    assert_eq!(h.snapshot(), once);

    let order_id = keys::order(&market(), &U256::from(7u64));
    let order: Order = h.load(&order_id).unwrap();
    assert_eq!(order.buyer, buyer());
    assert_eq!(order.total_payments, amount(50));
    assert!(order.is_physical);
    assert_eq!(order.lines[0].resource_id(), child());
    assert_eq!(order.payments, vec![keys::payment(&order_id, 0), keys::payment(&order_id, 1)]);
    let share: Payment = h.load(&order.payments[0]).unwrap();
    assert_eq!(share.amount, amount(40));
    assert_eq!(share.order, order_id);

    let fulfiller: Principal = h.load(&A.principal_id(addr(0xF1))).unwrap();
    assert_eq!(fulfiller.orders, vec![order_id]);
}

#[test]
fn test_unreadable_receipt_records_bare_order() {
    let mut h = with_child(SnapshotLedger::new());

    assert_eq!(h.apply(market(), executed(vec![8])).unwrap(), ApplyOutcome::Applied);

    let order: Order = h.load(&keys::order(&market(), &U256::from(8u64))).unwrap();
    assert_eq!(order.status, 0);
    assert!(order.lines.is_empty());
    assert!(order.payments.is_empty());
}

#[test]
fn test_order_from_non_market_contract_is_not_applicable() {
    let mut h = with_child(SnapshotLedger::new());

    let outcome = h.apply(A.contract(ContractKind::Child), executed(vec![7])).unwrap();

    assert_eq!(outcome, ApplyOutcome::Skipped(SkipReason::NotApplicable));
}
