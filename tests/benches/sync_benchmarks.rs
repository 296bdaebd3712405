//! # FGO Sync Benchmarks
//!
//! | Operation | Cost model |
//! |-----------|------------|
//! | Gate flip | O(principals × contracts) |
//! | Reference resolution | O(reachable references) |
//! | Principal onboarding | O(authorities × contracts) |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fgo_sync::domain::entities::CompositeResource;
use fgo_sync::domain::resolver::ReferenceResolver;
use fgo_sync::domain::value_objects::{ContractKind, Role};
use fgo_sync::{EventKind, SnapshotLedger};
use fgo_tests::fixtures::*;
use shared_types::{Address, U256};
use std::time::Duration;

const HOST: TestAuthority = TestAuthority::new(0x10);
const GUEST: TestAuthority = TestAuthority::new(0x20);

/// Host with one parent contract, plus `principals` guest designers.
fn populated(principals: usize) -> Harness {
    let mut h = Harness::new();
    h.deploy(HOST, &[ContractKind::Parent]).expect("deploy host");
    h.deploy(GUEST, &[]).expect("deploy guest");
    for i in 0..principals {
        let address = Address::from_low_u64_be(0x1000 + i as u64);
        h.create_principal(GUEST, Role::Designer, address)
            .expect("create principal");
    }
    h
}

fn bench_gate_flip(c: &mut Criterion) {
    let mut group = c.benchmark_group("gating");
    group.measurement_time(Duration::from_secs(10));

    for size in [10usize, 100, 500] {
        let mut h = populated(size);
        let mut gated = false;

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("flip", size), &size, |b, _| {
            b.iter(|| {
                gated = !gated;
                black_box(h.gate(HOST, Role::Designer, gated).expect("gate"))
            })
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolver");
    let children = HOST.contract(ContractKind::Child);

    for depth in [4u64, 16, 64] {
        let mut ledger = SnapshotLedger::new().with_resource(
            children,
            U256::one(),
            resource_state(addr(0xE1), 1, vec![]),
        );
        for token in 2..=depth {
            ledger = ledger.with_resource(
                children,
                U256::from(token),
                resource_state(
                    addr(0xE1),
                    1,
                    vec![
                        reference(children, token - 1, 2, 1, true),
                        reference(children, 1, 1, 1, false),
                    ],
                ),
            );
        }
        let mut h = Harness::with_ledger(ledger);
        h.deploy(HOST, &[ContractKind::Child]).expect("deploy");
        for token in 1..=depth {
            h.create_resource(HOST, ContractKind::Child, token).expect("create");
        }
        let root: CompositeResource = h
            .load(&HOST.resource_id(ContractKind::Child, depth))
            .expect("root stored");

        group.bench_with_input(BenchmarkId::new("chain", depth), &root, |b, root| {
            let resolver = ReferenceResolver::new(h.service.store(), 128);
            b.iter(|| black_box(resolver.resolve(root).expect("resolve")))
        });
    }

    group.finish();
}

fn bench_onboarding(c: &mut Criterion) {
    let mut group = c.benchmark_group("onboarding");

    for authorities in [4u8, 12] {
        let mut h = Harness::new();
        for i in 0..authorities {
            let authority = TestAuthority::new(0x10 + i * 0x10);
            h.deploy(authority, &[]).expect("deploy");
            h.apply(addr(FACTORY), authority.contract_deployed(ContractKind::Parent))
                .expect("deploy parent");
        }
        let mut next = 0u64;

        group.bench_function(BenchmarkId::new("designer", authorities), |b| {
            b.iter(|| {
                next += 1;
                let event = EventKind::PrincipalCreated {
                    principal: Address::from_low_u64_be(0x9000 + next),
                    profile_id: U256::one(),
                };
                black_box(
                    h.apply(HOST.registry(Role::Designer), event)
                        .expect("onboard"),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gate_flip, bench_resolution, bench_onboarding);
criterion_main!(benches);
