//! Benchmarks for the weight store.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use weight_store::boundary::{UserRange, VmSpace};
use weight_store::mem::pages::HeapPages;
use weight_store::store::registry::WeightStore;

const BASE: u64 = 0x1000;
const PAGE: usize = 4096;

fn bench_put_1mib(c: &mut Criterion) {
    let data = vec![42u8; 1024 * 1024];

    c.bench_function("put_1mib", |b| {
        b.iter_batched(
            || {
                (
                    WeightStore::new(Arc::new(HeapPages::new(PAGE))),
                    VmSpace::from_bytes(BASE, data.clone()),
                )
            },
            |(store, vm)| {
                store
                    .put("weights", UserRange::new(BASE, data.len()), &vm)
                    .unwrap();
                black_box(store);
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_1mib(c: &mut Criterion) {
    let len = 1024 * 1024;
    let store = WeightStore::new(Arc::new(HeapPages::new(PAGE)));
    let src = VmSpace::from_bytes(BASE, vec![42u8; len]);
    store.put("weights", UserRange::new(BASE, len), &src).unwrap();

    let mut dst = VmSpace::new(BASE, len);
    c.bench_function("get_1mib", |b| {
        b.iter(|| {
            let n = store
                .get("weights", UserRange::new(BASE, len), &mut dst)
                .unwrap();
            black_box(n);
        })
    });
}

fn bench_lookup_among_1000(c: &mut Criterion) {
    let store = WeightStore::new(Arc::new(HeapPages::new(PAGE)));
    for i in 0..1000 {
        let src = VmSpace::from_bytes(BASE, vec![i as u8; 64]);
        store
            .put(&format!("w{i}"), UserRange::new(BASE, 64), &src)
            .unwrap();
    }

    // Worst case for the linear scan: the last-inserted name.
    let mut probe = VmSpace::new(0, 0);
    c.bench_function("size_query_among_1000", |b| {
        b.iter(|| {
            let n = store
                .get("w999", UserRange::query(), &mut probe)
                .unwrap();
            black_box(n);
        })
    });
}

criterion_group!(
    benches,
    bench_put_1mib,
    bench_get_1mib,
    bench_lookup_among_1000,
);
criterion_main!(benches);
