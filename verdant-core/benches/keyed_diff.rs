//! Benchmark: keyed children reconciliation

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use verdant_core::host::MemoryHost;
use verdant_core::{create_renderer, h, props, AppContext, VNode};

fn list(keys: &[i64]) -> VNode {
    let items = keys
        .iter()
        .map(|&key| h("li", props! { "key" => key }, key.to_string()))
        .collect::<Vec<_>>();
    h("ul", props! {}, items)
}

fn benchmark_reverse(c: &mut Criterion) {
    let forward: Vec<i64> = (0..1000).collect();
    let reversed: Vec<i64> = forward.iter().rev().copied().collect();

    c.bench_function("keyed_reverse_1000", |b| {
        b.iter_batched(
            || {
                let host = MemoryHost::new();
                let root = host.create_root("div");
                let renderer = create_renderer(host);
                let app = Rc::new(AppContext::new());
                let old = list(&forward);
                renderer.render(&old, root, &app).unwrap();
                (renderer, root, app, old, list(&reversed))
            },
            |(renderer, root, app, old, new)| {
                renderer.rerender(&old, &new, root, &app).unwrap();
                black_box(new.el());
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_shuffle_with_churn(c: &mut Criterion) {
    let before: Vec<i64> = (0..1000).collect();
    // Rotate, drop every tenth key and append fresh ones.
    let after: Vec<i64> = before
        .iter()
        .map(|k| (k + 500) % 1000)
        .filter(|k| k % 10 != 0)
        .chain(1000..1100)
        .collect();

    c.bench_function("keyed_shuffle_churn_1000", |b| {
        b.iter_batched(
            || {
                let host = MemoryHost::new();
                let root = host.create_root("div");
                let renderer = create_renderer(host);
                let app = Rc::new(AppContext::new());
                let old = list(&before);
                renderer.render(&old, root, &app).unwrap();
                (renderer, root, app, old, list(&after))
            },
            |(renderer, root, app, old, new)| {
                renderer.rerender(&old, &new, root, &app).unwrap();
                black_box(new.el());
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_unchanged(c: &mut Criterion) {
    let keys: Vec<i64> = (0..1000).collect();
    let host = MemoryHost::new();
    let root = host.create_root("div");
    let renderer = create_renderer(host);
    let app = Rc::new(AppContext::new());
    let mut current = list(&keys);
    renderer.render(&current, root, &app).unwrap();

    c.bench_function("keyed_unchanged_1000", |b| {
        b.iter(|| {
            let next = list(&keys);
            renderer.rerender(&current, &next, root, &app).unwrap();
            current = next;
        })
    });
}

criterion_group!(
    benches,
    benchmark_reverse,
    benchmark_shuffle_with_churn,
    benchmark_unchanged
);
criterion_main!(benches);
