// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the built-in watermarking methods and registry
// lookups.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use filigree_methods::pdf::blank_pdf;
use filigree_methods::{MethodRegistry, ObjectStream, TrailerSeal, WatermarkingMethod};

/// Embed then extract with each built-in method on a 10-page document.
fn bench_round_trip(c: &mut Criterion) {
    let pdf = blank_pdf(10).expect("blank pdf");
    let methods: [&dyn WatermarkingMethod; 2] = [&TrailerSeal, &ObjectStream];

    let mut group = c.benchmark_group("round_trip");
    for method in methods {
        group.bench_function(method.name(), |b| {
            b.iter(|| {
                let marked = method
                    .add_watermark(black_box(&pdf), "bench-secret", "bench-key", None)
                    .expect("embed");
                let secret = method.read_secret(&marked, "bench-key").expect("extract");
                black_box(secret);
            });
        });
    }
    group.finish();
}

/// Applicability checks run before every embed, so they must stay cheap.
fn bench_applicability(c: &mut Criterion) {
    let pdf = blank_pdf(10).expect("blank pdf");

    let mut group = c.benchmark_group("is_watermark_applicable");
    group.bench_function("trailer-seal", |b| {
        b.iter(|| black_box(TrailerSeal.is_watermark_applicable(black_box(&pdf), None)));
    });
    group.bench_function("object-stream", |b| {
        b.iter(|| black_box(ObjectStream.is_watermark_applicable(black_box(&pdf), Some("5"))));
    });
    group.finish();
}

fn bench_registry_resolve(c: &mut Criterion) {
    let registry = MethodRegistry::with_builtin_methods();
    c.bench_function("registry_resolve", |b| {
        b.iter(|| black_box(registry.resolve(black_box("object-stream")).is_ok()));
    });
}

criterion_group!(
    benches,
    bench_round_trip,
    bench_applicability,
    bench_registry_resolve,
);
criterion_main!(benches);
