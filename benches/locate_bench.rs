#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use serview::MessageSplicer;
use std::hint::black_box;

/// The eligibility scan runs on every message the host displays, so it
/// has to stay cheap on buffers that carry no payload at all.
fn bench_locate(c: &mut Criterion) {
    let size = 1024 * 1024;

    // Worst case: no marker anywhere, full scan.
    let absent: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();

    // Marker at the very end, full scan with a hit.
    let mut tail_hit = absent.clone();
    let len = tail_hit.len();
    tail_hit[len - 2] = 0xAC;
    tail_hit[len - 1] = 0xED;

    let mut group = c.benchmark_group("eligibility_scan");
    group.throughput(Throughput::Bytes(size as u64));

    group.bench_function("marker_absent", |b| {
        b.iter(|| MessageSplicer::locate(black_box(&absent)));
    });

    group.bench_function("marker_at_tail", |b| {
        b.iter(|| MessageSplicer::locate(black_box(&tail_hit)));
    });

    group.finish();
}

criterion_group!(benches, bench_locate);
criterion_main!(benches);
