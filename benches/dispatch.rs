#![allow(unused)]
extern crate dexray;

#[path = "../src/test/builders.rs"]
mod builders;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use dexray::{Dispatcher, QuarantineInput, Vendor};
use std::hint::black_box;

/// Benchmark signature checks and full decoding of in-memory containers
///
/// `parse` measures the decoder alone; `dispatch` includes the misses of the decoders tried
/// before the right one and writing the payload to the scratch directory.
fn bench_containers(c: &mut Criterion) {
    let payload: Vec<u8> = (0..=255u8).cycle().take(1 << 20).collect();
    let containers = [
        (
            Vendor::AhnLab,
            builders::ahnlab_container("C:\\bench.exe", "Bench", &payload),
        ),
        (Vendor::AvastAvg, builders::avast_container(&payload)),
        (
            Vendor::McAfeeBup,
            builders::bup_container(
                "[File_0]\nOriginalName=C:\\bench.exe\n",
                &[payload.as_slice()],
            ),
        ),
        (Vendor::Defender, builders::defender_resource(&payload)),
        (
            Vendor::TrendMicro,
            builders::trendmicro_container(&[(2, b"bench.exe".to_vec())], &payload),
        ),
    ];

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    for (vendor, container) in &containers {
        group.bench_function(vendor.tag(), |b| {
            b.iter(|| {
                let recovered = vendor.parse(black_box(container)).unwrap();
                black_box(recovered)
            });
        });
    }
    group.finish();

    let scratch = tempfile::tempdir().unwrap();
    let input = QuarantineInput::new("bench.bin", "bench", scratch.path(), "");
    let dispatcher = Dispatcher::default();

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    for (vendor, container) in &containers {
        group.bench_function(vendor.tag(), |b| {
            b.iter(|| {
                let extraction = dispatcher.decode_data(&input, black_box(container)).unwrap();
                black_box(extraction)
            });
        });
    }
    group.finish();
}

/// Benchmark rejecting an input no decoder recognises
fn bench_miss(c: &mut Criterion) {
    let data = vec![0x4Du8; 1 << 20];
    let scratch = tempfile::tempdir().unwrap();
    let input = QuarantineInput::new("miss.bin", "miss", scratch.path(), "");
    let dispatcher = Dispatcher::default();

    c.bench_function("dispatch_miss", |b| {
        b.iter(|| {
            let extraction = dispatcher.decode_data(&input, black_box(&data)).unwrap();
            black_box(extraction)
        });
    });
}

criterion_group!(benches, bench_containers, bench_miss);
criterion_main!(benches);
