#![allow(missing_docs)]

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use serde::{Deserialize, Serialize};
use shapecode::{Shapecode, ShapecodeObject, Shaped, Value, shape_of};
use std::hint::black_box;

#[derive(Clone, Serialize, Deserialize, ShapecodeObject, Debug)]
struct BenchItem {
    id: u64,
    label: Option<String>,
    payload: Vec<u64>,
}

#[derive(Clone, Serialize, Deserialize, ShapecodeObject, Debug)]
struct BenchCollection {
    data: Vec<BenchItem>,
}

fn generate_data(count: usize) -> BenchCollection {
    let items = (0..count)
        .map(|i| BenchItem {
            id: i as u64,
            label: (i % 3 == 0).then(|| format!("item-{i}")),
            payload: vec![i as u64; 32],
        })
        .collect();
    BenchCollection { data: items }
}

// --- BENCHMARKS ---

fn bench_writers(c: &mut Criterion) {
    let item_count = 10_000;
    let data = generate_data(item_count);
    let codec = Shapecode::new();
    let encoded_len = codec.encode(&data).expect("shapecode encode failed").len();

    println!("Writers item count: {item_count}, frame bytes: {encoded_len}");

    let mut group = c.benchmark_group("Serialization Write");
    group.throughput(Throughput::Bytes(encoded_len as u64));

    // 1. Baseline: bincode
    group.bench_function("bincode_encode", |b| {
        b.iter(|| {
            bincode::serde::encode_to_vec(black_box(&data), bincode::config::standard())
                .expect("bincode encode failed")
        });
    });

    // 2. Shapecode: size, allocate, write
    group.bench_function("shapecode_encode", |b| {
        b.iter(|| codec.encode(black_box(&data)).expect("shapecode encode failed"));
    });

    // 3. Shapecode: reuse one buffer
    group.bench_function("shapecode_write_reused", |b| {
        let mut buffer = vec![0u8; encoded_len];
        b.iter(|| {
            codec
                .write_value(&mut buffer, black_box(&data))
                .expect("shapecode write failed")
        });
    });

    // 4. Shapecode: one frame per item, in parallel
    let shape = shape_of::<BenchItem>();
    let values: Vec<Value> = data.data.iter().map(Shaped::to_value).collect();
    group.bench_function("shapecode_batch", |b| {
        b.iter(|| {
            codec
                .serialize_batch(&shape, black_box(&values))
                .expect("shapecode batch failed")
        });
    });

    group.finish();
}

fn bench_readers(c: &mut Criterion) {
    let item_count = 10_000;
    let data = generate_data(item_count);
    let codec = Shapecode::new();

    let bincode_buffer = bincode::serde::encode_to_vec(&data, bincode::config::standard())
        .expect("bincode encode failed");
    let shapecode_buffer = codec.encode(&data).expect("shapecode encode failed");

    println!("Readers item count: {item_count}");

    let mut group = c.benchmark_group("Deserialization Read");
    group.throughput(Throughput::Bytes(shapecode_buffer.len() as u64));

    // 1. Baseline: bincode
    group.bench_function("bincode_decode", |b| {
        b.iter(|| {
            let (res, _): (BenchCollection, usize) = bincode::serde::decode_from_slice(
                black_box(&bincode_buffer),
                bincode::config::standard(),
            )
            .expect("bincode decode failed");
            res
        });
    });

    // 2. Shapecode: typed decode
    group.bench_function("shapecode_decode", |b| {
        b.iter(|| {
            let (res, _): (BenchCollection, usize) = codec
                .decode(black_box(&shapecode_buffer))
                .expect("shapecode decode failed");
            res
        });
    });

    // 3. Shapecode: value tree only
    let shape = shape_of::<BenchCollection>();
    group.bench_function("shapecode_read_value", |b| {
        b.iter(|| {
            codec
                .read(black_box(&shapecode_buffer), &shape)
                .expect("shapecode read failed")
        });
    });

    group.finish();
}

criterion_group!(benches, bench_writers, bench_readers);
criterion_main!(benches);
