//! Benchmarks for qcd operations.

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use qcd::{codec, Checksummer, MaskRule, RecordDigest, Sketch, SketchKind};

fn bench_record_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_digest");

    for size in [64, 512, 2048, 8192].iter() {
        let data = vec![42u8; *size];

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("compute", size), &data, |b, data| {
            b.iter(|| RecordDigest::compute(black_box(data), None));
        });
    }

    group.finish();
}

fn bench_masked_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("masked_digest");
    let mask = MaskRule::new(r"ts=\d+", "ts=*").unwrap();
    let record = b"level=info ts=1699991234 msg=\"request served\" bytes=4096";

    group.throughput(Throughput::Bytes(record.len() as u64));
    group.bench_function("compute", |b| {
        b.iter(|| RecordDigest::compute(black_box(record), Some(&mask)));
    });

    group.finish();
}

fn bench_sketch_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("sketch_add");

    let digests: Vec<RecordDigest> = (0..1_000u32)
        .map(|i| RecordDigest::compute(&i.to_le_bytes(), None))
        .collect();

    for kind in [SketchKind::Small, SketchKind::Medium, SketchKind::Auto] {
        group.bench_function(BenchmarkId::new("add_1000", format!("{kind:?}")), |b| {
            b.iter(|| {
                let mut sketch = Sketch::new(kind);
                for d in &digests {
                    sketch.add(black_box(d));
                }
                sketch
            });
        });
    }

    group.finish();
}

fn bench_sketch_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("sketch_contains");

    let digests: Vec<RecordDigest> = (0..1_000u32)
        .map(|i| RecordDigest::compute(&i.to_le_bytes(), None))
        .collect();
    let mut sketch = Sketch::new(SketchKind::Small);
    for d in &digests {
        sketch.add(d);
    }

    group.bench_function("hit", |b| {
        b.iter(|| sketch.contains(black_box(&digests[500])));
    });
    let absent = RecordDigest::compute(b"never added", None);
    group.bench_function("miss", |b| {
        b.iter(|| sketch.contains(black_box(&absent)));
    });

    group.finish();
}

fn bench_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum");

    for lines in [1_000usize, 10_000].iter() {
        let mut content = String::new();
        for i in 0..*lines {
            content.push_str(&format!("record number {i} with a bit of padding\n"));
        }

        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("lines", lines), &content, |b, content| {
            b.iter(|| {
                let mut ck = Checksummer::with_sketch(SketchKind::Small);
                ck.sum(Cursor::new(black_box(content.as_bytes()))).unwrap();
                ck.record_count()
            });
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let mut sketch = Sketch::new(SketchKind::Small);
    for i in 0..1_000u32 {
        sketch.add(&RecordDigest::compute(&i.to_le_bytes(), None));
    }
    let blob = codec::pack(&sketch).unwrap();

    group.bench_function("pack_small", |b| {
        b.iter(|| codec::pack(black_box(&sketch)).unwrap());
    });
    group.bench_function("unpack_small", |b| {
        b.iter(|| codec::unpack(black_box(&blob)).unwrap());
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_record_digest,
    bench_masked_digest,
    bench_sketch_add,
    bench_sketch_contains,
    bench_sum,
    bench_codec
);
criterion_main!(benches);
