use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rudiff::engine;
use rudiff::hash::rolling::RollingChecksum;
use rudiff::signature::SignatureHeader;

fn make_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 131 % 251) as u8).collect()
}

fn bench_rolling(c: &mut Criterion) {
    let data = make_data(1 << 20);
    let window = 2048;

    let mut group = c.benchmark_group("rolling");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("absorb_1mib", |b| {
        b.iter(|| {
            let mut r = RollingChecksum::new();
            r.absorb_block(black_box(&data));
            black_box(r.digest())
        })
    });

    group.bench_function("rotate_1mib", |b| {
        b.iter(|| {
            let mut r = RollingChecksum::new();
            r.absorb_block(&data[..window]);
            for i in 0..data.len() - window {
                r.rotate(data[i], data[i + window]);
            }
            black_box(r.digest())
        })
    });

    group.finish();
}

fn bench_signature(c: &mut Criterion) {
    let data = make_data(4 << 20);
    let header = SignatureHeader::default();

    let mut group = c.benchmark_group("signature");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("compute_4mib", |b| {
        b.iter(|| engine::signature_in_memory(black_box(&data), header).unwrap())
    });
    group.finish();
}

fn bench_delta(c: &mut Criterion) {
    let baseline = make_data(4 << 20);
    let mut updated = baseline.clone();
    for i in (0..updated.len()).step_by(64 * 1024) {
        updated[i] = updated[i].wrapping_add(1);
    }
    let sig = engine::signature_in_memory(&baseline, SignatureHeader::default()).unwrap();

    let mut group = c.benchmark_group("delta");
    group.throughput(Throughput::Bytes(updated.len() as u64));
    group.sample_size(20);
    group.bench_function("scan_4mib_sparse_edits", |b| {
        b.iter(|| engine::delta_in_memory(black_box(&sig), black_box(&updated)).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_rolling, bench_signature, bench_delta);
criterion_main!(benches);
