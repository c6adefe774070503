//! Active file benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rotalog_bench::random_data;
use rotalog_storage::ActiveFile;
use tempfile::TempDir;

/// Benchmark ActiveFile append operations.
fn bench_active_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("active_append");

    // Use larger sample size for file operations
    group.sample_size(50);

    for size in [256, 1024, 4096].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let temp_dir = TempDir::new().unwrap();
            let mut file = ActiveFile::open(&temp_dir.path().join("bench.log")).unwrap();
            let data = random_data(size);

            b.iter(|| {
                let offset = file.append(black_box(&data)).unwrap();
                black_box(offset);
            });
        });
    }

    group.finish();
}

/// Benchmark ActiveFile flush and sync operations.
fn bench_active_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("active_flush");
    group.sample_size(20); // Sync is slow

    let temp_dir = TempDir::new().unwrap();
    let mut file = ActiveFile::open(&temp_dir.path().join("bench.log")).unwrap();
    let data = random_data(1024);

    group.bench_function("flush_after_1kb_write", |b| {
        b.iter(|| {
            file.append(&data).unwrap();
            file.flush().unwrap();
        });
    });

    group.bench_function("sync_after_1kb_write", |b| {
        b.iter(|| {
            file.append(&data).unwrap();
            file.sync().unwrap();
        });
    });

    group.finish();
}

/// Benchmark reopening an existing file, which seeds its size from disk.
fn bench_reopen(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bench.log");
    {
        let mut file = ActiveFile::open(&path).unwrap();
        file.append(&random_data(64 * 1024)).unwrap();
    }

    c.bench_function("active_reopen", |b| {
        b.iter(|| {
            let file = ActiveFile::open(black_box(&path)).unwrap();
            black_box(file.size());
        });
    });
}

criterion_group!(benches, bench_active_append, bench_active_flush, bench_reopen);
criterion_main!(benches);
