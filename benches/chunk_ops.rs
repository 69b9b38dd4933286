//! Chunk operation benchmarks
//! Join of many small chunks, and pairwise-unique dedup over a split file

use std::fs;
use std::path::{Path, PathBuf};

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use datamgr::join::join;
use datamgr::ops::{dedup, split};
use datamgr::{Epilogue, Lines};
use tempfile::TempDir;

fn write_chunks(dir: &Path, chunks: usize, rows: usize) -> Vec<PathBuf> {
    fs::create_dir_all(dir).unwrap();
    (1..=chunks)
        .map(|i| {
            let path = dir.join(format!("bench-{i:03}"));
            let body: String = (0..rows).map(|r| format!("{i},{r},payload\n")).collect();
            fs::write(&path, body).unwrap();
            path
        })
        .collect()
}

fn benchmark_join(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let paths = write_chunks(&tmp.path().join("chunks"), 64, 2_000);
    let output = tmp.path().join("joined");

    c.bench_function("join_64_chunks", |b| {
        b.iter(|| {
            let written = join(black_box(&paths), &output).unwrap();
            black_box(written);
        })
    });
}

fn benchmark_dedup(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("input.txt");
    // Every value appears five times, spread over all chunks
    let body: String = (0..20_000).map(|i| format!("value-{}\n", i % 4_000)).collect();
    fs::write(&input, &body).unwrap();
    let mb = body.len() as f64 / 16.0 / 1e6;

    c.bench_function("dedup_16_chunks", |b| {
        b.iter_batched(
            || {
                let dir = tmp.path().join("split");
                let _ = fs::remove_dir_all(&dir);
                split(&Lines, &input, &dir, Some(mb), Epilogue::new()).unwrap();
                dir
            },
            |dir| {
                let report = dedup(&Lines, &dir, Epilogue::new()).unwrap();
                black_box(report.stats);
            },
            BatchSize::PerIteration,
        )
    });
}

criterion_group!(benches, benchmark_join, benchmark_dedup);
criterion_main!(benches);
