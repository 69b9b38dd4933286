//! Global deduplication over a split file

use std::collections::HashSet;
use std::fs;

use datamgr::ops::{dedup, sample, split};
use datamgr::{ChunkError, Epilogue, Lines};
use proptest::prelude::*;
use tempfile::TempDir;

/// Distinct lines of `body` in first-occurrence order.
fn distinct_lines(body: &str) -> String {
    let mut seen = HashSet::new();
    body.lines()
        .filter(|line| seen.insert(*line))
        .map(|line| format!("{line}\n"))
        .collect()
}

#[test]
fn test_split_dedup_join() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("words.txt");
    let body: String = (0..500).map(|i| format!("w{}\n", (i * 37) % 61)).collect();
    fs::write(&input, &body).unwrap();
    let dir = tmp.path().join("words");
    let out = tmp.path().join("words.dedup.txt");

    let mb = body.len() as f64 / 8.0 / 1e6;
    split(&Lines, &input, &dir, Some(mb), Epilogue::new()).unwrap();
    let report = dedup(&Lines, &dir, Epilogue::new().join_to(&out).clean(true)).unwrap();

    assert_eq!(fs::read_to_string(&out).unwrap(), distinct_lines(&body));
    assert_eq!(report.stats.rows_kept, 61);
    let removed = report.stats.within_removed + report.stats.across_removed;
    assert_eq!(removed, 500 - 61);
    assert!(!dir.exists());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_dedup_keeps_distinct_union_in_order(
        values in prop::collection::vec(0u8..12, 1..60),
        chunk_rows in 1usize..8,
    ) {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("p");
        fs::create_dir(&dir).unwrap();

        let body: String = values.iter().map(|v| format!("{v}\n")).collect();
        let lines: Vec<&str> = body.lines().collect();
        let chunks: Vec<_> = lines.chunks(chunk_rows).collect();
        let width = chunks.len().to_string().len();
        for (i, rows) in chunks.iter().enumerate() {
            let text: String = rows.iter().map(|r| format!("{r}\n")).collect();
            fs::write(dir.join(format!("p-{:0width$}", i + 1)), text).unwrap();
        }

        let out = tmp.path().join("out");
        dedup(&Lines, &dir, Epilogue::new().join_to(&out)).unwrap();

        prop_assert_eq!(fs::read_to_string(&out).unwrap(), distinct_lines(&body));
    }
}

#[test]
fn test_dedup_missing_dir() {
    let tmp = TempDir::new().unwrap();
    let err = dedup(&Lines, &tmp.path().join("missing"), Epilogue::new()).unwrap_err();
    assert!(matches!(err, ChunkError::ChunkDirMissing(_)));
}

#[test]
fn test_sampler_stops_early_and_cleans() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("s.txt");
    // Blank rows up front, real rows later
    let body = format!("{}{}", "\n".repeat(20), "a\nb\nc\nd\n".repeat(20));
    fs::write(&input, &body).unwrap();
    let dir = tmp.path().join("s");

    let bytes = body.len() as f64;
    let rows = body.lines().count() as f64;
    // 9.5 average rows round up to ten rows per chunk
    let mb = bytes / rows * 9.5 / 1e6;
    let sampled = sample(&Lines, &input, &dir, Some(mb), 4, 3).unwrap().unwrap();

    assert_eq!(
        sampled,
        vec![b"a\n".to_vec(), b"b\n".to_vec(), b"c\n".to_vec()]
    );
    assert!(!dir.exists());
}
