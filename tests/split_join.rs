//! Split, join and estimate end to end

use std::fs;

use datamgr::estimate::{estimate, estimate_from_counts};
use datamgr::join::join;
use datamgr::ops::split;
use datamgr::{discover, ChunkError, Epilogue, JsonLines, Lines};
use tempfile::TempDir;

fn write_rows(path: &std::path::Path, rows: usize, terminated: bool) -> Vec<u8> {
    let mut body: Vec<u8> = (0..rows)
        .flat_map(|i| format!("row-{i:05},value {}\n", i * 7).into_bytes())
        .collect();
    if !terminated {
        body.pop();
    }
    fs::write(path, &body).unwrap();
    body
}

#[test]
fn test_round_trip_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("big.txt");
    let body = write_rows(&input, 1_000, true);
    let dir = tmp.path().join("big");
    let out = tmp.path().join("out.txt");

    // Roughly 50 rows per chunk
    let mb = body.len() as f64 / 20.0 / 1e6;
    let epilogue = Epilogue::new().join_to(&out);
    let report = split(&Lines, &input, &dir, Some(mb), epilogue).unwrap();

    let count = report.handle.chunk_paths.len();
    assert!(count > 1);
    let width = count.to_string().len();
    let first = dir.join(format!("big-{:0width$}", 1));
    assert_eq!(report.handle.chunk_paths[0], first);
    assert_eq!(report.rows, 1_000);
    assert_eq!(fs::read(&out).unwrap(), body);

    // Rejoining the rediscovered set gives the same bytes
    let again = tmp.path().join("again.txt");
    join(&discover(&dir).unwrap(), &again).unwrap();
    assert_eq!(fs::read(&again).unwrap(), body);
}

#[test]
fn test_round_trip_without_trailing_newline() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("t.txt");
    let body = write_rows(&input, 37, false);
    let dir = tmp.path().join("t");
    let out = tmp.path().join("out.txt");

    let mb = body.len() as f64 / 10.0 / 1e6;
    let epilogue = Epilogue::new().join_to(&out).clean(true);
    split(&Lines, &input, &dir, Some(mb), epilogue).unwrap();

    assert_eq!(fs::read(&out).unwrap(), body);
    assert!(!dir.exists());
}

#[test]
fn test_jsonl_split_join_compact_source() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("data.jsonl");
    let body: String = (0..40)
        .map(|i| format!("{{\"id\":{i},\"tag\":\"t{}\"}}\n", i % 3))
        .collect();
    fs::write(&input, &body).unwrap();
    let dir = tmp.path().join("data");
    let out = tmp.path().join("data.out.jsonl");

    let mb = body.len() as f64 / 4.0 / 1e6;
    let epilogue = Epilogue::new().join_to(&out);
    let report = split(&JsonLines, &input, &dir, Some(mb), epilogue).unwrap();

    assert_eq!(report.rows, 40);
    assert_eq!(fs::read_to_string(&out).unwrap(), body);
}

#[test]
fn test_split_into_existing_dir_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("x.txt");
    write_rows(&input, 3, true);
    let dir = tmp.path().join("x");
    fs::create_dir(&dir).unwrap();

    let err = split(&Lines, &input, &dir, None, Epilogue::new()).unwrap_err();
    assert!(matches!(err, ChunkError::ChunkDirExists(_)));
}

#[test]
fn test_join_of_nothing_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    assert_eq!(join(&[], &out).unwrap(), None);
    assert!(!out.exists());
}

#[test]
fn test_estimator_sanity() {
    let est = estimate_from_counts(10_000, 1_000_000, 1.0);
    assert_eq!(est.rows_per_chunk, 10_000);
    assert_eq!(est.chunk_count, 1);

    let est = estimate_from_counts(10_000, 1_000_000, 0.25);
    assert_eq!(est.rows_per_chunk, 2_500);
    assert_eq!(est.chunk_count, 4);
}

#[test]
fn test_estimator_rejects_bad_input() {
    let tmp = TempDir::new().unwrap();
    let empty = tmp.path().join("empty");
    fs::write(&empty, b"").unwrap();

    assert!(matches!(
        estimate(&empty, 1.0),
        Err(ChunkError::EmptySource(_))
    ));
    assert!(matches!(
        estimate(&empty, 0.0),
        Err(ChunkError::InvalidChunkSize(_))
    ));
    assert!(matches!(
        estimate(&empty, f64::NAN),
        Err(ChunkError::InvalidChunkSize(_))
    ));
}
