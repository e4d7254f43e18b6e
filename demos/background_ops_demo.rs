//! Demo of the background-operator loop: insert a few batches, then run
//! merge-until-done and a tombstone cleanup, printing the snapshot after
//! each step.
//!
//! Stands in for a production ingest service, which would drive these same
//! three operations from independent timers (insert every N seconds, merge
//! every 10N, tombstone-clean every 50N) instead of one sleep loop. Insert,
//! merge, and cleanup are each plain idempotent operations with scheduling
//! left entirely to the caller — this demo picks the simplest of those
//! options, a single thread and a sleep loop.
//!
//! Run with `cargo run --example background-ops-demo`.

use std::thread;
use std::time::Duration;

use logtable::ops::merge::MergeConfig;
use logtable::query::DataFusionEngine;
use logtable::row::{CompressionCodec, Row, Value};
use logtable::store::local::LocalFsStore;
use logtable::table::{Table, TableConfig};

fn part_func(row: &Row) -> String {
    let user_id = match row.get("user_id") {
        Some(Value::Str(u)) => u.clone(),
        _ => "unknown".to_string(),
    };
    format!("u={user_id}")
}

fn identity(row: Row) -> Row {
    row
}

fn batch(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            let mut row = Row::new();
            row.insert("ts".to_string(), Value::Int(i as i64));
            row.insert("event".to_string(), Value::Str("tick".to_string()));
            row.insert("user_id".to_string(), Value::Str("a".to_string()));
            row
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let dir = std::env::temp_dir().join(format!("logtable-background-demo-{}", std::process::id()));
    let store = Box::new(LocalFsStore::open(&dir)?);
    let engine = Box::new(DataFusionEngine::new()?);

    let table = Table::open(
        store,
        engine,
        TableConfig {
            partition_fn: Box::new(part_func),
            format_fn: Box::new(identity),
            sort_key: vec!["ts".to_string()],
            compression: CompressionCodec::Snappy,
            author: "background-ops-demo-host".to_string(),
        },
    );

    for round in 0..5 {
        let outcome = table.insert(batch(10))?;
        println!("round {round}: inserted {} files", outcome.files.len());
        thread::sleep(Duration::from_millis(50));
    }

    let merged = table.merge_until_done(&MergeConfig {
        max_file_count: 2,
        ..Default::default()
    })?;
    println!("ran {} merge passes", merged.len());

    let cleaned = table.cleanup(0)?;
    println!(
        "cleanup: compacted log {:?}, deleted {} data files, {} log files",
        cleaned.compacted_log_path,
        cleaned.deleted_data_paths.len(),
        cleaned.deleted_log_paths.len()
    );

    let snapshot = table.snapshot_at(logtable::log::now_ms())?;
    println!(
        "final: {} alive files across {} partitions, {} log files",
        snapshot.alive_files().count(),
        snapshot.partitions().len(),
        snapshot.log_files.len()
    );

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}
