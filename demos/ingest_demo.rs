//! Minimal end-to-end demo: open a table over a local directory, insert a
//! handful of events, and query the alive set.
//!
//! Stands in for an out-of-scope HTTP ingest front-end — real ingest would
//! sit an HTTP handler in front of `Table::insert`, batching rows on a
//! timer instead of calling `insert` directly once like this demo does.
//!
//! Run with `cargo run --example ingest-demo`.

use chrono::{TimeZone, Utc};
use logtable::query::DataFusionEngine;
use logtable::row::{CompressionCodec, Row, Value};
use logtable::store::local::LocalFsStore;
use logtable::table::{Table, TableConfig};

/// Partitions by user and UTC day, e.g. `u=alice/d=2023-06-07`.
fn part_func(row: &Row) -> String {
    let user_id = match row.get("user_id") {
        Some(Value::Str(u)) => u.clone(),
        _ => "unknown".to_string(),
    };
    let day = match row.get("ts") {
        Some(Value::Int(ts)) => Utc
            .timestamp_millis_opt(*ts)
            .single()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        _ => "unknown".to_string(),
    };
    format!("u={user_id}/d={day}")
}

fn format_row(mut row: Row) -> Row {
    if let Some(Value::Json(props)) = row.get("properties").cloned() {
        row.insert("properties".to_string(), Value::Str(props.to_string()));
    }
    row
}

fn event(ts: i64, event: &str, user_id: &str, page: &str) -> Row {
    let mut row = Row::new();
    row.insert("ts".to_string(), Value::Int(ts));
    row.insert("event".to_string(), Value::Str(event.to_string()));
    row.insert("user_id".to_string(), Value::Str(user_id.to_string()));
    row.insert(
        "properties".to_string(),
        Value::Json(serde_json::json!({"page_name": page})),
    );
    row
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let dir = std::env::temp_dir().join(format!("logtable-ingest-demo-{}", std::process::id()));
    let store = Box::new(LocalFsStore::open(&dir)?);
    let engine = Box::new(DataFusionEngine::new()?);

    let table = Table::open(
        store,
        engine,
        TableConfig {
            partition_fn: Box::new(part_func),
            format_fn: Box::new(format_row),
            sort_key: vec!["event".to_string(), "ts".to_string()],
            compression: CompressionCodec::Zstd,
            author: "ingest-demo-host".to_string(),
        },
    );

    let rows = vec![
        event(1686176939445, "page_load", "a", "Home"),
        event(1676126229999, "page_load", "b", "Home"),
        event(1686176939666, "something_else", "a", "Profile"),
    ];
    let outcome = table.insert(rows)?;
    println!(
        "inserted {} files, log {:?}",
        outcome.files.len(),
        outcome.log_path
    );

    let schema = table.schema_at(logtable::log::now_ms())?;
    println!("schema: {schema}");

    let result = table.query(
        "alive",
        "select user_id, count(*) as cnt from alive group by user_id order by cnt desc",
    )?;
    for row in &result.rows {
        println!("{row:?}");
    }

    std::fs::remove_dir_all(&dir).ok();
    Ok(())
}
