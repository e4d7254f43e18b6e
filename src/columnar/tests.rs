use tempfile::TempDir;

use super::reader::read_rows;
use super::writer::write_rows;
use crate::row::{CompressionCodec, Row, Schema, Value};
use crate::store::local::LocalFsStore;

fn row(id: i64, name: &str, score: f64, active: bool) -> Row {
    let mut r = Row::new();
    r.insert("id".to_string(), Value::Int(id));
    r.insert("name".to_string(), Value::Str(name.to_string()));
    r.insert("score".to_string(), Value::Float(score));
    r.insert("active".to_string(), Value::Bool(active));
    r
}

#[test]
fn write_then_read_round_trips_every_column_type() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    let rows = vec![
        row(1, "alice", 1.5, true),
        row(2, "bob", 2.5, false),
    ];
    let mut schema = Schema::new();
    for r in &rows {
        schema.union_with(&Schema::from_row(r)).unwrap();
    }

    let stats = write_rows(&store, "p=x/f1.parquet", &schema, &rows, CompressionCodec::Snappy).unwrap();
    assert_eq!(stats.rows, 2);
    assert!(stats.bytes > 0);

    let (read_schema, read_back) = read_rows(&store, "p=x/f1.parquet").unwrap();
    assert!(read_schema.is_superset_of(&schema));
    assert_eq!(read_back.len(), 2);
    assert_eq!(read_back[0].get("name"), Some(&Value::Str("alice".to_string())));
    assert_eq!(read_back[1].get("id"), Some(&Value::Int(2)));
}

#[test]
fn null_cells_round_trip_as_absent_columns() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    let mut typed = Row::new();
    typed.insert("id".to_string(), Value::Int(0));
    typed.insert("name".to_string(), Value::Str(String::new()));
    let schema = Schema::from_row(&typed);

    let mut partial = Row::new();
    partial.insert("id".to_string(), Value::Int(1));
    partial.insert("name".to_string(), Value::Null);

    let rows = vec![partial];
    write_rows(&store, "p=x/f1.parquet", &schema, &rows, CompressionCodec::Zstd).unwrap();

    let (_, read_back) = read_rows(&store, "p=x/f1.parquet").unwrap();
    assert_eq!(read_back.len(), 1);
    assert!(read_back[0].get("name").is_none());
}

#[test]
fn nested_json_values_are_stored_as_strings() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    let mut r = Row::new();
    r.insert(
        "properties".to_string(),
        Value::Json(serde_json::json!({"a": 1})),
    );
    let schema = Schema::from_row(&r);

    write_rows(&store, "p=x/f1.parquet", &schema, &[r], CompressionCodec::Snappy).unwrap();

    let (_, read_back) = read_rows(&store, "p=x/f1.parquet").unwrap();
    assert_eq!(
        read_back[0].get("properties"),
        Some(&Value::Str("{\"a\":1}".to_string()))
    );
}
