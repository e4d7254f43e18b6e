use std::collections::BTreeMap;

use tempfile::TempDir;

use super::reader::read_at_max_time;
use super::record::{decode, encode, LogCodecError, LogRecord, LOG_FORMAT_VERSION};
use super::writer::{append_log, FileAdd, FileTombstone, LogAppend};
use super::{log_key, parse_log_key, Marker, now_ms};
use crate::row::{ColumnType, Schema};
use crate::store::local::LocalFsStore;
use crate::store::ObjectStore;

fn schema(pairs: &[(&str, ColumnType)]) -> Schema {
    let mut row_schema = Schema::new();
    for (col, ty) in pairs {
        let mut row = BTreeMap::new();
        row.insert(
            col.to_string(),
            match ty {
                ColumnType::Int64 => crate::row::Value::Int(0),
                ColumnType::Double => crate::row::Value::Float(0.0),
                ColumnType::Varchar => crate::row::Value::Str(String::new()),
                ColumnType::Bool => crate::row::Value::Bool(false),
            },
        );
        row_schema.union_with(&Schema::from_row(&row)).unwrap();
    }
    row_schema
}

#[test]
fn codec_round_trips_every_record_kind() {
    let records = vec![
        LogRecord::Header {
            ver: LOG_FORMAT_VERSION,
            by: "writer-a".to_string(),
        },
        LogRecord::Schema {
            schema: schema(&[("id", ColumnType::Int64)]),
        },
        LogRecord::FileAdd {
            path: "data/p=x/f1.parquet".to_string(),
            b: 1024,
            r: 10,
            p: "x".to_string(),
        },
        LogRecord::FileTombstone {
            path: "data/p=x/f0.parquet".to_string(),
            ts: 42,
        },
        LogRecord::LogTombstone {
            path: "_log/0000000000001_i_abc.jsonl".to_string(),
        },
    ];

    let bytes = encode(&records).unwrap();
    let decoded = decode(&bytes).unwrap();
    assert_eq!(records, decoded);
}

#[test]
fn decode_fails_hard_on_first_bad_line() {
    let bytes = b"{\"t\":\"v\",\"ver\":1,\"by\":\"a\"}\nnot json\n".to_vec();
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, LogCodecError::CorruptLine { line_no: 2, .. }));
}

#[test]
fn decode_rejects_unsupported_header_version() {
    let bytes = b"{\"t\":\"v\",\"ver\":99,\"by\":\"a\"}\n".to_vec();
    let err = decode(&bytes).unwrap_err();
    assert!(matches!(err, LogCodecError::UnsupportedVersion(99)));
}

#[test]
fn log_key_parses_back_to_its_components() {
    let uuid = uuid::Uuid::new_v4();
    let key = log_key(1_700_000_000_000, Marker::Merge, uuid);
    let parsed = parse_log_key(&key).expect("key should parse");
    assert_eq!(parsed.timestamp_ms, 1_700_000_000_000);
    assert_eq!(parsed.marker, Marker::Merge);
    assert_eq!(parsed.uuid, uuid);
}

#[test]
fn parse_log_key_ignores_foreign_keys() {
    assert!(parse_log_key("data/p=x/f1.parquet").is_none());
    assert!(parse_log_key("_log/not-a-log-file.txt").is_none());
}

#[test]
fn snapshot_folds_inserts_and_tombstones_in_order() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    append_log(
        &store,
        LogAppend {
            marker_merge: false,
            author: "writer-a".to_string(),
            schema: Some(schema(&[("id", ColumnType::Int64)])),
            file_adds: vec![FileAdd {
                path: "data/p=x/f1.parquet".to_string(),
                bytes: 100,
                rows: 5,
                partition: "x".to_string(),
            }],
            file_tombstones: vec![],
            log_tombstones: vec![],
        },
    )
    .unwrap();

    std::thread::sleep(std::time::Duration::from_millis(2));

    append_log(
        &store,
        LogAppend {
            marker_merge: false,
            author: "writer-b".to_string(),
            schema: None,
            file_adds: vec![FileAdd {
                path: "data/p=y/f2.parquet".to_string(),
                bytes: 200,
                rows: 7,
                partition: "y".to_string(),
            }],
            file_tombstones: vec![],
            log_tombstones: vec![],
        },
    )
    .unwrap();

    let snapshot = read_at_max_time(&store, now_ms()).unwrap();
    assert_eq!(snapshot.schema.get("id"), Some(ColumnType::Int64));
    assert_eq!(snapshot.alive_files().count(), 2);
    assert_eq!(snapshot.partitions().len(), 2);
}

#[test]
fn snapshot_respects_max_time_cutoff() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    let before = now_ms();
    std::thread::sleep(std::time::Duration::from_millis(2));

    append_log(
        &store,
        LogAppend {
            marker_merge: false,
            author: "writer-a".to_string(),
            schema: None,
            file_adds: vec![FileAdd {
                path: "data/p=x/f1.parquet".to_string(),
                bytes: 100,
                rows: 5,
                partition: "x".to_string(),
            }],
            file_tombstones: vec![],
            log_tombstones: vec![],
        },
    )
    .unwrap();

    let snapshot = read_at_max_time(&store, before).unwrap();
    assert_eq!(snapshot.alive_files().count(), 0);
}

#[test]
fn file_tombstone_removes_a_file_from_the_alive_set() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    append_log(
        &store,
        LogAppend {
            marker_merge: false,
            author: "writer-a".to_string(),
            schema: None,
            file_adds: vec![FileAdd {
                path: "data/p=x/f1.parquet".to_string(),
                bytes: 100,
                rows: 5,
                partition: "x".to_string(),
            }],
            file_tombstones: vec![],
            log_tombstones: vec![],
        },
    )
    .unwrap();

    std::thread::sleep(std::time::Duration::from_millis(2));

    append_log(
        &store,
        LogAppend {
            marker_merge: true,
            author: "writer-b".to_string(),
            schema: None,
            file_adds: vec![],
            file_tombstones: vec![FileTombstone {
                path: "data/p=x/f1.parquet".to_string(),
                tombstone_ms: now_ms(),
            }],
            log_tombstones: vec![],
        },
    )
    .unwrap();

    let snapshot = read_at_max_time(&store, now_ms()).unwrap();
    assert_eq!(snapshot.alive_files().count(), 0);
    assert_eq!(snapshot.files.len(), 1);
}

#[test]
fn conflicting_schema_append_surfaces_as_log_error() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    append_log(
        &store,
        LogAppend {
            marker_merge: false,
            author: "writer-a".to_string(),
            schema: Some(schema(&[("id", ColumnType::Int64)])),
            file_adds: vec![],
            file_tombstones: vec![],
            log_tombstones: vec![],
        },
    )
    .unwrap();

    std::thread::sleep(std::time::Duration::from_millis(2));

    append_log(
        &store,
        LogAppend {
            marker_merge: false,
            author: "writer-b".to_string(),
            schema: Some(schema(&[("id", ColumnType::Varchar)])),
            file_adds: vec![],
            file_tombstones: vec![],
            log_tombstones: vec![],
        },
    )
    .unwrap();

    let err = read_at_max_time(&store, now_ms()).unwrap_err();
    assert!(matches!(err, super::LogError::SchemaConflict(_)));
}

#[test]
fn list_all_ignores_non_log_objects_in_the_log_prefix() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();
    store.put("_log/README.txt", b"not a log file".to_vec()).unwrap();

    let snapshot = read_at_max_time(&store, now_ms()).unwrap();
    assert!(snapshot.files.is_empty());
    assert!(snapshot.schema.is_empty());
}
