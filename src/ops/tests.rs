use tempfile::TempDir;

use super::*;
use crate::query::DataFusionEngine;
use crate::row::{CompressionCodec, Row, Value};
use crate::store::local::LocalFsStore;

fn event(ts: i64, event: &str, user_id: &str) -> Row {
    let mut r = Row::new();
    r.insert("ts".to_string(), Value::Int(ts));
    r.insert("event".to_string(), Value::Str(event.to_string()));
    r.insert("user_id".to_string(), Value::Str(user_id.to_string()));
    r
}

fn part_by_user(row: &Row) -> String {
    match row.get("user_id") {
        Some(Value::Str(u)) => format!("u={u}"),
        _ => "u=unknown".to_string(),
    }
}

fn identity(row: Row) -> Row {
    row
}

fn sort_key() -> Vec<String> {
    vec!["ts".to_string()]
}

#[test]
fn insert_then_read_snapshot_sees_alive_files() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    let rows = vec![
        event(1686176939445, "page_load", "a"),
        event(1676126229999, "page_load", "b"),
        event(1686176939666, "something_else", "a"),
    ];

    let outcome = insert::insert(&store, &part_by_user, &identity, &sort_key(), CompressionCodec::Snappy, "host-a", rows).unwrap();
    assert!(outcome.log_path.is_some());
    assert_eq!(outcome.files.len(), 2);

    let snapshot = crate::log::read_at_max_time(&store, crate::log::now_ms()).unwrap();
    assert_eq!(snapshot.alive_files().count(), 2);
    assert_eq!(snapshot.partitions().len(), 2);
}

#[test]
fn empty_insert_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();
    let outcome = insert::insert(&store, &part_by_user, &identity, &sort_key(), CompressionCodec::Snappy, "host-a", vec![]).unwrap();
    assert!(outcome.log_path.is_none());
    assert!(outcome.files.is_empty());
}

#[test]
fn merge_returns_none_when_every_partition_has_fewer_than_two_files() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    insert::insert(
        &store,
        &part_by_user,
        &identity,
        &sort_key(),
        CompressionCodec::Snappy,
        "host-a",
        vec![event(1, "page_load", "a")],
    )
    .unwrap();

    let engine = DataFusionEngine::new().unwrap();
    let result = merge::merge(&store, &engine, CompressionCodec::Snappy, &merge::MergeConfig::default()).unwrap();
    assert!(result.is_none());
}

#[test]
fn merge_tombstones_inputs_and_adds_one_output() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    for _ in 0..3 {
        insert::insert(
            &store,
            &part_by_user,
            &identity,
            &sort_key(),
            CompressionCodec::Snappy,
            "host-a",
            vec![event(1, "page_load", "a"), event(2, "page_load", "b")],
        )
        .unwrap();
    }

    let before = crate::log::read_at_max_time(&store, crate::log::now_ms()).unwrap();
    assert_eq!(before.alive_files_in("u=a").count(), 3);

    let engine = DataFusionEngine::new().unwrap();
    let config = merge::MergeConfig {
        max_file_count: 2,
        ..Default::default()
    };
    let outcome = merge::merge(&store, &engine, CompressionCodec::Snappy, &config)
        .unwrap()
        .expect("a merge-eligible partition exists");
    assert_eq!(outcome.partition, "u=a");
    assert_eq!(outcome.merged_files.len(), 2);
    assert_eq!(outcome.new_file.rows, 2);

    let after = crate::log::read_at_max_time(&store, crate::log::now_ms()).unwrap();
    assert_eq!(after.alive_files_in("u=a").count(), 2);
    for path in &outcome.merged_files {
        assert!(!after.files[path].is_alive());
    }
}

#[test]
fn cleanup_physically_deletes_aged_tombstones_and_folds_insert_logs() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    for _ in 0..3 {
        insert::insert(
            &store,
            &part_by_user,
            &identity,
            &sort_key(),
            CompressionCodec::Snappy,
            "host-a",
            vec![event(1, "page_load", "a")],
        )
        .unwrap();
    }

    let engine = DataFusionEngine::new().unwrap();
    let config = merge::MergeConfig {
        max_file_count: 2,
        ..Default::default()
    };
    merge::merge(&store, &engine, CompressionCodec::Snappy, &config).unwrap().unwrap();

    let before = crate::log::read_at_max_time(&store, crate::log::now_ms()).unwrap();
    assert_eq!(before.log_files.len(), 4); // 3 inserts + 1 merge

    let outcome = cleanup::cleanup(&store, 0, "host-a").unwrap();
    assert!(outcome.compacted_log_path.is_some());
    assert_eq!(outcome.deleted_data_paths.len(), 2); // the two merged-away files
    assert_eq!(outcome.deleted_log_paths.len(), 0); // nothing was log-tombstoned yet

    let after = crate::log::read_at_max_time(&store, crate::log::now_ms()).unwrap();
    // the 3 `_i_` logs fold into 1 new `_m_` log; the original merge's
    // `_m_` log is never itself folded.
    assert_eq!(after.log_files.len(), 2);
    assert_eq!(after.alive_files().count(), before.alive_files().count());

    // running cleanup again immediately is a no-op: no fresh `_i_` logs,
    // nothing newly aged.
    let repeat = cleanup::cleanup(&store, 0, "host-a").unwrap();
    assert!(repeat.compacted_log_path.is_none());
    assert!(repeat.deleted_data_paths.is_empty());
}

#[test]
fn partition_remove_tombstones_matching_partition_only() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    insert::insert(
        &store,
        &part_by_user,
        &identity,
        &sort_key(),
        CompressionCodec::Snappy,
        "host-a",
        vec![event(1, "page_load", "a"), event(2, "page_load", "b")],
    )
    .unwrap();

    let (_, removed) = partition::partition_remove(&store, "host-a", |partitions| {
        partitions.iter().filter(|p| **p == "u=a").map(|s| s.to_string()).collect()
    })
    .unwrap()
    .expect("u=a had an alive file");
    assert_eq!(removed.len(), 1);

    let after = crate::log::read_at_max_time(&store, crate::log::now_ms()).unwrap();
    assert_eq!(after.alive_files_in("u=a").count(), 0);
    assert_eq!(after.alive_files_in("u=b").count(), 1);
}

#[test]
fn partition_remove_is_a_no_op_when_selector_picks_nothing() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    insert::insert(
        &store,
        &part_by_user,
        &identity,
        &sort_key(),
        CompressionCodec::Snappy,
        "host-a",
        vec![event(1, "page_load", "a")],
    )
    .unwrap();

    let result = partition::partition_remove(&store, "host-a", |_| vec![]).unwrap();
    assert!(result.is_none());
}

#[test]
fn partition_rewrite_filters_rows_and_tombstones_prior_files() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    insert::insert(
        &store,
        &part_by_user,
        &identity,
        &sort_key(),
        CompressionCodec::Snappy,
        "host-a",
        vec![event(1, "page_load", "a"), event(2, "click", "a")],
    )
    .unwrap();

    let engine = DataFusionEngine::new().unwrap();
    let outcome = partition::partition_rewrite(
        &store,
        &engine,
        CompressionCodec::Snappy,
        "host-a",
        "u=a",
        "select * from _rows where event != 'page_load'",
    )
    .unwrap()
    .expect("u=a had alive files");

    assert!(outcome.new_file.is_some());
    assert_eq!(outcome.rewritten_files.len(), 1);

    let after = crate::log::read_at_max_time(&store, crate::log::now_ms()).unwrap();
    let alive: Vec<_> = after.alive_files_in("u=a").collect();
    assert_eq!(alive.len(), 1);
    let (_, rows) = crate::columnar::read_rows(&store, &alive[0].path).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("event"), Some(&Value::Str("click".to_string())));
}

#[test]
fn partition_rewrite_to_zero_rows_tombstones_without_adding_a_file() {
    let dir = TempDir::new().unwrap();
    let store = LocalFsStore::open(dir.path()).unwrap();

    insert::insert(
        &store,
        &part_by_user,
        &identity,
        &sort_key(),
        CompressionCodec::Snappy,
        "host-a",
        vec![event(1, "page_load", "a")],
    )
    .unwrap();

    let engine = DataFusionEngine::new().unwrap();
    let outcome = partition::partition_rewrite(
        &store,
        &engine,
        CompressionCodec::Snappy,
        "host-a",
        "u=a",
        "select * from _rows where event = 'never_happened'",
    )
    .unwrap()
    .expect("u=a had alive files");

    assert!(outcome.new_file.is_none());
    let after = crate::log::read_at_max_time(&store, crate::log::now_ms()).unwrap();
    assert_eq!(after.alive_files_in("u=a").count(), 0);
}
