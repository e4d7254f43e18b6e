//! Partition-Remove / Partition-Rewrite Operators.

use super::OpsError;
use crate::columnar::write_rows;
use crate::log::{append_log, now_ms, read_at_max_time, FileAdd, FileTombstone, LogAppend};
use crate::query::QueryEngine;
use crate::row::CompressionCodec;
use crate::store::ObjectStore;
use uuid::Uuid;

/// Bulk-tombstones every alive file in the partitions `selector` returns.
///
/// `selector` is called once with every currently-alive partition key and
/// returns the subset to remove. No physical delete — that is
/// [`super::cleanup`]'s job. Returns `Ok(None)` if the selector chose
/// nothing (or chose partitions with no alive files): a no-op, no log is
/// appended.
pub fn partition_remove(
    store: &dyn ObjectStore,
    author: &str,
    selector: impl FnOnce(&[&str]) -> Vec<String>,
) -> Result<Option<(String, Vec<String>)>, OpsError> {
    let snapshot = read_at_max_time(store, now_ms())?;
    let partitions: Vec<&str> = snapshot.partitions().into_iter().collect();

    let selected = super::call_user_fn(std::panic::AssertUnwindSafe(|| selector(&partitions)))?;

    let tombstone_ms = now_ms();
    let file_tombstones: Vec<FileTombstone> = snapshot
        .alive_files()
        .filter(|f| selected.iter().any(|p| p == &f.partition))
        .map(|f| FileTombstone {
            path: f.path.clone(),
            tombstone_ms,
        })
        .collect();

    if file_tombstones.is_empty() {
        return Ok(None);
    }

    let removed_paths: Vec<String> = file_tombstones.iter().map(|t| t.path.clone()).collect();

    let log_path = append_log(
        store,
        LogAppend {
            marker_merge: true,
            author: author.to_string(),
            schema: None,
            file_adds: vec![],
            file_tombstones,
            log_tombstones: vec![],
        },
    )?;

    Ok(Some((log_path, removed_paths)))
}

/// Result of a [`partition_rewrite`] call.
#[derive(Debug, Clone)]
pub struct PartitionRewriteOutcome {
    pub log_path: String,
    /// The new file's path, if the transformation produced any rows.
    pub new_file: Option<String>,
    /// Every file that was alive in the partition before the rewrite.
    pub rewritten_files: Vec<String>,
}

/// Replaces a partition's contents with the result of `transform_sql`, a
/// SQL expression over a virtual table `_rows` exposing every file
/// currently alive in `partition`.
///
/// If the transformation yields zero rows, no new data file is written
/// but every previously-alive file in the partition is still tombstoned.
/// Returns `Ok(None)` if the partition has no alive files to begin with.
pub fn partition_rewrite(
    store: &dyn ObjectStore,
    engine: &dyn QueryEngine,
    codec: CompressionCodec,
    author: &str,
    partition: &str,
    transform_sql: &str,
) -> Result<Option<PartitionRewriteOutcome>, OpsError> {
    let snapshot = read_at_max_time(store, now_ms())?;
    let paths: Vec<String> = snapshot
        .alive_files_in(partition)
        .map(|f| f.path.clone())
        .collect();

    if paths.is_empty() {
        return Ok(None);
    }

    let result = engine.query_sql(store, &paths, "_rows", transform_sql)?;

    let new_file = if result.rows.is_empty() {
        None
    } else {
        let new_path = format!("{partition}/{}.parquet", Uuid::new_v4());
        let stats = write_rows(store, &new_path, &result.schema, &result.rows, codec)?;
        Some((new_path, stats))
    };

    let tombstone_ms = now_ms();
    let file_tombstones: Vec<FileTombstone> = paths
        .iter()
        .map(|path| FileTombstone {
            path: path.clone(),
            tombstone_ms,
        })
        .collect();

    let file_adds = match &new_file {
        Some((path, stats)) => vec![FileAdd {
            path: path.clone(),
            bytes: stats.bytes,
            rows: stats.rows,
            partition: partition.to_string(),
        }],
        None => vec![],
    };

    let log_path = append_log(
        store,
        LogAppend {
            marker_merge: true,
            author: author.to_string(),
            schema: None,
            file_adds,
            file_tombstones,
            log_tombstones: vec![],
        },
    )?;

    Ok(Some(PartitionRewriteOutcome {
        log_path,
        new_file: new_file.map(|(path, _)| path),
        rewritten_files: paths,
    }))
}
