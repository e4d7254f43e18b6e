//! Merge Operator.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::{file_uuid, OpsError};
use crate::columnar::write_rows;
use crate::log::{append_log, now_ms, read_at_max_time, FileAdd, FileTombstone, LogAppend, FileMarker};
use crate::query::QueryEngine;
use crate::row::CompressionCodec;
use crate::store::ObjectStore;

/// Tuning knobs for one [`merge`] call. Defaults are deliberately small —
/// small enough that a demo or test converges in a handful of calls.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// At most this many of a partition's alive files are merged in one call.
    pub max_file_count: usize,
    /// A file larger than this is considered already-compacted and is
    /// excluded from merge candidacy.
    pub max_file_size: u64,
    /// SQL run against a virtual table `source_files` composed of the
    /// selected input files. `None` means plain row-level concatenation,
    /// which never invokes the query engine at all.
    pub custom_query: Option<String>,
    pub author: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_file_count: 32,
            max_file_size: 64 * 1024 * 1024,
            custom_query: None,
            author: String::new(),
        }
    }
}

/// Result of a merge that found an eligible partition.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub log_path: String,
    pub new_file: FileMarker,
    pub partition: String,
    /// Paths of the input files tombstoned by this merge.
    pub merged_files: Vec<String>,
}

/// Picks one eligible partition, merges a batch of its alive files into
/// one new file, and appends a merge-marked log tombstoning the inputs.
///
/// Returns `Ok(None)` when no partition is eligible — a sentinel, not
/// an error; the caller knows to stop looping.
pub fn merge(
    store: &dyn ObjectStore,
    engine: &dyn QueryEngine,
    codec: CompressionCodec,
    config: &MergeConfig,
) -> Result<Option<MergeOutcome>, OpsError> {
    let snapshot = read_at_max_time(store, now_ms())?;

    let mut by_partition: BTreeMap<&str, Vec<&FileMarker>> = BTreeMap::new();
    for file in snapshot.alive_files() {
        if file.bytes <= config.max_file_size {
            by_partition.entry(file.partition.as_str()).or_default().push(file);
        }
    }

    // Lowest partition key among eligible partitions — a deterministic
    // tie-break.
    let Some((partition, mut candidates)) = by_partition
        .into_iter()
        .find(|(_, files)| files.len() >= 2)
    else {
        return Ok(None);
    };
    let partition = partition.to_string();

    // Oldest N by embedded file uuid — stable across processes.
    candidates.sort_by_key(|f| file_uuid(&f.path));
    candidates.truncate(config.max_file_count.max(2));

    let paths: Vec<String> = candidates.iter().map(|f| f.path.clone()).collect();

    let result = match &config.custom_query {
        Some(sql) => engine.query_sql(store, &paths, "source_files", sql)?,
        None => engine.read(store, &paths)?,
    };

    let new_path = format!("{partition}/{}.parquet", Uuid::new_v4());
    let stats = write_rows(store, &new_path, &result.schema, &result.rows, codec)?;

    let tombstone_ms = now_ms();
    let file_tombstones: Vec<FileTombstone> = paths
        .iter()
        .map(|path| FileTombstone {
            path: path.clone(),
            tombstone_ms,
        })
        .collect();

    let log_path = append_log(
        store,
        LogAppend {
            marker_merge: true,
            author: config.author.clone(),
            schema: None,
            file_adds: vec![FileAdd {
                path: new_path.clone(),
                bytes: stats.bytes,
                rows: stats.rows,
                partition: partition.clone(),
            }],
            file_tombstones,
            log_tombstones: vec![],
        },
    )?;

    Ok(Some(MergeOutcome {
        log_path,
        new_file: FileMarker {
            path: new_path,
            bytes: stats.bytes,
            rows: stats.rows,
            partition: partition.clone(),
            tombstone_ms: None,
        },
        partition,
        merged_files: paths,
    }))
}
