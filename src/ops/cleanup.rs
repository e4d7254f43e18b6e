//! Tombstone-Cleanup Operator.
//!
//! The only operator that physically deletes anything. Folds every
//! `_i_`-marker log file still reachable (i.e. not already named in a
//! prior cleanup's log-tombstones) into one new `_m_`-marker compacted
//! log, then deletes data files and log files whose tombstones have aged
//! past `min_age_ms`. `_m_`-marker logs — whether from a merge or from an
//! earlier cleanup — are never themselves folded: this keeps every
//! compaction event in the log as a permanent audit trail.

use tracing::warn;

use super::OpsError;
use crate::log::{append_log, now_ms, read_at_max_time, FileAdd, FileTombstone, LogAppend, Marker};
use crate::store::ObjectStore;

/// Result of one [`cleanup`] call.
#[derive(Debug, Clone, Default)]
pub struct CleanupOutcome {
    /// The new compacted log, if any `_i_`-marker logs were folded.
    pub compacted_log_path: Option<String>,
    pub deleted_log_paths: Vec<String>,
    pub deleted_data_paths: Vec<String>,
}

/// Physically deletes data files and log files whose tombstones are at
/// least `min_age_ms` old, and compacts the remaining `_i_`-marker logs
/// into a single new log.
///
/// Idempotent on repeat: a second call with the same `min_age_ms`
/// immediately after the first finds no fresh `_i_`-marker logs to fold
/// and no newly-eligible tombstones, so it is a no-op.
pub fn cleanup(store: &dyn ObjectStore, min_age_ms: i64, author: &str) -> Result<CleanupOutcome, OpsError> {
    let now = now_ms();
    let snapshot = read_at_max_time(store, now)?;

    let mut deleted_data_paths = Vec::new();
    for file in snapshot.files.values() {
        if let Some(ts) = file.tombstone_ms
            && now - ts >= min_age_ms
        {
            match store.delete(&file.path) {
                Ok(()) => deleted_data_paths.push(file.path.clone()),
                Err(e) => warn!(path = %file.path, error = %e, "failed to delete tombstoned data file, skipping"),
            }
        }
    }

    let mut deleted_log_paths = Vec::new();
    for log_file in &snapshot.log_files {
        if snapshot.log_tombstones.contains(&log_file.key) && now - log_file.timestamp_ms >= min_age_ms {
            match store.delete(&log_file.key) {
                Ok(()) => deleted_log_paths.push(log_file.key.clone()),
                Err(e) => warn!(path = %log_file.key, error = %e, "failed to delete superseded log file, skipping"),
            }
        }
    }

    let foldable: Vec<&str> = snapshot
        .log_files
        .iter()
        .filter(|lf| lf.marker == Marker::Insert && !snapshot.log_tombstones.contains(&lf.key))
        .map(|lf| lf.key.as_str())
        .collect();

    if foldable.is_empty() {
        return Ok(CleanupOutcome {
            compacted_log_path: None,
            deleted_log_paths,
            deleted_data_paths,
        });
    }

    let deleted: std::collections::HashSet<&str> = deleted_data_paths.iter().map(String::as_str).collect();
    let mut file_adds = Vec::new();
    let mut file_tombstones = Vec::new();
    for file in snapshot.files.values() {
        if deleted.contains(file.path.as_str()) {
            continue;
        }
        file_adds.push(FileAdd {
            path: file.path.clone(),
            bytes: file.bytes,
            rows: file.rows,
            partition: file.partition.clone(),
        });
        if let Some(ts) = file.tombstone_ms {
            file_tombstones.push(FileTombstone {
                path: file.path.clone(),
                tombstone_ms: ts,
            });
        }
    }

    let log_tombstones: Vec<String> = foldable.into_iter().map(str::to_string).collect();

    let compacted_log_path = append_log(
        store,
        LogAppend {
            marker_merge: true,
            author: author.to_string(),
            schema: if snapshot.schema.is_empty() {
                None
            } else {
                Some(snapshot.schema.clone())
            },
            file_adds,
            file_tombstones,
            log_tombstones,
        },
    )?;

    Ok(CleanupOutcome {
        compacted_log_path: Some(compacted_log_path),
        deleted_log_paths,
        deleted_data_paths,
    })
}
