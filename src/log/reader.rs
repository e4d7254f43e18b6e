//! Log Reader (Snapshot)
//!
//! Composes every log file visible up to a timestamp into a [`Snapshot`]:
//! the current schema, the full file inventory (alive or tombstoned), the
//! set of tombstoned log files, and the ordered list of log files folded.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use super::record::{self, LogRecord};
use super::{parse_log_key, LogError, LogFileName, LOG_DIR};
use crate::row::Schema;
use crate::store::ObjectStore;

/// In-memory record summarizing a data file: path, bytes, rows, partition,
/// and an optional tombstone timestamp. A file with `tombstone.is_some()`
/// is no longer alive but its path, bytes, and row count are preserved
/// from the original file-add (tombstoning never overwrites them).
#[derive(Debug, Clone, PartialEq)]
pub struct FileMarker {
    pub path: String,
    pub bytes: u64,
    pub rows: u64,
    pub partition: String,
    pub tombstone_ms: Option<i64>,
}

impl FileMarker {
    pub fn is_alive(&self) -> bool {
        self.tombstone_ms.is_none()
    }
}

/// The derived state obtained by folding every log file visible up to a
/// read timestamp.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub schema: Schema,
    pub files: BTreeMap<String, FileMarker>,
    pub log_tombstones: BTreeSet<String>,
    /// Every log file folded to produce this snapshot, in fold order
    /// (timestamp, then uuid).
    pub log_files: Vec<LogFileName>,
}

impl Snapshot {
    pub fn alive_files(&self) -> impl Iterator<Item = &FileMarker> {
        self.files.values().filter(|f| f.is_alive())
    }

    pub fn alive_files_in(&self, partition: &str) -> impl Iterator<Item = &FileMarker> {
        self.files
            .values()
            .filter(move |f| f.is_alive() && f.partition == partition)
    }

    /// Distinct alive partitions, sorted.
    pub fn partitions(&self) -> BTreeSet<&str> {
        self.alive_files().map(|f| f.partition.as_str()).collect()
    }

    /// Log files that are listed but have been superseded (named in a
    /// log-tombstone record) — eligible for physical deletion once aged
    /// past a cleanup's retention threshold.
    pub fn tombstoned_log_files(&self) -> impl Iterator<Item = &LogFileName> {
        self.log_files
            .iter()
            .filter(|lf| self.log_tombstones.contains(&lf.key))
    }
}

/// Folds every log file visible up to `max_time_ms` into a [`Snapshot`].
///
/// Lists the `_log/` prefix, filters to files whose filename timestamp is
/// `<= max_time_ms`, sorts by (timestamp, uuid), and folds schema-union,
/// file-add, file-tombstone, and log-tombstone records in order. A log
/// file that fails to parse is assumed to be a concurrent writer still
/// uploading it: the listing is retried exactly once before the failure
/// is surfaced as [`LogError::Corrupt`].
pub fn read_at_max_time(
    store: &dyn ObjectStore,
    max_time_ms: i64,
) -> Result<Snapshot, LogError> {
    let mut log_files = list_log_files(store, max_time_ms)?;
    log_files.sort();

    let mut snapshot = Snapshot::default();

    for log_file in &log_files {
        let records = match fetch_records(store, &log_file.key) {
            Ok(records) => records,
            Err(_) => {
                warn!(key = %log_file.key, "log file failed to parse; retrying listing once");
                // One listing and one re-fetch, per the reader's tolerance
                // for concurrent, not-yet-fully-uploaded writers.
                let refreshed = list_log_files(store, max_time_ms)?;
                if !refreshed.iter().any(|lf| lf.key == log_file.key) {
                    // The file vanished from the listing entirely (e.g. a
                    // racing cleanup deleted it) — simply skip it.
                    continue;
                }
                fetch_records(store, &log_file.key)?
            }
        };
        fold_records(&mut snapshot, records)?;
    }

    snapshot.log_files = log_files;
    Ok(snapshot)
}

fn list_log_files(store: &dyn ObjectStore, max_time_ms: i64) -> Result<Vec<LogFileName>, LogError> {
    let listed = store.list_all(LOG_DIR)?;
    Ok(listed
        .into_iter()
        .filter_map(|obj| parse_log_key(&obj.key))
        .filter(|lf| lf.timestamp_ms <= max_time_ms)
        .collect())
}

fn fetch_records(store: &dyn ObjectStore, key: &str) -> Result<Vec<LogRecord>, LogError> {
    let bytes = store.get(key)?;
    record::decode(&bytes).map_err(|source| LogError::Corrupt {
        path: key.to_string(),
        source,
    })
}

fn fold_records(snapshot: &mut Snapshot, records: Vec<LogRecord>) -> Result<(), LogError> {
    for rec in records {
        match rec {
            LogRecord::Header { .. } => {}
            LogRecord::Schema { schema } => {
                snapshot.schema.union_with(&schema)?;
            }
            LogRecord::FileAdd { path, b, r, p } => {
                snapshot.files.entry(path.clone()).or_insert(FileMarker {
                    path,
                    bytes: b,
                    rows: r,
                    partition: p,
                    tombstone_ms: None,
                });
            }
            LogRecord::FileTombstone { path, ts } => {
                if let Some(marker) = snapshot.files.get_mut(&path) {
                    marker.tombstone_ms = Some(ts);
                }
            }
            LogRecord::LogTombstone { path } => {
                snapshot.log_tombstones.insert(path);
            }
        }
    }
    Ok(())
}
