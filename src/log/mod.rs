//! Log file naming, the log codec, snapshot folding, and log appends.
//!
//! A log file is the atomic unit of manifest change — each append
//! produces exactly one new, immutable file under `<prefix>/_log/`. Its
//! name encodes everything needed to order it against every other log
//! file without opening it: a 13-digit millisecond timestamp, a
//! single-character marker (`i` for insert-class appends, `m` for
//! merge/cleanup-class appends), and a uuid tie-breaker.

pub mod reader;
pub mod record;
pub mod writer;

#[cfg(test)]
mod tests;

pub use reader::{FileMarker, Snapshot, read_at_max_time};
pub use record::{LogCodecError, LogRecord, LOG_FORMAT_VERSION};
pub use writer::append_log;

use std::cmp::Ordering;

use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

pub const LOG_DIR: &str = "_log";

/// Whether a log file resulted from an insert-class append (data-only, no
/// tombstones) or a merge/cleanup-class append (tombstones and/or a
/// compacted rewrite). Tombstone-cleanup only ever folds `Insert`-marked
/// logs into a compacted `Merge`-marked log; `Merge`-marked logs are
/// never themselves recursively compacted, so every compaction stays in
/// the log as a permanent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Insert,
    Merge,
}

impl Marker {
    fn as_char(self) -> char {
        match self {
            Marker::Insert => 'i',
            Marker::Merge => 'm',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(Marker::Insert),
            'm' => Some(Marker::Merge),
            _ => None,
        }
    }
}

/// Errors raised while working with the log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error("corrupt log {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: LogCodecError,
    },

    #[error("schema conflict: {0}")]
    SchemaConflict(#[from] crate::row::SchemaError),
}

/// A parsed log filename: its millisecond timestamp, marker, and uuid.
/// Two log files are ordered first by timestamp, then by uuid — the
/// result of folding the log depends only on the *set* of log files
/// visible, never on the order a listing happens to return them in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileName {
    pub key: String,
    pub timestamp_ms: i64,
    pub marker: Marker,
    pub uuid: Uuid,
}

impl Ord for LogFileName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp_ms
            .cmp(&other.timestamp_ms)
            .then_with(|| self.uuid.cmp(&other.uuid))
    }
}

impl PartialOrd for LogFileName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Builds the key for a new log file: `_log/<13-digit-ms>_<marker>_<uuid4>.jsonl`.
pub fn log_key(timestamp_ms: i64, marker: Marker, uuid: Uuid) -> String {
    format!(
        "{LOG_DIR}/{timestamp_ms:013}_{}_{uuid}.jsonl",
        marker.as_char()
    )
}

/// Parses a log key (as returned by `ObjectStore::list_all`) back into its
/// components. Returns `None` for any key that doesn't match the expected
/// shape — callers should treat such entries as not-a-log-file rather than
/// as corruption, since a bucket prefix may hold other objects.
pub fn parse_log_key(key: &str) -> Option<LogFileName> {
    let file_name = key.strip_prefix(&format!("{LOG_DIR}/"))?;
    let file_name = file_name.strip_suffix(".jsonl")?;
    let mut parts = file_name.splitn(3, '_');
    let ts_str = parts.next()?;
    let marker_str = parts.next()?;
    let uuid_str = parts.next()?;

    if ts_str.len() != 13 {
        return None;
    }
    let timestamp_ms: i64 = ts_str.parse().ok()?;
    let marker = Marker::from_char(marker_str.chars().next()?)?;
    let uuid = Uuid::parse_str(uuid_str).ok()?;

    Some(LogFileName {
        key: key.to_string(),
        timestamp_ms,
        marker,
        uuid,
    })
}

/// Returns the current wall-clock time in milliseconds since the Unix
/// epoch. The sole clock source used by the log protocol — log filenames,
/// tombstone timestamps, and cleanup retention thresholds are all
/// compared against this.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
