//! Appends a single log file to the `_log/` prefix.
//!
//! Every operator funnels its manifest mutation through [`append_log`]: the
//! entire record set is serialized in memory and handed to the object
//! store in one `put`, so the append is atomic from a reader's point of
//! view — either the whole file is listable with its full content, or it
//! is not listed at all.

use uuid::Uuid;

use super::record::{LogRecord, LOG_FORMAT_VERSION};
use super::{log_key, now_ms, record, LogError, Marker};
use crate::row::Schema;
use crate::store::ObjectStore;

/// A new data file becoming alive, as recorded in a log append.
#[derive(Debug, Clone)]
pub struct FileAdd {
    pub path: String,
    pub bytes: u64,
    pub rows: u64,
    pub partition: String,
}

/// An existing data file being tombstoned, as recorded in a log append.
#[derive(Debug, Clone)]
pub struct FileTombstone {
    pub path: String,
    pub tombstone_ms: i64,
}

/// The contents of one log append, before it is assigned a timestamp/uuid
/// and written.
#[derive(Debug, Clone, Default)]
pub struct LogAppend {
    pub marker_merge: bool,
    pub author: String,
    /// Present only if the schema changed relative to what the writer had
    /// last observed.
    pub schema: Option<Schema>,
    pub file_adds: Vec<FileAdd>,
    pub file_tombstones: Vec<FileTombstone>,
    pub log_tombstones: Vec<String>,
}

/// Writes `append` as a new log file and returns its key (e.g.
/// `_log/1700000000000_i_<uuid>.jsonl`).
pub fn append_log(store: &dyn ObjectStore, append: LogAppend) -> Result<String, LogError> {
    let marker = if append.marker_merge {
        Marker::Merge
    } else {
        Marker::Insert
    };

    let mut records = Vec::with_capacity(2 + append.file_adds.len() + append.file_tombstones.len() + append.log_tombstones.len());
    records.push(LogRecord::Header {
        ver: LOG_FORMAT_VERSION,
        by: append.author,
    });
    if let Some(schema) = append.schema {
        records.push(LogRecord::Schema { schema });
    }
    for add in append.file_adds {
        records.push(LogRecord::FileAdd {
            path: add.path,
            b: add.bytes,
            r: add.rows,
            p: add.partition,
        });
    }
    for tomb in append.file_tombstones {
        records.push(LogRecord::FileTombstone {
            path: tomb.path,
            ts: tomb.tombstone_ms,
        });
    }
    for log_path in append.log_tombstones {
        records.push(LogRecord::LogTombstone { path: log_path });
    }

    let bytes = record::encode(&records).map_err(|source| LogError::Corrupt {
        path: "<new log>".to_string(),
        source,
    })?;

    let key = log_key(now_ms(), marker, Uuid::new_v4());
    store.put(&key, bytes)?;
    Ok(key)
}
