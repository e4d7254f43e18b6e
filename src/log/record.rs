//! Log Codec
//!
//! Encodes and parses the five record kinds that make up a log file, per
//! the byte-exact wire format: one JSON object per line, tagged by a
//! single-character `t` field. Writes are single-shot — a whole log file
//! is built in memory and handed to the object store in one `put`; reads
//! parse record-by-record and fail hard (`CorruptLog`) on the first
//! unparseable line or unrecognized tag — no partial recovery is
//! attempted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::row::Schema;

/// Errors raised while encoding or decoding a log file's records.
#[derive(Debug, Error)]
pub enum LogCodecError {
    #[error("corrupt log line {line_no}: {source}")]
    CorruptLine {
        line_no: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported log format version {0}")]
    UnsupportedVersion(u32),
}

/// Current log header version. A reader that encounters a different
/// version in a header record it does not understand treats the file as
/// corrupt rather than guessing at forward compatibility.
pub const LOG_FORMAT_VERSION: u32 = 1;

/// One record within a log file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum LogRecord {
    /// Header: format version and the writer's hostname/author tag. Always
    /// the first line of a log file.
    #[serde(rename = "v")]
    Header { ver: u32, by: String },

    /// Full current schema, written whenever the writer observed a column
    /// that did not previously exist.
    #[serde(rename = "s")]
    Schema { schema: Schema },

    /// A new data file becoming alive.
    #[serde(rename = "f")]
    FileAdd {
        path: String,
        b: u64,
        r: u64,
        p: String,
    },

    /// An existing data file being marked for eventual physical deletion.
    #[serde(rename = "d")]
    FileTombstone { path: String, ts: i64 },

    /// An older log file that may be garbage-collected once aged past the
    /// cleanup retention threshold.
    #[serde(rename = "l")]
    LogTombstone { path: String },
}

/// Serializes `records` as newline-terminated JSON lines, ready for a
/// single `ObjectStore::put`.
pub fn encode(records: &[LogRecord]) -> Result<Vec<u8>, LogCodecError> {
    let mut out = Vec::new();
    for rec in records {
        let line = serde_json::to_vec(rec).map_err(|e| LogCodecError::CorruptLine {
            line_no: 0,
            source: e,
        })?;
        out.extend_from_slice(&line);
        out.push(b'\n');
    }
    Ok(out)
}

/// Parses a log file's raw bytes into its records, in file order. Fails on
/// the first unparseable line — there is no partial recovery within a
/// single log file.
pub fn decode(bytes: &[u8]) -> Result<Vec<LogRecord>, LogCodecError> {
    let text = String::from_utf8_lossy(bytes);
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let rec: LogRecord =
            serde_json::from_str(line).map_err(|e| LogCodecError::CorruptLine {
                line_no: i + 1,
                source: e,
            })?;
        if let LogRecord::Header { ver, .. } = &rec
            && *ver != LOG_FORMAT_VERSION
        {
            return Err(LogCodecError::UnsupportedVersion(*ver));
        }
        records.push(rec);
    }
    Ok(records)
}
