//! Insert / Merge / Tombstone-Cleanup / Partition-Remove / Partition-Rewrite
//! operators — the background workhorses that mutate the log concurrently
//! and safely.
//!
//! Every operator reads a fresh [`crate::log::Snapshot`], does its work,
//! and folds its decision back in through a single [`crate::log::append_log`]
//! call. None of them hold any lock across calls — correctness comes from
//! the log's fold-order rules, not from mutual exclusion.

pub mod cleanup;
pub mod insert;
pub mod merge;
pub mod partition;

#[cfg(test)]
mod tests;

pub use cleanup::{cleanup, CleanupOutcome};
pub use insert::{insert, InsertOutcome};
pub use merge::{merge, MergeConfig, MergeOutcome};
pub use partition::{partition_remove, partition_rewrite, PartitionRewriteOutcome};

use thiserror::Error;
use uuid::Uuid;

use crate::columnar::ColumnarError;
use crate::log::LogError;
use crate::query::QueryEngineError;
use crate::row::{SchemaError, Value};

/// Errors raised by an operator.
#[derive(Debug, Error)]
pub enum OpsError {
    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("columnar error: {0}")]
    Columnar(#[from] ColumnarError),

    #[error("query engine error: {0}")]
    Query(#[from] QueryEngineError),

    /// A new insert would assign a different leaf type to a pre-existing
    /// column.
    #[error("schema conflict: {0}")]
    Schema(#[from] SchemaError),

    /// A caller-supplied partition or row-format function panicked.
    #[error("partition/row-format function panicked: {0}")]
    PartitionFunction(String),
}

/// Calls a caller-supplied, panic-opaque function, converting a panic into
/// [`OpsError::PartitionFunction`] rather than unwinding through the
/// operator.
pub(crate) fn call_user_fn<T>(f: impl FnOnce() -> T + std::panic::UnwindSafe) -> Result<T, OpsError> {
    std::panic::catch_unwind(f).map_err(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        OpsError::PartitionFunction(msg)
    })
}

/// Extracts the uuid embedded in a data file path (`.../<uuid4>.parquet`),
/// used to order files deterministically across processes without
/// relying on listing order. Returns `None` for a path that does not end
/// in a parseable uuid — callers fall back to lexicographic path order in
/// that case.
pub(crate) fn file_uuid(path: &str) -> Option<Uuid> {
    let file_name = path.rsplit('/').next()?;
    let stem = file_name.strip_suffix(".parquet")?;
    Uuid::parse_str(stem).ok()
}

/// Orders two cell values for the insert operator's stable sort-key
/// comparison. `Null` sorts first; values of different variants that
/// aren't directly comparable are treated as equal (stability then
/// preserves their relative input order).
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Null), Some(Value::Null)) => Ordering::Equal,
        (Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Int(x)), Some(Value::Int(y))) => x.cmp(y),
        (Some(Value::Float(x)), Some(Value::Float(y))) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Some(Value::Int(x)), Some(Value::Float(y))) => (*x as f64).partial_cmp(y).unwrap_or(Ordering::Equal),
        (Some(Value::Float(x)), Some(Value::Int(y))) => x.partial_cmp(&(*y as f64)).unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Str(x)), Some(Value::Str(y))) => x.cmp(y),
        (Some(Value::Json(x)), Some(Value::Json(y))) => x.to_string().cmp(&y.to_string()),
        _ => Ordering::Equal,
    }
}
