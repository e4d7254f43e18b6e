//! Insert Operator: partitions, sorts, writes, and logs a batch of rows.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::{call_user_fn, compare_values, OpsError};
use crate::columnar::write_rows;
use crate::log::{append_log, read_at_max_time, now_ms, FileAdd, FileMarker, LogAppend};
use crate::row::{CompressionCodec, Row, Schema};
use crate::store::ObjectStore;

/// Result of a successful insert: the log file it appended (`None` if the
/// input was empty — a no-op, not an error) and the data files it created.
#[derive(Debug, Clone, Default)]
pub struct InsertOutcome {
    pub log_path: Option<String>,
    pub files: Vec<FileMarker>,
}

/// Sorts, partitions, writes, and logs `rows`.
///
/// `partition_fn`/`format_fn` are called once per row, per the row
/// partitioner/formatter contract. `sort_key` names the columns each
/// partition's rows are stably sorted by before writing, in priority
/// order.
#[allow(clippy::too_many_arguments)]
pub fn insert(
    store: &dyn ObjectStore,
    partition_fn: &(dyn Fn(&Row) -> String + Sync),
    format_fn: &(dyn Fn(Row) -> Row + Sync),
    sort_key: &[String],
    codec: CompressionCodec,
    author: &str,
    rows: Vec<Row>,
) -> Result<InsertOutcome, OpsError> {
    if rows.is_empty() {
        return Ok(InsertOutcome::default());
    }

    let mut by_partition: BTreeMap<String, Vec<Row>> = BTreeMap::new();
    for row in rows {
        let formatted = call_user_fn(std::panic::AssertUnwindSafe(|| format_fn(row)))?;
        let partition = call_user_fn(std::panic::AssertUnwindSafe(|| partition_fn(&formatted)))?;
        by_partition.entry(partition).or_default().push(formatted);
    }

    let mut new_schema = Schema::new();
    let mut file_adds = Vec::new();
    let mut files = Vec::new();

    for (partition, mut group) in by_partition {
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| {
            sort_key
                .iter()
                .map(|col| compare_values(a.get(col.as_str()), b.get(col.as_str())))
                .find(|ord| *ord != std::cmp::Ordering::Equal)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut file_schema = Schema::new();
        for row in &group {
            file_schema.union_with(&Schema::from_row(row))?;
        }
        new_schema.union_with(&file_schema)?;

        let path = format!("{partition}/{}.parquet", Uuid::new_v4());
        let stats = write_rows(store, &path, &file_schema, &group, codec)?;

        file_adds.push(FileAdd {
            path: path.clone(),
            bytes: stats.bytes,
            rows: stats.rows,
            partition: partition.clone(),
        });
        files.push(FileMarker {
            path,
            bytes: stats.bytes,
            rows: stats.rows,
            partition,
            tombstone_ms: None,
        });
    }

    if file_adds.is_empty() {
        return Ok(InsertOutcome::default());
    }

    let current = read_at_max_time(store, now_ms())?;
    let mut merged_schema = current.schema.clone();
    merged_schema.union_with(&new_schema)?;
    let schema_record = if current.schema.is_superset_of(&merged_schema) {
        None
    } else {
        Some(merged_schema)
    };

    let log_path = append_log(
        store,
        LogAppend {
            marker_merge: false,
            author: author.to_string(),
            schema: schema_record,
            file_adds,
            file_tombstones: vec![],
            log_tombstones: vec![],
        },
    )?;

    Ok(InsertOutcome {
        log_path: Some(log_path),
        files,
    })
}
