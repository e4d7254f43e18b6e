//! `Table` — the public handle that wires the object store, the row
//! partitioner/formatter, and the query engine together behind the
//! insert/merge/cleanup/partition-remove/partition-rewrite operators.
//!
//! A cheap, `Clone`-via-`Arc` handle that can be shared across threads,
//! with configuration supplied once at construction (`TableConfig`) and
//! every mutating call taking `&self` — no internal lock is needed here
//! since all mutation goes through the object store's append-only log
//! rather than shared in-process state.

use std::sync::Arc;

use thiserror::Error;

use crate::columnar::ColumnarError;
use crate::log::{self, LogError, Snapshot};
use crate::ops::{
    self, cleanup::CleanupOutcome, insert::InsertOutcome, merge::MergeConfig, merge::MergeOutcome,
    partition::PartitionRewriteOutcome, OpsError,
};
use crate::query::{QueryEngine, QueryEngineError, QueryResult};
use crate::row::{CompressionCodec, Row, Schema};
use crate::store::{ObjectStore, StoreError};

/// Errors surfaced by [`Table`]'s operations, aggregating every
/// subsystem's error type behind one `#[from]`-derived enum.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("columnar error: {0}")]
    Columnar(#[from] ColumnarError),

    #[error("query engine error: {0}")]
    Query(#[from] QueryEngineError),

    #[error("operator error: {0}")]
    Ops(#[from] OpsError),
}

/// Configuration for a [`Table`] instance. Passed once to [`Table::open`].
pub struct TableConfig {
    /// Routes each row to its partition key. Called once per row, per
    /// insert.
    pub partition_fn: Box<dyn Fn(&Row) -> String + Send + Sync>,
    /// Applies a per-row transform before partitioning. Called once per
    /// row, per insert.
    pub format_fn: Box<dyn Fn(Row) -> Row + Send + Sync>,
    /// Column names each partition's rows are stably sorted by before
    /// being written, in priority order.
    pub sort_key: Vec<String>,
    /// Compression codec applied to every data file this table writes.
    pub compression: CompressionCodec,
    /// Hostname/author tag recorded in every log file's header.
    pub author: String,
}

/// The append-only, log-structured table handle. Cheap to clone — clones
/// share the same underlying store and query engine via `Arc`.
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

struct TableInner {
    store: Box<dyn ObjectStore>,
    engine: Box<dyn QueryEngine>,
    config: TableConfig,
}

impl Table {
    /// Builds a table handle over `store`, using `engine` to run merge's
    /// custom aggregation queries and partition-rewrite's transformations.
    pub fn open(store: Box<dyn ObjectStore>, engine: Box<dyn QueryEngine>, config: TableConfig) -> Self {
        Self {
            inner: Arc::new(TableInner { store, engine, config }),
        }
    }

    /// Applies the row-format and partition functions, sorts each
    /// partition's rows by the configured sort key, writes one data file
    /// per non-empty partition, and appends one insert-marked log file.
    /// An empty `rows` is a no-op, not an error.
    pub fn insert(&self, rows: Vec<Row>) -> Result<InsertOutcome, TableError> {
        let config = &self.inner.config;
        Ok(ops::insert::insert(
            self.inner.store.as_ref(),
            config.partition_fn.as_ref(),
            config.format_fn.as_ref(),
            &config.sort_key,
            config.compression,
            &config.author,
            rows,
        )?)
    }

    /// Picks one eligible partition and merges a batch of its alive files
    /// into one new file, tombstoning the inputs. Returns `Ok(None)` when
    /// no partition is eligible.
    pub fn merge(&self, config: &MergeConfig) -> Result<Option<MergeOutcome>, TableError> {
        Ok(ops::merge::merge(
            self.inner.store.as_ref(),
            self.inner.engine.as_ref(),
            self.inner.config.compression,
            config,
        )?)
    }

    /// Runs [`Table::merge`] repeatedly with `config` until it returns
    /// `None`, returning every outcome along the way. A convenience for
    /// the common "merge this partition down as far as it'll go right
    /// now" loop — merge, cleanup, and the partition operators are each
    /// idempotent operations with scheduling left entirely to the caller.
    pub fn merge_until_done(&self, config: &MergeConfig) -> Result<Vec<MergeOutcome>, TableError> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.merge(config)? {
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Physically deletes data files and log files whose tombstones are
    /// at least `min_age_ms` old, and compacts the remaining
    /// insert-marked logs into one new log.
    pub fn cleanup(&self, min_age_ms: i64) -> Result<CleanupOutcome, TableError> {
        Ok(ops::cleanup::cleanup(self.inner.store.as_ref(), min_age_ms, &self.inner.config.author)?)
    }

    /// Bulk-tombstones every alive file in the partitions `selector`
    /// returns, given the full current set of alive partition keys.
    pub fn partition_remove(
        &self,
        selector: impl FnOnce(&[&str]) -> Vec<String>,
    ) -> Result<Option<(String, Vec<String>)>, TableError> {
        Ok(ops::partition::partition_remove(self.inner.store.as_ref(), &self.inner.config.author, selector)?)
    }

    /// Replaces `partition`'s contents with the result of `transform_sql`
    /// evaluated over a virtual table `_rows` exposing its alive files.
    pub fn partition_rewrite(&self, partition: &str, transform_sql: &str) -> Result<Option<PartitionRewriteOutcome>, TableError> {
        Ok(ops::partition::partition_rewrite(
            self.inner.store.as_ref(),
            self.inner.engine.as_ref(),
            self.inner.config.compression,
            &self.inner.config.author,
            partition,
            transform_sql,
        )?)
    }

    /// The derived state (schema, file inventory, log-tombstones) as of
    /// `max_time_ms`. Pass [`log::now_ms`] for "as of right now".
    pub fn snapshot_at(&self, max_time_ms: i64) -> Result<Snapshot, TableError> {
        Ok(log::read_at_max_time(self.inner.store.as_ref(), max_time_ms)?)
    }

    /// The current schema, as of `max_time_ms`. Its `Display` impl
    /// renders the same `{"col": "TYPE", ...}` shape a caller would print
    /// before composing a query.
    pub fn schema_at(&self, max_time_ms: i64) -> Result<Schema, TableError> {
        Ok(self.snapshot_at(max_time_ms)?.schema)
    }

    /// Runs `sql` against every alive file, exposed as `table_name`. A
    /// thin convenience over [`QueryEngine::query_sql`] for callers who
    /// just want to read the table rather than mutate it.
    pub fn query(&self, table_name: &str, sql: &str) -> Result<QueryResult, TableError> {
        let snapshot = self.snapshot_at(log::now_ms())?;
        let paths: Vec<String> = snapshot.alive_files().map(|f| f.path.clone()).collect();
        Ok(self
            .inner
            .engine
            .query_sql(self.inner.store.as_ref(), &paths, table_name, sql)?)
    }
}
