//! Columnar Engine Contract
//!
//! The actual analytic query engine is an external collaborator: this
//! module only defines the interface the core consumes — reading one or
//! more data files into a tabular form, applying a SQL-like expression,
//! and reporting schema — and ships exactly one concrete adapter,
//! [`datafusion::DataFusionEngine`], so merge and partition-rewrite have
//! something real to run against.

pub mod datafusion;


pub use datafusion::DataFusionEngine;

use thiserror::Error;

use crate::row::{Row, Schema};

/// Errors raised while a [`QueryEngine`] reads files or evaluates an
/// expression.
#[derive(Debug, Error)]
pub enum QueryEngineError {
    #[error("columnar I/O error: {0}")]
    Columnar(#[from] crate::columnar::ColumnarError),

    #[error("query engine backend error: {0}")]
    Backend(String),
}

/// A tabular result set: the schema of its columns plus its rows, in
/// whatever order the engine produced them.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

/// The interface the core consumes from the embedded analytic query
/// engine. Implementations read and write through a [`crate::store::ObjectStore`]
/// so the engine never needs direct filesystem/network access of its own.
pub trait QueryEngine: Send + Sync {
    /// Reads `paths` (already-materialized Parquet files) into one
    /// concatenated result, in the order given.
    fn read(&self, store: &dyn crate::store::ObjectStore, paths: &[String]) -> Result<QueryResult, QueryEngineError>;

    /// Reads `paths` and evaluates `sql` against them, exposed to the
    /// query as a table named `table_name` (e.g. `source_files` for
    /// merge, `_rows` for partition-rewrite).
    fn query_sql(
        &self,
        store: &dyn crate::store::ObjectStore,
        paths: &[String],
        table_name: &str,
        sql: &str,
    ) -> Result<QueryResult, QueryEngineError>;

    /// Schema introspection: the column types a set of files would expose
    /// without materializing their rows, by unioning the schema of each.
    fn schema_of(&self, store: &dyn crate::store::ObjectStore, paths: &[String]) -> Result<Schema, QueryEngineError>;
}
