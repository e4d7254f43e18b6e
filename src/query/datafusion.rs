//! `datafusion`-backed [`QueryEngine`] adapter.
//!
//! Reads each requested path off the configured object store, converts it
//! to an Arrow `RecordBatch` in memory, and registers the concatenation as
//! a `datafusion` `MemTable`. This is deliberately the simplest adapter
//! that can run the merge and partition-rewrite scenarios — it is not
//! meant to scale to files larger than memory; a production engine would
//! register `datafusion`'s own `ListingTable` against the store's URIs
//! instead.

use std::sync::Arc;

use datafusion::arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use tokio::runtime::Runtime;

use super::{QueryEngine, QueryEngineError, QueryResult};
use crate::columnar::{self, ColumnarError};
use crate::row::Schema;
use crate::store::ObjectStore;

/// A `datafusion`-backed query engine. Owns a dedicated multi-thread
/// runtime so the rest of the core, including callers of [`QueryEngine`],
/// stays synchronous — the same pattern `crate::store::cloud::CloudStore`
/// uses to front the async `object_store` crate.
pub struct DataFusionEngine {
    runtime: Runtime,
}

impl DataFusionEngine {
    pub fn new() -> Result<Self, QueryEngineError> {
        let runtime = Runtime::new()
            .map_err(|e| QueryEngineError::Backend(format!("failed to start runtime: {e}")))?;
        Ok(Self { runtime })
    }

    fn load_batches(
        &self,
        store: &dyn ObjectStore,
        paths: &[String],
    ) -> Result<(Arc<datafusion::arrow::datatypes::Schema>, Vec<RecordBatch>), QueryEngineError> {
        let mut schema = Schema::new();
        let mut rows_per_file = Vec::with_capacity(paths.len());

        for path in paths {
            let (file_schema, rows) = columnar::read_rows(store, path).map_err(QueryEngineError::Columnar)?;
            schema
                .union_with(&file_schema)
                .map_err(|source| QueryEngineError::Columnar(ColumnarError::Schema {
                    path: path.clone(),
                    source,
                }))?;
            rows_per_file.push(rows);
        }

        let all_rows: Vec<_> = rows_per_file.into_iter().flatten().collect();
        let batch = columnar::rows_to_record_batch(&schema, &all_rows).map_err(QueryEngineError::Columnar)?;
        let arrow_schema = batch.schema();
        Ok((arrow_schema, vec![batch]))
    }
}

impl QueryEngine for DataFusionEngine {
    fn read(&self, store: &dyn ObjectStore, paths: &[String]) -> Result<QueryResult, QueryEngineError> {
        let mut schema = Schema::new();
        let mut rows = Vec::new();
        for path in paths {
            let (file_schema, file_rows) = columnar::read_rows(store, path).map_err(QueryEngineError::Columnar)?;
            schema
                .union_with(&file_schema)
                .map_err(|source| QueryEngineError::Columnar(ColumnarError::Schema {
                    path: path.clone(),
                    source,
                }))?;
            rows.extend(file_rows);
        }
        Ok(QueryResult { schema, rows })
    }

    fn query_sql(
        &self,
        store: &dyn ObjectStore,
        paths: &[String],
        table_name: &str,
        sql: &str,
    ) -> Result<QueryResult, QueryEngineError> {
        let (arrow_schema, batches) = self.load_batches(store, paths)?;
        let table_name = table_name.to_string();
        let sql = sql.to_string();

        self.runtime.block_on(async move {
            let ctx = SessionContext::new();
            let table = MemTable::try_new(arrow_schema, vec![batches])
                .map_err(|e| QueryEngineError::Backend(e.to_string()))?;
            ctx.register_table(table_name.as_str(), Arc::new(table))
                .map_err(|e| QueryEngineError::Backend(e.to_string()))?;

            let df = ctx
                .sql(&sql)
                .await
                .map_err(|e| QueryEngineError::Backend(e.to_string()))?;
            let result_batches = df
                .collect()
                .await
                .map_err(|e| QueryEngineError::Backend(e.to_string()))?;

            let mut rows = Vec::new();
            for batch in &result_batches {
                columnar::append_rows(batch, &mut rows);
            }
            let schema = match result_batches.first() {
                Some(batch) => columnar::schema_from_arrow(&batch.schema(), "<query result>")
                    .map_err(QueryEngineError::Columnar)?,
                None => Schema::new(),
            };
            Ok(QueryResult { schema, rows })
        })
    }

    fn schema_of(&self, store: &dyn ObjectStore, paths: &[String]) -> Result<Schema, QueryEngineError> {
        let mut schema = Schema::new();
        for path in paths {
            let (file_schema, _) = columnar::read_rows(store, path).map_err(QueryEngineError::Columnar)?;
            schema
                .union_with(&file_schema)
                .map_err(|source| QueryEngineError::Columnar(ColumnarError::Schema {
                    path: path.clone(),
                    source,
                }))?;
        }
        Ok(schema)
    }
}
