//! Reads a Parquet data file back into rows and its schema.
//!
//! Used by the merge operator (to read input files before re-aggregating)
//! and by tests; the query engine adapter (`crate::query`) reads files
//! directly through `datafusion` instead, for anything past a full
//! materialization.

use std::sync::Arc;

use arrow::array::Array;
use arrow::datatypes::{DataType, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::ColumnarError;
use crate::row::{ColumnType, Row, Schema, Value};
use crate::store::ObjectStore;

/// Reads `path` in full, returning its schema and every row it contains,
/// in file order.
pub fn read_rows(store: &dyn ObjectStore, path: &str) -> Result<(Schema, Vec<Row>), ColumnarError> {
    let bytes = store.get(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))?;
    let arrow_schema = builder.schema().clone();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        append_rows(&batch, &mut rows);
    }

    let schema = schema_from_arrow(&arrow_schema, path)?;
    Ok((schema, rows))
}

/// Converts an Arrow schema into our storage-type schema. Exposed to the
/// query engine adapter, which gets Arrow schemas back from `datafusion`
/// and needs the same column-type mapping.
pub(crate) fn schema_from_arrow(arrow_schema: &ArrowSchema, path: &str) -> Result<Schema, ColumnarError> {
    let mut schema = Schema::new();
    for field in arrow_schema.fields() {
        let column_type = match field.data_type() {
            DataType::Int64 => ColumnType::Int64,
            DataType::Float64 => ColumnType::Double,
            DataType::Utf8 => ColumnType::Varchar,
            DataType::Boolean => ColumnType::Bool,
            other => {
                return Err(ColumnarError::UnsupportedArrowType {
                    path: path.to_string(),
                    field: field.name().clone(),
                    data_type: format!("{other:?}"),
                });
            }
        };
        let mut row = Row::new();
        row.insert(
            field.name().clone(),
            match column_type {
                ColumnType::Int64 => Value::Int(0),
                ColumnType::Double => Value::Float(0.0),
                ColumnType::Varchar => Value::Str(String::new()),
                ColumnType::Bool => Value::Bool(false),
            },
        );
        schema
            .union_with(&Schema::from_row(&row))
            .map_err(|source| ColumnarError::Schema {
                path: path.to_string(),
                source,
            })?;
    }
    Ok(schema)
}

/// Appends every row of `batch` to `out`. Shared with the query engine
/// adapter for converting `datafusion` result batches back into rows.
pub(crate) fn append_rows(batch: &RecordBatch, out: &mut Vec<Row>) {
    let schema = batch.schema();
    for row_idx in 0..batch.num_rows() {
        let mut row = Row::new();
        for (col_idx, field) in schema.fields().iter().enumerate() {
            let column = batch.column(col_idx);
            if column.is_null(row_idx) {
                continue;
            }
            let value = match field.data_type() {
                DataType::Int64 => {
                    let arr = column
                        .as_any()
                        .downcast_ref::<arrow::array::Int64Array>()
                        .expect("field declared Int64");
                    Value::Int(arr.value(row_idx))
                }
                DataType::Float64 => {
                    let arr = column
                        .as_any()
                        .downcast_ref::<arrow::array::Float64Array>()
                        .expect("field declared Float64");
                    Value::Float(arr.value(row_idx))
                }
                DataType::Boolean => {
                    let arr = column
                        .as_any()
                        .downcast_ref::<arrow::array::BooleanArray>()
                        .expect("field declared Boolean");
                    Value::Bool(arr.value(row_idx))
                }
                DataType::Utf8 => {
                    let arr = column
                        .as_any()
                        .downcast_ref::<arrow::array::StringArray>()
                        .expect("field declared Utf8");
                    Value::Str(arr.value(row_idx).to_string())
                }
                _ => continue,
            };
            row.insert(field.name().clone(), value);
        }
        out.push(row);
    }
}
