//! Writes an in-memory batch of rows to a single Parquet file.
//!
//! One columnar file per partition, built entirely in memory and handed
//! to the object store in one `put` — there is no partial, streamed
//! upload a reader could observe mid-write.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use super::{to_parquet_compression, ColumnarError};
use crate::row::{ColumnType, CompressionCodec, Row, Schema, Value};
use crate::store::ObjectStore;

/// Byte size and row count of a freshly written data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStats {
    pub bytes: u64,
    pub rows: u64,
}

/// Writes `rows` (already formatted, partitioned, and sorted by the
/// caller) to `path` as one Parquet file, column order following
/// `schema`'s iteration order.
///
/// Buffers the whole file in memory before the store `put`.
pub fn write_rows(
    store: &dyn ObjectStore,
    path: &str,
    schema: &Schema,
    rows: &[Row],
    codec: CompressionCodec,
) -> Result<FileStats, ColumnarError> {
    let batch = rows_to_record_batch(schema, rows)?;

    let props = WriterProperties::builder()
        .set_compression(to_parquet_compression(codec))
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    let stats = FileStats {
        bytes: buf.len() as u64,
        rows: rows.len() as u64,
    };
    store.put(path, buf)?;
    Ok(stats)
}

fn arrow_type_of(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Int64 => DataType::Int64,
        ColumnType::Double => DataType::Float64,
        ColumnType::Varchar => DataType::Utf8,
        ColumnType::Bool => DataType::Boolean,
    }
}

/// Builds an Arrow `RecordBatch` from `rows` against `schema`'s column
/// order. Shared with the query engine adapter, which needs the same
/// conversion to register rows read back off object storage as an
/// in-memory table.
pub(crate) fn rows_to_record_batch(schema: &Schema, rows: &[Row]) -> Result<RecordBatch, ColumnarError> {
    let columns: Vec<(&str, ColumnType)> = schema.columns().collect();

    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, ty)| Field::new(*name, arrow_type_of(*ty), true))
        .collect();
    let arrow_schema = Arc::new(ArrowSchema::new(fields));

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
    for (name, ty) in &columns {
        arrays.push(build_column(rows, name, *ty));
    }

    let batch = RecordBatch::try_new(arrow_schema, arrays)?;
    Ok(batch)
}

fn build_column(rows: &[Row], column: &str, ty: ColumnType) -> ArrayRef {
    match ty {
        ColumnType::Int64 => {
            let mut builder = Int64Builder::with_capacity(rows.len());
            for row in rows {
                match row.get(column) {
                    Some(Value::Int(v)) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Double => {
            let mut builder = Float64Builder::with_capacity(rows.len());
            for row in rows {
                match row.get(column) {
                    Some(Value::Float(v)) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Bool => {
            let mut builder = BooleanBuilder::with_capacity(rows.len());
            for row in rows {
                match row.get(column) {
                    Some(Value::Bool(v)) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        ColumnType::Varchar => {
            let mut builder = StringBuilder::new();
            for row in rows {
                match row.get(column) {
                    Some(Value::Str(s)) => builder.append_value(s),
                    // Nested values are stored as their JSON-encoded string,
                    // per the row payload's Varchar-for-nested rule.
                    Some(Value::Json(v)) => builder.append_value(v.to_string()),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
    }
}
