//! Columnar Writer / Reader
//!
//! Writes sorted, partitioned rows to an immutable Parquet file and reads
//! such files back. Column order follows the schema's iteration order
//! (insertion order, union-extended — see [`crate::row::Schema`]);
//! implementations downstream never depend on a particular ordering
//! beyond "stable for a given schema".

pub mod reader;
pub mod writer;

#[cfg(test)]
mod tests;

pub use reader::read_rows;
pub use writer::{write_rows, FileStats};
pub(crate) use reader::{append_rows, schema_from_arrow};
pub(crate) use writer::rows_to_record_batch;

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while writing or reading a columnar data file.
#[derive(Debug, Error)]
pub enum ColumnarError {
    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("schema conflict while reading {path}: {source}")]
    Schema {
        path: String,
        #[source]
        source: crate::row::SchemaError,
    },

    #[error("unsupported column type in {path}: field {field:?} has arrow type {data_type:?}")]
    UnsupportedArrowType {
        path: String,
        field: String,
        data_type: String,
    },
}

/// Maps a [`crate::row::CompressionCodec`] onto the `parquet` crate's
/// compression enum.
pub(crate) fn to_parquet_compression(
    codec: crate::row::CompressionCodec,
) -> parquet::basic::Compression {
    use crate::row::CompressionCodec;
    use parquet::basic::Compression;
    match codec {
        CompressionCodec::Snappy => Compression::SNAPPY,
        CompressionCodec::Zstd => Compression::ZSTD(Default::default()),
        CompressionCodec::Gzip => Compression::GZIP(Default::default()),
        CompressionCodec::Lz4 => Compression::LZ4,
    }
}
