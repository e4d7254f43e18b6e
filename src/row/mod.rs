//! Row model: the opaque, schema-free payload ingest operates on.
//!
//! A [`Row`] is an unordered mapping from column name to [`Value`]. Rows
//! carry no identity of their own — the table only ever reasons about them
//! as an ordered sequence to sort and partition. [`Schema`] is derived from
//! the union of column types observed across writes and grows
//! monotonically; a later insert that assigns a different leaf type to an
//! already-known column is rejected with [`SchemaError::Conflict`].

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single scalar cell value.
///
/// `Json` covers nested values (objects/arrays); they are stored as a
/// JSON-encoded string at the columnar layer, per the row payload's
/// "JSON-encoded string for nested values" rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Json(serde_json::Value),
    Null,
}

impl Value {
    /// The storage type this value would contribute to a [`Schema`].
    ///
    /// Returns `None` for `Null` — a null cell carries no type information
    /// and never conflicts with, or contributes to, the column's type.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Int(_) => Some(ColumnType::Int64),
            Value::Float(_) => Some(ColumnType::Double),
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::Str(_) => Some(ColumnType::Varchar),
            Value::Json(_) => Some(ColumnType::Varchar),
            Value::Null => None,
        }
    }
}

/// An unordered mapping from column name to scalar value.
///
/// Backed by a `BTreeMap` so that two rows with the same columns always
/// iterate in the same order, which keeps columnar writing deterministic
/// without requiring callers to pre-sort column names themselves.
pub type Row = BTreeMap<String, Value>;

/// Storage type tag for a column, per the log's schema record wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "INT64")]
    Int64,
    #[serde(rename = "DOUBLE")]
    Double,
    #[serde(rename = "VARCHAR")]
    Varchar,
    #[serde(rename = "BOOL")]
    Bool,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Int64 => "INT64",
            ColumnType::Double => "DOUBLE",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Bool => "BOOL",
        };
        f.write_str(s)
    }
}

/// Errors raised while growing or merging a [`Schema`].
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    /// A column was observed with a leaf type different from the one
    /// already assigned to it by an earlier log entry.
    #[error("schema conflict on column {column:?}: existing type {existing}, new type {new}")]
    Conflict {
        column: String,
        existing: ColumnType,
        new: ColumnType,
    },
}

/// Mapping from column name to storage type. Grows monotonically: once a
/// column is assigned a type, that type never changes (additive union
/// only), matching the log's schema-is-superset-of-every-prior-schema
/// invariant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(BTreeMap<String, ColumnType>);

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn get(&self, column: &str) -> Option<ColumnType> {
        self.0.get(column).copied()
    }

    /// Builds a schema from a single row, skipping `Value::Null` cells
    /// (they carry no type information).
    pub fn from_row(row: &Row) -> Self {
        let mut schema = Schema::new();
        for (col, val) in row {
            if let Some(ty) = val.column_type() {
                schema.0.insert(col.clone(), ty);
            }
        }
        schema
    }

    /// Unions `other` into `self` in place, rejecting any column whose
    /// type in `other` conflicts with its already-assigned type here.
    /// New columns are added as-is.
    pub fn union_with(&mut self, other: &Schema) -> Result<(), SchemaError> {
        for (col, ty) in &other.0 {
            match self.0.get(col) {
                Some(existing) if existing != ty => {
                    return Err(SchemaError::Conflict {
                        column: col.clone(),
                        existing: *existing,
                        new: *ty,
                    });
                }
                Some(_) => {}
                None => {
                    self.0.insert(col.clone(), *ty);
                }
            }
        }
        Ok(())
    }

    /// `true` if `self` contains every column `other` does, with matching
    /// types. Used to decide whether a schema record changed and is worth
    /// writing to the log.
    pub fn is_superset_of(&self, other: &Schema) -> bool {
        other.0.iter().all(|(col, ty)| self.0.get(col) == Some(ty))
    }
}

impl fmt::Display for Schema {
    /// Renders as `{"col": "TYPE", ...}`, matching the schema-introspection
    /// JSON shape a caller would print before composing a query.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (col, ty)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{col:?}: {ty:?}", ty = ty.to_string())?;
        }
        f.write_str("}")
    }
}

/// Compression codec applied when writing a columnar data file.
/// `Snappy` is the default, matching the columnar engine contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionCodec {
    #[default]
    Snappy,
    Zstd,
    Gzip,
    Lz4,
}

/// Partitions a row into its partition-key string. Pure, called once per
/// row per insert. The core treats the result as an opaque path segment.
pub trait PartitionFn: Fn(&Row) -> String + Send + Sync {}
impl<F: Fn(&Row) -> String + Send + Sync> PartitionFn for F {}

/// Transforms a row before it is partitioned and written. Pure, called
/// once per row per insert.
pub trait RowFormatter: Fn(Row) -> Row + Send + Sync {}
impl<F: Fn(Row) -> Row + Send + Sync> RowFormatter for F {}
