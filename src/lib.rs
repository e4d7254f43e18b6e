//! # logtable
//!
//! An append-only, log-structured table format for tabular event data:
//! immutable, partitioned columnar (Parquet) files on object storage, with
//! a separate transactional log enumerating which files are alive, which
//! are tombstoned, and which schema currently applies.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                            Table                               │
//! │  ┌───────────┐  ┌─────────────┐  ┌──────────────────────────┐ │
//! │  │  row       │  │  columnar   │  │  query (QueryEngine)     │ │
//! │  │  Row/Schema│  │  writer/    │  │  DataFusionEngine        │ │
//! │  │  /Value    │  │  reader     │  │                          │ │
//! │  └─────┬──────┘  └──────┬──────┘  └───────────┬──────────────┘ │
//! │        │                │                     │                │
//! │        └────────┬───────┴─────────────────────┘                │
//! │                 ops: insert / merge / cleanup / partition      │
//! │                 (each appends through `log::append_log`)       │
//! │                               │                                 │
//! │  ┌────────────────────────────┴────────────────────────────┐   │
//! │  │  log: codec + snapshot folding over `_log/` (the        │   │
//! │  │  append-only manifest)                                  │   │
//! │  └────────────────────────────┬────────────────────────────┘   │
//! │                               │                                 │
//! │  ┌────────────────────────────┴────────────────────────────┐   │
//! │  │           store: ObjectStore (LocalFsStore / CloudStore) │   │
//! │  └───────────────────────────────────────────────────────────┘ │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`row`] | The row/schema/value data model and partition/format contracts |
//! | [`store`] | Object store adapter (`LocalFsStore`, `CloudStore`) |
//! | [`columnar`] | Parquet writer/reader for data files |
//! | [`log`] | Log codec, filenames, and snapshot folding — the manifest |
//! | [`query`] | The external analytic query engine's consumed interface |
//! | [`ops`] | Insert / merge / tombstone-cleanup / partition-remove / partition-rewrite operators |
//! | [`table`] | [`Table`] — the public handle wiring everything together |
//!
//! ## Key properties
//!
//! - **Append-only manifest.** Every mutation — insert, merge, cleanup,
//!   partition-remove, partition-rewrite — is one new, immutable log file.
//!   Nothing is ever rewritten in place.
//! - **Concurrency without mutual exclusion.** Concurrent writers sharing
//!   a bucket prefix never corrupt the log: correctness comes from
//!   log-filename ordering and idempotent fold rules, not locks.
//! - **Monotone schema.** The schema only ever grows by column union; a
//!   leaf-type change for an existing column is rejected.
//! - **Snapshot reads.** A reader folds every visible log file up to a
//!   timestamp into one snapshot of alive files — it never observes
//!   partial state.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use logtable::ops::insert::InsertOutcome;
//! use logtable::query::DataFusionEngine;
//! use logtable::row::{CompressionCodec, Row, Value};
//! use logtable::store::local::LocalFsStore;
//! use logtable::table::{Table, TableConfig};
//!
//! let store = Box::new(LocalFsStore::open("/tmp/logtable-demo").unwrap());
//! let engine = Box::new(DataFusionEngine::new().unwrap());
//! let table = Table::open(
//!     store,
//!     engine,
//!     TableConfig {
//!         partition_fn: Box::new(|row: &Row| match row.get("user_id") {
//!             Some(Value::Str(u)) => format!("u={u}"),
//!             _ => "u=unknown".to_string(),
//!         }),
//!         format_fn: Box::new(|row| row),
//!         sort_key: vec!["ts".to_string()],
//!         compression: CompressionCodec::Snappy,
//!         author: "demo-host".to_string(),
//!     },
//! );
//!
//! let mut row = Row::new();
//! row.insert("ts".to_string(), Value::Int(1));
//! row.insert("user_id".to_string(), Value::Str("a".to_string()));
//! let InsertOutcome { files, .. } = table.insert(vec![row]).unwrap();
//! assert_eq!(files.len(), 1);
//! ```

#![allow(dead_code)]

pub mod columnar;
pub mod log;
pub mod ops;
pub mod query;
pub mod row;
pub mod store;
pub mod table;

pub use table::{Table, TableConfig, TableError};
