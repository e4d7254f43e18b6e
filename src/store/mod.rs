//! Object Store Adapter
//!
//! A thin, synchronous abstraction over bucketed blob I/O: `put`/`get`/
//! `list`/`delete` under a prefix. The rest of the crate is written
//! against the [`ObjectStore`] trait only — it never assumes a particular
//! backend.
//!
//! Two implementations are provided:
//!
//! - [`local::LocalFsStore`] — backs onto `std::fs`, for tests and the
//!   demo binaries.
//! - [`cloud::CloudStore`] — wraps the real, async `object_store` crate
//!   (S3/GCS) behind a dedicated [`tokio::runtime::Runtime`] so callers
//!   see a plain synchronous API, matching the engine's "largely
//!   synchronous per call" scheduling model.
//!
//! Both implementations assume read-after-write consistency for `put` of
//! new keys and a strongly consistent `list` — the log protocol's
//! ordering guarantees depend on it.

pub mod cloud;
pub mod local;


use thiserror::Error;

/// Errors raised by an [`ObjectStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store backend error: {0}")]
    Backend(String),
}

/// A single listed key with the byte size object storage reports for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedObject {
    pub key: String,
    pub size: u64,
}

/// Opaque continuation token for paginated listings. `None` means "list
/// from the start"; a returned `Some(_)` means "there may be more — call
/// `list` again with this token".
pub type Continuation = Option<String>;

/// Thin abstraction over bucketed blob storage, scoped to whatever prefix
/// the implementation was constructed with.
///
/// All keys passed to and returned from these methods are relative to
/// that prefix; callers never need to know whether the prefix lives on
/// local disk, S3, or GCS.
pub trait ObjectStore: Send + Sync {
    /// Writes `bytes` to `key`, creating or overwriting it. A `put` of a
    /// brand-new key is assumed to be visible to a subsequent `list`/`get`
    /// immediately (read-after-write consistency).
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Reads the full contents of `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Lists keys under `prefix`, returning up to one page of results plus
    /// a continuation token if more remain. Results are not required to
    /// be sorted by the implementation — callers that need a specific
    /// order sort the returned keys themselves.
    fn list(&self, prefix: &str, continuation: Continuation) -> Result<(Vec<ListedObject>, Continuation), StoreError>;

    /// Deletes `key`. Deleting a key that does not exist is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Lists every key under `prefix`, draining all continuation pages.
    /// Convenience built on top of [`ObjectStore::list`].
    fn list_all(&self, prefix: &str) -> Result<Vec<ListedObject>, StoreError> {
        let mut out = Vec::new();
        let mut cont: Continuation = None;
        loop {
            let (mut page, next) = self.list(prefix, cont)?;
            out.append(&mut page);
            match next {
                Some(token) => cont = Some(token),
                None => break,
            }
        }
        Ok(out)
    }
}
