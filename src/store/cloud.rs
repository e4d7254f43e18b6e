//! [`ObjectStore`] backed by the `object_store` crate (S3/GCS), presented
//! synchronously behind a dedicated [`tokio::runtime::Runtime`].
//!
//! `object_store`'s trait is async end to end; rather than infect the rest
//! of the crate with `async fn`, every call here is `runtime.block_on`'d,
//! pushing concurrency down into a fixed-size resource — a Tokio runtime
//! dedicated to network I/O.

use std::sync::Arc;

use futures::stream::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore as DynObjectStore, PutPayload};
use tokio::runtime::Runtime;
use tracing::{debug, error};

use super::{Continuation, ListedObject, ObjectStore, StoreError};

/// Connection parameters for a cloud object store, matching the external
/// object-store contract's configuration surface.
#[derive(Debug, Clone)]
pub struct CloudStoreConfig {
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub prefix: String,
    /// Use path-style bucket addressing (`endpoint/bucket/key`) instead of
    /// virtual-hosted style (`bucket.endpoint/key`). Required for MinIO and
    /// most S3-compatible local testing setups.
    pub path_style: bool,
    pub provider: CloudProvider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudProvider {
    S3,
    Gcs,
}

/// Synchronous object store wrapping an async `object_store::ObjectStore`.
pub struct CloudStore {
    inner: Arc<dyn DynObjectStore>,
    prefix: String,
    runtime: Runtime,
}

impl CloudStore {
    pub fn open(config: CloudStoreConfig) -> Result<Self, StoreError> {
        let runtime = Runtime::new().map_err(StoreError::Io)?;

        let inner: Arc<dyn DynObjectStore> = match config.provider {
            CloudProvider::S3 => {
                let mut builder = AmazonS3Builder::new()
                    .with_region(&config.region)
                    .with_bucket_name(&config.bucket)
                    .with_access_key_id(&config.access_key)
                    .with_secret_access_key(&config.secret_key)
                    .with_allow_http(true)
                    .with_virtual_hosted_style_request(!config.path_style);
                if let Some(endpoint) = &config.endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| StoreError::Backend(e.to_string()))?,
                )
            }
            CloudProvider::Gcs => {
                let builder = GoogleCloudStorageBuilder::new().with_bucket_name(&config.bucket);
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| StoreError::Backend(e.to_string()))?,
                )
            }
        };

        Ok(Self {
            inner,
            prefix: config.prefix,
            runtime,
        })
    }

    fn full_path(&self, key: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{}", self.prefix.trim_end_matches('/'), key))
        }
    }

    fn strip_prefix(&self, path: &ObjectPath) -> String {
        let full = path.to_string();
        if self.prefix.is_empty() {
            full
        } else {
            full.strip_prefix(&format!("{}/", self.prefix.trim_end_matches('/')))
                .unwrap_or(&full)
                .to_string()
        }
    }
}

impl ObjectStore for CloudStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = self.full_path(key);
        let len = bytes.len();
        self.runtime.block_on(async {
            self.inner
                .put(&path, PutPayload::from(bytes))
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))
        })?;
        debug!(key, bytes = len, "put object (cloud)");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.full_path(key);
        self.runtime.block_on(async {
            let result = self.inner.get(&path).await.map_err(|e| match e {
                object_store::Error::NotFound { .. } => StoreError::NotFound(key.to_string()),
                other => StoreError::Backend(other.to_string()),
            })?;
            let bytes = result
                .bytes()
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
            Ok(bytes.to_vec())
        })
    }

    fn list(
        &self,
        prefix: &str,
        _continuation: Continuation,
    ) -> Result<(Vec<ListedObject>, Continuation), StoreError> {
        let path = self.full_path(prefix);
        self.runtime.block_on(async {
            let mut stream = self.inner.list(Some(&path));
            let mut out = Vec::new();
            while let Some(meta) = stream.next().await {
                let meta = meta.map_err(|e| StoreError::Backend(e.to_string()))?;
                out.push(ListedObject {
                    key: self.strip_prefix(&meta.location),
                    size: meta.size as u64,
                });
            }
            // The underlying crate streams exhaustively rather than paging,
            // so there is never a continuation token to return.
            Ok((out, None))
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.full_path(key);
        self.runtime.block_on(async {
            match self.inner.delete(&path).await {
                Ok(()) => Ok(()),
                Err(object_store::Error::NotFound { .. }) => Ok(()),
                Err(e) => {
                    error!(key, error = %e, "delete failed");
                    Err(StoreError::Backend(e.to_string()))
                }
            }
        })
    }
}
