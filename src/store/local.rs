//! `std::fs`-backed [`ObjectStore`], for tests and the demo binaries.
//!
//! Writes go to `<root>/<key>.tmp` then `rename` to `<root>/<key>` — a
//! reader can never observe a partially-written object.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Continuation, ListedObject, ObjectStore, StoreError};

/// Object store rooted at a directory on local disk. Keys map directly to
/// relative paths under that root.
#[derive(Debug)]
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    /// Opens (creating if necessary) a local object store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ObjectStore for LocalFsStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = self.full_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp-put");
        {
            let mut f = File::create(&tmp_path)?;
            f.write_all(&bytes)?;
            f.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        debug!(key, bytes = bytes.len(), "put object");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.full_path(key);
        let mut f = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(key.to_string())
            } else {
                StoreError::Io(e)
            }
        })?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn list(
        &self,
        prefix: &str,
        _continuation: Continuation,
    ) -> Result<(Vec<ListedObject>, Continuation), StoreError> {
        let prefix_path = self.full_path(prefix);
        let mut out = Vec::new();
        if prefix_path.is_dir() {
            walk_dir(&self.root, &prefix_path, &mut out)?;
        } else if let Some(parent) = prefix_path.parent() {
            // `prefix` may name a file-name prefix within an existing directory
            // rather than a directory itself (e.g. listing `_log/1700` to match
            // `_log/1700000000000_i_<uuid>.jsonl`).
            if parent.is_dir() {
                for entry in fs::read_dir(parent)? {
                    let entry = entry?;
                    let path = entry.path();
                    if path.starts_with(&prefix_path) || path_str(&path).starts_with(&path_str(&prefix_path)) {
                        let rel = path.strip_prefix(&self.root).unwrap_or(&path);
                        out.push(ListedObject {
                            key: rel.to_string_lossy().replace('\\', "/"),
                            size: entry.metadata()?.len(),
                        });
                    }
                }
            }
        }
        // No pagination: a local directory listing is cheap enough to return whole.
        Ok((out, None))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.full_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(key, "delete of missing object ignored");
                Ok(())
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

fn path_str(p: &Path) -> String {
    p.to_string_lossy().replace('\\', "/")
}

fn walk_dir(root: &Path, dir: &Path, out: &mut Vec<ListedObject>) -> Result<(), StoreError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_dir(root, &path, out)?;
        } else {
            let rel = path.strip_prefix(root).unwrap_or(&path);
            let key = rel.to_string_lossy().replace('\\', "/");
            if key.ends_with(".tmp-put") {
                continue;
            }
            out.push(ListedObject {
                key,
                size: entry.metadata()?.len(),
            });
        }
    }
    Ok(())
}
