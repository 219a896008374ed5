//! Blob-store abstraction.
//!
//! All durable reads and writes go through `BlobStore`, so the runner can
//! be pointed at a local directory in production and an in-memory map in
//! tests. Paths are relative, `/`-separated blob names.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

/// Structured errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("blob not found: {path}")]
    NotFound { path: String },

    #[error("i/o error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Durable storage collaborator.
pub trait BlobStore: Send + Sync {
    fn load(&self, path: &str) -> Result<Vec<u8>, StoreError>;
    fn save(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn exists(&self, path: &str) -> bool;
}

/// Filesystem-backed store rooted at a directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl BlobStore for FsStore {
    fn load(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        fs::read(self.resolve(path)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound {
                path: path.to_string(),
            },
            _ => StoreError::Io {
                path: path.to_string(),
                source: e,
            },
        })
    }

    fn save(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let io_err = |e: io::Error| StoreError::Io {
            path: path.to_string(),
            source: e,
        };

        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Atomic write: tmp sibling, then rename into place.
        let tmp = full.with_file_name(format!(
            "{}.tmp",
            full.file_name().and_then(|n| n.to_str()).unwrap_or("blob")
        ));
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, &full).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            StoreError::Io {
                path: path.to_string(),
                source: e,
            }
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.into());
    }

    /// Stored blob paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl BlobStore for MemStore {
    fn load(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })
    }

    fn save(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.insert(path, bytes);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }
}
