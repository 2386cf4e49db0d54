//! Object storage abstraction used by [`RemoteSecretSource`](super::RemoteSecretSource)
//!
//! The remote source only needs two operations from a storage client: list the
//! keys under a prefix and read an object body. Applications plug in their own
//! client (S3, GCS, ...) by implementing [`ObjectStore`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use walkdir::WalkDir;

use super::traits::{SecretError, SecretResult};

/// Minimal read-only object storage client
pub trait ObjectStore: Send + Sync {
    /// Keys in `bucket` starting with `prefix`, in lexicographic order
    fn list_objects(&self, bucket: &str, prefix: &str) -> SecretResult<Vec<String>>;

    /// Full body of the object `key` in `bucket`
    fn read_object(&self, bucket: &str, key: &str) -> SecretResult<Vec<u8>>;
}

/// In-memory object store
///
/// Handy for tests and for embedding fixed documents. Every call is counted so
/// callers can observe how often a source actually hits the store.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    list_calls: AtomicUsize,
    read_calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an object
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), body.into());
    }

    /// Number of `list_objects` calls served so far
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `read_object` calls served so far
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn list_objects(&self, bucket: &str, prefix: &str) -> SecretResult<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| SecretError::ObjectStore(format!("bucket {bucket:?} does not exist")))?;

        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn read_object(&self, bucket: &str, key: &str) -> SecretResult<Vec<u8>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
            .ok_or_else(|| {
                SecretError::ObjectStore(format!("object {key:?} not found in bucket {bucket:?}"))
            })
    }
}

/// Object store laid out on the local filesystem
///
/// Every directory directly under `root` is a bucket; every file below a
/// bucket is an object whose key is its `/`-separated relative path.
#[derive(Debug, Clone)]
pub struct DirectoryObjectStore {
    root: PathBuf,
}

impl DirectoryObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> SecretResult<PathBuf> {
        if !is_plain_relative(Path::new(bucket)) {
            return Err(SecretError::ObjectStore(format!("invalid bucket name {bucket:?}")));
        }
        let path = self.root.join(bucket);
        if !path.is_dir() {
            return Err(SecretError::ObjectStore(format!("bucket {bucket:?} does not exist")));
        }
        Ok(path)
    }
}

impl ObjectStore for DirectoryObjectStore {
    fn list_objects(&self, bucket: &str, prefix: &str) -> SecretResult<Vec<String>> {
        let bucket_path = self.bucket_path(bucket)?;
        let mut keys = Vec::new();

        for entry in WalkDir::new(&bucket_path).follow_links(true) {
            let entry = entry.map_err(|e| SecretError::ObjectStore(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&bucket_path) else {
                continue;
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn read_object(&self, bucket: &str, key: &str) -> SecretResult<Vec<u8>> {
        let bucket_path = self.bucket_path(bucket)?;
        if !is_plain_relative(Path::new(key)) {
            return Err(SecretError::ObjectStore(format!("invalid object key {key:?}")));
        }
        Ok(fs::read(bucket_path.join(key))?)
    }
}

/// Relative path without `..` or root components
fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().next().is_some()
}
