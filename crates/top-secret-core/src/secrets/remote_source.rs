//! Object-storage backed secret source

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use super::format::parse_yaml;
use super::object_store::ObjectStore;
use super::traits::{lookup, Mapping, SecretError, SecretResult, SecretSource, SecretValue};

/// Secret source backed by YAML documents kept in object storage
///
/// For each configured object name the source lists the bucket under that name
/// as a prefix and reads the first match. Documents are fetched once, either on
/// the first lookup (the default) or when the source is built eagerly, and are
/// then cached for the lifetime of the source. Concurrent first lookups share a
/// single fetch.
///
/// A failed fetch is not cached: the error is returned and the next lookup
/// tries again.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use top_secret_core::secrets::{MemoryObjectStore, RemoteSecretSource, SecretSource};
///
/// let store = Arc::new(MemoryObjectStore::new());
/// store.insert("configs", "prod/app.yaml", "api_key: abc123\n");
///
/// let source = RemoteSecretSource::new(store.clone(), "configs", ["prod/app"]);
/// assert!(!source.is_loaded());
/// assert_eq!(source.get_string("api_key").unwrap(), "abc123");
/// assert!(source.is_loaded());
/// ```
pub struct RemoteSecretSource {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    objects: Vec<String>,
    contents: OnceCell<Vec<Mapping>>,
}

impl RemoteSecretSource {
    /// Create a lazy source; nothing is fetched until the first lookup
    pub fn new<I, S>(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store,
            bucket: bucket.into(),
            objects: objects.into_iter().map(Into::into).collect(),
            contents: OnceCell::new(),
        }
    }

    /// Create a source and fetch every object immediately
    pub fn eager<I, S>(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        objects: I,
    ) -> SecretResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::new(store, bucket, objects);
        source.load()?;
        Ok(source)
    }

    /// Create a source, fetching immediately unless `lazy` is set
    pub fn with_lazy<I, S>(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        objects: I,
        lazy: bool,
    ) -> SecretResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if lazy {
            Ok(Self::new(store, bucket, objects))
        } else {
            Self::eager(store, bucket, objects)
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    /// Whether the documents have been fetched
    pub fn is_loaded(&self) -> bool {
        self.contents.get().is_some()
    }

    /// Fetch the documents unless already cached
    pub fn load(&self) -> SecretResult<&[Mapping]> {
        self.contents
            .get_or_try_init(|| self.fetch())
            .map(Vec::as_slice)
    }

    fn fetch(&self) -> SecretResult<Vec<Mapping>> {
        let mut contents = Vec::with_capacity(self.objects.len());

        for prefix in &self.objects {
            let key = self
                .store
                .list_objects(&self.bucket, prefix)?
                .into_iter()
                .next()
                .ok_or_else(|| SecretError::ObjectNotFound {
                    bucket: self.bucket.clone(),
                    prefix: prefix.clone(),
                })?;

            let body = self.store.read_object(&self.bucket, &key)?;
            let origin = format!("{}/{}", self.bucket, key);
            let text = String::from_utf8(body).map_err(|e| SecretError::Parse {
                origin: origin.clone(),
                message: e.to_string(),
            })?;
            let mapping = parse_yaml(&text, &origin)?;

            debug!(object = %origin, keys = mapping.len(), "loaded remote secret document");
            contents.push(mapping);
        }

        Ok(contents)
    }
}

impl SecretSource for RemoteSecretSource {
    fn name(&self) -> &str {
        "remote"
    }

    fn get(&self, name: &str) -> SecretResult<SecretValue> {
        lookup(self.load()?, name).cloned().ok_or_else(|| {
            SecretError::missing(
                name,
                format!("Key is not set in any object of bucket {:?}.", self.bucket),
            )
        })
    }
}

// Implement Debug manually since Arc<dyn ObjectStore> doesn't implement Debug
impl std::fmt::Debug for RemoteSecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSecretSource")
            .field("bucket", &self.bucket)
            .field("objects", &self.objects)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
