//! Chained secret source with fallback behavior

use std::sync::Arc;

use tracing::debug;

use super::traits::{ResolvedSecret, SecretError, SecretResult, SecretSource, SecretValue};

/// A secret source that chains multiple sources together with fallback behavior
///
/// The chain tries each source in order and returns the first value found.
/// A source reporting the secret as missing hands over to the next one. Any
/// other error (unreadable file, malformed document, unreachable bucket) stops
/// the chain and is returned as-is. When every source misses, the last miss is
/// returned.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use top_secret_core::secrets::{
///     ChainSecretSource, EnvSecretSource, MemorySecretSource, SecretSource,
/// };
///
/// let defaults = MemorySecretSource::new().with_secret("log_level", "info");
///
/// // Try the environment first, then fall back to the defaults
/// let chain = ChainSecretSource::new(vec![
///     Arc::new(EnvSecretSource::with_prefixes(["MYAPP_"])),
///     Arc::new(defaults),
/// ]);
///
/// let resolved = chain.resolve("log_level").unwrap();
/// assert!(resolved.source == "env" || resolved.source == "memory");
/// ```
#[derive(Default)]
pub struct ChainSecretSource {
    sources: Vec<Arc<dyn SecretSource>>,
}

impl ChainSecretSource {
    /// Create a new chain; sources are tried in order
    pub fn new(sources: Vec<Arc<dyn SecretSource>>) -> Self {
        Self { sources }
    }

    /// Append a source at the lowest priority
    pub fn with_source(mut self, source: Arc<dyn SecretSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Get the sources in this chain
    pub fn sources(&self) -> &[Arc<dyn SecretSource>] {
        &self.sources
    }

    /// Retrieve a secret along with the name of the source that produced it
    pub fn resolve(&self, name: &str) -> SecretResult<ResolvedSecret> {
        let mut last_miss = None;

        for source in &self.sources {
            match source.get(name) {
                Ok(value) => {
                    debug!(secret = name, source = source.name(), "secret resolved");
                    return Ok(ResolvedSecret::new(value, source.name()));
                }
                Err(err) if err.is_missing() => {
                    debug!(
                        secret = name,
                        source = source.name(),
                        "secret missing, trying next source"
                    );
                    last_miss = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_miss
            .unwrap_or_else(|| SecretError::missing(name, "No secret sources are configured.")))
    }

    /// Find which source holds a secret
    pub fn find_source(&self, name: &str) -> Option<&Arc<dyn SecretSource>> {
        self.sources.iter().find(|source| source.has(name))
    }
}

impl SecretSource for ChainSecretSource {
    fn name(&self) -> &str {
        "chain"
    }

    fn get(&self, name: &str) -> SecretResult<SecretValue> {
        self.resolve(name).map(|resolved| resolved.value)
    }
}

// Implement Debug manually since Arc<dyn SecretSource> doesn't implement Debug
impl std::fmt::Debug for ChainSecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|s| s.name()).collect();
        f.debug_struct("ChainSecretSource")
            .field("sources", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{DirectorySecretSource, MemorySecretSource};
    use serde_json::json;
    use std::path::PathBuf;

    /// Source that always fails with a non-recoverable error
    struct BrokenSource;

    impl SecretSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        fn get(&self, _name: &str) -> SecretResult<SecretValue> {
            Err(SecretError::NotAFile(PathBuf::from("/broken")))
        }
    }

    #[test]
    fn test_chain_source_name() {
        let chain = ChainSecretSource::new(vec![Arc::new(MemorySecretSource::new())]);
        assert_eq!(chain.name(), "chain");
    }

    #[test]
    fn test_chain_source_fallback() {
        let first = Arc::new(MemorySecretSource::new());
        let second = Arc::new(MemorySecretSource::new().with_secret("key", "from_second"));

        let chain = ChainSecretSource::new(vec![first, second]);
        assert_eq!(chain.get("key").unwrap(), json!("from_second"));
    }

    #[test]
    fn test_chain_source_priority() {
        let first = Arc::new(MemorySecretSource::new().with_secret("key", "from_first"));
        let second = Arc::new(MemorySecretSource::new().with_secret("key", "from_second"));

        let chain = ChainSecretSource::new(vec![first, second]);
        assert_eq!(chain.get_string("key").unwrap(), "from_first");
    }

    #[test]
    fn test_chain_source_last_miss_propagates() {
        let chain = ChainSecretSource::new(vec![
            Arc::new(MemorySecretSource::new()),
            Arc::new(DirectorySecretSource::new("/nonexistent/top-secret")),
        ]);

        let err = chain.get("key").unwrap_err();
        assert!(err.is_missing());
        assert!(err.to_string().contains("/nonexistent/top-secret"));
    }

    #[test]
    fn test_chain_source_stops_on_hard_error() {
        let chain = ChainSecretSource::new(vec![
            Arc::new(MemorySecretSource::new()),
            Arc::new(BrokenSource),
            Arc::new(MemorySecretSource::new().with_secret("key", "unreachable")),
        ]);

        let err = chain.get("key").unwrap_err();
        assert!(matches!(err, SecretError::NotAFile(_)));
    }

    #[test]
    fn test_chain_source_success_before_hard_error() {
        let chain = ChainSecretSource::new(vec![
            Arc::new(MemorySecretSource::new().with_secret("key", "value")),
            Arc::new(BrokenSource),
        ]);

        assert_eq!(chain.get_string("key").unwrap(), "value");
    }

    #[test]
    fn test_chain_source_empty() {
        let chain = ChainSecretSource::default();
        let err = chain.get("key").unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_chain_source_resolve_and_find() {
        let chain = ChainSecretSource::new(vec![Arc::new(MemorySecretSource::new())])
            .with_source(Arc::new(MemorySecretSource::new().with_secret("key", "value")));

        let resolved = chain.resolve("key").unwrap();
        assert_eq!(resolved.source, "memory");
        assert_eq!(resolved.value, json!("value"));

        assert_eq!(chain.find_source("key").unwrap().name(), "memory");
        assert!(chain.find_source("absent").is_none());
    }
}
