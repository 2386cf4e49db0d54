//! In-memory secret source

use std::collections::HashMap;

use serde_json::Value;

use super::traits::{SecretError, SecretResult, SecretSource, SecretValue};

/// Secret source holding a fixed set of values
///
/// Useful in tests and for injecting defaults at the end of a chain. The set
/// is fixed once the source is built.
///
/// # Example
///
/// ```
/// use top_secret_core::secrets::{SecretSource, MemorySecretSource};
///
/// let source = MemorySecretSource::new().with_secret("api_key", "sk-test");
/// assert_eq!(source.get_string("api_key").unwrap(), "sk-test");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySecretSource {
    secrets: HashMap<String, Value>,
}

impl MemorySecretSource {
    /// Create a new empty memory source
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory source with initial values
    pub fn with_secrets(initial: HashMap<String, Value>) -> Self {
        Self { secrets: initial }
    }

    /// Add a secret while building the source
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl SecretSource for MemorySecretSource {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, name: &str) -> SecretResult<SecretValue> {
        self.secrets
            .get(name)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| SecretError::missing(name, "Key is not set in memory."))
    }
}
