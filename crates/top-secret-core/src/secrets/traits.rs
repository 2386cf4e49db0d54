//! Core traits and types for secret sources

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

/// A secret as produced by a source
///
/// Environment and directory sources always yield `Value::String`. Aggregate
/// sources yield whatever the backing document holds under the key.
pub type SecretValue = Value;

/// One parsed configuration document
pub type Mapping = serde_json::Map<String, Value>;

/// A secret together with the source that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSecret {
    pub value: SecretValue,
    /// Name of the source that provided the value (useful for chains)
    pub source: String,
}

impl ResolvedSecret {
    pub fn new(value: SecretValue, source: impl Into<String>) -> Self {
        Self {
            value,
            source: source.into(),
        }
    }
}

/// Errors that can occur while looking up a secret
///
/// `Missing` is the only recoverable kind: a chain moves on to its next source.
/// Every other variant signals misconfiguration or malformed data.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Cannot get secret {name:?}. {reason}")]
    Missing { name: String, reason: String },

    #[error("File {} doesn't exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("File {} is not in a supported format", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("Expected a mapping at the top of {origin}, found {found}")]
    InvalidDocument { origin: String, found: String },

    #[error("No object under prefix {prefix:?} in bucket {bucket:?}")]
    ObjectNotFound { bucket: String, prefix: String },

    #[error("Object store error: {0}")]
    ObjectStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SecretError {
    pub fn missing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Missing {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the secret was simply not found, as opposed to a configuration
    /// or format failure
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

pub type SecretResult<T> = Result<T, SecretError>;

/// Trait for secret source implementations
///
/// Implementations:
/// - Environment variables (`EnvSecretSource`)
/// - Structured files (`FileSecretSource`)
/// - One file per secret (`DirectorySecretSource`)
/// - Object storage (`RemoteSecretSource`)
/// - Fixed in-memory values (`MemorySecretSource`)
/// - Chained for fallback behavior (`ChainSecretSource`)
///
/// # Example
///
/// ```
/// use top_secret_core::secrets::{SecretSource, EnvSecretSource};
///
/// let source = EnvSecretSource::with_prefixes(["MYAPP_", ""]);
/// // source.get("DB_PASSWORD") checks MYAPP_DB_PASSWORD, then DB_PASSWORD
/// ```
pub trait SecretSource: Send + Sync {
    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Retrieve a secret by name
    ///
    /// Returns `Err(SecretError::Missing { .. })` when this source does not
    /// hold the secret. A null value is never returned.
    fn get(&self, name: &str) -> SecretResult<SecretValue>;

    /// Retrieve a secret as text
    ///
    /// String values are returned as-is; anything else is rendered as JSON.
    fn get_string(&self, name: &str) -> SecretResult<String> {
        Ok(match self.get(name)? {
            Value::String(s) => s,
            other => other.to_string(),
        })
    }

    /// Check if a secret can be retrieved
    fn has(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }
}

/// Find the first non-null value for `name` across `mappings`, in order
pub(crate) fn lookup<'a>(mappings: &'a [Mapping], name: &str) -> Option<&'a Value> {
    mappings
        .iter()
        .filter_map(|m| m.get(name))
        .find(|v| !v.is_null())
}
