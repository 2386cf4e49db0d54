//! One-file-per-secret directory source
//!
//! Matches the layout used by Docker and Kubernetes secret mounts, where every
//! secret lives in its own file named after the secret.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::traits::{SecretError, SecretResult, SecretSource, SecretValue};

/// Secret source that reads each secret from a file inside a base directory
///
/// Nothing is cached: every lookup reads the file again.
///
/// # Example
///
/// ```no_run
/// use top_secret_core::secrets::{SecretSource, DirectorySecretSource};
///
/// // Reads /run/secrets/db_password.txt
/// let source = DirectorySecretSource::new("/run/secrets").with_postfix(".txt");
/// let password = source.get_string("db_password")?;
/// # Ok::<(), top_secret_core::secrets::SecretError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DirectorySecretSource {
    base_path: PathBuf,
    postfix: Option<String>,
    strip_whitespace: bool,
}

impl DirectorySecretSource {
    /// Create a source rooted at `base_path` that strips surrounding whitespace
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            postfix: None,
            strip_whitespace: true,
        }
    }

    /// Append `.{postfix}` to every secret name
    ///
    /// A single leading dot is ignored, so `"txt"` and `".txt"` are equivalent.
    pub fn with_postfix(mut self, postfix: impl AsRef<str>) -> Self {
        let postfix = postfix.as_ref();
        let postfix = postfix.strip_prefix('.').unwrap_or(postfix);
        self.postfix = (!postfix.is_empty()).then(|| postfix.to_string());
        self
    }

    /// Set the default whitespace handling for lookups
    pub fn with_strip_whitespace(mut self, strip: bool) -> Self {
        self.strip_whitespace = strip;
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn postfix(&self) -> Option<&str> {
        self.postfix.as_deref()
    }

    /// Path of the file holding `name`
    ///
    /// An absolute name bypasses the base directory.
    pub fn build_path(&self, name: &str) -> PathBuf {
        let file_name = match &self.postfix {
            Some(postfix) => format!("{name}.{postfix}"),
            None => name.to_string(),
        };

        let file_path = Path::new(&file_name);
        if file_path.is_absolute() {
            file_path.to_path_buf()
        } else {
            self.base_path.join(file_path)
        }
    }

    /// Read the secret `name`, optionally overriding whitespace stripping
    pub fn read(&self, name: &str, strip_whitespace: Option<bool>) -> SecretResult<String> {
        let path = self.build_path(name);
        if !path.exists() {
            return Err(SecretError::missing(
                name,
                format!("File {} doesn't exist.", path.display()),
            ));
        }

        let content = fs::read_to_string(&path)?;
        debug!(secret = name, path = %path.display(), "read secret file");

        if strip_whitespace.unwrap_or(self.strip_whitespace) {
            Ok(content.trim().to_string())
        } else {
            Ok(content)
        }
    }
}

impl SecretSource for DirectorySecretSource {
    fn name(&self) -> &str {
        "directory"
    }

    fn get(&self, name: &str) -> SecretResult<SecretValue> {
        self.read(name, None).map(Value::String)
    }
}
