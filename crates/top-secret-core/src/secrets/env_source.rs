//! Environment variable secret source

use std::env::{self, VarError};

use serde_json::Value;
use tracing::{debug, warn};

use super::traits::{SecretError, SecretResult, SecretSource, SecretValue};

/// Secret source that reads from environment variables
///
/// The environment is read live on every lookup; nothing is cached.
///
/// # Prefixes
///
/// Each configured prefix is tried in order against the requested name, and the
/// first variable that is set wins, even when its value is empty. The default
/// is a single empty prefix, i.e. the name is used verbatim.
///
/// # Example
///
/// ```
/// use top_secret_core::secrets::{SecretSource, EnvSecretSource};
///
/// let source = EnvSecretSource::with_prefixes(["PROD_", ""]);
/// assert_eq!(source.prefixes(), &["PROD_".to_string(), String::new()]);
/// ```
#[derive(Debug, Clone)]
pub struct EnvSecretSource {
    prefixes: Vec<String>,
}

impl Default for EnvSecretSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvSecretSource {
    /// Create a source that looks names up verbatim
    pub fn new() -> Self {
        Self {
            prefixes: vec![String::new()],
        }
    }

    /// Create a source that tries each prefix in order
    ///
    /// An empty list behaves like [`EnvSecretSource::new`].
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
        if prefixes.is_empty() {
            return Self::new();
        }
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl SecretSource for EnvSecretSource {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, name: &str) -> SecretResult<SecretValue> {
        let mut checked = Vec::with_capacity(self.prefixes.len());

        for prefix in &self.prefixes {
            let var = format!("{prefix}{name}");
            match env::var(&var) {
                Ok(value) => {
                    debug!(secret = name, variable = %var, "secret found in environment");
                    return Ok(Value::String(value));
                }
                Err(VarError::NotUnicode(_)) => {
                    warn!(variable = %var, "environment variable is not valid unicode, skipping");
                }
                Err(VarError::NotPresent) => {}
            }
            checked.push(var);
        }

        let reason = match checked.as_slice() {
            [only] => format!("Environment variable {only:?} is not set."),
            many => format!("None of the environment variables {many:?} is set."),
        };
        Err(SecretError::missing(name, reason))
    }
}
