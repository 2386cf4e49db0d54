//! Top Secret Core
//!
//! Read-only secret lookup for applications that keep their secrets in more
//! than one place. A secret is requested by name and looked up through one or
//! more sources:
//! - environment variables, optionally under several prefixes
//! - structured JSON / YAML files, loaded once
//! - a directory holding one file per secret (Docker / Kubernetes mounts)
//! - YAML documents in object storage, fetched lazily and cached
//!
//! Sources share the [`SecretSource`] trait and compose through
//! [`ChainSecretSource`]: the first source that has the secret wins, a missing
//! secret moves on to the next source, and configuration errors stop the chain.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use top_secret_core::{
//!     preprocess, ChainSecretSource, DirectorySecretSource, EnvSecretSource, SecretSource,
//! };
//!
//! let chain = ChainSecretSource::new(vec![
//!     Arc::new(EnvSecretSource::with_prefixes(["MYAPP_", ""])),
//!     Arc::new(DirectorySecretSource::new("/run/secrets")),
//! ]);
//!
//! let port = preprocess::typed(&chain.get_string("DB_PORT")?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod secrets;
pub mod preprocess;
pub mod config;
pub mod logging;

pub use secrets::{
    SecretSource, SecretError, SecretResult, SecretValue, Mapping, ResolvedSecret,
    EnvSecretSource, FileSecretSource, DirectorySecretSource, RemoteSecretSource,
    MemorySecretSource, ChainSecretSource,
    ObjectStore, MemoryObjectStore, DirectoryObjectStore,
};

pub use preprocess::{PreprocessError, PreprocessResult, TypedValue, TypeTag};

pub use config::{ChainConfig, SourceSpec};
