//! Secret source abstractions and implementations
//!
//! This module provides a read-only secret lookup system with:
//! - `SecretSource` trait for implementing custom sources
//! - Built-in implementations: `EnvSecretSource`, `FileSecretSource`,
//!   `DirectorySecretSource`, `RemoteSecretSource`, `MemorySecretSource`
//! - `ChainSecretSource` for trying several sources in order
//! - `ObjectStore` trait plugging a storage client into `RemoteSecretSource`

mod traits;
pub(crate) mod format;
mod env_source;
mod file_source;
mod directory_source;
mod object_store;
mod remote_source;
mod memory_source;
mod chain_source;

pub use traits::{Mapping, ResolvedSecret, SecretError, SecretResult, SecretSource, SecretValue};
pub use env_source::EnvSecretSource;
pub use file_source::{FileSecretSource, DEFAULT_SECRET_FILES};
pub use directory_source::DirectorySecretSource;
pub use object_store::{DirectoryObjectStore, MemoryObjectStore, ObjectStore};
pub use remote_source::RemoteSecretSource;
pub use memory_source::MemorySecretSource;
pub use chain_source::ChainSecretSource;
