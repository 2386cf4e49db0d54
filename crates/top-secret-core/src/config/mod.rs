//! Declarative source-chain configuration
//!
//! A chain can be described in YAML or JSON instead of being assembled in code:
//! - `ChainConfig`: ordered list of sources, loadable from a file
//! - `SourceSpec`: one source and its settings

mod chain_config;

pub use chain_config::{ChainConfig, SourceSpec};
