//! Chain configuration file model

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::secrets::format::Format;
use crate::secrets::{
    ChainSecretSource, DirectorySecretSource, EnvSecretSource, FileSecretSource, ObjectStore,
    RemoteSecretSource, SecretError, SecretResult, SecretSource, DEFAULT_SECRET_FILES,
};

/// Configuration file structure
///
/// ```yaml
/// sources:
///   - type: env
///     prefixes: ["MYAPP_", ""]
///   - type: directory
///     base_path: /run/secrets
///   - type: file
///     files: [settings.yaml]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Sources in lookup order
    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

/// Settings for a single source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSpec {
    Env {
        #[serde(default)]
        prefixes: Vec<String>,
    },
    File {
        #[serde(default = "default_files")]
        files: Vec<PathBuf>,
        #[serde(default)]
        require_files_exist: bool,
    },
    Directory {
        base_path: PathBuf,
        #[serde(default)]
        postfix: Option<String>,
        #[serde(default = "default_true")]
        strip_whitespace: bool,
    },
    Remote {
        bucket: String,
        objects: Vec<String>,
        #[serde(default = "default_true")]
        lazy: bool,
    },
}

fn default_files() -> Vec<PathBuf> {
    DEFAULT_SECRET_FILES.iter().map(PathBuf::from).collect()
}

fn default_true() -> bool {
    true
}

impl SourceSpec {
    /// Build the described source
    ///
    /// File sources are loaded and eager remote sources fetched right away.
    /// A remote source needs an object store.
    pub fn build(
        &self,
        object_store: Option<&Arc<dyn ObjectStore>>,
    ) -> SecretResult<Arc<dyn SecretSource>> {
        let source: Arc<dyn SecretSource> = match self {
            SourceSpec::Env { prefixes } => {
                Arc::new(EnvSecretSource::with_prefixes(prefixes.clone()))
            }
            SourceSpec::File {
                files,
                require_files_exist,
            } => Arc::new(FileSecretSource::load(files, *require_files_exist)?),
            SourceSpec::Directory {
                base_path,
                postfix,
                strip_whitespace,
            } => {
                let mut source =
                    DirectorySecretSource::new(base_path).with_strip_whitespace(*strip_whitespace);
                if let Some(postfix) = postfix {
                    source = source.with_postfix(postfix);
                }
                Arc::new(source)
            }
            SourceSpec::Remote {
                bucket,
                objects,
                lazy,
            } => {
                let store = object_store.ok_or_else(|| {
                    SecretError::Config(format!(
                        "remote source for bucket {bucket:?} needs an object store"
                    ))
                })?;
                Arc::new(RemoteSecretSource::with_lazy(
                    Arc::clone(store),
                    bucket.clone(),
                    objects.clone(),
                    *lazy,
                )?)
            }
        };
        Ok(source)
    }
}

impl ChainConfig {
    pub fn from_yaml_str(text: &str) -> SecretResult<Self> {
        serde_yaml::from_str(text).map_err(|e| SecretError::Parse {
            origin: "chain configuration".to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_json_str(text: &str) -> SecretResult<Self> {
        serde_json::from_str(text).map_err(|e| SecretError::Parse {
            origin: "chain configuration".to_string(),
            message: e.to_string(),
        })
    }

    /// Load a configuration file; the format follows the extension
    pub fn from_path(path: impl AsRef<Path>) -> SecretResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SecretError::FileNotFound(path.to_path_buf()));
        }
        let format = Format::from_path(path)
            .ok_or_else(|| SecretError::UnsupportedFormat(path.to_path_buf()))?;
        let text = fs::read_to_string(path)?;

        let parsed = match format {
            Format::Json => Self::from_json_str(&text),
            Format::Yaml => Self::from_yaml_str(&text),
        };
        parsed.map_err(|e| match e {
            SecretError::Parse { message, .. } => SecretError::Parse {
                origin: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Whether any source needs an object store
    pub fn needs_object_store(&self) -> bool {
        self.sources
            .iter()
            .any(|s| matches!(s, SourceSpec::Remote { .. }))
    }

    /// Build every source, in order, into a chain
    pub fn build(
        &self,
        object_store: Option<Arc<dyn ObjectStore>>,
    ) -> SecretResult<ChainSecretSource> {
        let sources = self
            .sources
            .iter()
            .map(|spec| spec.build(object_store.as_ref()))
            .collect::<SecretResult<Vec<_>>>()?;
        Ok(ChainSecretSource::new(sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemoryObjectStore;
    use tempfile::tempdir;

    const YAML: &str = r#"
sources:
  - type: env
    prefixes: ["APP_"]
  - type: directory
    base_path: /run/secrets
    postfix: .txt
  - type: file
  - type: remote
    bucket: configs
    objects: [prod/app]
"#;

    #[test]
    fn test_parse_yaml_with_defaults() {
        let config = ChainConfig::from_yaml_str(YAML).unwrap();

        assert_eq!(config.sources.len(), 4);
        assert_eq!(
            config.sources[0],
            SourceSpec::Env {
                prefixes: vec!["APP_".to_string()]
            }
        );
        assert_eq!(
            config.sources[1],
            SourceSpec::Directory {
                base_path: PathBuf::from("/run/secrets"),
                postfix: Some(".txt".to_string()),
                strip_whitespace: true,
            }
        );
        assert_eq!(
            config.sources[2],
            SourceSpec::File {
                files: default_files(),
                require_files_exist: false,
            }
        );
        assert!(matches!(config.sources[3], SourceSpec::Remote { lazy: true, .. }));
        assert!(config.needs_object_store());
    }

    #[test]
    fn test_parse_json() {
        let config = ChainConfig::from_json_str(
            r#"{"sources": [{"type": "remote", "bucket": "b", "objects": ["x"], "lazy": false}]}"#,
        )
        .unwrap();
        assert_eq!(
            config.sources,
            vec![SourceSpec::Remote {
                bucket: "b".to_string(),
                objects: vec!["x".to_string()],
                lazy: false,
            }]
        );
    }

    #[test]
    fn test_unknown_source_type() {
        let err = ChainConfig::from_yaml_str("sources:\n  - type: vault\n").unwrap_err();
        assert!(matches!(err, SecretError::Parse { .. }));
    }

    #[test]
    fn test_build_chain() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("db.txt"), "hunter2\n").unwrap();

        let store = Arc::new(MemoryObjectStore::new());
        store.insert("configs", "prod/app.yaml", "api_key: from_remote\n");

        let config = ChainConfig {
            sources: vec![
                SourceSpec::Directory {
                    base_path: dir.path().to_path_buf(),
                    postfix: Some("txt".to_string()),
                    strip_whitespace: true,
                },
                SourceSpec::Remote {
                    bucket: "configs".to_string(),
                    objects: vec!["prod/app".to_string()],
                    lazy: true,
                },
            ],
        };

        let chain = config.build(Some(store.clone())).unwrap();
        let names: Vec<&str> = chain.sources().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["directory", "remote"]);
        assert_eq!(store.list_calls(), 0);

        assert_eq!(chain.get_string("db").unwrap(), "hunter2");
        assert_eq!(chain.get_string("api_key").unwrap(), "from_remote");
        assert!(chain.get("absent").unwrap_err().is_missing());
    }

    #[test]
    fn test_remote_without_store() {
        let config = ChainConfig::from_yaml_str(YAML).unwrap();
        assert!(matches!(
            SourceSpec::build(&config.sources[3], None),
            Err(SecretError::Config(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("chain.yml");
        fs::write(&yaml, "sources:\n  - type: env\n").unwrap();
        let config = ChainConfig::from_path(&yaml).unwrap();
        assert_eq!(config.sources, vec![SourceSpec::Env { prefixes: vec![] }]);

        let broken = dir.path().join("chain.json");
        fs::write(&broken, "{").unwrap();
        let err = ChainConfig::from_path(&broken).unwrap_err();
        assert!(
            matches!(err, SecretError::Parse { ref origin, .. } if origin.ends_with("chain.json"))
        );

        let toml = dir.path().join("chain.toml");
        fs::write(&toml, "").unwrap();
        assert!(matches!(
            ChainConfig::from_path(&toml),
            Err(SecretError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ChainConfig::from_path(dir.path().join("absent.yaml")),
            Err(SecretError::FileNotFound(_))
        ));
    }
}
