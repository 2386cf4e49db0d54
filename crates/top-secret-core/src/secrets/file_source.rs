//! Structured file secret source (JSON / YAML)

use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::format::Format;
use super::traits::{lookup, Mapping, SecretError, SecretResult, SecretSource, SecretValue};

/// Files tried by [`FileSecretSource::new`], in lookup order
pub const DEFAULT_SECRET_FILES: [&str; 4] = [
    "settings.json",
    ".secrets.json",
    "settings.yaml",
    ".secrets.yaml",
];

/// Secret source backed by one or more structured configuration files
///
/// All files are read and parsed once, when the source is created. Lookups
/// scan the parsed documents in the order the files were given and return the
/// first non-null value stored under the requested key.
///
/// Relative paths are resolved against the current working directory at
/// construction time. Files that do not exist are skipped unless
/// `require_files_exist` is set.
///
/// # Example
///
/// ```no_run
/// use top_secret_core::secrets::{SecretSource, FileSecretSource};
///
/// let source = FileSecretSource::load(["/etc/myapp/secrets.yaml", "local.json"], false)?;
/// let password = source.get_string("db_password")?;
/// # Ok::<(), top_secret_core::secrets::SecretError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileSecretSource {
    contents: Vec<Mapping>,
    sources: Vec<PathBuf>,
}

impl FileSecretSource {
    /// Load the default candidates from the current directory, skipping the
    /// ones that are absent
    pub fn new() -> SecretResult<Self> {
        Self::load(DEFAULT_SECRET_FILES, false)
    }

    /// Load and parse every file in `files`
    pub fn load<I, P>(files: I, require_files_exist: bool) -> SecretResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut contents = Vec::new();
        let mut sources = Vec::new();

        for file in files {
            let path = resolve(file.as_ref())?;
            if let Some(mapping) = parse_file(&path, require_files_exist)? {
                debug!(path = %path.display(), keys = mapping.len(), "loaded secret file");
                contents.push(mapping);
                sources.push(path);
            }
        }

        Ok(Self { contents, sources })
    }

    /// Resolved paths of the files that were loaded, in lookup order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl SecretSource for FileSecretSource {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, name: &str) -> SecretResult<SecretValue> {
        lookup(&self.contents, name)
            .cloned()
            .ok_or_else(|| SecretError::missing(name, "Key is not set in any loaded file."))
    }
}

fn parse_file(path: &Path, require_exists: bool) -> SecretResult<Option<Mapping>> {
    if !path.exists() {
        if require_exists {
            return Err(SecretError::FileNotFound(path.to_path_buf()));
        }
        debug!(path = %path.display(), "secret file absent, skipping");
        return Ok(None);
    }

    if !path.is_file() {
        return Err(SecretError::NotAFile(path.to_path_buf()));
    }

    let format =
        Format::from_path(path).ok_or_else(|| SecretError::UnsupportedFormat(path.to_path_buf()))?;
    let text = fs::read_to_string(path)?;
    format.parse(&text, &path.display().to_string()).map(Some)
}

/// Make `path` absolute and lexically normalised
fn resolve(path: &Path) -> SecretResult<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    Ok(normalize(&absolute))
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
