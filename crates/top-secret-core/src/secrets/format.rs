//! Parsing of structured secret documents into mappings

use std::path::Path;

use serde_json::Value;
use serde_yaml::Value as YamlValue;

use super::traits::{Mapping, SecretError, SecretResult};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Pick the format from a file extension
    ///
    /// Only `json`, `yaml` and `yml` are recognised. A bare dot file such as
    /// `.json` counts as having the extension after its dot.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = match path.extension() {
            Some(ext) => ext.to_str()?,
            None => path.file_name()?.to_str()?.rsplit_once('.')?.1,
        };
        match extension {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    pub fn parse(self, text: &str, origin: &str) -> SecretResult<Mapping> {
        match self {
            Format::Json => parse_json(text, origin),
            Format::Yaml => parse_yaml(text, origin),
        }
    }
}

pub fn parse_json(text: &str, origin: &str) -> SecretResult<Mapping> {
    let value: Value = serde_json::from_str(text).map_err(|e| SecretError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    })?;
    into_mapping(value, origin)
}

/// Parse YAML with the safe loader
///
/// Tags are unwrapped to their inner value, never executed. Merge keys
/// (`<<: *anchor`) are flattened into the mapping holding them. An empty
/// document yields an empty mapping.
pub fn parse_yaml(text: &str, origin: &str) -> SecretResult<Mapping> {
    if is_blank_yaml(text) {
        return Ok(Mapping::new());
    }
    let parse_error = |e: serde_yaml::Error| SecretError::Parse {
        origin: origin.to_string(),
        message: e.to_string(),
    };
    let mut yaml: YamlValue = serde_yaml::from_str(text).map_err(parse_error)?;
    yaml.apply_merge().map_err(parse_error)?;
    if yaml.is_null() {
        return Ok(Mapping::new());
    }
    into_mapping(yaml_to_json(yaml, origin)?, origin)
}

fn is_blank_yaml(text: &str) -> bool {
    text.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn into_mapping(value: Value, origin: &str) -> SecretResult<Mapping> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SecretError::InvalidDocument {
            origin: origin.to_string(),
            found: kind(&other).to_string(),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

fn yaml_to_json(yaml: YamlValue, origin: &str) -> SecretResult<Value> {
    Ok(match yaml {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                // NaN and infinities have no JSON number form; keep the YAML spelling
                match n.as_f64().and_then(serde_json::Number::from_f64) {
                    Some(number) => Value::Number(number),
                    None => Value::String(n.to_string()),
                }
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(seq) => Value::Array(
            seq.into_iter()
                .map(|v| yaml_to_json(v, origin))
                .collect::<SecretResult<_>>()?,
        ),
        YamlValue::Mapping(map) => {
            let mut out = Mapping::new();
            for (k, v) in map {
                out.insert(yaml_key(k, origin)?, yaml_to_json(v, origin)?);
            }
            Value::Object(out)
        }
        YamlValue::Tagged(tagged) => yaml_to_json(tagged.value, origin)?,
    })
}

fn yaml_key(key: YamlValue, origin: &str) -> SecretResult<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value, origin),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => Err(SecretError::Parse {
            origin: origin.to_string(),
            message: "mapping keys must be scalars".to_string(),
        }),
    }
}
