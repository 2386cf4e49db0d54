//! Post-lookup transforms for raw secret strings
//!
//! Sources hand back secrets exactly as stored. These functions decode or cast
//! that raw text; they are pure and are applied by the caller after a lookup.
//!
//! ```
//! use top_secret_core::preprocess::{typed, TypedValue};
//!
//! assert_eq!(typed("i:42").unwrap(), TypedValue::Int(42));
//! assert_eq!(typed("b:no").unwrap(), TypedValue::Bool(false));
//! assert_eq!(typed("plain").unwrap(), TypedValue::String("plain".into()));
//! ```

use std::fmt;
use std::num::{ParseFloatError, ParseIntError};
use std::str::FromStr;
use std::string::FromUtf8Error;

use base64::Engine as _;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while decoding a secret value
#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("Unknown type tag: {0:?}")]
    UnknownTag(String),

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid base32: {0}")]
    Base32(#[from] data_encoding::DecodeError),

    #[error("Decoded value is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("Invalid integer: {0}")]
    Int(#[from] ParseIntError),

    #[error("Invalid float: {0}")]
    Float(#[from] ParseFloatError),

    #[error("Invalid decimal: {0}")]
    Decimal(#[from] rust_decimal::Error),

    #[error("Invalid boolean: {0:?}")]
    Bool(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type PreprocessResult<T> = Result<T, PreprocessError>;

/// Decode a standard, padded base64 value into text
///
/// Whitespace anywhere in the value is ignored, so line-wrapped encodings
/// (as written by `base64` at 76 columns) decode as one value.
pub fn base64_decode(value: &str) -> PreprocessResult<String> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(strip_whitespace(value))?;
    Ok(String::from_utf8(bytes)?)
}

/// Decode an RFC 4648 base32 value into text
///
/// Whitespace is ignored as for [`base64_decode`].
pub fn base32_decode(value: &str) -> PreprocessResult<String> {
    let bytes = data_encoding::BASE32.decode(strip_whitespace(value).as_bytes())?;
    Ok(String::from_utf8(bytes)?)
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_ascii_whitespace()).collect()
}

/// Conversion selected by the tag of a typed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Int,
    Float,
    Decimal,
    Bool,
    String,
    Json,
}

impl FromStr for TypeTag {
    type Err = PreprocessError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "i" | "int" => Ok(TypeTag::Int),
            "f" | "float" => Ok(TypeTag::Float),
            "d" | "decimal" => Ok(TypeTag::Decimal),
            "b" | "bool" => Ok(TypeTag::Bool),
            "s" | "string" => Ok(TypeTag::String),
            "j" | "json" => Ok(TypeTag::Json),
            other => Err(PreprocessError::UnknownTag(other.to_string())),
        }
    }
}

impl TypeTag {
    /// Convert `raw` according to this tag
    pub fn cast(self, raw: &str) -> PreprocessResult<TypedValue> {
        Ok(match self {
            TypeTag::Int => TypedValue::Int(raw.trim().parse()?),
            TypeTag::Float => TypedValue::Float(raw.trim().parse()?),
            TypeTag::Decimal => TypedValue::Decimal(Decimal::from_str(raw.trim())?),
            TypeTag::Bool => TypedValue::Bool(parse_bool(raw)?),
            TypeTag::String => TypedValue::String(raw.to_string()),
            TypeTag::Json => TypedValue::Json(serde_json::from_str(raw)?),
        })
    }
}

/// A secret after typed decoding
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Bool(bool),
    String(String),
    Json(Value),
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Int(i) => write!(f, "{i}"),
            TypedValue::Float(x) => write!(f, "{x}"),
            TypedValue::Decimal(d) => write!(f, "{d}"),
            TypedValue::Bool(b) => write!(f, "{b}"),
            TypedValue::String(s) => f.write_str(s),
            TypedValue::Json(v) => write!(f, "{v}"),
        }
    }
}

/// Decode a `<tag>:<raw>` value
///
/// A value without a `:` is returned unchanged as a string. Only the first `:`
/// separates the tag, so `s:a:b` yields `"a:b"`.
pub fn typed(value: &str) -> PreprocessResult<TypedValue> {
    match value.split_once(':') {
        None => Ok(TypedValue::String(value.to_string())),
        Some((tag, raw)) => tag.parse::<TypeTag>()?.cast(raw),
    }
}

fn parse_bool(raw: &str) -> PreprocessResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Ok(false),
        _ => Err(PreprocessError::Bool(raw.to_string())),
    }
}
