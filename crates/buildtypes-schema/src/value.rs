//! Decoding of source text into the generic tree the validator consumes.
//!
//! The validator never sees source syntax: YAML, JSON and TOML documents are
//! all decoded into a `serde_json::Value` first.

use serde_json::{Map, Number, Value};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported mapping key: {0}")]
    UnsupportedKey(String),
    #[error("number {0} cannot be represented")]
    NonFiniteNumber(String),
}

/// Serialization syntax of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl SourceFormat {
    /// Pick the format from the file extension. Anything unrecognized is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

pub fn decode_str(input: &str, format: SourceFormat) -> Result<Value, DecodeError> {
    match format {
        SourceFormat::Yaml => {
            let mut value: serde_yaml::Value = serde_yaml::from_str(input)?;
            value.apply_merge()?;
            yaml_to_tree(value)
        }
        SourceFormat::Json => Ok(serde_json::from_str(input)?),
        SourceFormat::Toml => {
            let value: toml::Value = toml::from_str(input)?;
            Ok(serde_json::to_value(value)?)
        }
    }
}

fn yaml_to_tree(value: serde_yaml::Value) -> Result<Value, DecodeError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => yaml_number(&n)?,
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(yaml_to_tree)
                .collect::<Result<_, _>>()?,
        ),
        Yaml::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(yaml_key(key)?, yaml_to_tree(value)?);
            }
            Value::Object(map)
        }
        // Tags carry no meaning in a build types document.
        Yaml::Tagged(tagged) => yaml_to_tree(tagged.value)?,
    })
}

// NaN and the infinities have no JSON form and are rejected.
fn yaml_number(n: &serde_yaml::Number) -> Result<Value, DecodeError> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Number(i.into()))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::Number(u.into()))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| DecodeError::NonFiniteNumber(n.to_string()))
    }
}

// Scalar keys are stringified so that `10: ...` names a build type "10".
fn yaml_key(key: serde_yaml::Value) -> Result<String, DecodeError> {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Null => Ok("null".to_owned()),
        Yaml::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(DecodeError::UnsupportedKey(format!("{other:?}"))),
    }
}
