//! Loading JSON, YAML and TOML documents as comparable values.
//!
//! Every document node is wrapped in a held value of type `any`, so a JSON `null` is an empty
//! holder and compares as absence. Numbers share the type identity `number` whatever their
//! width, which lets `1` and `1.0` compare equal across formats.

use crate::inspect::Inspect;
use crate::value::{Kind, Value};
use chrono::DateTime;
use serde_json::Value as JsonValue;
use serde_yml::Value as YamlValue;
use std::path::Path;
use tracing::debug;
use valdiff_common::{ObjectMode, ValDiffError};

const HOLDER_TYPE: &str = "any";
const NUMBER_TYPE: &str = "number";
const ARRAY_TYPE: &str = "array";
const OBJECT_TYPE: &str = "object";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Toml,
}

impl DocumentFormat {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        if is_json_file(path) {
            Some(Self::Json)
        } else if is_yaml_file(path) {
            Some(Self::Yaml)
        } else if is_toml_file(path) {
            Some(Self::Toml)
        } else {
            None
        }
    }
}

/// Check if a file path appears to be JSON based on extension
pub fn is_json_file(path: &Path) -> bool {
    has_extension(path, &["json"])
}

/// Check if a file path appears to be YAML based on extension
pub fn is_yaml_file(path: &Path) -> bool {
    has_extension(path, &["yaml", "yml"])
}

pub fn is_toml_file(path: &Path) -> bool {
    has_extension(path, &["toml"])
}

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy().to_lowercase();
            candidates.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Read and parse a document, choosing the parser from the file extension.
pub fn load_document(path: &Path, mode: ObjectMode) -> Result<Value, ValDiffError> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        ValDiffError::UnsupportedFormat(format!(
            "{} (expected .json, .yaml, .yml or .toml)",
            path.display()
        ))
    })?;

    let content = std::fs::read_to_string(path)?;
    debug!("Loaded {} ({} bytes) as {:?}", path.display(), content.len(), format);

    parse_document(&content, format, mode).map_err(|message| ValDiffError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse document text in the given format.
pub fn parse_document(
    content: &str,
    format: DocumentFormat,
    mode: ObjectMode,
) -> Result<Value, String> {
    match format {
        DocumentFormat::Json => {
            let json: JsonValue = serde_json::from_str(content).map_err(|e| e.to_string())?;
            Ok(json_to_value(&json, mode))
        }
        DocumentFormat::Yaml => {
            let yaml: YamlValue = serde_yml::from_str(content).map_err(|e| e.to_string())?;
            Ok(yaml_to_value(&yaml, mode))
        }
        DocumentFormat::Toml => {
            let table: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;
            Ok(toml_to_value(&toml::Value::Table(table), mode))
        }
    }
}

fn held(inner: Value) -> Value {
    Value::dynamic(HOLDER_TYPE, Some(inner))
}

fn null() -> Value {
    Value::dynamic(HOLDER_TYPE, None)
}

fn object(entries: Vec<(String, Value)>, mode: ObjectMode) -> Value {
    match mode {
        ObjectMode::Map => Value::map(
            OBJECT_TYPE,
            entries
                .into_iter()
                .map(|(k, v)| (held(Value::string(k)), v))
                .collect(),
        ),
        ObjectMode::Record => {
            let mut entries = entries;
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
            let ty = format!("{}{{{}}}", OBJECT_TYPE, keys.join(","));
            Value::record(ty, entries)
        }
    }
}

pub fn json_to_value(json: &JsonValue, mode: ObjectMode) -> Value {
    match json {
        JsonValue::Null => null(),
        JsonValue::Bool(b) => held(Value::bool(*b)),
        JsonValue::Number(n) => {
            let kind = if let Some(i) = n.as_i64() {
                Kind::Int(i)
            } else if let Some(u) = n.as_u64() {
                Kind::Uint(u)
            } else {
                Kind::Float(n.as_f64().unwrap_or(f64::NAN))
            };
            held(Value::new(NUMBER_TYPE, kind))
        }
        JsonValue::String(s) => held(Value::string(s.as_str())),
        JsonValue::Array(items) => held(Value::seq(
            ARRAY_TYPE,
            items.iter().map(|v| json_to_value(v, mode)).collect(),
        )),
        JsonValue::Object(map) => held(object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_value(v, mode)))
                .collect(),
            mode,
        )),
    }
}

fn yaml_to_value(yaml: &YamlValue, mode: ObjectMode) -> Value {
    match yaml {
        YamlValue::Null => null(),
        YamlValue::Bool(b) => held(Value::bool(*b)),
        YamlValue::Number(n) => {
            let kind = if let Some(i) = n.as_i64() {
                Kind::Int(i)
            } else if let Some(u) = n.as_u64() {
                Kind::Uint(u)
            } else {
                Kind::Float(n.as_f64().unwrap_or(f64::NAN))
            };
            held(Value::new(NUMBER_TYPE, kind))
        }
        YamlValue::String(s) => held(Value::string(s.as_str())),
        YamlValue::Sequence(seq) => held(Value::seq(
            ARRAY_TYPE,
            seq.iter().map(|v| yaml_to_value(v, mode)).collect(),
        )),
        YamlValue::Mapping(map) => held(object(
            map.iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_value(v, mode)))
                .collect(),
            mode,
        )),
        YamlValue::Tagged(tagged) => yaml_to_value(&tagged.value, mode),
    }
}

// Non-string keys are stringified so YAML objects line up with JSON ones.
fn yaml_key(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        other => format!("{:?}", other),
    }
}

fn toml_to_value(value: &toml::Value, mode: ObjectMode) -> Value {
    match value {
        toml::Value::String(s) => held(Value::string(s.as_str())),
        toml::Value::Integer(i) => held(Value::new(NUMBER_TYPE, Kind::Int(*i))),
        toml::Value::Float(f) => held(Value::new(NUMBER_TYPE, Kind::Float(*f))),
        toml::Value::Boolean(b) => held(Value::bool(*b)),
        toml::Value::Datetime(dt) => {
            let text = dt.to_string();
            match DateTime::parse_from_rfc3339(&text) {
                Ok(t) => held(Value::time(t)),
                // Local dates and times carry no offset and stay textual.
                Err(_) => held(Value::new("local datetime", Kind::Str(text))),
            }
        }
        toml::Value::Array(items) => held(Value::seq(
            ARRAY_TYPE,
            items.iter().map(|v| toml_to_value(v, mode)).collect(),
        )),
        toml::Value::Table(table) => held(object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_value(v, mode)))
                .collect(),
            mode,
        )),
    }
}

impl Inspect for JsonValue {
    fn to_value(&self) -> Value {
        json_to_value(self, ObjectMode::Map)
    }

    fn type_name() -> String {
        HOLDER_TYPE.to_string()
    }
}
