use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::form_urlencoded;

/// A model reference as written in configuration: either a plain string
/// (`"gpt-4"`, `"gpt-4?temperature=0.5"`) or a structured form with a
/// `name` and an `options` mapping.
///
/// Both forms canonicalize to a single string of the shape
/// `name` or `name?key=value&...` via [`ModelRef::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelRef {
    Name(String),
    Detailed(DetailedModelRef),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedModelRef {
    pub name: String,
    #[serde(default)]
    pub options: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelRefError {
    #[error("Model name cannot be empty.")]
    EmptyName,
    #[error("Cannot use both query parameters in model name and options array.")]
    AmbiguousOptions,
}

impl ModelRef {
    /// Canonicalize to the string form.
    ///
    /// Plain strings pass through unchanged. For the structured form, any
    /// query embedded in `name` is parsed out (a scheme, if present, stays
    /// prefixed to the path), and the result is re-encoded with the options
    /// as a query string in insertion order. Booleans encode as the literal
    /// strings `true` / `false`.
    pub fn normalize(&self) -> Result<String, ModelRefError> {
        match self {
            Self::Name(name) => Ok(name.clone()),
            Self::Detailed(detailed) => normalize_detailed(&detailed.name, &detailed.options),
        }
    }
}

fn normalize_detailed(name: &str, options: &Map<String, Value>) -> Result<String, ModelRefError> {
    let mut pairs = flatten_options(options);

    let model = match name.split_once('?') {
        None => name.to_string(),
        Some((head, query)) => {
            let model = split_scheme(head)?;
            if !query.is_empty() {
                if !pairs.is_empty() {
                    return Err(ModelRefError::AmbiguousOptions);
                }
                pairs = form_urlencoded::parse(query.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
            }
            model
        }
    };

    if pairs.is_empty() {
        return Ok(model);
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    Ok(format!("{model}?{}", serializer.finish()))
}

/// Split an optional URI scheme off the part before `?`, keeping it as a
/// `scheme:` prefix on the path. The path itself must be non-empty.
fn split_scheme(head: &str) -> Result<String, ModelRefError> {
    if let Some((scheme, rest)) = head.split_once("://") {
        // Authority form: only what follows the host counts as path.
        let path = rest.find('/').map(|i| &rest[i..]).unwrap_or("");
        if path.is_empty() {
            return Err(ModelRefError::EmptyName);
        }
        return Ok(format!("{scheme}:{path}"));
    }

    if let Some((scheme, path)) = head.split_once(':') {
        if is_scheme(scheme) {
            if path.is_empty() {
                return Err(ModelRefError::EmptyName);
            }
            return Ok(format!("{scheme}:{path}"));
        }
    }

    if head.is_empty() {
        return Err(ModelRefError::EmptyName);
    }
    Ok(head.to_string())
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Flatten an options mapping into encoded key/value pairs, bracketing
/// nested keys (`pool[size]=4`) and stringifying booleans. Nulls are
/// skipped.
fn flatten_options(options: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in options {
        flatten_value(key, value, &mut pairs);
    }
    pairs
}

fn flatten_value(key: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            let literal = if *b { "true" } else { "false" };
            pairs.push((key.to_string(), literal.to_string()));
        }
        Value::Number(n) => pairs.push((key.to_string(), n.to_string())),
        Value::String(s) => pairs.push((key.to_string(), s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(&format!("{key}[{index}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten_value(&format!("{key}[{sub}]"), item, pairs);
            }
        }
    }
}
