use super::formatters::Formatter;
use super::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const KEY_PATH_SEPARATOR: char = '.';

/// Dot separated path into a nested record, e.g. `patient.name`.
///
/// Paths are validated when parsed so that empty segments (`patient..name`)
/// are rejected while the configuration is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyPath {
    raw: String,
    segments: Vec<String>,
}

impl KeyPath {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MalformedKeyPath(raw.to_string()));
        }
        let segments: Vec<String> = trimmed
            .split(KEY_PATH_SEPARATOR)
            .map(|s| s.trim().to_string())
            .collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::MalformedKeyPath(raw.to_string()));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}

impl std::str::FromStr for KeyPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for KeyPath {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyPath> for String {
    fn from(path: KeyPath) -> Self {
        path.raw
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Walk `path` through `record`. Returns `None` as soon as a segment is
/// missing or the current value cannot be indexed; never panics.
///
/// Array elements can be addressed with numeric segments (`identifiers.0`).
pub fn resolve<'a>(record: &'a Value, path: &KeyPath) -> Option<&'a Value> {
    path.segments().try_fold(record, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// A formatter together with the extra key paths passed to it positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterBinding {
    pub formatter: Formatter,
    pub args: Vec<KeyPath>,
}

impl FormatterBinding {
    pub fn new(formatter: Formatter) -> Self {
        Self {
            formatter,
            args: Vec::new(),
        }
    }

    pub fn with_args(formatter: Formatter, args: Vec<KeyPath>) -> Self {
        Self { formatter, args }
    }
}

/// Resolve `path` and turn it into display text, running it through the bound
/// formatter (if any) with the resolved extra arguments in declaration order.
pub fn resolve_formatted(
    record: &Value,
    path: &KeyPath,
    binding: Option<&FormatterBinding>,
) -> String {
    let value = resolve(record, path);
    match binding {
        None => display_value(value),
        Some(binding) => {
            let args: Vec<Option<&Value>> =
                binding.args.iter().map(|arg| resolve(record, arg)).collect();
            binding.formatter.apply(value, &args)
        }
    }
}

/// Text shown for a raw (unformatted) value. Missing and null values are empty.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}
