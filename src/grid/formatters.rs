use super::resolver::display_value;
use super::ConfigError;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde_json::Value;

const TIME_FORMAT: &str = "%-I:%M %p";
const DATE_FORMAT: &str = "%d %b %Y";

/// Named cell formatters. Configuration refers to them by their camelCase
/// name; anything else is rejected when the column is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Formatter {
    ConvertToTime,
    ConvertToDate,
    DifferenceInMins,
    ToUpperCase,
}

impl Formatter {
    pub const ALL: [Formatter; 4] = [
        Formatter::ConvertToTime,
        Formatter::ConvertToDate,
        Formatter::DifferenceInMins,
        Formatter::ToUpperCase,
    ];

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| ConfigError::UnknownFormatter(name.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Formatter::ConvertToTime => "convertToTime",
            Formatter::ConvertToDate => "convertToDate",
            Formatter::DifferenceInMins => "differenceInMins",
            Formatter::ToUpperCase => "toUpperCase",
        }
    }

    /// Format `value` with the extra resolved `args`. Values that cannot be
    /// interpreted render as an empty string.
    pub fn apply(&self, value: Option<&Value>, args: &[Option<&Value>]) -> String {
        match self {
            Formatter::ConvertToTime => timestamp(value)
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
            Formatter::ConvertToDate => timestamp(value)
                .map(|t| t.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            Formatter::DifferenceInMins => {
                let end = args.first().copied().flatten();
                match (timestamp(value), timestamp(end)) {
                    (Some(start), Some(end)) => (end - start).num_minutes().to_string(),
                    _ => String::new(),
                }
            }
            Formatter::ToUpperCase => display_value(value).to_uppercase(),
        }
    }
}

impl std::fmt::Display for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpret a record value as a point in time: epoch milliseconds (number or
/// numeric string), RFC 3339, or a local `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn timestamp(value: Option<&Value>) -> Option<DateTime<Local>> {
    match value? {
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            Local.timestamp_millis_opt(millis).single()
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(millis) = s.parse::<i64>() {
                return Local.timestamp_millis_opt(millis).single();
            }
            if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                return Some(t.with_timezone(&Local));
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        }
        _ => None,
    }
}
