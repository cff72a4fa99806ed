use crate::grid::{parse_columns, ColumnConfig, ConditionSet, ConfigError, KeyPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Refresh interval in seconds used when none (or a non-positive one) is configured.
pub const DEFAULT_REFRESH_INTERVAL: u64 = 60;
/// Field appointments are sorted by, ascending.
pub const SORT_BY: &str = "startDateTime";
pub const DEFAULT_TITLE: &str = "Appointments";
pub const NO_DATA_TEXT: &str = "No appointments";

pub const CHECK_IN_SUCCESS_MESSAGE: &str = "CHECK_IN_SUCCESS_MESSAGE";
pub const CHECK_IN_ERROR_MESSAGE: &str = "CHECK_IN_ERROR_MESSAGE";
pub const COMPLETED_SUCCESS_MESSAGE: &str = "COMPLETED_SUCCESS_MESSAGE";
pub const COMPLETED_ERROR_MESSAGE: &str = "COMPLETED_ERROR_MESSAGE";

const DEFAULT_COLUMNS: &str = include_str!("columns.json");

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_sort_by() -> String {
    SORT_BY.to_string()
}

/// Where appointments are fetched from. `url` doubles as the base URL for
/// status changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<ConditionSet>,
}

/// An action column: `name` picks the handler, `when` decides per row
/// whether the button is offered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub name: String,
    #[serde(default)]
    pub when: ConditionSet,
}

/// Settings of the appointment widget as stored in the dashboard file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub view_all: String,
    /// Seconds between refreshes.
    #[serde(default)]
    pub refresh_interval: f64,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Value>,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
}

impl Default for AppointmentConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            title: default_title(),
            view_all: String::new(),
            refresh_interval: 0.0,
            actions: Vec::new(),
            columns: None,
            provider: None,
            sort_by: default_sort_by(),
        }
    }
}

impl AppointmentConfig {
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Interval the refresh timer is armed with after a successful fetch.
    /// Positive values are rounded up to whole milliseconds, never to zero.
    pub fn refresh_interval(&self) -> Duration {
        if self.refresh_interval.is_finite() && self.refresh_interval > 0.0 {
            let millis = (self.refresh_interval * 1000.0).ceil() as u64;
            Duration::from_millis(millis.max(1))
        } else {
            Duration::from_secs(DEFAULT_REFRESH_INTERVAL)
        }
    }

    /// Configured columns, or the bundled default layout.
    pub fn column_configs(&self) -> Result<Vec<ColumnConfig>, ConfigError> {
        match &self.columns {
            Some(columns) => Ok(columns.clone()),
            None => default_columns(),
        }
    }

    pub fn sort_key(&self) -> Result<KeyPath, ConfigError> {
        KeyPath::parse(&self.sort_by)
    }
}

pub fn default_columns() -> Result<Vec<ColumnConfig>, ConfigError> {
    parse_columns(DEFAULT_COLUMNS)
}
