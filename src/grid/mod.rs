//! Declarative grid: key-path resolution, formatters, conditions and the
//! column descriptors consumed by [`view::GridView`].

use serde_json::Value;
use std::sync::Arc;

pub mod column;
pub mod condition;
pub mod formatters;
pub mod resolver;
pub mod view;

pub use column::{build_column, build_columns, parse_columns, CellDef, CellType, ColumnConfig};
pub use condition::{filter_by_conditions, ConditionSet, FieldCondition, Operator};
pub use formatters::Formatter;
pub use resolver::{resolve, resolve_formatted, FormatterBinding, KeyPath};
pub use view::GridView;

/// Deployment defect in a column, action or filter configuration.
///
/// These are raised while columns are being built so a typo never turns into
/// a silently wrong cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownFormatter(String),
    UnknownAction(String),
    MalformedKeyPath(String),
    InvalidCondition(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::UnknownFormatter(name) => write!(f, "unknown formatter '{name}'"),
            ConfigError::UnknownAction(name) => write!(f, "no handler registered for action '{name}'"),
            ConfigError::MalformedKeyPath(path) => write!(f, "malformed key path '{path}'"),
            ConfigError::InvalidCondition(msg) => write!(f, "invalid condition: {msg}"),
            ConfigError::Parse(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Clickable control rendered inside an action cell.
#[derive(Clone)]
pub struct ActionButton {
    pub label: String,
    trigger: Arc<dyn Fn() + Send + Sync>,
}

impl ActionButton {
    pub fn new(label: impl Into<String>, trigger: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            trigger: Arc::new(trigger),
        }
    }

    /// Run the handler bound to this button.
    pub fn activate(&self) {
        (self.trigger)();
    }
}

impl std::fmt::Debug for ActionButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionButton")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// Buttons compare by what they show; handlers are closures.
impl PartialEq for ActionButton {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

/// Render-ready content of a single grid cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Renderable {
    Label {
        text: String,
        style: Option<String>,
    },
    ColorCircle {
        color: Option<String>,
    },
    Group {
        style: Option<String>,
        items: Vec<Renderable>,
    },
    Button(ActionButton),
    StatusLabel {
        text: String,
    },
}

impl Renderable {
    /// Plain text of the cell, used for logging and tests.
    pub fn text(&self) -> String {
        match self {
            Renderable::Label { text, .. } | Renderable::StatusLabel { text } => text.clone(),
            Renderable::ColorCircle { color } => color.clone().unwrap_or_default(),
            Renderable::Button(button) => button.label.clone(),
            Renderable::Group { items, .. } => items
                .iter()
                .map(Renderable::text)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

pub type Accessor = Arc<dyn Fn(&Value) -> Renderable + Send + Sync>;

/// One grid column: an id, a style tag and a pure `record -> cell` accessor.
#[derive(Clone)]
pub struct ColumnDescriptor {
    pub id: String,
    pub style: Option<String>,
    accessor: Accessor,
}

impl ColumnDescriptor {
    pub fn new(
        id: impl Into<String>,
        style: Option<String>,
        accessor: impl Fn(&Value) -> Renderable + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            style,
            accessor: Arc::new(accessor),
        }
    }

    pub fn render(&self, record: &Value) -> Renderable {
        (self.accessor)(record)
    }
}

impl std::fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("id", &self.id)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}
