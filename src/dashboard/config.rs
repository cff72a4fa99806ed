use crate::dashboard::WidgetRegistry;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

fn default_version() -> u32 {
    1
}

/// One widget on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WidgetEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub widget: String,
    #[serde(default)]
    pub settings: serde_json::Value,
}

impl WidgetEntry {
    pub fn with_widget(widget: &str) -> Self {
        Self {
            id: None,
            widget: widget.to_string(),
            settings: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn heading(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.widget)
    }
}

/// Primary dashboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub widgets: Vec<WidgetEntry>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            widgets: vec![WidgetEntry::with_widget("appointments")],
        }
    }
}

impl DashboardConfig {
    /// Load a configuration from disk. Unknown widget types are filtered out
    /// using the provided registry.
    pub fn load(path: impl AsRef<Path>, registry: &WidgetRegistry) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut cfg: DashboardConfig = serde_json::from_str(&content)?;
        let warnings = cfg.sanitize(registry);
        for w in warnings {
            tracing::warn!("{w}");
        }
        Ok(cfg)
    }

    /// Save the configuration to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Remove unsupported widgets and fill in missing settings.
    pub fn sanitize(&mut self, registry: &WidgetRegistry) -> Vec<String> {
        let mut warnings = Vec::new();
        self.widgets.retain(|entry| {
            if entry.widget.is_empty() {
                return false;
            }
            if !registry.contains(&entry.widget) {
                tracing::warn!(widget = %entry.widget, "unknown dashboard widget dropped");
                warnings.push(format!("unknown dashboard widget '{}' dropped", entry.widget));
                return false;
            }
            true
        });
        for entry in &mut self.widgets {
            if entry.settings.is_null() {
                entry.settings = registry
                    .default_settings(&entry.widget)
                    .unwrap_or_else(|| json!({}));
            }
        }
        warnings
    }

    pub fn path_for(base: &str) -> PathBuf {
        let base = Path::new(base);
        if base.is_dir() {
            base.join("dashboard.json")
        } else {
            PathBuf::from(base)
        }
    }
}
