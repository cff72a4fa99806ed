use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// When enabled the application initialises the logger at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Write logs to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<String>,
    /// Locale used to look up UI texts. Defaults to `en`.
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Enable toast notifications in the UI.
    #[serde(default = "default_toasts")]
    pub enable_toasts: bool,
    /// Duration of toast notifications in seconds.
    #[serde(default = "default_toast_duration")]
    pub toast_duration: f32,
    /// Dashboard file, or a directory containing `dashboard.json`.
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,
    /// Directory holding `<locale>.json` translation overrides.
    #[serde(default)]
    pub translations_dir: Option<String>,
}

fn default_locale() -> String {
    "en".into()
}

fn default_toasts() -> bool {
    true
}

fn default_toast_duration() -> f32 {
    3.0
}

fn default_dashboard_path() -> String {
    "dashboard.json".into()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_file: None,
            locale: default_locale(),
            enable_toasts: default_toasts(),
            toast_duration: default_toast_duration(),
            dashboard_path: default_dashboard_path(),
            translations_dir: None,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
