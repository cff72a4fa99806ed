pub mod config;
pub mod shell;

use crate::appointment::resource::AppointmentResource;
use crate::appointment::{AppointmentConfig, AppointmentWidget};
use crate::dashboard::config::{DashboardConfig, WidgetEntry};
use crate::grid::ConfigError;
use crate::i18n::Translations;
use crate::notify::Notifier;
use eframe::egui;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub use shell::{ShellResponse, WidgetShell};

/// Context shared with widgets at render time.
pub struct DashboardContext<'a> {
    pub translations: &'a Translations,
    pub now: Instant,
}

/// Widget trait implemented by all dashboard widgets.
pub trait Widget: Send {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>);
}

/// Services handed to widget constructors.
#[derive(Clone)]
pub struct WidgetEnv {
    pub resource: Arc<dyn AppointmentResource>,
    pub notifier: Arc<dyn Notifier>,
    pub translations: Arc<Translations>,
}

type WidgetCtor =
    dyn Fn(&Value, &WidgetEnv) -> Result<Box<dyn Widget>, ConfigError> + Send + Sync;

/// Descriptor for building widgets from JSON settings.
#[derive(Clone)]
pub struct WidgetFactory {
    ctor: Arc<WidgetCtor>,
    default_settings: Arc<dyn Fn() -> Value + Send + Sync>,
}

impl WidgetFactory {
    pub fn new<T, C>(build: fn(C, &WidgetEnv) -> Result<T, ConfigError>) -> Self
    where
        T: Widget + 'static,
        C: DeserializeOwned + Serialize + Default + 'static,
    {
        Self {
            ctor: Arc::new(move |v: &Value, env: &WidgetEnv| {
                let cfg = serde_json::from_value::<C>(v.clone())?;
                Ok(Box::new(build(cfg, env)?) as Box<dyn Widget>)
            }),
            default_settings: Arc::new(|| {
                serde_json::to_value(C::default()).unwrap_or_else(|_| json!({}))
            }),
        }
    }

    pub fn default_settings(&self) -> Value {
        (self.default_settings)()
    }

    pub fn create(&self, settings: &Value, env: &WidgetEnv) -> Result<Box<dyn Widget>, ConfigError> {
        (self.ctor)(settings, env)
    }
}

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    map: HashMap<String, WidgetFactory>,
}

impl WidgetRegistry {
    pub fn with_defaults() -> Self {
        let mut reg = Self::default();
        reg.register(
            "appointments",
            WidgetFactory::new::<_, AppointmentConfig>(AppointmentWidget::try_new),
        );
        reg
    }

    pub fn register(&mut self, name: &str, factory: WidgetFactory) {
        self.map.insert(name.to_string(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn create(
        &self,
        name: &str,
        settings: &Value,
        env: &WidgetEnv,
    ) -> Option<Result<Box<dyn Widget>, ConfigError>> {
        let settings = if settings.is_null() {
            self.default_settings(name)
                .unwrap_or_else(|| Value::Object(Default::default()))
        } else {
            settings.clone()
        };
        self.map.get(name).map(|f| f.create(&settings, env))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn default_settings(&self, name: &str) -> Option<Value> {
        self.map.get(name).map(|f| f.default_settings())
    }
}

enum SlotWidget {
    Ready(Box<dyn Widget>),
    Broken(ConfigError),
}

struct Slot {
    entry: WidgetEntry,
    widget: SlotWidget,
}

/// Vertical stack of configured widgets.
pub struct Dashboard {
    config_path: PathBuf,
    pub config: DashboardConfig,
    slots: Vec<Slot>,
    registry: WidgetRegistry,
    env: WidgetEnv,
    pub warnings: Vec<String>,
}

impl Dashboard {
    pub fn new(config_path: impl AsRef<Path>, registry: WidgetRegistry, env: WidgetEnv) -> Self {
        let mut dashboard = Self {
            config_path: config_path.as_ref().to_path_buf(),
            config: DashboardConfig::default(),
            slots: Vec::new(),
            registry,
            env,
            warnings: Vec::new(),
        };
        dashboard.reload();
        dashboard
    }

    pub fn reload(&mut self) {
        let mut warnings = Vec::new();
        let config = match DashboardConfig::load(&self.config_path, &self.registry) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::error!(path = %self.config_path.display(), "failed to load dashboard config: {err:#}");
                warnings.push(format!("failed to load dashboard config: {err}"));
                DashboardConfig::default()
            }
        };
        self.slots = config
            .widgets
            .iter()
            .filter_map(|entry| {
                let created = self.registry.create(&entry.widget, &entry.settings, &self.env)?;
                let widget = match created {
                    Ok(widget) => SlotWidget::Ready(widget),
                    Err(err) => {
                        tracing::error!(widget = %entry.widget, "widget configuration error: {err}");
                        warnings.push(format!("{}: {err}", entry.heading()));
                        SlotWidget::Broken(err)
                    }
                };
                Some(Slot {
                    entry: entry.clone(),
                    widget,
                })
            })
            .collect();
        if self.slots.is_empty() {
            warnings.push("dashboard has no widgets".into());
        }
        self.config = config;
        self.warnings = warnings;
    }

    pub fn widget_count(&self) -> usize {
        self.slots.len()
    }

    pub fn broken_widgets(&self) -> Vec<(&str, &ConfigError)> {
        self.slots
            .iter()
            .filter_map(|slot| match &slot.widget {
                SlotWidget::Broken(err) => Some((slot.entry.heading(), err)),
                SlotWidget::Ready(_) => None,
            })
            .collect()
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) {
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                for slot in &mut self.slots {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        match &mut slot.widget {
                            SlotWidget::Ready(widget) => widget.render(ui, ctx),
                            SlotWidget::Broken(err) => {
                                ui.heading(slot.entry.heading());
                                ui.colored_label(
                                    egui::Color32::RED,
                                    format!(
                                        "{}: {err}",
                                        ctx.translations.translate("Configuration error")
                                    ),
                                );
                            }
                        }
                    });
                    ui.add_space(8.0);
                }
            });
    }
}
