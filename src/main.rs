use clinic_dashboard::appointment::HttpAppointmentResource;
use clinic_dashboard::dashboard::config::DashboardConfig;
use clinic_dashboard::dashboard::{Dashboard, WidgetEnv, WidgetRegistry};
use clinic_dashboard::gui::DashboardApp;
use clinic_dashboard::i18n::Translations;
use clinic_dashboard::logging;
use clinic_dashboard::notify::ChannelNotifier;
use clinic_dashboard::settings::Settings;

use anyhow::Context;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load("settings.json").context("load settings.json")?;
    logging::init(settings.debug_logging, settings.log_file.as_ref().map(PathBuf::from));

    let translations = match &settings.translations_dir {
        Some(dir) => Translations::load(dir, &settings.locale)?,
        None => Translations::builtin(&settings.locale),
    };
    let translations = Arc::new(translations);

    let (notifier, notifications) = ChannelNotifier::new();
    let env = WidgetEnv {
        resource: Arc::new(HttpAppointmentResource::new()?),
        notifier: Arc::new(notifier),
        translations: Arc::clone(&translations),
    };
    let dashboard_path = DashboardConfig::path_for(&settings.dashboard_path);
    tracing::info!(path = %dashboard_path.display(), locale = %settings.locale, "starting dashboard");
    let dashboard = Dashboard::new(dashboard_path, WidgetRegistry::with_defaults(), env);
    let app = DashboardApp::new(dashboard, translations, notifications, &settings);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Clinic Dashboard",
        native_options,
        Box::new(move |_cc| Box::new(app)),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}
