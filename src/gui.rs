use crate::dashboard::{Dashboard, DashboardContext};
use crate::i18n::Translations;
use crate::notify::{Notification, NotificationKind};
use crate::settings::Settings;
use crate::toast_log::{append_toast_log_to, TOAST_LOG_FILE};
use eframe::egui;
use egui_toast::{Toast, ToastKind, ToastOptions, Toasts};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;

/// Top-level eframe application: hosts the dashboard and turns widget
/// notifications into toasts.
pub struct DashboardApp {
    dashboard: Dashboard,
    translations: Arc<Translations>,
    notifications: Receiver<Notification>,
    toasts: Toasts,
    toast_log: PathBuf,
    pub enable_toasts: bool,
    pub toast_duration: f32,
}

impl DashboardApp {
    pub fn new(
        dashboard: Dashboard,
        translations: Arc<Translations>,
        notifications: Receiver<Notification>,
        settings: &Settings,
    ) -> Self {
        Self {
            dashboard,
            translations,
            notifications,
            toasts: Toasts::new().anchor(egui::Align2::RIGHT_TOP, [10.0, 10.0]),
            toast_log: PathBuf::from(TOAST_LOG_FILE),
            enable_toasts: settings.enable_toasts,
            toast_duration: settings.toast_duration,
        }
    }

    pub fn with_toast_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.toast_log = path.into();
        self
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    fn push_toast(&mut self, toast: Toast) {
        append_toast_log_to(&self.toast_log, toast.text.text());
        self.toasts.add(toast);
    }

    /// Move pending notifications into the toast queue. Returns how many
    /// were taken.
    pub fn drain_notifications(&mut self) -> usize {
        let pending: Vec<Notification> = self.notifications.try_iter().collect();
        let count = pending.len();
        if !self.enable_toasts {
            for n in pending {
                tracing::info!(kind = ?n.kind, "{}", n.message);
            }
            return count;
        }
        for n in pending {
            let kind = match n.kind {
                NotificationKind::Success => ToastKind::Success,
                NotificationKind::Error => ToastKind::Error,
            };
            let toast = Toast {
                text: n.message.into(),
                kind,
                options: ToastOptions::default().duration_in_seconds(self.toast_duration as f64),
            };
            self.push_toast(toast);
        }
        count
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_notifications();

        let translations = Arc::clone(&self.translations);
        let dash_ctx = DashboardContext {
            translations: &translations,
            now: Instant::now(),
        };
        egui::CentralPanel::default().show(ctx, |ui| {
            for warning in &self.dashboard.warnings {
                ui.colored_label(egui::Color32::YELLOW, warning);
            }
            self.dashboard.ui(ui, &dash_ctx);
        });

        if self.enable_toasts {
            self.toasts.show(ctx);
        }
    }
}
