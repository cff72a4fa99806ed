use super::actions::{build_action_columns, ActionContext, RefreshCallback};
use super::config::{AppointmentConfig, NO_DATA_TEXT};
use super::cycle::{CycleSettings, FetchTicket, LoadingStatus, RefreshCycle, RefreshTimer};
use super::resource::AppointmentResource;
use crate::dashboard::{DashboardContext, Widget, WidgetEnv, WidgetShell};
use crate::grid::{build_columns, ColumnDescriptor, ConfigError, GridView};
use eframe::egui;
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

type FetchOutcome = (FetchTicket, anyhow::Result<Vec<Value>>);

/// Dashboard widget listing appointments with per-row status actions.
pub struct AppointmentWidget {
    cfg: AppointmentConfig,
    resource: Arc<dyn AppointmentResource>,
    columns: Vec<ColumnDescriptor>,
    cycle: RefreshCycle,
    results_tx: Sender<FetchOutcome>,
    results_rx: Receiver<FetchOutcome>,
    refresh_rx: Receiver<()>,
    repaint: Arc<OnceCell<egui::Context>>,
}

impl AppointmentWidget {
    /// Validate the configuration and build every column. Any configuration
    /// defect is reported here, before the first frame.
    pub fn try_new(cfg: AppointmentConfig, env: &WidgetEnv) -> Result<Self, ConfigError> {
        let (refresh_tx, refresh_rx) = channel();
        let repaint: Arc<OnceCell<egui::Context>> = Arc::new(OnceCell::new());
        let refresh: RefreshCallback = {
            let repaint = Arc::clone(&repaint);
            Arc::new(move || {
                let _ = refresh_tx.send(());
                if let Some(ctx) = repaint.get() {
                    ctx.request_repaint();
                }
            })
        };

        let action_ctx = ActionContext {
            base_url: cfg.source.url.clone(),
            resource: Arc::clone(&env.resource),
            refresh,
            notifier: Arc::clone(&env.notifier),
            translations: Arc::clone(&env.translations),
        };
        let mut columns = build_columns(&cfg.column_configs()?)?;
        columns.extend(build_action_columns(&cfg.actions, &action_ctx)?);

        let cycle = RefreshCycle::new(CycleSettings {
            interval: cfg.refresh_interval(),
            filters: cfg.source.filters.clone(),
            sort_by: cfg.sort_key()?,
        });
        let (results_tx, results_rx) = channel();
        Ok(Self {
            cfg,
            resource: Arc::clone(&env.resource),
            columns,
            cycle,
            results_tx,
            results_rx,
            refresh_rx,
            repaint,
        })
    }

    pub fn status(&self) -> LoadingStatus {
        self.cycle.status()
    }

    pub fn rows(&self) -> &[Value] {
        self.cycle.rows()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn cycle(&self) -> &RefreshCycle {
        &self.cycle
    }

    /// Advance the cycle: mount on first call, apply settled fetches,
    /// honour queued refreshes and the refresh timer.
    pub fn pump(&mut self, now: Instant) {
        if let Some(ticket) = self.cycle.mount() {
            self.spawn_fetch(ticket);
        }
        while let Ok((ticket, result)) = self.results_rx.try_recv() {
            if let Some(next) = self.cycle.complete(ticket, result, now) {
                self.spawn_fetch(next);
            }
        }
        while self.refresh_rx.try_recv().is_ok() {
            self.refresh();
        }
        if let Some(ticket) = self.cycle.poll_timer(now) {
            self.spawn_fetch(ticket);
        }
    }

    pub fn refresh(&mut self) {
        if let Some(ticket) = self.cycle.request_refresh() {
            self.spawn_fetch(ticket);
        }
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        tracing::debug!(?ticket, url = %self.cfg.source.url, "fetching appointments");
        let resource = Arc::clone(&self.resource);
        let source = self.cfg.source.clone();
        let provider = self.cfg.provider.clone();
        let tx = self.results_tx.clone();
        let repaint = Arc::clone(&self.repaint);
        thread::spawn(move || {
            let result = resource.get_appointments(&source, provider.as_ref());
            if tx.send((ticket, result)).is_err() {
                tracing::debug!("appointment widget dropped before fetch settled");
                return;
            }
            if let Some(ctx) = repaint.get() {
                ctx.request_repaint();
            }
        });
    }
}

impl Widget for AppointmentWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) {
        self.repaint.get_or_init(|| ui.ctx().clone());
        self.pump(ctx.now);
        if let RefreshTimer::Armed { due, .. } = self.cycle.timer() {
            ui.ctx()
                .request_repaint_after(due.saturating_duration_since(ctx.now));
        }

        let tr = ctx.translations;
        match self.cycle.status() {
            LoadingStatus::Loading => {
                ui.label(format!("{}...", tr.translate("Loading")));
            }
            LoadingStatus::Failed => {
                ui.colored_label(
                    egui::Color32::RED,
                    tr.translate("Unable to load appointments"),
                );
                if ui.small_button(tr.translate("Refresh")).clicked() {
                    self.refresh();
                }
            }
            LoadingStatus::Loaded => {
                let grid_id = format!("appointments-{}", self.cfg.title);
                let response = WidgetShell::new(tr.translate(&self.cfg.title))
                    .icon("📅")
                    .total_count(self.cycle.rows().len())
                    .refresh_button(tr.translate("Refresh"))
                    .view_all(&self.cfg.view_all, tr.translate("View All"))
                    .show(ui, |ui| {
                        GridView::new(&grid_id, self.cycle.rows(), &self.columns)
                            .no_data_text(tr.translate(NO_DATA_TEXT))
                            .show(ui)
                    });
                if response.inner.activated > 0 {
                    tracing::debug!(count = response.inner.activated, "appointment actions activated");
                }
                if response.refresh_clicked {
                    self.refresh();
                }
            }
        }
    }
}
