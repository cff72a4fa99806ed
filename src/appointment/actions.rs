use super::config::{
    ActionConfig, CHECK_IN_ERROR_MESSAGE, CHECK_IN_SUCCESS_MESSAGE, COMPLETED_ERROR_MESSAGE,
    COMPLETED_SUCCESS_MESSAGE,
};
use super::resource::AppointmentResource;
use crate::grid::{ActionButton, ColumnDescriptor, ConfigError, Renderable};
use crate::i18n::Translations;
use crate::notify::{Notification, Notifier};
use serde_json::Value;
use std::sync::Arc;
use std::thread;

/// Status-changing actions offered on appointment rows. This is the complete
/// handler table: any other name in configuration is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentAction {
    CheckIn,
    Done,
}

impl AppointmentAction {
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "CheckIn" => Ok(Self::CheckIn),
            "Done" => Ok(Self::Done),
            other => Err(ConfigError::UnknownAction(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckIn => "CheckIn",
            Self::Done => "Done",
        }
    }

    /// Status the appointment is moved to.
    pub fn target_status(&self) -> &'static str {
        match self {
            Self::CheckIn => "CheckedIn",
            Self::Done => "Completed",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Self::CheckIn => CHECK_IN_SUCCESS_MESSAGE,
            Self::Done => COMPLETED_SUCCESS_MESSAGE,
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Self::CheckIn => CHECK_IN_ERROR_MESSAGE,
            Self::Done => COMPLETED_ERROR_MESSAGE,
        }
    }
}

pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

/// Runtime collaborators shared by every action cell.
#[derive(Clone)]
pub struct ActionContext {
    pub base_url: String,
    pub resource: Arc<dyn AppointmentResource>,
    pub refresh: RefreshCallback,
    pub notifier: Arc<dyn Notifier>,
    pub translations: Arc<Translations>,
}

impl ActionContext {
    fn message(&self, key: &str) -> String {
        self.translations.translate(key).to_string()
    }
}

/// Build one column per action config. Unknown action names fail here,
/// before anything is drawn.
pub fn build_action_columns(
    configs: &[ActionConfig],
    ctx: &ActionContext,
) -> Result<Vec<ColumnDescriptor>, ConfigError> {
    configs
        .iter()
        .map(|config| {
            let action = AppointmentAction::from_name(&config.name)?;
            let when = config.when.clone();
            let ctx = ctx.clone();
            Ok(ColumnDescriptor::new(
                format!("{}_action", config.name),
                Some("center".into()),
                move |record| {
                    if when.matches(record) {
                        action_button(action, record, &ctx)
                    } else {
                        status_label(record, &ctx)
                    }
                },
            ))
        })
        .collect()
}

fn action_button(action: AppointmentAction, record: &Value, ctx: &ActionContext) -> Renderable {
    let uuid = record
        .get("uuid")
        .and_then(Value::as_str)
        .map(str::to_string);
    let ctx = ctx.clone();
    Renderable::Button(ActionButton::new(
        ctx.translations.translate(action.name()).to_string(),
        move || match &uuid {
            Some(uuid) => spawn_status_change(action, uuid.clone(), ctx.clone()),
            None => {
                tracing::error!(action = action.name(), "appointment has no uuid");
                ctx.notifier
                    .notify(Notification::error(ctx.message(action.error_message())));
            }
        },
    ))
}

fn status_label(record: &Value, ctx: &ActionContext) -> Renderable {
    let status = record.get("status").and_then(Value::as_str).unwrap_or_default();
    Renderable::StatusLabel {
        text: ctx.translations.translate(status).to_string(),
    }
}

fn spawn_status_change(action: AppointmentAction, uuid: String, ctx: ActionContext) {
    thread::spawn(move || run_status_change(action, &uuid, &ctx));
}

/// Issue the status change and report the outcome. Failures stay local to
/// this row: they are logged and notified, never propagated.
pub fn run_status_change(action: AppointmentAction, uuid: &str, ctx: &ActionContext) {
    let result =
        ctx.resource
            .change_appointment_status(uuid, action.target_status(), &ctx.base_url);
    match result {
        Ok(resp) if resp.ok => {
            tracing::info!(action = action.name(), uuid, "appointment status changed");
            ctx.notifier
                .notify(Notification::success(ctx.message(action.success_message())));
            (ctx.refresh)();
        }
        Ok(resp) => {
            ctx.notifier
                .notify(Notification::error(ctx.message(action.error_message())));
            tracing::error!(
                action = action.name(),
                uuid,
                status = resp.status,
                body = ?resp.body,
                "appointment status change rejected"
            );
        }
        Err(err) => {
            ctx.notifier
                .notify(Notification::error(ctx.message(action.error_message())));
            tracing::error!(action = action.name(), uuid, "appointment status change failed: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::config::SourceConfig;
    use crate::appointment::resource::StatusResponse;
    use crate::notify::{ChannelNotifier, NotificationKind};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeResource {
        calls: Mutex<Vec<(String, String, String)>>,
        reject: bool,
    }

    impl AppointmentResource for FakeResource {
        fn get_appointments(
            &self,
            _source: &SourceConfig,
            _provider: Option<&Value>,
        ) -> anyhow::Result<Vec<Value>> {
            Ok(Vec::new())
        }

        fn change_appointment_status(
            &self,
            uuid: &str,
            to_status: &str,
            base_url: &str,
        ) -> anyhow::Result<StatusResponse> {
            self.calls.lock().unwrap().push((
                uuid.to_string(),
                to_status.to_string(),
                base_url.to_string(),
            ));
            Ok(StatusResponse {
                ok: !self.reject,
                status: if self.reject { 400 } else { 200 },
                body: self.reject.then(|| json!({"error": "invalid transition"})),
            })
        }
    }

    struct Harness {
        resource: Arc<FakeResource>,
        refreshes: Arc<AtomicUsize>,
        notifications: std::sync::mpsc::Receiver<Notification>,
        ctx: ActionContext,
    }

    fn harness(reject: bool) -> Harness {
        let resource = Arc::new(FakeResource {
            reject,
            ..Default::default()
        });
        let refreshes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&refreshes);
        let (notifier, notifications) = ChannelNotifier::new();
        let ctx = ActionContext {
            base_url: "http://host/appointments".into(),
            resource: resource.clone(),
            refresh: Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            notifier: Arc::new(notifier),
            translations: Arc::new(Translations::builtin("en")),
        };
        Harness {
            resource,
            refreshes,
            notifications,
            ctx,
        }
    }

    fn check_in_config() -> Vec<ActionConfig> {
        serde_json::from_value(json!([
            {"name": "CheckIn", "when": [{"field": "status", "equals": "Scheduled"}]}
        ]))
        .unwrap()
    }

    #[test]
    fn unknown_action_fails_at_construction() {
        let h = harness(false);
        let configs: Vec<ActionConfig> =
            serde_json::from_value(json!([{"name": "Teleport"}])).unwrap();
        assert_eq!(
            build_action_columns(&configs, &h.ctx).unwrap_err(),
            ConfigError::UnknownAction("Teleport".into())
        );
    }

    #[test]
    fn columns_follow_config_order() {
        let h = harness(false);
        let configs: Vec<ActionConfig> =
            serde_json::from_value(json!([{"name": "Done"}, {"name": "CheckIn"}])).unwrap();
        let columns = build_action_columns(&configs, &h.ctx).unwrap();
        let ids: Vec<_> = columns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["Done_action", "CheckIn_action"]);
        assert!(build_action_columns(&[], &h.ctx).unwrap().is_empty());
    }

    #[test]
    fn non_matching_row_shows_status_label() {
        let h = harness(false);
        let columns = build_action_columns(&check_in_config(), &h.ctx).unwrap();
        let cell = columns[0].render(&json!({"uuid": "a", "status": "CheckedIn"}));
        assert_eq!(
            cell,
            Renderable::StatusLabel {
                text: "Checked In".into()
            }
        );
        assert!(h.resource.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn matching_row_shows_button() {
        let h = harness(false);
        let columns = build_action_columns(&check_in_config(), &h.ctx).unwrap();
        match columns[0].render(&json!({"uuid": "a", "status": "Scheduled"})) {
            Renderable::Button(button) => assert_eq!(button.label, "Check In"),
            other => panic!("expected button, got {other:?}"),
        }
    }

    #[test]
    fn activation_issues_one_call_then_notifies_and_refreshes() {
        let h = harness(false);
        let columns = build_action_columns(&check_in_config(), &h.ctx).unwrap();
        let Renderable::Button(button) =
            columns[0].render(&json!({"uuid": "abc", "status": "Scheduled"}))
        else {
            panic!("expected button");
        };
        button.activate();
        let note = h
            .notifications
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(note, Notification::success("Patient checked in successfully"));
        // refresh runs right after the notification on the same worker
        for _ in 0..100 {
            if h.refreshes.load(Ordering::SeqCst) == 1 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(h.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(
            *h.resource.calls.lock().unwrap(),
            vec![(
                "abc".to_string(),
                "CheckedIn".to_string(),
                "http://host/appointments".to_string()
            )]
        );
    }

    #[test]
    fn rejected_change_notifies_error_without_refresh() {
        let h = harness(true);
        run_status_change(AppointmentAction::Done, "abc", &h.ctx);
        let note = h.notifications.try_recv().unwrap();
        assert_eq!(note.kind, NotificationKind::Error);
        assert_eq!(note.message, "Unable to mark the appointment as completed");
        assert_eq!(h.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(h.resource.calls.lock().unwrap()[0].1, "Completed");
    }

    #[test]
    fn missing_uuid_reports_error() {
        let h = harness(false);
        let columns = build_action_columns(&check_in_config(), &h.ctx).unwrap();
        let Renderable::Button(button) = columns[0].render(&json!({"status": "Scheduled"}))
        else {
            panic!("expected button");
        };
        button.activate();
        assert_eq!(
            h.notifications.try_recv().unwrap().kind,
            NotificationKind::Error
        );
        assert!(h.resource.calls.lock().unwrap().is_empty());
    }
}
