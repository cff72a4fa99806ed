//! Appointment list widget: configuration, remote resource, row actions and
//! the fetch/refresh cycle.

pub mod actions;
pub mod config;
pub mod cycle;
pub mod resource;
pub mod widget;

pub use actions::{build_action_columns, ActionContext, AppointmentAction};
pub use config::{ActionConfig, AppointmentConfig, SourceConfig};
pub use cycle::{LoadingStatus, RefreshCycle, RefreshTimer};
pub use resource::{AppointmentResource, HttpAppointmentResource, StatusResponse};
pub use widget::AppointmentWidget;
