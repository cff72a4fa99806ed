pub mod appointment;
pub mod dashboard;
pub mod grid;
pub mod gui;
pub mod i18n;
pub mod logging;
pub mod notify;
pub mod settings;
pub mod toast_log;
