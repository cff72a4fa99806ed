use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub const TOAST_LOG_FILE: &str = "toast.log";

pub fn append_toast_log(msg: &str) {
    append_toast_log_to(TOAST_LOG_FILE, msg);
}

/// Append `msg` to the log at `path`, prefixed with an RFC 3339 timestamp.
pub fn append_toast_log_to(path: impl AsRef<Path>, msg: &str) {
    match OpenOptions::new().create(true).append(true).open(path.as_ref()) {
        Ok(mut file) => {
            let _ = writeln!(file, "{} - {}", Local::now().to_rfc3339(), msg);
        }
        Err(err) => {
            tracing::warn!(path = %path.as_ref().display(), "cannot append toast log: {err}");
        }
    }
}
