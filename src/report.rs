//! Failure reporting: durable error report files and operator alerts.
//!
//! A failed run leaves an `error_report_<YYYYmmdd_HHMMSS>.txt` file in the
//! logs directory with the timestamp, the error, the run parameters and any
//! triage findings. When a recipient is configured, the run also sends an
//! alert through a [`Notifier`] on success and on failure. Delivery is the
//! front-end's business; failures to deliver are logged and otherwise
//! ignored.

use crate::config::ConversionConfig;
use crate::error::ConversionError;
use crate::output::ConversionIssue;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Boxed error returned by notifier implementations.
pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

/// Delivers a short alert (email, chat, …) to a recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// A [`Notifier`] that only writes the alert to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(recipient, subject, "{}", body);
        Ok(())
    }
}

/// Send an alert if both a notifier and a recipient are configured.
pub(crate) async fn send_alert(config: &ConversionConfig, subject: &str, body: &str) {
    let (Some(notifier), Some(recipient)) = (&config.notifier, &config.notify_recipient) else {
        return;
    };
    if let Err(e) = notifier.notify(recipient, subject, body).await {
        warn!("Failed to notify {}: {}", recipient, e);
    }
}

/// Render the text of an error report.
pub fn render_error_report(
    at: DateTime<Utc>,
    error: &ConversionError,
    input_folder: &Path,
    output_path: &Path,
    config: &ConversionConfig,
    issues: &[ConversionIssue],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Timestamp: {}", at.to_rfc3339());
    let _ = writeln!(out, "Error kind: {}", error.kind());
    let _ = writeln!(out, "Error: {error}");
    if let Some(path) = error.path() {
        let _ = writeln!(out, "File: {}", path.display());
    }
    let _ = writeln!(out, "Input folder: {}", input_folder.display());
    let _ = writeln!(out, "Output: {}", output_path.display());
    let _ = writeln!(out, "Parameters: {}", config.summary());

    if issues.is_empty() {
        let _ = writeln!(out, "Triage issues: none");
    } else {
        let _ = writeln!(out, "Triage issues ({}):", issues.len());
        for issue in issues {
            let _ = writeln!(out, "  - {issue}");
        }
    }
    out
}

/// Write an error report into `logs_dir` and return its path.
///
/// Reports written within the same second share a file and are appended.
pub fn write_error_report(
    logs_dir: &Path,
    error: &ConversionError,
    input_folder: &Path,
    output_path: &Path,
    config: &ConversionConfig,
    issues: &[ConversionIssue],
) -> std::io::Result<PathBuf> {
    let now = Utc::now();
    std::fs::create_dir_all(logs_dir)?;
    let path = logs_dir.join(format!("error_report_{}.txt", now.format("%Y%m%d_%H%M%S")));

    let text = render_error_report(now, error, input_folder, output_path, config, issues);
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    file.write_all(text.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(path)
}
