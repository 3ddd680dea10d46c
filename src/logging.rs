//! Structured JSONL logging plus human-readable stderr output.
//!
//! This module provides dual-output logging:
//! - **JSONL to file** (~/.devtools-shortcuts/logs/devtools-shortcuts.jsonl) - structured for tooling
//! - **Pretty to stderr** - human-readable for developers
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the binary.
//!
//! # Usage
//!
//! ```rust,ignore
//! use devtools_shortcuts::logging;
//!
//! // Initialize logging - MUST keep guard alive for duration of program
//! let _guard = logging::init();
//!
//! tracing::info!(event_type = "shortcut_fired", action = "console.toggle", "Keyboard shortcut fired");
//! ```

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "devtools-shortcuts.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
/// If the log file can't be opened only the stderr layer is active.
pub fn init() -> LoggingGuard {
    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }
    let log_path = log_path();

    // Environment filter - default to info, allow override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file {}: {}", log_path.display(), e);
            None
        }
    };

    let file_logging = file.is_some();
    let (subscriber, file_guard) = build_subscriber(env_filter, file);
    subscriber.init();

    tracing::debug!(
        event_type = "app_lifecycle",
        action = "started",
        file_logging = file_logging,
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Compose the filter, the optional JSONL file layer and the stderr layer.
fn build_subscriber(
    env_filter: EnvFilter,
    file: Option<File>,
) -> (impl Subscriber + Send + Sync + 'static, Option<WorkerGuard>) {
    // JSONL layer for file output, absent when the file can't be opened
    let (json_layer, file_guard) = match file {
        Some(file) => {
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .with_span_events(FmtSpan::NONE);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Pretty layer for stderr (human developers)
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer);
    (subscriber, file_guard)
}

/// Get the log directory path (~/.devtools-shortcuts/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".devtools-shortcuts").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("devtools-shortcuts-logs"))
}

/// Get the path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join(LOG_FILE_NAME)
}

/// Log a consumed key-down with structured fields
pub fn log_key_event(key: &str, dom_key: &str, action: &str) {
    tracing::debug!(
        event_type = "key_event",
        key = key,
        dom_key = dom_key,
        action = action,
        "Key {} {}",
        action,
        key
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_layer_writes_jsonl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOG_FILE_NAME);
        let file = OpenOptions::new().create(true).append(true).open(&path).unwrap();

        let (subscriber, guard) = build_subscriber(EnvFilter::new("debug"), Some(file));
        assert!(guard.is_some());
        tracing::subscriber::with_default(subscriber, || {
            log_key_event("Ctrl+K", "k", "dispatch");
        });
        drop(guard);

        let content = fs::read_to_string(&path).unwrap();
        let line = content.lines().next().expect("one JSON line");
        let json: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(json["fields"]["event_type"], "key_event");
        assert_eq!(json["fields"]["dom_key"], "k");
    }

    #[test]
    fn stderr_only_without_file() {
        let (subscriber, guard) = build_subscriber(EnvFilter::new("info"), None);
        assert!(guard.is_none());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(event_type = "test", "stderr only");
        });
    }

    #[test]
    fn log_path_is_under_log_dir() {
        let path = log_path();
        assert!(path.ends_with(LOG_FILE_NAME));
        assert_eq!(path.parent(), Some(get_log_dir().as_path()));
    }
}
