use thiserror::Error;
use tracing::{error, warn};

use crate::shortcuts::{PersistenceError, ShortcutParseError};

/// Errors surfaced by the shortcut crate.
#[derive(Error, Debug)]
pub enum ShortcutsError {
    #[error("Invalid shortcut '{input}': {source}")]
    Parse {
        input: String,
        #[source]
        source: ShortcutParseError,
    },

    #[error("Settings persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShortcutsError {
    pub fn parse(input: impl Into<String>, source: ShortcutParseError) -> Self {
        Self::Parse {
            input: input.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShortcutsError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use devtools_shortcuts::error::ResultExt;
///
/// // Keep running if the settings file can't be written
/// settings.save(&path).log_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = %err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = %err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
