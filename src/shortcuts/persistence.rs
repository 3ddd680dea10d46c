//! User shortcut settings persistence.
//!
//! Handles loading and saving the shortcut settings file. Format:
//! ```json
//! {
//!   "activeKeybindSet": "vsCode",
//!   "userShortcuts": [
//!     {"action": "console.toggle", "descriptors": [{"keyCode": 75, "modifiers": 2}], "type": "UserShortcut"},
//!     {"action": "main.toggle-dock", "descriptors": [{"keyCode": 68, "modifiers": 10}], "type": "DisabledDefault"}
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::{Shortcut, DEVTOOLS_DEFAULT};

fn default_keybind_set() -> String {
    DEVTOOLS_DEFAULT.to_string()
}

/// On-disk shape of the shortcut settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortcutSettingsFile {
    #[serde(default = "default_keybind_set")]
    pub active_keybind_set: String,
    /// Ordered user overrides; order decides registration order.
    #[serde(default)]
    pub user_shortcuts: Vec<Shortcut>,
}

impl Default for ShortcutSettingsFile {
    fn default() -> Self {
        Self {
            active_keybind_set: default_keybind_set(),
            user_shortcuts: Vec::new(),
        }
    }
}

/// Error that can occur when loading/saving shortcut settings.
#[derive(Debug)]
pub enum PersistenceError {
    /// IO error reading/writing file
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// JSON parse error
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "IO error on {}: {}", path.display(), source),
            Self::Json { path, source } => {
                write!(f, "JSON error in {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl ShortcutSettingsFile {
    /// Load settings from a JSON file.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| PersistenceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(|source| PersistenceError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).map_err(io_err)
    }
}

/// Get the default path for the shortcut settings file.
pub fn default_settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".devtools-shortcuts")
        .join("shortcuts.json")
}
