//! Configuration type definitions

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::defaults::DEFAULT_KEY_TIMEOUT_MS;
use crate::shortcuts::{default_settings_path, Platform, RegistryOptions};

/// Startup configuration.
///
/// Every field is optional; missing values fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Where user shortcuts and the active keybind set are stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<PathBuf>,
    /// Platform override ("mac", "windows", "linux")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Chord continuation timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_timeout_ms: Option<u64>,
}

impl Config {
    pub fn get_settings_path(&self) -> PathBuf {
        self.settings_path
            .clone()
            .unwrap_or_else(default_settings_path)
    }

    /// Configured platform, or the running platform if unset or unknown.
    pub fn get_platform(&self) -> Platform {
        match self.platform.as_deref().map(str::parse::<Platform>) {
            Some(Ok(platform)) => platform,
            Some(Err(e)) => {
                warn!(error = %e, "Ignoring platform override");
                Platform::current()
            }
            None => Platform::current(),
        }
    }

    pub fn get_key_timeout(&self) -> Duration {
        Duration::from_millis(self.key_timeout_ms.unwrap_or(DEFAULT_KEY_TIMEOUT_MS))
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            platform: self.get_platform(),
            key_timeout: self.get_key_timeout(),
        }
    }
}
