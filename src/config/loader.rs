//! Configuration loading from file system

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::defaults::{DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE};
use super::types::Config;

/// Get the default config path (~/.devtools-shortcuts/config.json)
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(DEFAULT_CONFIG_DIR)
        .join(DEFAULT_CONFIG_FILE)
}

/// Load configuration from ~/.devtools-shortcuts/config.json
///
/// Returns Config::default() if any step fails.
pub fn load_config() -> Config {
    load_config_from(&default_config_path())
}

/// Load configuration from `path`, falling back to defaults on any failure.
#[instrument(name = "load_config")]
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to read config, using defaults");
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(config) => {
            info!(path = %path.display(), "Successfully loaded config");
            config
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %path.display(),
                "Failed to parse config JSON, using defaults"
            );
            Config::default()
        }
    }
}
