//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// How long the registry waits for the next key of a chord (ms)
pub const DEFAULT_KEY_TIMEOUT_MS: u64 = 1000;

/// Config file location, relative to the home directory
pub const DEFAULT_CONFIG_DIR: &str = ".devtools-shortcuts";
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
