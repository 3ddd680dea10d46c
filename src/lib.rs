//! DevTools keyboard shortcuts - chord-aware shortcut resolution
//!
//! This library resolves key presses to front-end actions: multi-key chords,
//! per-platform and per-keybind-set default bindings, and user overrides
//! persisted as JSON.

pub mod config;
pub mod error;
pub mod logging;
pub mod settings;
pub mod shortcuts;
