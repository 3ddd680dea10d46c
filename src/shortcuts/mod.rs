//! Keyboard shortcut resolution.
//!
//! This module provides:
//! - Key descriptors and binding-string parsing with platform-aware display
//! - A chord trie mapping key sequences to action ids
//! - A registry rebuilt from user overrides and declared action bindings,
//!   filtered by platform and active keybind set
//! - A chord state machine that turns key-downs into action executions
//!
//! # Example
//!
//! ```ignore
//! use devtools_shortcuts::shortcuts::{Handlers, KeyEvent, Modifiers, ShortcutRegistry};
//!
//! let registry = ShortcutRegistry::new(actions, settings, host, Default::default());
//! let handlers = Handlers::new().on("foo.bar", || async { true });
//!
//! let mut event = KeyEvent::new("k", Modifiers::CTRL);
//! registry.handle_shortcut(&mut event, Some(&handlers)).await;
//! ```

mod actions;
mod dispatch;
mod event;
mod host;
pub mod keys;
mod persistence;
mod registry;
mod tree;
mod types;



#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod dispatch_tests;

pub use actions::{
    Action, ActionExtension, ActionRegistry, Binding, Handler, Handlers, StaticAction,
    StaticActionRegistry,
};
pub use dispatch::{KeyDisposition, ShortcutListener};
pub use event::KeyEvent;
pub use host::{ForwardedKey, HostBridge, NoopHost, RecordingHost};
pub use persistence::{default_settings_path, PersistenceError, ShortcutSettingsFile};
pub use registry::{
    RegistryOptions, ShortcutConflict, ShortcutRegistry, DIALOG_ALLOWED_ACTIONS,
    FORWARDED_ACTIONS,
};
pub use tree::ShortcutTreeNode;
pub use types::{
    parse_descriptors, Descriptors, KeyDescriptor, Modifiers, Platform, Shortcut,
    ShortcutParseError, ShortcutType, DEVTOOLS_DEFAULT, VS_CODE,
};
