//! Shortcut registry: live bindings rebuilt from user overrides and declared
//! action bindings, plus the user edit and query operations.
//!
//! Bindings are never patched in place. Any change to the active keybind set
//! or to the user shortcut list rebuilds them from scratch.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use super::actions::{ActionRegistry, Handlers};
use super::dispatch::{ChordState, ShortcutListener};
use super::host::{ForwardedKey, HostBridge};
use super::tree::ShortcutTreeNode;
use super::types::{
    parse_descriptors, KeyDescriptor, Platform, Shortcut, ShortcutType, DEVTOOLS_DEFAULT,
};
use crate::config::DEFAULT_KEY_TIMEOUT_MS;
use crate::error::ResultExt;
use crate::settings::{ListenerId, Settings};

/// Actions whose keys the host must forward instead of handling itself.
pub const FORWARDED_ACTIONS: &[&str] = &[
    "main.toggle-dock",
    "debugger.toggle-breakpoints-active",
    "debugger.toggle-pause",
    "quick-open.show-command-menu",
    "console.toggle",
];

/// Actions that stay reachable while a modal dialog is open.
pub const DIALOG_ALLOWED_ACTIONS: &[&str] = &[
    "inspector-main.zoom-in",
    "inspector-main.zoom-out",
    "inspector-main.zoom-reset",
];

/// Construction options for [`ShortcutRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Platform used for binding filtering and titles.
    pub platform: Platform,
    /// How long to wait for the next key of a chord.
    pub key_timeout: Duration,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            key_timeout: Duration::from_millis(DEFAULT_KEY_TIMEOUT_MS),
        }
    }
}

/// A key sequence bound to more than one action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortcutConflict {
    pub descriptors: Vec<KeyDescriptor>,
    /// Bound actions in registration order.
    pub actions: Vec<String>,
}

/// Live binding state, replaced as a unit on every rebuild.
#[derive(Default)]
pub(super) struct Bindings {
    pub(super) action_to_shortcut: HashMap<String, Vec<Shortcut>>,
    pub(super) key_map: ShortcutTreeNode,
    disabled_defaults: HashMap<String, Vec<Shortcut>>,
    devtools_default_actions: HashSet<String>,
}

impl Bindings {
    fn clear(&mut self) {
        self.action_to_shortcut.clear();
        self.key_map.clear();
        self.disabled_defaults.clear();
        self.devtools_default_actions.clear();
    }

    fn register_shortcut(&mut self, shortcut: Shortcut) {
        self.key_map
            .add_key_mapping(&shortcut.descriptors, &shortcut.action);
        self.action_to_shortcut
            .entry(shortcut.action.clone())
            .or_default()
            .push(shortcut);
    }

    fn is_disabled_default(&self, descriptors: &[KeyDescriptor], action: &str) -> bool {
        self.disabled_defaults
            .get(action)
            .is_some_and(|list| list.iter().any(|d| d.descriptors_match(descriptors)))
    }
}

pub(super) struct Inner {
    pub(super) actions: Arc<dyn ActionRegistry>,
    pub(super) settings: Settings,
    pub(super) host: Arc<dyn HostBridge>,
    pub(super) options: RegistryOptions,
    pub(super) bindings: RwLock<Bindings>,
    pub(super) chord: Mutex<ChordState>,
    /// Serializes key dispatch and prefix timeouts.
    pub(super) dispatch: tokio::sync::Mutex<()>,
    pub(super) modal_dialog_shown: AtomicBool,
    subscriptions: Mutex<Vec<Subscription>>,
}

enum Subscription {
    KeybindSet(ListenerId),
    UserShortcuts(ListenerId),
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.chord.get_mut().cancel();
        for subscription in self.subscriptions.get_mut().drain(..) {
            match subscription {
                Subscription::KeybindSet(id) => {
                    self.settings.active_keybind_set.remove_change_listener(id);
                }
                Subscription::UserShortcuts(id) => {
                    self.settings.user_shortcuts.remove_change_listener(id);
                }
            }
        }
    }
}

impl Inner {
    fn register_bindings(&self) {
        let keybind_set = self.settings.active_keybind_set.get();
        let user_shortcuts = self.settings.user_shortcuts.get();
        let platform = self.options.platform;
        let mut forwarded_keys: Vec<ForwardedKey> = Vec::new();

        let mut bindings = self.bindings.write();
        bindings.clear();

        // User overrides first so a disable or rebind always wins over defaults.
        for shortcut in user_shortcuts {
            if shortcut.shortcut_type == ShortcutType::DisabledDefault {
                bindings
                    .disabled_defaults
                    .entry(shortcut.action.clone())
                    .or_default()
                    .push(shortcut);
                continue;
            }
            if !self.is_registrable(&shortcut.action, shortcut.descriptors.is_empty()) {
                continue;
            }
            if is_forwarded(&shortcut.action) {
                forwarded_keys.extend(shortcut.descriptors.iter().copied().map(ForwardedKey::from));
            }
            bindings.register_shortcut(shortcut);
        }

        for extension in self.actions.action_extensions() {
            let action = extension.id.as_str();
            for binding in &extension.bindings {
                let keybind_sets = binding.keybind_sets.as_deref();
                if !platform.matches(binding.platform.as_deref())
                    || !keybind_sets_match(keybind_sets, &keybind_set)
                {
                    continue;
                }

                let descriptors = match parse_descriptors(&binding.shortcut, platform) {
                    Ok(descriptors) => descriptors,
                    Err(error) => {
                        warn!(
                            action = action,
                            shortcut = %binding.shortcut,
                            error = %error,
                            "Skipping unparsable binding"
                        );
                        continue;
                    }
                };
                if !self.is_registrable(action, false) {
                    continue;
                }

                if bindings.is_disabled_default(&descriptors, action) {
                    bindings.devtools_default_actions.insert(action.to_string());
                    continue;
                }

                if is_forwarded(action) {
                    forwarded_keys.extend(descriptors.iter().copied().map(ForwardedKey::from));
                }

                let shortcut = match keybind_sets {
                    None => {
                        bindings.devtools_default_actions.insert(action.to_string());
                        Shortcut {
                            action: action.to_string(),
                            descriptors,
                            shortcut_type: ShortcutType::DefaultShortcut,
                            keybind_sets: Default::default(),
                        }
                    }
                    Some(sets) => {
                        if sets.iter().any(|s| s == DEVTOOLS_DEFAULT) {
                            bindings.devtools_default_actions.insert(action.to_string());
                        }
                        Shortcut {
                            action: action.to_string(),
                            descriptors,
                            shortcut_type: ShortcutType::KeybindSetShortcut,
                            keybind_sets: sets.iter().cloned().collect(),
                        }
                    }
                };
                bindings.register_shortcut(shortcut);
            }
        }

        debug!(
            event_type = "bindings_rebuilt",
            keybind_set = %keybind_set,
            actions = bindings.action_to_shortcut.len(),
            forwarded = forwarded_keys.len(),
            "Shortcut bindings rebuilt"
        );
        drop(bindings);

        if let Some(json) = serde_json::to_string(&forwarded_keys).log_err() {
            self.host.set_whitelisted_shortcuts(&json);
        }
    }

    fn is_registrable(&self, action: &str, empty: bool) -> bool {
        if empty {
            debug!(action = action, "Skipping shortcut without keys");
            return false;
        }
        if !self.actions.has_action(action) {
            debug!(action = action, "Skipping shortcut for unknown action");
            return false;
        }
        true
    }
}

fn is_forwarded(action: &str) -> bool {
    FORWARDED_ACTIONS.contains(&action)
}

fn keybind_sets_match(keybind_sets: Option<&[String]>, active: &str) -> bool {
    keybind_sets.map_or(true, |sets| sets.iter().any(|s| s == active))
}

/// Resolves key presses to actions.
///
/// Cloning is cheap; clones share state. Settings listeners hold only a weak
/// reference, so dropping the last handle unsubscribes and cancels any
/// pending chord timer.
#[derive(Clone)]
pub struct ShortcutRegistry {
    pub(super) inner: Arc<Inner>,
}

impl ShortcutRegistry {
    /// Build the registry and its initial bindings, then follow changes to
    /// the keybind-set and user-shortcut settings.
    ///
    /// Construction itself needs no runtime, but key dispatch does: arming a
    /// chord prefix spawns its timeout on the current Tokio runtime.
    pub fn new(
        actions: Arc<dyn ActionRegistry>,
        settings: Settings,
        host: Arc<dyn HostBridge>,
        options: RegistryOptions,
    ) -> Self {
        let inner = Arc::new(Inner {
            actions,
            settings,
            host,
            options,
            bindings: RwLock::new(Bindings::default()),
            chord: Mutex::new(ChordState::default()),
            dispatch: tokio::sync::Mutex::new(()),
            modal_dialog_shown: AtomicBool::new(false),
            subscriptions: Mutex::new(Vec::new()),
        });

        let weak = Arc::downgrade(&inner);
        let keybind_set_listener = inner
            .settings
            .active_keybind_set
            .add_change_listener(rebuild_on_change(weak.clone()));
        let user_shortcuts_listener = inner
            .settings
            .user_shortcuts
            .add_change_listener(rebuild_on_change(weak));
        inner.subscriptions.lock().extend([
            Subscription::KeybindSet(keybind_set_listener),
            Subscription::UserShortcuts(user_shortcuts_listener),
        ]);

        inner.register_bindings();
        Self { inner }
    }

    pub fn platform(&self) -> Platform {
        self.inner.options.platform
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Rebuild all bindings now. Settings changes do this automatically.
    pub fn register_bindings(&self) {
        self.inner.register_bindings();
    }

    /// Add a user shortcut.
    ///
    /// Re-enables a matching disabled default instead of storing a copy, and
    /// ignores a shortcut the action already has.
    pub fn register_user_shortcut(&self, shortcut: Shortcut) {
        let keybind_set = self.inner.settings.active_keybind_set.get();
        let (disabled_default, duplicate) = {
            let bindings = self.inner.bindings.read();
            let matches = |other: &&Shortcut| {
                other.descriptors_match(&shortcut.descriptors) && other.has_keybind_set(&keybind_set)
            };
            let disabled_default = bindings
                .disabled_defaults
                .get(&shortcut.action)
                .and_then(|list| list.iter().find(matches).cloned());
            let duplicate = bindings
                .action_to_shortcut
                .get(&shortcut.action)
                .is_some_and(|list| list.iter().any(|s| matches(&s)));
            (disabled_default, duplicate)
        };

        if let Some(disabled_default) = disabled_default {
            debug!(action = %shortcut.action, "Re-enabling disabled default shortcut");
            self.remove_shortcut(&disabled_default);
            return;
        }
        if duplicate {
            debug!(action = %shortcut.action, "Ignoring duplicate user shortcut");
            return;
        }
        self.add_shortcut_to_setting(shortcut);
    }

    /// Remove a shortcut. Defaults are disabled, user shortcuts are deleted.
    pub fn remove_shortcut(&self, shortcut: &Shortcut) {
        if shortcut.shortcut_type.is_default() {
            self.add_shortcut_to_setting(shortcut.change_type(ShortcutType::DisabledDefault));
        } else {
            self.remove_shortcut_from_setting(shortcut);
        }
    }

    fn add_shortcut_to_setting(&self, shortcut: Shortcut) {
        let setting = &self.inner.settings.user_shortcuts;
        let mut user_shortcuts = setting.get();
        user_shortcuts.push(shortcut);
        setting.set(user_shortcuts);
    }

    fn remove_shortcut_from_setting(&self, shortcut: &Shortcut) {
        let setting = &self.inner.settings.user_shortcuts;
        let mut user_shortcuts = setting.get();
        if let Some(index) = user_shortcuts.iter().position(|s| shortcut.equals(s)) {
            user_shortcuts.remove(index);
            setting.set(user_shortcuts);
        }
    }

    pub fn shortcuts_for_action(&self, action: &str) -> Vec<Shortcut> {
        self.inner
            .bindings
            .read()
            .action_to_shortcut
            .get(action)
            .cloned()
            .unwrap_or_default()
    }

    /// Every key of every chord bound to `action`, in binding order.
    pub fn keys_for_action(&self, action: &str) -> Vec<KeyDescriptor> {
        self.shortcuts_for_action(action)
            .iter()
            .flat_map(|s| s.descriptors.iter().copied())
            .collect()
    }

    /// Title of the first shortcut bound to `action`.
    pub fn shortcut_title_for_action(&self, action: &str) -> Option<String> {
        let bindings = self.inner.bindings.read();
        bindings
            .action_to_shortcut
            .get(action)
            .and_then(|list| list.first())
            .map(|s| s.title(self.inner.options.platform))
    }

    pub fn action_has_default_shortcut(&self, action: &str) -> bool {
        self.inner
            .bindings
            .read()
            .devtools_default_actions
            .contains(action)
    }

    pub fn disabled_defaults_for_action(&self, action: &str) -> Vec<Shortcut> {
        self.inner
            .bindings
            .read()
            .disabled_defaults
            .get(action)
            .cloned()
            .unwrap_or_default()
    }

    /// First keys that currently lead somewhere: an applicable action or a
    /// longer chord.
    pub fn global_shortcut_keys(&self) -> Vec<KeyDescriptor> {
        let candidates: Vec<(KeyDescriptor, Vec<String>, bool)> = {
            let bindings = self.inner.bindings.read();
            bindings
                .key_map
                .chords()
                .filter_map(|node| {
                    node.key()
                        .map(|key| (key, node.actions().to_vec(), node.has_chords()))
                })
                .collect()
        };
        candidates
            .into_iter()
            .filter(|(_, actions, has_chords)| {
                *has_chords || !self.inner.actions.applicable_actions(actions).is_empty()
            })
            .map(|(key, _, _)| key)
            .collect()
    }

    /// Actions bound to exactly `descriptors`.
    pub fn actions_for_descriptors(&self, descriptors: &[KeyDescriptor]) -> Vec<String> {
        if descriptors.is_empty() {
            return Vec::new();
        }
        self.inner
            .bindings
            .read()
            .key_map
            .node_for_sequence(descriptors)
            .map(|node| node.actions().to_vec())
            .unwrap_or_default()
    }

    /// Key sequences bound to more than one distinct action.
    pub fn conflicts(&self) -> Vec<ShortcutConflict> {
        fn walk(node: &ShortcutTreeNode, path: &mut Vec<KeyDescriptor>, out: &mut Vec<ShortcutConflict>) {
            let mut actions: Vec<String> = Vec::new();
            for action in node.actions() {
                if !actions.contains(action) {
                    actions.push(action.clone());
                }
            }
            if actions.len() > 1 {
                out.push(ShortcutConflict {
                    descriptors: path.clone(),
                    actions,
                });
            }
            for child in node.chords() {
                if let Some(key) = child.key() {
                    path.push(key);
                    walk(child, path, out);
                    path.pop();
                }
            }
        }

        let bindings = self.inner.bindings.read();
        let mut conflicts = Vec::new();
        walk(&bindings.key_map, &mut Vec::new(), &mut conflicts);
        conflicts
    }

    /// Tell the registry whether a modal dialog is open. While one is, only
    /// [`DIALOG_ALLOWED_ACTIONS`] run outside a chord.
    pub fn set_modal_dialog_shown(&self, shown: bool) {
        self.inner.modal_dialog_shown.store(shown, Ordering::Relaxed);
    }

    /// Listener that dispatches key-downs with `handlers`.
    pub fn add_shortcut_listener(&self, handlers: Handlers) -> ShortcutListener {
        ShortcutListener::new(self.clone(), handlers)
    }
}

fn rebuild_on_change<T>(inner: Weak<Inner>) -> impl Fn(&T) + Send + Sync + 'static {
    move |_| {
        if let Some(inner) = inner.upgrade() {
            inner.register_bindings();
        }
    }
}
