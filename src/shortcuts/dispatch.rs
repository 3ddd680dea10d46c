//! Runtime key handling: the chord state machine.
//!
//! The registry is either idle or waiting for the next key of a chord. A key
//! whose trie node has continuations arms a timer; if it fires before another
//! key arrives, the first key is resolved on its own.
//!
//! Key-downs and timer expiries are serialized through one fair async mutex,
//! so a key pressed while an earlier action is still running waits for it.
//! Handlers must not dispatch keys on the same registry.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::actions::{Action, Handlers};
use super::event::KeyEvent;
use super::registry::{Inner, ShortcutRegistry, DIALOG_ALLOWED_ACTIONS};
use super::types::{KeyDescriptor, Modifiers, Platform};
use crate::logging;

/// What happened to a key-down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Not a shortcut; the event was left for ordinary input handling.
    Ignored,
    /// Consumed but dropped because a modal dialog is open.
    Blocked,
    /// Consumed; waiting for the next key of a chord.
    AwaitingChord,
    /// Consumed; an action reported it handled the key.
    Handled,
    /// Consumed; no candidate action handled the key.
    Unhandled,
}

struct PendingPrefix {
    key: KeyDescriptor,
    handlers: Option<Handlers>,
    timer: JoinHandle<()>,
    generation: u64,
}

/// Chord progress. `pending` is set only while a prefix timer is armed.
#[derive(Default)]
pub(super) struct ChordState {
    pending: Option<PendingPrefix>,
    generation: u64,
}

impl ChordState {
    /// Drop the pending prefix and stop its timer.
    pub(super) fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.timer.abort();
                true
            }
            None => false,
        }
    }
}

impl Inner {
    /// Candidate actions for `key`, continuing from `prefix` when mid-chord.
    ///
    /// Registry-applicable actions come first, then actions the registry
    /// filtered out but the caller supplied a handler for.
    fn applicable_actions(
        &self,
        key: KeyDescriptor,
        handlers: Option<&Handlers>,
        prefix: Option<KeyDescriptor>,
    ) -> Vec<Arc<dyn Action>> {
        let ids: Vec<String> = {
            let bindings = self.bindings.read();
            let node = match prefix {
                Some(prefix) => bindings
                    .key_map
                    .get_node(&prefix)
                    .and_then(|n| n.get_node(&key)),
                None => bindings.key_map.get_node(&key),
            };
            node.map(|n| n.actions().to_vec()).unwrap_or_default()
        };

        let mut applicable = self.actions.applicable_actions(&ids);
        if let Some(handlers) = handlers {
            for id in &ids {
                if !handlers.contains(id) || applicable.iter().any(|a| a.id() == id) {
                    continue;
                }
                if let Some(action) = self.actions.action(id) {
                    applicable.push(action);
                }
            }
        }
        applicable
    }

    /// Run candidates in order until one reports it handled the key.
    async fn maybe_execute_action_for_key(
        &self,
        key: KeyDescriptor,
        handlers: Option<&Handlers>,
        prefix: Option<KeyDescriptor>,
    ) -> bool {
        let actions = self.applicable_actions(key, handlers, prefix);
        self.execute_first_handled(actions, handlers).await
    }

    async fn execute_first_handled(
        &self,
        actions: Vec<Arc<dyn Action>>,
        handlers: Option<&Handlers>,
    ) -> bool {
        for action in actions {
            let handled = match handlers.and_then(|h| h.get(action.id())) {
                Some(handler) => handler().await,
                None => action.execute().await,
            };
            if handled {
                self.host.keyboard_shortcut_fired(action.id());
                info!(
                    event_type = "shortcut_fired",
                    action = action.id(),
                    "Keyboard shortcut fired"
                );
                return true;
            }
        }
        false
    }

    /// Timer expiry: resolve the pending prefix key on its own.
    async fn consume_prefix(&self, generation: u64) {
        let _dispatch = self.dispatch.lock().await;
        let pending = {
            let mut chord = self.chord.lock();
            let current = chord
                .pending
                .as_ref()
                .is_some_and(|p| p.generation == generation);
            if current {
                chord.pending.take()
            } else {
                None
            }
        };
        let Some(pending) = pending else {
            return;
        };
        debug!(
            event_type = "chord_timeout",
            key = %pending.key.display_for_platform(self.options.platform),
            "Chord timed out, resolving prefix alone"
        );
        self.maybe_execute_action_for_key(pending.key, pending.handlers.as_ref(), None)
            .await;
    }

    fn arm_prefix(self: &Arc<Self>, key: KeyDescriptor, handlers: Option<&Handlers>) {
        let mut chord = self.chord.lock();
        chord.cancel();
        chord.generation += 1;
        let generation = chord.generation;

        let weak: Weak<Inner> = Arc::downgrade(self);
        let timeout = self.options.key_timeout;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.consume_prefix(generation).await;
            }
        });

        chord.pending = Some(PendingPrefix {
            key,
            handlers: handlers.cloned(),
            timer,
            generation,
        });
    }

    /// Whether a key-down is probably text input for a focused editor, in
    /// which case it must reach the editor instead of a shortcut.
    fn is_possibly_input_key(&self, key: KeyDescriptor, dom_key: &str, event: Option<&KeyEvent>) -> bool {
        let Some(event) = event else {
            return false;
        };
        if !event.editing || is_non_text_dom_key(dom_key) {
            return false;
        }

        let modifiers = key.modifiers;
        if modifiers.is_empty() {
            return true;
        }

        // Textual undo/redo takes precedence over front-end undo while editing.
        let z = u16::from(b'Z');
        let y = u16::from(b'Y');
        let is = |code: u16, mods: Modifiers| key == KeyDescriptor::new(code, mods);
        match self.options.platform {
            Platform::MacOS => {
                if is(z, Modifiers::META) || is(z, Modifiers::META | Modifiers::SHIFT) {
                    return true;
                }
            }
            platform => {
                if is(z, Modifiers::CTRL) || is(y, Modifiers::CTRL) {
                    return true;
                }
                if platform != Platform::Windows && is(z, Modifiers::CTRL | Modifiers::SHIFT) {
                    return true;
                }
            }
        }

        // Ctrl+Alt is AltGr on Windows keyboard layouts.
        if modifiers.contains(Modifiers::CTRL | Modifiers::ALT) {
            return self.options.platform == Platform::Windows;
        }

        !modifiers.intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::META)
    }
}

fn is_non_text_dom_key(dom_key: &str) -> bool {
    let function_key = dom_key
        .strip_prefix('F')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit());
    function_key
        || ["Control", "Shift", "Alt", "Meta", "Escape", "Win"]
            .iter()
            .any(|name| dom_key.contains(name))
        || dom_key.ends_with("U+001B")
}

impl ShortcutRegistry {
    /// Dispatch a keyboard event. Requires a Tokio runtime for the chord timer.
    pub async fn handle_shortcut(
        &self,
        event: &mut KeyEvent,
        handlers: Option<&Handlers>,
    ) -> KeyDisposition {
        let key = KeyDescriptor::from_event(event);
        let dom_key = event.key.clone();
        self.handle_key(key, &dom_key, Some(event), handlers).await
    }

    /// Feed one key-down into the chord state machine.
    pub async fn handle_key(
        &self,
        key: KeyDescriptor,
        dom_key: &str,
        mut event: Option<&mut KeyEvent>,
        handlers: Option<&Handlers>,
    ) -> KeyDisposition {
        let inner = &self.inner;
        let _dispatch = inner.dispatch.lock().await;

        let prefix = inner.chord.lock().pending.as_ref().map(|p| p.key);
        let has_handlers_or_prefix = handlers.is_some() || prefix.is_some();
        let node_has_chords = inner
            .bindings
            .read()
            .key_map
            .get_node(&key)
            .is_some_and(|node| node.has_chords());
        let actions = inner.applicable_actions(key, handlers, prefix);
        let maybe_has_actions = !actions.is_empty() || node_has_chords;

        if (!has_handlers_or_prefix && inner.is_possibly_input_key(key, dom_key, event.as_deref()))
            || !maybe_has_actions
            || key.is_modifier_key()
        {
            return KeyDisposition::Ignored;
        }

        if let Some(event) = event.as_mut() {
            event.consume(true);
        }
        logging::log_key_event(
            &key.display_for_platform(inner.options.platform),
            dom_key,
            if prefix.is_some() { "chord_continue" } else { "dispatch" },
        );

        // A modal dialog restricts everything outside a chord to the allowlist.
        if prefix.is_none() && inner.modal_dialog_shown.load(Ordering::Relaxed) {
            let allowed: Vec<Arc<dyn Action>> = actions
                .into_iter()
                .filter(|a| DIALOG_ALLOWED_ACTIONS.contains(&a.id()))
                .collect();
            if allowed.is_empty() {
                debug!(dom_key = dom_key, "Shortcut blocked by modal dialog");
                return KeyDisposition::Blocked;
            }
            return if inner.execute_first_handled(allowed, handlers).await {
                KeyDisposition::Handled
            } else {
                KeyDisposition::Unhandled
            };
        }

        let pending = inner.chord.lock().pending.take();
        if let Some(pending) = pending {
            pending.timer.abort();
            if inner
                .maybe_execute_action_for_key(key, handlers, Some(pending.key))
                .await
            {
                return KeyDisposition::Handled;
            }
            // The chord went nowhere; the prefix may still mean something alone.
            inner
                .maybe_execute_action_for_key(pending.key, pending.handlers.as_ref(), None)
                .await;
        }

        if node_has_chords {
            inner.arm_prefix(key, handlers);
            return KeyDisposition::AwaitingChord;
        }

        if inner.maybe_execute_action_for_key(key, handlers, None).await {
            KeyDisposition::Handled
        } else {
            KeyDisposition::Unhandled
        }
    }

    /// The first key of the chord in progress, if any.
    pub fn active_prefix(&self) -> Option<KeyDescriptor> {
        self.inner.chord.lock().pending.as_ref().map(|p| p.key)
    }

    pub fn is_awaiting_chord(&self) -> bool {
        self.active_prefix().is_some()
    }

    /// Abandon any chord in progress and stop its timer.
    pub fn dispose(&self) {
        if self.inner.chord.lock().cancel() {
            debug!("Pending chord cancelled");
        }
    }
}

/// Key-down listener bound to a set of handlers.
#[derive(Clone)]
pub struct ShortcutListener {
    registry: ShortcutRegistry,
    handlers: Handlers,
}

impl ShortcutListener {
    pub(super) fn new(registry: ShortcutRegistry, handlers: Handlers) -> Self {
        Self { registry, handlers }
    }

    /// Dispatch `event` with this listener's handlers. Must be polled inside
    /// a Tokio runtime, since a chord prefix spawns its timeout task.
    pub async fn on_key_down(&self, event: &mut KeyEvent) -> KeyDisposition {
        self.registry
            .handle_shortcut(event, Some(&self.handlers))
            .await
    }

    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }
}
