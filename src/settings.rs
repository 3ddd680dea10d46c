//! Observable settings consumed by the shortcut registry.
//!
//! A [`Setting`] holds a value and notifies its change listeners
//! synchronously on every write, after the new value is visible to `get`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::error::ResultExt;
use crate::shortcuts::{PersistenceError, Shortcut, ShortcutSettingsFile};

pub const ACTIVE_KEYBIND_SET: &str = "activeKeybindSet";
pub const USER_SHORTCUTS: &str = "userShortcuts";

/// Handle returned by [`Setting::add_change_listener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SettingInner<T> {
    name: &'static str,
    value: RwLock<T>,
    listeners: Mutex<Vec<(ListenerId, Listener<T>)>>,
    next_listener: AtomicU64,
}

/// A named, observable value. Clones share the same value.
pub struct Setting<T> {
    inner: Arc<SettingInner<T>>,
}

impl<T> Clone for Setting<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Setting<T> {
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            inner: Arc::new(SettingInner {
                name,
                value: RwLock::new(value),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Store `value` and notify listeners in subscription order.
    pub fn set(&self, value: T) {
        *self.inner.value.write() = value.clone();
        debug!(event_type = "setting_changed", setting = self.inner.name, "Setting changed");

        // Listeners may subscribe or unsubscribe while being notified.
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(&value);
        }
    }

    pub fn add_change_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_listener.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if no listener had this id.
    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn downgrade(&self) -> WeakSetting<T> {
        WeakSetting {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Non-owning handle to a [`Setting`].
pub struct WeakSetting<T> {
    inner: Weak<SettingInner<T>>,
}

impl<T> Clone for WeakSetting<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> WeakSetting<T> {
    pub fn upgrade(&self) -> Option<Setting<T>> {
        self.inner.upgrade().map(|inner| Setting { inner })
    }
}

/// The two settings the shortcut registry observes.
#[derive(Clone)]
pub struct Settings {
    pub active_keybind_set: Setting<String>,
    pub user_shortcuts: Setting<Vec<Shortcut>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_file(ShortcutSettingsFile::default())
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: ShortcutSettingsFile) -> Self {
        Self {
            active_keybind_set: Setting::new(ACTIVE_KEYBIND_SET, file.active_keybind_set),
            user_shortcuts: Setting::new(USER_SHORTCUTS, file.user_shortcuts),
        }
    }

    pub fn snapshot(&self) -> ShortcutSettingsFile {
        ShortcutSettingsFile {
            active_keybind_set: self.active_keybind_set.get(),
            user_shortcuts: self.user_shortcuts.get(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        ShortcutSettingsFile::load(path).map(Self::from_file)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        self.snapshot().save(path)
    }

    /// Save to `path` after every change. Failures are logged, not returned.
    pub fn persist_to(&self, path: impl Into<PathBuf>) {
        let path: PathBuf = path.into();
        let keybind_set = self.active_keybind_set.downgrade();
        let user_shortcuts = self.user_shortcuts.downgrade();

        let save = move || {
            let (Some(keybind_set), Some(user_shortcuts)) =
                (keybind_set.upgrade(), user_shortcuts.upgrade())
            else {
                return;
            };
            let settings = Settings {
                active_keybind_set: keybind_set,
                user_shortcuts,
            };
            settings.save(&path).log_err();
        };
        let save = Arc::new(save);

        let on_keybind_set = Arc::clone(&save);
        self.active_keybind_set
            .add_change_listener(move |_| on_keybind_set());
        self.user_shortcuts.add_change_listener(move |_| save());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::{KeyDescriptor, Modifiers, ShortcutType, VS_CODE};
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    #[test]
    fn set_notifies_listeners_after_write() {
        let setting = Setting::new("test", 1u32);
        let observed = Arc::new(Mutex::new(Vec::new()));

        let reader = setting.clone();
        let seen = Arc::clone(&observed);
        setting.add_change_listener(move |value| {
            seen.lock().push((*value, reader.get()));
        });

        setting.set(2);
        setting.set(3);
        assert_eq!(*observed.lock(), vec![(2, 2), (3, 3)]);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let setting = Setting::new("test", 0u32);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = setting.add_change_listener(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        setting.set(1);
        assert!(setting.remove_change_listener(id));
        assert!(!setting.remove_change_listener(id));
        setting.set(2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn persist_to_writes_on_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shortcuts.json");

        let settings = Settings::new();
        settings.persist_to(&path);
        settings.active_keybind_set.set(VS_CODE.to_string());

        let shortcut = Shortcut::new(
            [KeyDescriptor::new(75, Modifiers::CTRL)],
            "console.toggle",
            ShortcutType::UserShortcut,
        )
        .unwrap();
        settings.user_shortcuts.set(vec![shortcut.clone()]);

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.active_keybind_set.get(), VS_CODE);
        assert_eq!(loaded.user_shortcuts.get(), vec![shortcut]);
    }

    #[test]
    fn weak_setting_does_not_keep_value_alive() {
        let setting = Setting::new("test", String::from("x"));
        let weak = setting.downgrade();
        assert!(weak.upgrade().is_some());
        drop(setting);
        assert!(weak.upgrade().is_none());
    }
}
