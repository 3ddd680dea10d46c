//! Outbound calls to the embedding host.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::types::KeyDescriptor;
use crate::error::ResultExt;

/// A key combination the host must forward into the front-end instead of
/// handling itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardedKey {
    pub key_code: u16,
    pub modifiers: u8,
}

impl From<KeyDescriptor> for ForwardedKey {
    fn from(descriptor: KeyDescriptor) -> Self {
        Self {
            key_code: descriptor.code,
            modifiers: descriptor.modifiers.bits(),
        }
    }
}

/// The embedding browser shell.
pub trait HostBridge: Send + Sync {
    /// Replace the list of forwarded key combinations. `json` is an array of
    /// `{"keyCode", "modifiers"}` objects.
    fn set_whitelisted_shortcuts(&self, json: &str);

    /// Usage metric: a shortcut ran an action.
    fn keyboard_shortcut_fired(&self, _action: &str) {}
}

/// Host that ignores every call.
#[derive(Debug, Default)]
pub struct NoopHost;

impl HostBridge for NoopHost {
    fn set_whitelisted_shortcuts(&self, _json: &str) {}
}

/// Host that records what it was told. Useful for tests and tooling.
#[derive(Debug, Default)]
pub struct RecordingHost {
    whitelist: Mutex<Option<String>>,
    fired: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last whitelist payload, if any.
    pub fn whitelist(&self) -> Option<String> {
        self.whitelist.lock().clone()
    }

    pub fn forwarded_keys(&self) -> Vec<ForwardedKey> {
        self.whitelist()
            .and_then(|json| serde_json::from_str(&json).warn_on_err())
            .unwrap_or_default()
    }

    pub fn fired(&self) -> Vec<String> {
        self.fired.lock().clone()
    }
}

impl HostBridge for RecordingHost {
    fn set_whitelisted_shortcuts(&self, json: &str) {
        *self.whitelist.lock() = Some(json.to_string());
    }

    fn keyboard_shortcut_fired(&self, action: &str) {
        self.fired.lock().push(action.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcuts::types::Modifiers;

    #[test]
    fn recording_host_decodes_whitelist() {
        let host = RecordingHost::new();
        assert!(host.forwarded_keys().is_empty());

        host.set_whitelisted_shortcuts(r#"[{"keyCode":192,"modifiers":2}]"#);
        assert_eq!(
            host.forwarded_keys(),
            vec![ForwardedKey::from(KeyDescriptor::new(192, Modifiers::CTRL))]
        );
    }

    #[test]
    fn malformed_whitelist_yields_no_keys() {
        let host = RecordingHost::new();
        host.set_whitelisted_shortcuts("not json");
        assert_eq!(host.whitelist().as_deref(), Some("not json"));
        assert!(host.forwarded_keys().is_empty());
    }
}
