//! Keyboard events as delivered by the host window.

use super::keys;
use super::types::Modifiers;

/// A key-down event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// The DOM `key` value ("k", "Escape", "Control", ...).
    pub key: String,
    /// Legacy virtual key code.
    pub key_code: u16,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    /// The event target is an editable text field.
    pub editing: bool,
    consumed: bool,
    default_prevented: bool,
}

impl KeyEvent {
    /// Build an event from a DOM key name; the key code is derived from it.
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        let key = key.into();
        let key_code = keys::key_code(&key).unwrap_or(0);
        Self {
            key,
            key_code,
            ctrl: modifiers.contains(Modifiers::CTRL),
            alt: modifiers.contains(Modifiers::ALT),
            shift: modifiers.contains(Modifiers::SHIFT),
            meta: modifiers.contains(Modifiers::META),
            ..Default::default()
        }
    }

    pub fn in_text_field(mut self) -> Self {
        self.editing = true;
        self
    }

    pub fn modifiers(&self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::CTRL, self.ctrl);
        modifiers.set(Modifiers::ALT, self.alt);
        modifiers.set(Modifiers::SHIFT, self.shift);
        modifiers.set(Modifiers::META, self.meta);
        modifiers
    }

    /// Stop propagation, and optionally the host's default handling.
    pub fn consume(&mut self, prevent_default: bool) {
        self.consumed = true;
        if prevent_default {
            self.default_prevented = true;
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_key_code_and_flags() {
        let event = KeyEvent::new("k", Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(event.key_code, 75);
        assert!(event.ctrl && event.shift);
        assert!(!event.alt && !event.meta);
        assert_eq!(event.modifiers(), Modifiers::CTRL | Modifiers::SHIFT);
    }

    #[test]
    fn consume_marks_event() {
        let mut event = KeyEvent::new("Escape", Modifiers::empty());
        assert!(!event.is_consumed());
        event.consume(true);
        assert!(event.is_consumed());
        assert!(event.is_default_prevented());
    }
}
