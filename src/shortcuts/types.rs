//! Core shortcut types with proper error handling and platform-aware display.
//!
//! This module provides:
//! - `Modifiers` - Modifier key flags (shift, ctrl, alt, meta)
//! - `KeyDescriptor` - One normalized key press (key code + modifiers)
//! - `Shortcut` - A chord sequence of key presses bound to an action
//! - `ShortcutParseError` - Detailed parse errors for binding strings
//! - Platform-aware display (⌘⇧K on macOS, Ctrl+Shift+K on Windows/Linux)

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use super::event::KeyEvent;
use super::keys;

/// Keybind set that DevTools ships by default.
pub const DEVTOOLS_DEFAULT: &str = "devToolsDefault";
/// Keybind set mirroring Visual Studio Code.
pub const VS_CODE: &str = "vsCode";

/// Errors that can occur when parsing a shortcut string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortcutParseError {
    #[error("shortcut string is empty")]
    Empty,
    #[error("shortcut has no key, only modifiers")]
    MissingKey,
    #[error("unknown modifier '{0}' in shortcut")]
    UnknownModifier(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),
}

bitflags! {
    /// Modifier keys held during a key press.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Modifiers: u8 {
        const SHIFT = 1;
        const CTRL = 2;
        const ALT = 4;
        const META = 8;
    }
}

impl Modifiers {
    /// The platform accelerator: Meta on macOS, Ctrl elsewhere.
    pub fn ctrl_or_meta(platform: Platform) -> Self {
        if platform == Platform::MacOS {
            Self::META
        } else {
            Self::CTRL
        }
    }

    /// Option on macOS, Shift elsewhere.
    pub fn shift_or_option(platform: Platform) -> Self {
        if platform == Platform::MacOS {
            Self::ALT
        } else {
            Self::SHIFT
        }
    }

    fn parse(name: &str, platform: Platform) -> Result<Self, ShortcutParseError> {
        match name.to_lowercase().as_str() {
            "shift" | "shft" | "⇧" => Ok(Self::SHIFT),
            "ctrl" | "control" | "ctl" | "^" | "⌃" => Ok(Self::CTRL),
            "alt" | "opt" | "option" | "⌥" => Ok(Self::ALT),
            "meta" | "cmd" | "command" | "super" | "win" | "⌘" => Ok(Self::META),
            "ctrlormeta" | "mod" => Ok(Self::ctrl_or_meta(platform)),
            "shiftoroption" => Ok(Self::shift_or_option(platform)),
            _ => Err(ShortcutParseError::UnknownModifier(name.to_string())),
        }
    }
}

/// Platform used for binding filtering and display formatting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    pub fn current() -> Self {
        #[cfg(target_os = "macos")]
        {
            Platform::MacOS
        }
        #[cfg(target_os = "windows")]
        {
            Platform::Windows
        }
        #[cfg(target_os = "linux")]
        {
            Platform::Linux
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Platform::Linux
        }
    }

    /// Name used in binding platform restrictions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MacOS => "mac",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }

    /// Whether a comma separated platform list (e.g. `"mac,linux"`) names
    /// this platform. An absent or empty list matches every platform.
    pub fn matches(&self, platforms: Option<&str>) -> bool {
        match platforms {
            None => true,
            Some(list) if list.trim().is_empty() => true,
            Some(list) => list.split(',').any(|p| p.trim() == self.as_str()),
        }
    }
}

impl FromStr for Platform {
    type Err = ShortcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mac" | "macos" | "darwin" => Ok(Platform::MacOS),
            "windows" | "win" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            _ => Err(ShortcutParseError::UnknownPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

mod modifier_bits {
    use super::Modifiers;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(m: &Modifiers, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(m.bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Modifiers, D::Error> {
        Ok(Modifiers::from_bits_truncate(u8::deserialize(d)?))
    }
}

/// A single normalized key press: virtual key code plus held modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyDescriptor {
    #[serde(rename = "keyCode")]
    pub code: u16,
    #[serde(with = "modifier_bits")]
    pub modifiers: Modifiers,
}

impl KeyDescriptor {
    pub const fn new(code: u16, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Build a descriptor from a key name such as `"k"` or `"ArrowUp"`.
    pub fn from_name(name: &str, modifiers: Modifiers) -> Result<Self, ShortcutParseError> {
        keys::key_code(name)
            .map(|code| Self::new(code, modifiers))
            .ok_or_else(|| ShortcutParseError::UnknownKey(name.to_string()))
    }

    /// Derive the descriptor for a keyboard event. The same physical key and
    /// modifier combination always yields the same descriptor.
    pub fn from_event(event: &KeyEvent) -> Self {
        Self::new(event.key_code, event.modifiers())
    }

    /// Parse one chord step of a binding string, e.g. `"Ctrl+Shift+P"`.
    ///
    /// `"Ctrl++"` binds the `+` key.
    pub fn parse(step: &str, platform: Platform) -> Result<Self, ShortcutParseError> {
        let step = step.trim();
        if step.is_empty() {
            return Err(ShortcutParseError::Empty);
        }

        let (modifier_part, key_part) = if step == "+" {
            ("", "+")
        } else if let Some(rest) = step.strip_suffix("++") {
            (rest, "+")
        } else {
            match step.rsplit_once('+') {
                Some((mods, key)) => (mods, key),
                None => ("", step),
            }
        };

        if key_part.is_empty() {
            return Err(ShortcutParseError::MissingKey);
        }

        let mut modifiers = Modifiers::empty();
        for name in modifier_part.split('+').filter(|p| !p.is_empty()) {
            modifiers |= Modifiers::parse(name, platform)?;
        }

        Self::from_name(key_part, modifiers)
    }

    pub fn is_modifier_key(&self) -> bool {
        keys::is_modifier(self.code)
    }

    pub fn display_for_platform(&self, platform: Platform) -> String {
        match platform {
            Platform::MacOS => self.display_macos(),
            Platform::Windows | Platform::Linux => self.display_other(),
        }
    }

    fn display_macos(&self) -> String {
        let mut s = String::new();
        if self.modifiers.contains(Modifiers::CTRL) {
            s.push('⌃');
        }
        if self.modifiers.contains(Modifiers::ALT) {
            s.push('⌥');
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            s.push('⇧');
        }
        if self.modifiers.contains(Modifiers::META) {
            s.push('⌘');
        }
        match keys::mac_glyph(self.code) {
            Some(glyph) => s.push_str(glyph),
            None => s.push_str(&keys::display_name(self.code)),
        }
        s
    }

    fn display_other(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.modifiers.contains(Modifiers::CTRL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(Modifiers::ALT) {
            parts.push("Alt".to_string());
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.modifiers.contains(Modifiers::META) {
            parts.push("Meta".to_string());
        }
        parts.push(keys::display_name(self.code));
        parts.join("+")
    }
}

impl fmt::Display for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_for_platform(Platform::current()))
    }
}

/// Chord sequence storage. Nearly every shortcut is one or two presses.
pub type Descriptors = SmallVec<[KeyDescriptor; 2]>;

/// Parse a whitespace separated binding string (`"Ctrl+K Ctrl+C"`).
pub fn parse_descriptors(shortcut: &str, platform: Platform) -> Result<Descriptors, ShortcutParseError> {
    let descriptors = shortcut
        .split_whitespace()
        .map(|step| KeyDescriptor::parse(step, platform))
        .collect::<Result<Descriptors, _>>()?;
    if descriptors.is_empty() {
        return Err(ShortcutParseError::Empty);
    }
    Ok(descriptors)
}

/// Where a shortcut came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShortcutType {
    /// Added by the user.
    UserShortcut,
    /// Declared by an action with no keybind-set restriction.
    DefaultShortcut,
    /// A default the user switched off.
    DisabledDefault,
    /// Declared by an action for specific keybind sets.
    KeybindSetShortcut,
}

impl ShortcutType {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::DefaultShortcut | Self::KeybindSetShortcut)
    }
}

/// A chord sequence bound to an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub action: String,
    pub descriptors: Descriptors,
    #[serde(rename = "type")]
    pub shortcut_type: ShortcutType,
    #[serde(default, rename = "keybindSets", skip_serializing_if = "BTreeSet::is_empty")]
    pub keybind_sets: BTreeSet<String>,
}

impl Shortcut {
    pub fn new(
        descriptors: impl IntoIterator<Item = KeyDescriptor>,
        action: impl Into<String>,
        shortcut_type: ShortcutType,
    ) -> Result<Self, ShortcutParseError> {
        let descriptors: Descriptors = descriptors.into_iter().collect();
        if descriptors.is_empty() {
            return Err(ShortcutParseError::Empty);
        }
        Ok(Self {
            action: action.into(),
            descriptors,
            shortcut_type,
            keybind_sets: BTreeSet::new(),
        })
    }

    /// Parse a binding string into a shortcut for `action`.
    pub fn parse(
        shortcut: &str,
        action: impl Into<String>,
        shortcut_type: ShortcutType,
        platform: Platform,
    ) -> Result<Self, ShortcutParseError> {
        Self::new(parse_descriptors(shortcut, platform)?, action, shortcut_type)
    }

    pub fn with_keybind_sets<I, S>(mut self, sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keybind_sets = sets.into_iter().map(Into::into).collect();
        self
    }

    pub fn descriptors_match(&self, descriptors: &[KeyDescriptor]) -> bool {
        self.descriptors.as_slice() == descriptors
    }

    /// Unrestricted shortcuts belong to every keybind set.
    pub fn has_keybind_set(&self, keybind_set: &str) -> bool {
        self.keybind_sets.is_empty() || self.keybind_sets.contains(keybind_set)
    }

    /// Same keys, same provenance, same action. Keybind sets are ignored.
    pub fn equals(&self, other: &Shortcut) -> bool {
        self.descriptors_match(&other.descriptors)
            && self.shortcut_type == other.shortcut_type
            && self.action == other.action
    }

    pub fn change_type(&self, shortcut_type: ShortcutType) -> Self {
        Self {
            shortcut_type,
            ..self.clone()
        }
    }

    pub fn title(&self, platform: Platform) -> String {
        self.descriptors
            .iter()
            .map(|d| d.display_for_platform(platform))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
