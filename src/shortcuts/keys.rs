//! Virtual key codes and key-name canonicalization.
//!
//! Key names from binding strings and keyboard events are first folded into a
//! canonical lowercase form (`"ArrowUp"` and `"up"` both become `"up"`), then
//! mapped to the legacy virtual key codes the host delivers with key events.

pub const BACKSPACE: u16 = 8;
pub const TAB: u16 = 9;
pub const ENTER: u16 = 13;
pub const SHIFT: u16 = 16;
pub const CTRL: u16 = 17;
pub const ALT: u16 = 18;
pub const ESC: u16 = 27;
pub const SPACE: u16 = 32;
pub const PAGE_UP: u16 = 33;
pub const PAGE_DOWN: u16 = 34;
pub const END: u16 = 35;
pub const HOME: u16 = 36;
pub const LEFT: u16 = 37;
pub const UP: u16 = 38;
pub const RIGHT: u16 = 39;
pub const DOWN: u16 = 40;
pub const DELETE: u16 = 46;
pub const META: u16 = 91;
pub const META_RIGHT: u16 = 92;
pub const CONTEXT_MENU: u16 = 93;
pub const NUMPAD_PLUS: u16 = 107;
pub const NUMPAD_MINUS: u16 = 109;
pub const F1: u16 = 112;
pub const SEMICOLON: u16 = 186;
pub const PLUS: u16 = 187;
pub const COMMA: u16 = 188;
pub const MINUS: u16 = 189;
pub const PERIOD: u16 = 190;
pub const SLASH: u16 = 191;
pub const BACKQUOTE: u16 = 192;
pub const BRACKET_LEFT: u16 = 219;
pub const BACKSLASH: u16 = 220;
pub const BRACKET_RIGHT: u16 = 221;
pub const QUOTE: u16 = 222;
/// Firefox reports the Meta key with this code.
pub const META_FIREFOX: u16 = 224;

/// Canonicalize a key name to the internal standard form.
pub fn canonicalize_key(key: &str) -> String {
    let key_lower = key.to_lowercase();
    match key_lower.as_str() {
        "arrowup" | "uparrow" => "up",
        "arrowdown" | "downarrow" => "down",
        "arrowleft" | "leftarrow" => "left",
        "arrowright" | "rightarrow" => "right",
        "return" => "enter",
        "esc" => "escape",
        "back" => "backspace",
        "del" => "delete",
        " " | "spacebar" => "space",
        "control" => "ctrl",
        "os" | "win" | "command" => "meta",
        "/" | "forwardslash" | "?" | "questionmark" => "slash",
        "\\" => "backslash",
        ";" => "semicolon",
        "'" | "apostrophe" | "singlequote" => "quote",
        "," => "comma",
        "." | "dot" => "period",
        "[" | "leftbracket" => "bracketleft",
        "]" | "rightbracket" => "bracketright",
        "-" | "dash" | "hyphen" => "minus",
        "=" | "equals" | "equal" | "+" => "plus",
        "`" | "backtick" | "grave" | "tilde" | "~" => "backquote",
        "pgup" => "pageup",
        "pgdn" | "pgdown" => "pagedown",
        _ => return key_lower,
    }
    .to_string()
}

/// Look up the virtual key code for a key name.
///
/// Accepts anything [`canonicalize_key`] understands plus single letters and
/// digits. Returns `None` for names with no key code.
pub fn key_code(name: &str) -> Option<u16> {
    let canonical = canonicalize_key(name);
    let code = match canonical.as_str() {
        "backspace" => BACKSPACE,
        "tab" => TAB,
        "enter" => ENTER,
        "shift" => SHIFT,
        "ctrl" => CTRL,
        "alt" => ALT,
        "escape" => ESC,
        "space" => SPACE,
        "pageup" => PAGE_UP,
        "pagedown" => PAGE_DOWN,
        "end" => END,
        "home" => HOME,
        "left" => LEFT,
        "up" => UP,
        "right" => RIGHT,
        "down" => DOWN,
        "delete" => DELETE,
        "meta" => META,
        "numpadplus" => NUMPAD_PLUS,
        "numpadminus" => NUMPAD_MINUS,
        "semicolon" => SEMICOLON,
        "plus" => PLUS,
        "comma" => COMMA,
        "minus" => MINUS,
        "period" => PERIOD,
        "slash" => SLASH,
        "backquote" => BACKQUOTE,
        "bracketleft" => BRACKET_LEFT,
        "backslash" => BACKSLASH,
        "bracketright" => BRACKET_RIGHT,
        "quote" => QUOTE,
        other => return single_char_code(other).or_else(|| function_key_code(other)),
    };
    Some(code)
}

fn single_char_code(name: &str) -> Option<u16> {
    let mut chars = name.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii_uppercase() || upper.is_ascii_digit() {
        Some(upper as u16)
    } else {
        None
    }
}

fn function_key_code(name: &str) -> Option<u16> {
    let n: u16 = name.strip_prefix('f')?.parse().ok()?;
    (1..=12).contains(&n).then(|| F1 + n - 1)
}

/// Whether a key code is a bare modifier key.
pub fn is_modifier(code: u16) -> bool {
    matches!(
        code,
        SHIFT | CTRL | ALT | META | META_RIGHT | CONTEXT_MENU | META_FIREFOX
    )
}

/// Symbol used for a key code on macOS, where one exists.
pub fn mac_glyph(code: u16) -> Option<&'static str> {
    Some(match code {
        ENTER => "↵",
        ESC => "⎋",
        TAB => "⇥",
        SPACE => "␣",
        BACKSPACE => "⌫",
        DELETE => "⌦",
        UP => "↑",
        DOWN => "↓",
        LEFT => "←",
        RIGHT => "→",
        HOME => "↖",
        END => "↘",
        PAGE_UP => "⇞",
        PAGE_DOWN => "⇟",
        _ => return None,
    })
}

/// Human readable name for a key code.
pub fn display_name(code: u16) -> String {
    match code {
        BACKSPACE => "Backspace",
        TAB => "Tab",
        ENTER => "Enter",
        SHIFT => "Shift",
        CTRL => "Ctrl",
        ALT => "Alt",
        ESC => "Esc",
        SPACE => "Space",
        PAGE_UP => "PageUp",
        PAGE_DOWN => "PageDown",
        END => "End",
        HOME => "Home",
        LEFT => "Left",
        UP => "Up",
        RIGHT => "Right",
        DOWN => "Down",
        DELETE => "Delete",
        META | META_RIGHT | META_FIREFOX => "Meta",
        CONTEXT_MENU => "ContextMenu",
        NUMPAD_PLUS => "Numpad +",
        NUMPAD_MINUS => "Numpad -",
        SEMICOLON => ";",
        PLUS => "+",
        COMMA => ",",
        MINUS => "-",
        PERIOD => ".",
        SLASH => "/",
        BACKQUOTE => "`",
        BRACKET_LEFT => "[",
        BACKSLASH => "\\",
        BRACKET_RIGHT => "]",
        QUOTE => "'",
        c if (F1..F1 + 12).contains(&c) => return format!("F{}", c - F1 + 1),
        c => {
            return char::from_u32(u32::from(c))
                .filter(|ch| ch.is_ascii_alphanumeric())
                .map(|ch| ch.to_string())
                .unwrap_or_else(|| format!("<{}>", c))
        }
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits_use_uppercase_ascii() {
        assert_eq!(key_code("k"), Some(75));
        assert_eq!(key_code("K"), Some(75));
        assert_eq!(key_code("0"), Some(48));
    }

    #[test]
    fn aliases_resolve_to_same_code() {
        assert_eq!(key_code("ArrowUp"), key_code("up"));
        assert_eq!(key_code("Esc"), Some(ESC));
        assert_eq!(key_code("/"), Some(SLASH));
        assert_eq!(key_code("?"), Some(SLASH));
    }

    #[test]
    fn function_keys_are_bounded() {
        assert_eq!(key_code("F1"), Some(112));
        assert_eq!(key_code("f12"), Some(123));
        assert_eq!(key_code("f13"), None);
    }

    #[test]
    fn unknown_names_have_no_code() {
        assert_eq!(key_code("hyperspace"), None);
        assert_eq!(key_code("é"), None);
    }

    #[test]
    fn modifier_codes_are_detected() {
        assert!(is_modifier(SHIFT));
        assert!(is_modifier(META_FIREFOX));
        assert!(!is_modifier(75));
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name(75), "K");
        assert_eq!(display_name(F1 + 4), "F5");
        assert_eq!(display_name(ESC), "Esc");
    }
}
