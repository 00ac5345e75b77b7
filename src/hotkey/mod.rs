//! Hotkey-binding parsing for the settings panel.
//!
//! This client does not listen for keys — the capture client does.  It only
//! edits the binding string stored in config, so the settings form needs to
//! validate what the user typed before saving.  A binding is zero or more
//! modifiers joined with `+` followed by one key name, e.g. `"F9"` or
//! `"Ctrl+Shift+Space"`.

use std::fmt;

// ---------------------------------------------------------------------------
// KeyBinding
// ---------------------------------------------------------------------------

/// A parsed hotkey combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// The non-modifier key, validated against [`rdev::Key`].
    pub key: rdev::Key,
    /// Canonical name of `key`, as written back to config.
    key_name: String,
}

impl fmt::Display for KeyBinding {
    /// Canonical config representation (`Ctrl+Shift+Space` order).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        write!(f, "{}", self.key_name)
    }
}

// ---------------------------------------------------------------------------
// parse_binding
// ---------------------------------------------------------------------------

/// Parse a binding string from the settings form.
///
/// Returns `None` for unknown key names, duplicate/trailing modifiers, or an
/// empty string, so the form can refuse to save and show a hint instead.
pub fn parse_binding(binding: &str) -> Option<KeyBinding> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut key = None;

    for part in binding.trim().split('+') {
        match part.trim() {
            "Ctrl" | "ctrl" if !ctrl => ctrl = true,
            "Shift" | "shift" if !shift => shift = true,
            "Alt" | "alt" | "Option" | "option" if !alt => alt = true,
            name => {
                // Only one non-modifier key allowed.
                if key.is_some() {
                    return None;
                }
                key = Some((parse_key(name)?, canonical_name(name)));
            }
        }
    }

    let (key, key_name) = key?;
    Some(KeyBinding {
        ctrl,
        shift,
        alt,
        key,
        key_name,
    })
}

fn canonical_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Map a key name onto [`rdev::Key`].
///
/// Supports F1–F12, common named keys, and single ASCII letters.  Returns
/// `None` for unrecognised names.
pub fn parse_key(name: &str) -> Option<rdev::Key> {
    use rdev::Key;

    let key = match name {
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        "Space" | "space" => Key::Space,
        "Tab" | "tab" => Key::Tab,
        "Escape" | "escape" | "Esc" | "esc" => Key::Escape,
        "Enter" | "enter" | "Return" | "return" => Key::Return,
        "Backspace" | "backspace" => Key::Backspace,
        "Home" | "home" => Key::Home,
        "End" | "end" => Key::End,
        single if single.len() == 1 => {
            let c = single.chars().next()?;
            letter_key(c.to_ascii_lowercase())?
        }
        _ => return None,
    };
    Some(key)
}

fn letter_key(c: char) -> Option<rdev::Key> {
    use rdev::Key;
    let key = match c {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        _ => return None,
    };
    Some(key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_function_key() {
        let b = parse_binding("F9").expect("valid");
        assert_eq!(b.key, rdev::Key::F9);
        assert!(!b.ctrl && !b.shift && !b.alt);
        assert_eq!(b.to_string(), "F9");
    }

    #[test]
    fn modifier_combination() {
        let b = parse_binding("Ctrl+Shift+Space").expect("valid");
        assert!(b.ctrl && b.shift && !b.alt);
        assert_eq!(b.key, rdev::Key::Space);
        assert_eq!(b.to_string(), "Ctrl+Shift+Space");
    }

    #[test]
    fn canonical_order_is_restored_on_display() {
        let b = parse_binding("shift+ctrl+t").expect("valid");
        assert_eq!(b.to_string(), "Ctrl+Shift+T");
    }

    #[test]
    fn single_letters_parse_case_insensitively() {
        assert_eq!(parse_key("a"), Some(rdev::Key::KeyA));
        assert_eq!(parse_key("A"), Some(rdev::Key::KeyA));
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(parse_binding("F13").is_none());
        assert!(parse_binding("xyz").is_none());
        assert!(parse_binding("").is_none());
    }

    #[test]
    fn two_non_modifier_keys_are_rejected() {
        assert!(parse_binding("A+B").is_none());
    }

    #[test]
    fn modifiers_alone_are_rejected() {
        assert!(parse_binding("Ctrl+Shift").is_none());
    }
}
