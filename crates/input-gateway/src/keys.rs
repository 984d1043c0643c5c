use enigo::{Button, Key};

/// Maps a model-supplied key name to a concrete key.
///
/// Single characters map to their unicode key; longer names come from a fixed
/// table. Returns `None` for anything unrecognized so the caller can report a
/// validation result instead of pressing something unintended.
pub fn parse_key(name: &str) -> Option<Key> {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(Key::Unicode(c.to_ascii_lowercase()));
    }

    let key = match trimmed.to_ascii_lowercase().as_str() {
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "backspace" => Key::Backspace,
        "delete" | "del" => Key::Delete,
        "shift" => Key::Shift,
        "ctrl" | "control" => Key::Control,
        "alt" => Key::Alt,
        "meta" | "super" | "win" => Key::Meta,
        "up" => Key::UpArrow,
        "down" => Key::DownArrow,
        "left" => Key::LeftArrow,
        "right" => Key::RightArrow,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => return None,
    };
    Some(key)
}

pub fn parse_button(name: &str) -> Option<Button> {
    match name.trim().to_ascii_lowercase().as_str() {
        "left" => Some(Button::Left),
        "right" => Some(Button::Right),
        "middle" => Some(Button::Middle),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_characters_map_to_unicode_keys() {
        assert_eq!(parse_key("w"), Some(Key::Unicode('w')));
        assert_eq!(parse_key("W"), Some(Key::Unicode('w')));
        assert_eq!(parse_key(" 5 "), Some(Key::Unicode('5')));
    }

    #[test]
    fn named_keys_are_case_insensitive() {
        assert_eq!(parse_key("Space"), Some(Key::Space));
        assert_eq!(parse_key("ENTER"), Some(Key::Return));
        assert_eq!(parse_key("esc"), Some(Key::Escape));
        assert_eq!(parse_key("f11"), Some(Key::F11));
    }

    #[test]
    fn unknown_key_names_are_rejected() {
        assert_eq!(parse_key("warp"), None);
        assert_eq!(parse_key(""), None);
        assert_eq!(parse_key("f13"), None);
    }

    #[test]
    fn buttons_parse_with_default_spelling() {
        assert_eq!(parse_button("left"), Some(Button::Left));
        assert_eq!(parse_button(" Right "), Some(Button::Right));
        assert_eq!(parse_button("middle"), Some(Button::Middle));
        assert_eq!(parse_button("fourth"), None);
    }
}
