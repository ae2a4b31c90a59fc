pub mod key_range {
    pub const BASIC_MIN: u8 = 0x4;
    pub const BASIC_A: u8 = 0x4;
    pub const BASIC_1: u8 = 0x1e;
    pub const BASIC_0: u8 = 0x27;
    pub const BASIC_MAX: u8 = 0xa4;
    pub const MODIFIER_MIN: u8 = 0xe0;
    pub const MODIFIER_MAX: u8 = 0xe7;

    pub const LEFT_CONTROL: u8 = 0xe0;
    pub const LEFT_SHIFT: u8 = 0xe1;
    pub const LEFT_ALT: u8 = 0xe2;
    pub const LEFT_GUI: u8 = 0xe3;

    pub const ENTER: u8 = 0x28;
    pub const TAB: u8 = 0x2b;
    pub const SPACE: u8 = 0x2c;

    pub fn is_modifier(code: u8) -> bool {
        (MODIFIER_MIN..=MODIFIER_MAX).contains(&code)
    }
}

/// Consumer page (0x0c) usages the firmware knows by name.
pub mod consumer {
    pub const BRIGHTNESS_INCREMENT: u16 = 0x06f;
    pub const BRIGHTNESS_DECREMENT: u16 = 0x070;
    pub const RECORD: u16 = 0x0b2;
    pub const FAST_FORWARD: u16 = 0x0b3;
    pub const REWIND: u16 = 0x0b4;
    pub const SCAN_NEXT_TRACK: u16 = 0x0b5;
    pub const SCAN_PREVIOUS_TRACK: u16 = 0x0b6;
    pub const STOP: u16 = 0x0b7;
    pub const EJECT: u16 = 0x0b8;
    pub const PLAY_PAUSE: u16 = 0x0cd;
    pub const MUTE: u16 = 0x0e2;
    pub const VOLUME_INCREMENT: u16 = 0x0e9;
    pub const VOLUME_DECREMENT: u16 = 0x0ea;
}

/// Names accepted for media keys. Matched case-insensitively and before any key name.
pub const CONSUMER_NAMES: &[(&str, u16)] = &[
    ("PLAY_PAUSE", consumer::PLAY_PAUSE),
    ("MUTE", consumer::MUTE),
    ("VOLUME_DECREMENT", consumer::VOLUME_DECREMENT),
    ("VOLUME_INCREMENT", consumer::VOLUME_INCREMENT),
    ("SCAN_NEXT_TRACK", consumer::SCAN_NEXT_TRACK),
    ("SCAN_PREVIOUS_TRACK", consumer::SCAN_PREVIOUS_TRACK),
    ("STOP", consumer::STOP),
    ("RECORD", consumer::RECORD),
    ("FAST_FORWARD", consumer::FAST_FORWARD),
    ("REWIND", consumer::REWIND),
    ("EJECT", consumer::EJECT),
    ("BRIGHTNESS_INCREMENT", consumer::BRIGHTNESS_INCREMENT),
    ("BRIGHTNESS_DECREMENT", consumer::BRIGHTNESS_DECREMENT),
];

/// Local stand-ins for companion actions so a key still does something when no host app listens.
pub const APP_FALLBACKS: &[(&str, u16)] = &[
    ("APP_PLAY_PAUSE", consumer::PLAY_PAUSE),
    ("APP_NEXT", consumer::SCAN_NEXT_TRACK),
    ("APP_PREV", consumer::SCAN_PREVIOUS_TRACK),
    ("APP_MUTE", consumer::MUTE),
    ("APP_VOL_UP", consumer::VOLUME_INCREMENT),
    ("APP_VOL_DOWN", consumer::VOLUME_DECREMENT),
];

const MODIFIER_ALIASES: &[(&str, u8)] = &[
    ("CTRL", key_range::LEFT_CONTROL),
    ("CONTROL", key_range::LEFT_CONTROL),
    ("CMD", key_range::LEFT_GUI),
    ("GUI", key_range::LEFT_GUI),
    ("WIN", key_range::LEFT_GUI),
    ("WINDOWS", key_range::LEFT_GUI),
    ("COMMAND", key_range::LEFT_GUI),
    ("SHIFT", key_range::LEFT_SHIFT),
    ("LSHIFT", key_range::LEFT_SHIFT),
    ("RSHIFT", key_range::LEFT_SHIFT),
    ("ALT", key_range::LEFT_ALT),
    ("OPTION", key_range::LEFT_ALT),
];

#[rustfmt::skip]
const KEY_NAMES: &[(&str, u8)] = &[
    ("A", 0x04), ("B", 0x05), ("C", 0x06), ("D", 0x07), ("E", 0x08), ("F", 0x09),
    ("G", 0x0a), ("H", 0x0b), ("I", 0x0c), ("J", 0x0d), ("K", 0x0e), ("L", 0x0f),
    ("M", 0x10), ("N", 0x11), ("O", 0x12), ("P", 0x13), ("Q", 0x14), ("R", 0x15),
    ("S", 0x16), ("T", 0x17), ("U", 0x18), ("V", 0x19), ("W", 0x1a), ("X", 0x1b),
    ("Y", 0x1c), ("Z", 0x1d),
    ("ONE", 0x1e), ("TWO", 0x1f), ("THREE", 0x20), ("FOUR", 0x21), ("FIVE", 0x22),
    ("SIX", 0x23), ("SEVEN", 0x24), ("EIGHT", 0x25), ("NINE", 0x26), ("ZERO", 0x27),
    ("1", 0x1e), ("2", 0x1f), ("3", 0x20), ("4", 0x21), ("5", 0x22),
    ("6", 0x23), ("7", 0x24), ("8", 0x25), ("9", 0x26), ("0", 0x27),
    ("ENTER", 0x28), ("RETURN", 0x28),
    ("ESCAPE", 0x29), ("ESC", 0x29),
    ("BACKSPACE", 0x2a),
    ("TAB", 0x2b),
    ("SPACEBAR", 0x2c), ("SPACE", 0x2c),
    ("MINUS", 0x2d),
    ("EQUALS", 0x2e),
    ("LEFT_BRACKET", 0x2f),
    ("RIGHT_BRACKET", 0x30),
    ("BACKSLASH", 0x31),
    ("POUND", 0x32),
    ("SEMICOLON", 0x33),
    ("QUOTE", 0x34),
    ("GRAVE_ACCENT", 0x35),
    ("COMMA", 0x36),
    ("PERIOD", 0x37),
    ("FORWARD_SLASH", 0x38),
    ("CAPS_LOCK", 0x39),
    ("F1", 0x3a), ("F2", 0x3b), ("F3", 0x3c), ("F4", 0x3d), ("F5", 0x3e), ("F6", 0x3f),
    ("F7", 0x40), ("F8", 0x41), ("F9", 0x42), ("F10", 0x43), ("F11", 0x44), ("F12", 0x45),
    ("PRINT_SCREEN", 0x46),
    ("SCROLL_LOCK", 0x47),
    ("PAUSE", 0x48),
    ("INSERT", 0x49),
    ("HOME", 0x4a),
    ("PAGE_UP", 0x4b),
    ("DELETE", 0x4c),
    ("END", 0x4d),
    ("PAGE_DOWN", 0x4e),
    ("RIGHT_ARROW", 0x4f), ("LEFT_ARROW", 0x50), ("DOWN_ARROW", 0x51), ("UP_ARROW", 0x52),
    ("RIGHT", 0x4f), ("LEFT", 0x50), ("DOWN", 0x51), ("UP", 0x52),
    ("KEYPAD_NUMLOCK", 0x53),
    ("KEYPAD_FORWARD_SLASH", 0x54),
    ("KEYPAD_ASTERISK", 0x55),
    ("KEYPAD_MINUS", 0x56),
    ("KEYPAD_PLUS", 0x57),
    ("KEYPAD_ENTER", 0x58),
    ("KEYPAD_ONE", 0x59), ("KEYPAD_TWO", 0x5a), ("KEYPAD_THREE", 0x5b),
    ("KEYPAD_FOUR", 0x5c), ("KEYPAD_FIVE", 0x5d), ("KEYPAD_SIX", 0x5e),
    ("KEYPAD_SEVEN", 0x5f), ("KEYPAD_EIGHT", 0x60), ("KEYPAD_NINE", 0x61),
    ("KEYPAD_ZERO", 0x62),
    ("KEYPAD_PERIOD", 0x63),
    ("KEYPAD_BACKSLASH", 0x64),
    ("APPLICATION", 0x65),
    ("POWER", 0x66),
    ("KEYPAD_EQUALS", 0x67),
    ("F13", 0x68), ("F14", 0x69), ("F15", 0x6a), ("F16", 0x6b), ("F17", 0x6c), ("F18", 0x6d),
    ("F19", 0x6e), ("F20", 0x6f), ("F21", 0x70), ("F22", 0x71), ("F23", 0x72), ("F24", 0x73),
    ("LEFT_CONTROL", 0xe0),
    ("LEFT_SHIFT", 0xe1),
    ("LEFT_ALT", 0xe2),
    ("LEFT_GUI", 0xe3),
    ("RIGHT_CONTROL", 0xe4),
    ("RIGHT_SHIFT", 0xe5),
    ("RIGHT_ALT", 0xe6),
    ("RIGHT_GUI", 0xe7),
];

/// Unshifted/shifted pairs on a US layout for the punctuation keys.
const SHIFT_PAIRS: &[(char, char, u8)] = &[
    ('-', '_', 0x2d),
    ('=', '+', 0x2e),
    ('[', '{', 0x2f),
    (']', '}', 0x30),
    ('\\', '|', 0x31),
    (';', ':', 0x33),
    ('\'', '"', 0x34),
    ('`', '~', 0x35),
    (',', '<', 0x36),
    ('.', '>', 0x37),
    ('/', '?', 0x38),
];

const SHIFTED_DIGITS: &str = ")!@#$%^&*(";

fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| *v)
}

/// Modifier synonym lookup (`CTRL`, `CMD`, `OPTION`, ...). All map to the left-hand modifier.
pub fn modifier_alias(name: &str) -> Option<u8> {
    lookup(MODIFIER_ALIASES, name)
}

/// Keyboard usage for a key name; modifier synonyms are tried first.
///
/// ```
/// use trkey_common::keycodes::key_code;
/// assert_eq!(key_code("ctrl"), Some(0xe0));
/// assert_eq!(key_code("Up_Arrow"), Some(0x52));
/// assert_eq!(key_code("nope"), None);
/// ```
pub fn key_code(name: &str) -> Option<u8> {
    modifier_alias(name).or_else(|| lookup(KEY_NAMES, name))
}

pub fn consumer_code(name: &str) -> Option<u16> {
    lookup(CONSUMER_NAMES, name)
}

pub fn app_fallback(name: &str) -> Option<u16> {
    lookup(APP_FALLBACKS, name)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyStroke {
    pub code: u8,
    pub shift: bool,
}

impl KeyStroke {
    const fn plain(code: u8) -> Self {
        Self { code, shift: false }
    }

    const fn shifted(code: u8) -> Self {
        Self { code, shift: true }
    }
}

/// Keystroke that types `c` on a US layout, or `None` if the character can't be typed.
pub fn char_to_key(c: char) -> Option<KeyStroke> {
    match c {
        'a'..='z' => Some(KeyStroke::plain(c as u8 - b'a' + key_range::BASIC_A)),
        'A'..='Z' => Some(KeyStroke::shifted(c as u8 - b'A' + key_range::BASIC_A)),
        '1'..='9' => Some(KeyStroke::plain(c as u8 - b'1' + key_range::BASIC_1)),
        '0' => Some(KeyStroke::plain(key_range::BASIC_0)),
        ' ' => Some(KeyStroke::plain(key_range::SPACE)),
        '\n' => Some(KeyStroke::plain(key_range::ENTER)),
        '\t' => Some(KeyStroke::plain(key_range::TAB)),
        c => {
            if let Some(i) = SHIFTED_DIGITS.find(c) {
                let code = if i == 0 {
                    key_range::BASIC_0
                } else {
                    key_range::BASIC_1 + i as u8 - 1
                };
                return Some(KeyStroke::shifted(code));
            }
            SHIFT_PAIRS.iter().find_map(|(plain, shifted, code)| {
                if c == *plain {
                    Some(KeyStroke::plain(*code))
                } else if c == *shifted {
                    Some(KeyStroke::shifted(*code))
                } else {
                    None
                }
            })
        }
    }
}

#[cfg(test)]
#[path = "keycodes_test.rs"]
mod test;
