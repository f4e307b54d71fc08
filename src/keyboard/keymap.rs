//! Key code definitions and display names

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Represents a physical key code (hardware scan code, evdev numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for KeyCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = get_key_info(*self);
        if info.name == UNKNOWN.name {
            write!(f, "key {}", self.0)
        } else {
            write!(f, "{} ({})", info.name, self.0)
        }
    }
}

/// Display information about a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    /// Display name for the key
    pub name: &'static str,
    /// Short label
    pub label: &'static str,
}

const UNKNOWN: KeyInfo = KeyInfo {
    name: "Unknown",
    label: "?",
};

/// (code, name, label) for a standard ANSI keyboard
const KEY_NAMES: &[(u16, &str, &str)] = &[
    (1, "Escape", "Esc"),
    (2, "1", "1"),
    (3, "2", "2"),
    (4, "3", "3"),
    (5, "4", "4"),
    (6, "5", "5"),
    (7, "6", "6"),
    (8, "7", "7"),
    (9, "8", "8"),
    (10, "9", "9"),
    (11, "0", "0"),
    (12, "Minus", "-"),
    (13, "Equals", "="),
    (14, "Backspace", "Bksp"),
    (15, "Tab", "Tab"),
    (16, "Q", "Q"),
    (17, "W", "W"),
    (18, "E", "E"),
    (19, "R", "R"),
    (20, "T", "T"),
    (21, "Y", "Y"),
    (22, "U", "U"),
    (23, "I", "I"),
    (24, "O", "O"),
    (25, "P", "P"),
    (26, "LeftBracket", "["),
    (27, "RightBracket", "]"),
    (28, "Enter", "Enter"),
    (29, "LeftCtrl", "Ctrl"),
    (30, "A", "A"),
    (31, "S", "S"),
    (32, "D", "D"),
    (33, "F", "F"),
    (34, "G", "G"),
    (35, "H", "H"),
    (36, "J", "J"),
    (37, "K", "K"),
    (38, "L", "L"),
    (39, "Semicolon", ";"),
    (40, "Apostrophe", "'"),
    (41, "Grave", "`"),
    (42, "LeftShift", "Shift"),
    (43, "Backslash", "\\"),
    (44, "Z", "Z"),
    (45, "X", "X"),
    (46, "C", "C"),
    (47, "V", "V"),
    (48, "B", "B"),
    (49, "N", "N"),
    (50, "M", "M"),
    (51, "Comma", ","),
    (52, "Period", "."),
    (53, "Slash", "/"),
    (54, "RightShift", "Shift"),
    (55, "NumpadMultiply", "*"),
    (56, "LeftAlt", "Alt"),
    (57, "Space", "Space"),
    (58, "CapsLock", "Caps"),
    (59, "F1", "F1"),
    (60, "F2", "F2"),
    (61, "F3", "F3"),
    (62, "F4", "F4"),
    (63, "F5", "F5"),
    (64, "F6", "F6"),
    (65, "F7", "F7"),
    (66, "F8", "F8"),
    (67, "F9", "F9"),
    (68, "F10", "F10"),
    (69, "NumLock", "Num"),
    (70, "ScrollLock", "ScrLk"),
    (71, "Numpad7", "7"),
    (72, "Numpad8", "8"),
    (73, "Numpad9", "9"),
    (74, "NumpadSubtract", "-"),
    (75, "Numpad4", "4"),
    (76, "Numpad5", "5"),
    (77, "Numpad6", "6"),
    (78, "NumpadAdd", "+"),
    (79, "Numpad1", "1"),
    (80, "Numpad2", "2"),
    (81, "Numpad3", "3"),
    (82, "Numpad0", "0"),
    (83, "NumpadDecimal", "."),
    (87, "F11", "F11"),
    (88, "F12", "F12"),
    (96, "NumpadEnter", "Enter"),
    (97, "RightCtrl", "Ctrl"),
    (98, "NumpadDivide", "/"),
    (99, "PrintScreen", "PrtSc"),
    (100, "RightAlt", "Alt"),
    (102, "Home", "Home"),
    (103, "Up", "↑"),
    (104, "PageUp", "PgUp"),
    (105, "Left", "←"),
    (106, "Right", "→"),
    (107, "End", "End"),
    (108, "Down", "↓"),
    (109, "PageDown", "PgDn"),
    (110, "Insert", "Ins"),
    (111, "Delete", "Del"),
    (119, "Pause", "Pause"),
    (125, "LeftMeta", "Win"),
    (126, "RightMeta", "Win"),
    (127, "Menu", "Menu"),
];

/// Static keymap for standard US keyboard layout
pub static KEYMAP: LazyLock<HashMap<KeyCode, KeyInfo>> = LazyLock::new(|| {
    KEY_NAMES
        .iter()
        .map(|&(code, name, label)| (KeyCode(code), KeyInfo { name, label }))
        .collect()
});

/// Get key info by code, returns "Unknown" if not found
pub fn get_key_info(code: KeyCode) -> KeyInfo {
    KEYMAP.get(&code).copied().unwrap_or(UNKNOWN)
}
