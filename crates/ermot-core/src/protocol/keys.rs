//! Key-name vocabulary used by `keyboard-key` and the shortcut table.
//!
//! Controllers name keys with short lowercase words (`enter`, `f5`,
//! `audio_play`) or a single character (`a`, `/`).  This module turns those
//! names into a platform-independent [`HostKey`]; the host's automation
//! backend maps a `HostKey` to whatever its OS API needs.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyParseError {
    #[error("unknown key name: {0:?}")]
    UnknownKey(String),
    #[error("unknown modifier: {0:?}")]
    UnknownModifier(String),
}

/// Modifier held down while a key is tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Control,
    Shift,
    Alt,
    /// Command on macOS, Windows key elsewhere.
    Meta,
}

impl Modifier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Shift => "shift",
            Self::Alt => "alt",
            Self::Meta => "command",
        }
    }
}

impl FromStr for Modifier {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "control" | "ctrl" => Ok(Self::Control),
            "shift" => Ok(Self::Shift),
            "alt" | "option" => Ok(Self::Alt),
            "command" | "cmd" | "meta" | "win" | "super" => Ok(Self::Meta),
            _ => Err(KeyParseError::UnknownModifier(s.to_string())),
        }
    }
}

/// Keys that are not a single printable character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Backspace,
    Tab,
    Escape,
    Space,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// `F1` through `F12`.
    Function(u8),
    PrintScreen,
    CapsLock,
    Control,
    Shift,
    Alt,
    Meta,
    AudioPlay,
    AudioNext,
    AudioPrev,
    AudioMute,
    AudioVolumeUp,
    AudioVolumeDown,
}

const NAMED_KEYS: &[(&str, NamedKey)] = &[
    ("enter", NamedKey::Enter),
    ("return", NamedKey::Enter),
    ("backspace", NamedKey::Backspace),
    ("tab", NamedKey::Tab),
    ("escape", NamedKey::Escape),
    ("esc", NamedKey::Escape),
    ("space", NamedKey::Space),
    ("delete", NamedKey::Delete),
    ("insert", NamedKey::Insert),
    ("home", NamedKey::Home),
    ("end", NamedKey::End),
    ("pageup", NamedKey::PageUp),
    ("pagedown", NamedKey::PageDown),
    ("up", NamedKey::Up),
    ("down", NamedKey::Down),
    ("left", NamedKey::Left),
    ("right", NamedKey::Right),
    ("printscreen", NamedKey::PrintScreen),
    ("capslock", NamedKey::CapsLock),
    ("control", NamedKey::Control),
    ("ctrl", NamedKey::Control),
    ("shift", NamedKey::Shift),
    ("alt", NamedKey::Alt),
    ("command", NamedKey::Meta),
    ("meta", NamedKey::Meta),
    ("audio_play", NamedKey::AudioPlay),
    ("audio_pause", NamedKey::AudioPlay),
    ("audio_next", NamedKey::AudioNext),
    ("audio_prev", NamedKey::AudioPrev),
    ("audio_mute", NamedKey::AudioMute),
    ("audio_vol_up", NamedKey::AudioVolumeUp),
    ("audio_vol_down", NamedKey::AudioVolumeDown),
];

impl NamedKey {
    /// Canonical controller-facing name.
    pub fn name(self) -> String {
        if let Self::Function(n) = self {
            return format!("f{n}");
        }
        NAMED_KEYS
            .iter()
            .find(|(_, key)| *key == self)
            .map(|(name, _)| (*name).to_string())
            .unwrap_or_default()
    }
}

/// A key the host can tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostKey {
    Named(NamedKey),
    Char(char),
}

impl FromStr for HostKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Self::Char(c));
        }

        let lower = s.to_ascii_lowercase();
        if let Some((_, key)) = NAMED_KEYS.iter().find(|(name, _)| *name == lower) {
            return Ok(Self::Named(*key));
        }
        if let Some(n) = lower
            .strip_prefix('f')
            .and_then(|digits| digits.parse::<u8>().ok())
            .filter(|n| (1..=12).contains(n))
        {
            return Ok(Self::Named(NamedKey::Function(n)));
        }
        Err(KeyParseError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(key) => f.write_str(&key.name()),
            Self::Char(c) => write!(f, "{c}"),
        }
    }
}

/// A key plus the modifiers held while tapping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub key: HostKey,
    pub modifiers: Vec<Modifier>,
}

impl KeyChord {
    pub fn new(key: HostKey, modifiers: &[Modifier]) -> Self {
        Self {
            key,
            modifiers: modifiers.to_vec(),
        }
    }

    /// Parses a controller-supplied key name and modifier list.
    pub fn parse(key: &str, modifiers: &[String]) -> Result<Self, KeyParseError> {
        Ok(Self {
            key: key.parse()?,
            modifiers: modifiers
                .iter()
                .map(|m| m.parse())
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn modifier_names(&self) -> Vec<String> {
        self.modifiers.iter().map(|m| m.as_str().to_string()).collect()
    }
}

/// Named editing shortcuts offered by the controller's shortcut pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Copy,
    Paste,
    Cut,
    Undo,
    Redo,
    Save,
    SelectAll,
    Find,
    NewTab,
    CloseTab,
    Refresh,
    Screenshot,
    AltTab,
    TaskManager,
}

impl ShortcutAction {
    /// Looks up a shortcut by its controller name; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "copy" => Self::Copy,
            "paste" => Self::Paste,
            "cut" => Self::Cut,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "save" => Self::Save,
            "selectAll" => Self::SelectAll,
            "find" => Self::Find,
            "newTab" => Self::NewTab,
            "closeTab" => Self::CloseTab,
            "refresh" => Self::Refresh,
            "screenshot" => Self::Screenshot,
            "altTab" => Self::AltTab,
            "taskManager" => Self::TaskManager,
            _ => return None,
        })
    }

    /// The key combination this shortcut taps.
    pub fn chord(self) -> KeyChord {
        use Modifier::{Alt, Control, Shift};

        let ch = |c| HostKey::Char(c);
        match self {
            Self::Copy => KeyChord::new(ch('c'), &[Control]),
            Self::Paste => KeyChord::new(ch('v'), &[Control]),
            Self::Cut => KeyChord::new(ch('x'), &[Control]),
            Self::Undo => KeyChord::new(ch('z'), &[Control]),
            Self::Redo => KeyChord::new(ch('z'), &[Control, Shift]),
            Self::Save => KeyChord::new(ch('s'), &[Control]),
            Self::SelectAll => KeyChord::new(ch('a'), &[Control]),
            Self::Find => KeyChord::new(ch('f'), &[Control]),
            Self::NewTab => KeyChord::new(ch('t'), &[Control]),
            Self::CloseTab => KeyChord::new(ch('w'), &[Control]),
            Self::Refresh => KeyChord::new(HostKey::Named(NamedKey::Function(5)), &[]),
            Self::Screenshot => KeyChord::new(HostKey::Named(NamedKey::PrintScreen), &[]),
            Self::AltTab => KeyChord::new(HostKey::Named(NamedKey::Tab), &[Alt]),
            Self::TaskManager => KeyChord::new(HostKey::Named(NamedKey::Escape), &[Control, Shift]),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
