//! Controller → host command catalogue and payload decoding.
//!
//! Every WebSocket text frame from a controller is a JSON envelope:
//!
//! ```json
//! {"event": "mouse-move", "payload": {"x": 10, "y": -5}}
//! ```
//!
//! Decoding happens in two steps: the event name is matched against the
//! fixed [`CommandName`] catalogue, then the payload is decoded into the
//! shape that command expects.  Anything that does not fit is rejected with a
//! [`CommandDecodeError`]; the host logs and drops it without replying.
//!
//! # `set-volume` payloads
//!
//! Mobile clients have historically sent the level in several shapes, so
//! `set-volume` accepts a tagged union:
//!
//! | Payload          | Meaning                                  |
//! |------------------|------------------------------------------|
//! | `75`             | bare number                              |
//! | `"75"`           | JSON text of a number                    |
//! | `"{\"data\":75}"`| JSON text of a wrapped number            |
//! | `{"data": 75}`   | wrapped number                           |
//! | `{"data": "75"}` | wrapped JSON text of a number            |
//!
//! Everything else (`null`, `{"data":"abc"}`, arrays, booleans) is rejected.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error produced when a frame cannot be turned into a [`ControllerCommand`].
#[derive(Debug, Error)]
pub enum CommandDecodeError {
    #[error("frame is not a JSON envelope: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    #[error("unknown event {0:?}")]
    UnknownEvent(String),

    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload { event: CommandName, reason: String },

    #[error("invalid volume payload: {0}")]
    InvalidVolume(String),
}

/// Raw envelope as received on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub event: String,
    /// Absent payloads deserialize as `Value::Null`.
    #[serde(default)]
    pub payload: Value,
}

// ── Catalogue ─────────────────────────────────────────────────────────────────

macro_rules! command_names {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        /// Every event name a controller may send.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CommandName {
            $($variant),+
        }

        impl CommandName {
            pub const ALL: &'static [CommandName] = &[$(CommandName::$variant),+];

            /// Wire name, e.g. `"mouse-move"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(CommandName::$variant => $wire),+
                }
            }
        }

        impl FromStr for CommandName {
            type Err = CommandDecodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(CommandName::$variant),)+
                    other => Err(CommandDecodeError::UnknownEvent(other.to_string())),
                }
            }
        }
    };
}

command_names! {
    QueryVolume => "query-volume",
    SetVolume => "set-volume",
    MouseMove => "mouse-move",
    MouseClick => "mouse-click",
    MouseDoubleClick => "mouse-double-click",
    KeyboardType => "keyboard-type",
    KeyboardKey => "keyboard-key",
    KeyboardShortcut => "keyboard-shortcut",
    KeyboardGetClipboard => "keyboard-get-clipboard",
    MediaPlayPause => "media-play-pause",
    MediaNext => "media-next",
    MediaPrevious => "media-previous",
    MediaSkipBack10 => "media-skip-back-10",
    MediaSkipForward10 => "media-skip-forward-10",
    SystemLock => "system-lock",
    SystemSleep => "system-sleep",
    SystemRestart => "system-restart",
    SystemShutdown => "system-shutdown",
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payload types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

/// Seconds covered by one arrow-key press when approximating a seek.
pub const SECONDS_PER_SKIP_PRESS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    PlayPause,
    Next,
    Previous,
    SkipBackward { seconds: u32 },
    SkipForward { seconds: u32 },
}

impl MediaAction {
    /// Arrow-key presses for a skip: `ceil(seconds / 5)`; zero otherwise.
    pub fn presses(self) -> u32 {
        match self {
            Self::SkipBackward { seconds } | Self::SkipForward { seconds } => {
                seconds.div_ceil(SECONDS_PER_SKIP_PRESS)
            }
            _ => 0,
        }
    }
}

/// Power-state actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemAction {
    Lock,
    Sleep,
    Restart,
    Shutdown,
}

impl SystemAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lock => "lock",
            Self::Sleep => "sleep",
            Self::Restart => "restart",
            Self::Shutdown => "shutdown",
        }
    }
}

/// A fully decoded command.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCommand {
    QueryVolume,
    /// Requested level before clamping.
    SetVolume { requested: f64 },
    MouseMove { dx: f64, dy: f64 },
    MouseClick { button: MouseButton },
    MouseDoubleClick,
    KeyboardType { text: String },
    KeyboardKey { key: String, modifiers: Vec<String> },
    /// Shortcut names are resolved by the dispatcher; unknown ones are ignored there.
    KeyboardShortcut { action: String },
    KeyboardGetClipboard,
    Media(MediaAction),
    System(SystemAction),
}

#[derive(Deserialize)]
struct MoveDelta {
    x: f64,
    y: f64,
}

#[derive(Deserialize, Default)]
struct ClickPayload {
    #[serde(default)]
    button: MouseButton,
}

#[derive(Deserialize)]
struct TypePayload {
    text: String,
}

#[derive(Deserialize)]
struct KeyPayload {
    key: String,
    /// Absent and `null` both mean "no modifiers".
    #[serde(default)]
    modifiers: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ShortcutPayload {
    action: String,
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Parses a text frame and decodes the command it carries.
pub fn parse_frame(text: &str) -> Result<ControllerCommand, CommandDecodeError> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(CommandDecodeError::MalformedFrame)?;
    decode_command(&envelope)
}

/// Decodes an envelope into a typed command.
pub fn decode_command(envelope: &Envelope) -> Result<ControllerCommand, CommandDecodeError> {
    let name: CommandName = envelope.event.parse()?;
    let payload = &envelope.payload;

    let command = match name {
        CommandName::QueryVolume => ControllerCommand::QueryVolume,
        CommandName::SetVolume => ControllerCommand::SetVolume {
            requested: decode_volume_payload(payload)?,
        },
        CommandName::MouseMove => {
            let delta: MoveDelta = required(name, payload)?;
            ControllerCommand::MouseMove {
                dx: delta.x,
                dy: delta.y,
            }
        }
        CommandName::MouseClick => {
            let click: ClickPayload = optional(name, payload)?;
            ControllerCommand::MouseClick {
                button: click.button,
            }
        }
        CommandName::MouseDoubleClick => ControllerCommand::MouseDoubleClick,
        CommandName::KeyboardType => {
            let typed: TypePayload = required(name, payload)?;
            ControllerCommand::KeyboardType { text: typed.text }
        }
        CommandName::KeyboardKey => {
            let key: KeyPayload = required(name, payload)?;
            ControllerCommand::KeyboardKey {
                key: key.key,
                modifiers: key.modifiers.unwrap_or_default(),
            }
        }
        CommandName::KeyboardShortcut => {
            let shortcut: ShortcutPayload = required(name, payload)?;
            ControllerCommand::KeyboardShortcut {
                action: shortcut.action,
            }
        }
        CommandName::KeyboardGetClipboard => ControllerCommand::KeyboardGetClipboard,
        CommandName::MediaPlayPause => ControllerCommand::Media(MediaAction::PlayPause),
        CommandName::MediaNext => ControllerCommand::Media(MediaAction::Next),
        CommandName::MediaPrevious => ControllerCommand::Media(MediaAction::Previous),
        CommandName::MediaSkipBack10 => {
            ControllerCommand::Media(MediaAction::SkipBackward { seconds: 10 })
        }
        CommandName::MediaSkipForward10 => {
            ControllerCommand::Media(MediaAction::SkipForward { seconds: 10 })
        }
        CommandName::SystemLock => ControllerCommand::System(SystemAction::Lock),
        CommandName::SystemSleep => ControllerCommand::System(SystemAction::Sleep),
        CommandName::SystemRestart => ControllerCommand::System(SystemAction::Restart),
        CommandName::SystemShutdown => ControllerCommand::System(SystemAction::Shutdown),
    };
    Ok(command)
}

fn required<T: DeserializeOwned>(
    name: CommandName,
    payload: &Value,
) -> Result<T, CommandDecodeError> {
    T::deserialize(payload).map_err(|e| CommandDecodeError::InvalidPayload {
        event: name,
        reason: e.to_string(),
    })
}

/// Like [`required`], but an absent payload means "all defaults".
fn optional<T: DeserializeOwned + Default>(
    name: CommandName,
    payload: &Value,
) -> Result<T, CommandDecodeError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    required(name, payload)
}

/// The accepted `set-volume` shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum VolumePayload {
    Level(f64),
    Encoded(String),
    Wrapped { data: WrappedLevel },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WrappedLevel {
    Level(f64),
    Encoded(String),
}

/// Decodes a `set-volume` payload into the requested (unclamped) level.
pub fn decode_volume_payload(payload: &Value) -> Result<f64, CommandDecodeError> {
    let decoded = volume_shape(payload)
        .ok_or_else(|| CommandDecodeError::InvalidVolume(payload.to_string()))?;

    let level = match decoded {
        VolumePayload::Level(level) => level,
        VolumePayload::Wrapped {
            data: WrappedLevel::Level(level),
        } => level,
        VolumePayload::Wrapped {
            data: WrappedLevel::Encoded(text),
        } => parse_encoded_number(&text)?,
        VolumePayload::Encoded(text) => {
            let inner: Value = serde_json::from_str(&text)
                .map_err(|_| CommandDecodeError::InvalidVolume(text.clone()))?;
            // One level of nesting only: the decoded text may not be text again.
            match volume_shape(&inner) {
                Some(VolumePayload::Level(level)) => level,
                Some(VolumePayload::Wrapped {
                    data: WrappedLevel::Level(level),
                }) => level,
                _ => return Err(CommandDecodeError::InvalidVolume(text)),
            }
        }
    };

    if level.is_nan() {
        return Err(CommandDecodeError::InvalidVolume(payload.to_string()));
    }
    Ok(level)
}

/// Matches a value against [`VolumePayload`]; only scalars and objects qualify.
fn volume_shape(value: &Value) -> Option<VolumePayload> {
    // serde would happily read `[75]` as the struct variant `{data: 75}`.
    if value.is_array() {
        return None;
    }
    VolumePayload::deserialize(value).ok()
}

fn parse_encoded_number(text: &str) -> Result<f64, CommandDecodeError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| CommandDecodeError::InvalidVolume(text.to_string())),
        _ => Err(CommandDecodeError::InvalidVolume(text.to_string())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(event: &str, payload: Value) -> Envelope {
        Envelope {
            event: event.to_string(),
            payload,
        }
    }

    // ── Catalogue ─────────────────────────────────────────────────────────────

    #[test]
    fn test_every_command_name_parses_back_from_its_wire_name() {
        for name in CommandName::ALL {
            assert_eq!(name.as_str().parse::<CommandName>().unwrap(), *name);
        }
        assert_eq!(CommandName::ALL.len(), 18);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let err = decode_command(&envelope("launch-rockets", Value::Null)).unwrap_err();
        assert!(matches!(err, CommandDecodeError::UnknownEvent(e) if e == "launch-rockets"));
    }

    // ── set-volume ────────────────────────────────────────────────────────────

    #[test]
    fn test_volume_shapes_decode_to_same_level() {
        let shapes = [
            json!(75),
            json!("75"),
            json!({"data": 75}),
            json!({"data": "75"}),
            json!("{\"data\":75}"),
        ];
        for shape in shapes {
            assert_eq!(
                decode_volume_payload(&shape).unwrap(),
                75.0,
                "shape {shape} must decode"
            );
        }
    }

    #[test]
    fn test_volume_rejects_non_numeric_shapes() {
        let shapes = [
            json!({"data": "abc"}),
            Value::Null,
            json!("abc"),
            json!(true),
            json!([75]),
            json!("[75]"),
            json!({"level": 75}),
            json!("\"75\""),
            json!({"data": null}),
        ];
        for shape in shapes {
            assert!(
                decode_volume_payload(&shape).is_err(),
                "shape {shape} must be rejected"
            );
        }
    }

    #[test]
    fn test_volume_keeps_fractional_levels_for_clamping() {
        assert_eq!(decode_volume_payload(&json!(50.6)).unwrap(), 50.6);
    }

    // ── Other commands ────────────────────────────────────────────────────────

    #[test]
    fn test_mouse_move_requires_both_deltas() {
        let ok = decode_command(&envelope("mouse-move", json!({"x": 10, "y": -5}))).unwrap();
        assert_eq!(ok, ControllerCommand::MouseMove { dx: 10.0, dy: -5.0 });

        let missing = decode_command(&envelope("mouse-move", json!({"x": 10})));
        assert!(matches!(
            missing,
            Err(CommandDecodeError::InvalidPayload {
                event: CommandName::MouseMove,
                ..
            })
        ));
    }

    #[test]
    fn test_mouse_click_defaults_to_left_button() {
        assert_eq!(
            decode_command(&envelope("mouse-click", Value::Null)).unwrap(),
            ControllerCommand::MouseClick {
                button: MouseButton::Left
            }
        );
        assert_eq!(
            decode_command(&envelope("mouse-click", json!({}))).unwrap(),
            ControllerCommand::MouseClick {
                button: MouseButton::Left
            }
        );
        assert_eq!(
            decode_command(&envelope("mouse-click", json!({"button": "right"}))).unwrap(),
            ControllerCommand::MouseClick {
                button: MouseButton::Right
            }
        );
    }

    #[test]
    fn test_keyboard_key_modifiers_default_to_empty() {
        let expected = ControllerCommand::KeyboardKey {
            key: "enter".to_string(),
            modifiers: vec![],
        };

        let absent = decode_command(&envelope("keyboard-key", json!({"key": "enter"}))).unwrap();
        let null = decode_command(&envelope(
            "keyboard-key",
            json!({"key": "enter", "modifiers": null}),
        ))
        .unwrap();

        assert_eq!(absent, expected);
        assert_eq!(null, expected);
    }

    #[test]
    fn test_unknown_shortcut_still_decodes() {
        let cmd =
            decode_command(&envelope("keyboard-shortcut", json!({"action": "nope"}))).unwrap();
        assert_eq!(
            cmd,
            ControllerCommand::KeyboardShortcut {
                action: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_skip_commands_cover_ten_seconds_in_two_presses() {
        let cmd = decode_command(&envelope("media-skip-back-10", Value::Null)).unwrap();
        assert_eq!(
            cmd,
            ControllerCommand::Media(MediaAction::SkipBackward { seconds: 10 })
        );
        if let ControllerCommand::Media(action) = cmd {
            assert_eq!(action.presses(), 2);
        }
        assert_eq!(MediaAction::SkipForward { seconds: 11 }.presses(), 3);
        assert_eq!(MediaAction::PlayPause.presses(), 0);
    }

    #[test]
    fn test_parse_frame_handles_missing_payload() {
        let cmd = parse_frame(r#"{"event":"system-lock"}"#).unwrap();
        assert_eq!(cmd, ControllerCommand::System(SystemAction::Lock));
    }

    #[test]
    fn test_parse_frame_rejects_non_json() {
        assert!(matches!(
            parse_frame("mouse-move 10 -5"),
            Err(CommandDecodeError::MalformedFrame(_))
        ));
    }
}
