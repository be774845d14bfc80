//! Controller protocol: JSON envelopes over WebSocket text frames.

pub mod command;
pub mod event;
pub mod keys;
pub mod result;

pub use command::{
    decode_command, decode_volume_payload, parse_frame, CommandDecodeError, CommandName,
    ControllerCommand, Envelope, MediaAction, MouseButton, SystemAction,
};
pub use event::ControllerEvent;
pub use keys::{HostKey, KeyChord, KeyParseError, Modifier, NamedKey, ShortcutAction};
pub use result::{ActionDetail, ActionResult, Position, SkipDirection};
