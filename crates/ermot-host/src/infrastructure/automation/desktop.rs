//! Desktop automation through `enigo` (pointer, keyboard) and `arboard`
//! (clipboard).
//!
//! # Threading (for beginners)
//!
//! The platform handles inside `Enigo` and `Clipboard` are not `Send` on
//! every OS (macOS event sources, X11 connections), so they cannot move
//! between tokio worker threads.  Instead they live on one dedicated OS
//! thread, `ermot-automation`.  Async callers send that thread a boxed job
//! and await its answer on a `oneshot` channel:
//!
//! ```text
//!  tokio task ──job──► std::sync::mpsc ──► automation thread (owns Enigo)
//!      ▲                                          │
//!      └──────────── oneshot reply ◄──────────────┘
//! ```
//!
//! Jobs therefore run strictly one at a time, in arrival order.
//!
//! # Lazy connection
//!
//! The display connection is opened on first use, not at startup, so the
//! host still starts (and the rest of the channel still works) on a machine
//! without a desktop session.  A failed connection is retried on the next
//! command.

use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use ermot_core::protocol::command::MouseButton;
use ermot_core::protocol::keys::{HostKey, KeyChord, Modifier, NamedKey};
use ermot_core::protocol::result::Position;

use crate::application::host_actions::{AutomationError, InputAutomation};

type Job = Box<dyn FnOnce(&mut Backend) + Send>;

/// OS handles owned by the automation thread.
#[derive(Default)]
struct Backend {
    enigo: Option<Enigo>,
    clipboard: Option<arboard::Clipboard>,
}

impl Backend {
    fn enigo(&mut self) -> Result<&mut Enigo, AutomationError> {
        if self.enigo.is_none() {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| AutomationError::Unavailable(e.to_string()))?;
            info!("Automation: display connection opened");
            self.enigo = Some(enigo);
        }
        self.enigo
            .as_mut()
            .ok_or_else(|| AutomationError::Unavailable("no display connection".into()))
    }

    fn clipboard(&mut self) -> Result<&mut arboard::Clipboard, AutomationError> {
        if self.clipboard.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| AutomationError::Clipboard(e.to_string()))?;
            self.clipboard = Some(clipboard);
        }
        self.clipboard
            .as_mut()
            .ok_or_else(|| AutomationError::Clipboard("clipboard unavailable".into()))
    }

    fn tap(&mut self, chord: &KeyChord) -> Result<(), AutomationError> {
        let key = to_enigo_key(chord.key)?;
        let enigo = self.enigo()?;

        let mut held = Vec::with_capacity(chord.modifiers.len());
        let mut outcome = Ok(());
        for modifier in &chord.modifiers {
            let m = modifier_key(*modifier);
            if let Err(e) = enigo.key(m, Direction::Press) {
                outcome = Err(platform(e));
                break;
            }
            held.push(m);
        }
        if outcome.is_ok() {
            outcome = enigo.key(key, Direction::Click).map_err(platform);
        }
        // Release in reverse order even if the tap failed.
        for m in held.into_iter().rev() {
            if let Err(e) = enigo.key(m, Direction::Release) {
                warn!("Automation: failed to release {m:?}: {e}");
            }
        }
        outcome
    }
}

/// `InputAutomation` implementation running on the `ermot-automation` thread.
pub struct EnigoAutomation {
    jobs: mpsc::Sender<Job>,
}

impl EnigoAutomation {
    /// Starts the automation thread.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Unavailable`] if the thread cannot be spawned.
    pub fn start() -> Result<Self, AutomationError> {
        let (jobs, queue) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name("ermot-automation".to_string())
            .spawn(move || {
                let mut backend = Backend::default();
                for job in queue {
                    job(&mut backend);
                }
                debug!("Automation thread exiting");
            })
            .map_err(|e| AutomationError::Unavailable(format!("automation thread: {e}")))?;
        Ok(Self { jobs })
    }

    /// Runs `f` on the automation thread and waits for its result.
    async fn call<R, F>(&self, f: F) -> Result<R, AutomationError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Backend) -> Result<R, AutomationError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |backend| {
            let _ = reply_tx.send(f(backend));
        });
        self.jobs
            .send(job)
            .map_err(|_| AutomationError::Unavailable("automation thread stopped".into()))?;
        reply_rx
            .await
            .map_err(|_| AutomationError::Unavailable("automation thread stopped".into()))?
    }
}

#[async_trait]
impl InputAutomation for EnigoAutomation {
    async fn move_pointer_by(&self, dx: i32, dy: i32) -> Result<(), AutomationError> {
        self.call(move |b| {
            b.enigo()?
                .move_mouse(dx, dy, Coordinate::Rel)
                .map_err(platform)
        })
        .await
    }

    async fn pointer_position(&self) -> Result<Position, AutomationError> {
        self.call(|b| {
            let (x, y) = b.enigo()?.location().map_err(platform)?;
            Ok(Position { x, y })
        })
        .await
    }

    async fn click(&self, button: MouseButton, double: bool) -> Result<(), AutomationError> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            MouseButton::Middle => Button::Middle,
        };
        self.call(move |b| {
            let enigo = b.enigo()?;
            enigo.button(button, Direction::Click).map_err(platform)?;
            if double {
                enigo.button(button, Direction::Click).map_err(platform)?;
            }
            Ok(())
        })
        .await
    }

    async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        let text = text.to_string();
        self.call(move |b| b.enigo()?.text(&text).map_err(platform))
            .await
    }

    async fn tap(&self, chord: &KeyChord) -> Result<(), AutomationError> {
        let chord = chord.clone();
        self.call(move |b| b.tap(&chord)).await
    }

    async fn clipboard_text(&self) -> Result<String, AutomationError> {
        self.call(|b| {
            b.clipboard()?
                .get_text()
                .map_err(|e| AutomationError::Clipboard(e.to_string()))
        })
        .await
    }
}

// ── Key translation ───────────────────────────────────────────────────────────

fn platform(e: enigo::InputError) -> AutomationError {
    AutomationError::Platform(e.to_string())
}

fn modifier_key(modifier: Modifier) -> Key {
    match modifier {
        Modifier::Control => Key::Control,
        Modifier::Shift => Key::Shift,
        Modifier::Alt => Key::Alt,
        Modifier::Meta => Key::Meta,
    }
}

/// Maps a protocol key onto an `enigo` key.
fn to_enigo_key(key: HostKey) -> Result<Key, AutomationError> {
    let named = match key {
        HostKey::Char(c) => return Ok(Key::Unicode(c)),
        HostKey::Named(named) => named,
    };

    Ok(match named {
        NamedKey::Enter => Key::Return,
        NamedKey::Backspace => Key::Backspace,
        NamedKey::Tab => Key::Tab,
        NamedKey::Escape => Key::Escape,
        NamedKey::Space => Key::Space,
        NamedKey::Delete => Key::Delete,
        NamedKey::Home => Key::Home,
        NamedKey::End => Key::End,
        NamedKey::PageUp => Key::PageUp,
        NamedKey::PageDown => Key::PageDown,
        NamedKey::Up => Key::UpArrow,
        NamedKey::Down => Key::DownArrow,
        NamedKey::Left => Key::LeftArrow,
        NamedKey::Right => Key::RightArrow,
        NamedKey::CapsLock => Key::CapsLock,
        NamedKey::Control => Key::Control,
        NamedKey::Shift => Key::Shift,
        NamedKey::Alt => Key::Alt,
        NamedKey::Meta => Key::Meta,
        NamedKey::AudioPlay => Key::MediaPlayPause,
        NamedKey::AudioNext => Key::MediaNextTrack,
        NamedKey::AudioPrev => Key::MediaPrevTrack,
        NamedKey::AudioMute => Key::VolumeMute,
        NamedKey::AudioVolumeUp => Key::VolumeUp,
        NamedKey::AudioVolumeDown => Key::VolumeDown,
        NamedKey::Function(n) => function_key(n)?,
        NamedKey::Insert | NamedKey::PrintScreen => platform_only_key(named)?,
    })
}

fn function_key(n: u8) -> Result<Key, AutomationError> {
    Ok(match n {
        1 => Key::F1,
        2 => Key::F2,
        3 => Key::F3,
        4 => Key::F4,
        5 => Key::F5,
        6 => Key::F6,
        7 => Key::F7,
        8 => Key::F8,
        9 => Key::F9,
        10 => Key::F10,
        11 => Key::F11,
        12 => Key::F12,
        _ => return Err(AutomationError::UnsupportedKey(format!("f{n}"))),
    })
}

#[cfg(not(target_os = "macos"))]
fn platform_only_key(key: NamedKey) -> Result<Key, AutomationError> {
    match key {
        NamedKey::Insert => Ok(Key::Insert),
        NamedKey::PrintScreen => Ok(Key::PrintScr),
        other => Err(AutomationError::UnsupportedKey(other.name())),
    }
}

/// macOS keyboards have neither Insert nor Print Screen.
#[cfg(target_os = "macos")]
fn platform_only_key(key: NamedKey) -> Result<Key, AutomationError> {
    Err(AutomationError::UnsupportedKey(key.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characters_map_to_unicode_keys() {
        assert_eq!(to_enigo_key(HostKey::Char('z')).unwrap(), Key::Unicode('z'));
    }

    #[test]
    fn test_named_keys_map_to_enigo_keys() {
        assert_eq!(
            to_enigo_key(HostKey::Named(NamedKey::Enter)).unwrap(),
            Key::Return
        );
        assert_eq!(
            to_enigo_key(HostKey::Named(NamedKey::Left)).unwrap(),
            Key::LeftArrow
        );
        assert_eq!(
            to_enigo_key(HostKey::Named(NamedKey::AudioPlay)).unwrap(),
            Key::MediaPlayPause
        );
        assert_eq!(
            to_enigo_key(HostKey::Named(NamedKey::Function(5))).unwrap(),
            Key::F5
        );
    }

    #[test]
    fn test_function_key_out_of_range_is_unsupported() {
        assert!(matches!(
            function_key(13),
            Err(AutomationError::UnsupportedKey(name)) if name == "f13"
        ));
    }

    #[test]
    fn test_modifiers_map_to_modifier_keys() {
        assert_eq!(modifier_key(Modifier::Control), Key::Control);
        assert_eq!(modifier_key(Modifier::Meta), Key::Meta);
    }
}
