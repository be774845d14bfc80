//! HostActionGateway: turns commands into host-side effects.
//!
//! The gateway sits between the command dispatcher and two OS-facing
//! capabilities:
//!
//! - [`InputAutomation`] – pointer, keyboard, and clipboard primitives.
//! - [`SystemCommandRunner`] – submits a shell command without waiting.
//!
//! Every gateway method returns an [`ActionResult`].  Automation failures are
//! caught here and converted to `{success: false, error}`; nothing propagates
//! past this boundary to the transport.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use ermot_core::protocol::command::{MediaAction, MouseButton, SystemAction};
use ermot_core::protocol::keys::{HostKey, KeyChord, KeyParseError, NamedKey, ShortcutAction};
use ermot_core::protocol::result::{ActionDetail, ActionResult, Position, SkipDirection};

/// Error type for automation primitives.
#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("automation backend unavailable: {0}")]
    Unavailable(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error(transparent)]
    InvalidKey(#[from] KeyParseError),

    #[error("key {0} is not supported on this platform")]
    UnsupportedKey(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),

    #[error("failed to submit {command:?}: {source}")]
    Submit {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Pointer, keyboard, and clipboard primitives of the host desktop.
#[async_trait]
pub trait InputAutomation: Send + Sync {
    /// Moves the pointer relative to where it is now.
    async fn move_pointer_by(&self, dx: i32, dy: i32) -> Result<(), AutomationError>;

    async fn pointer_position(&self) -> Result<Position, AutomationError>;

    async fn click(&self, button: MouseButton, double: bool) -> Result<(), AutomationError>;

    /// Types `text` literally, independent of keyboard layout.
    async fn type_text(&self, text: &str) -> Result<(), AutomationError>;

    /// Presses the modifiers, taps the key, releases the modifiers.
    async fn tap(&self, chord: &KeyChord) -> Result<(), AutomationError>;

    async fn clipboard_text(&self) -> Result<String, AutomationError>;
}

/// Submits a shell command to the OS and returns without waiting for it.
///
/// `Ok` means "submitted", never "completed".
#[cfg_attr(test, mockall::automock)]
pub trait SystemCommandRunner: Send + Sync {
    fn submit(&self, command: &str) -> Result<(), AutomationError>;
}

// ── Power commands ────────────────────────────────────────────────────────────

/// OS family used to pick power commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
}

impl HostOs {
    /// The OS this binary was compiled for; anything not Windows or macOS is
    /// treated as Linux.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

/// Shell command implementing `action` on `os`.
pub fn power_command(os: HostOs, action: SystemAction) -> &'static str {
    match (os, action) {
        (HostOs::Windows, SystemAction::Lock) => "rundll32.exe user32.dll,LockWorkStation",
        (HostOs::Windows, SystemAction::Sleep) => "rundll32.exe powrprof.dll,SetSuspendState 0,1,0",
        (HostOs::Windows, SystemAction::Restart) => "shutdown /r /t 0",
        (HostOs::Windows, SystemAction::Shutdown) => "shutdown /s /t 0",
        (HostOs::MacOs, SystemAction::Lock) => "pmset displaysleepnow",
        (HostOs::MacOs, SystemAction::Sleep) => "pmset sleepnow",
        (HostOs::MacOs, SystemAction::Restart) => "sudo shutdown -r now",
        (HostOs::MacOs, SystemAction::Shutdown) => "sudo shutdown -h now",
        (HostOs::Linux, SystemAction::Lock) => "xdg-screensaver lock",
        (HostOs::Linux, SystemAction::Sleep) => "systemctl suspend",
        (HostOs::Linux, SystemAction::Restart) => "shutdown -r now",
        (HostOs::Linux, SystemAction::Shutdown) => "shutdown -h now",
    }
}

// ── Gateway ───────────────────────────────────────────────────────────────────

/// Translates commands into automation calls and structured results.
pub struct HostActionGateway {
    input: Arc<dyn InputAutomation>,
    runner: Arc<dyn SystemCommandRunner>,
    os: HostOs,
}

impl HostActionGateway {
    pub fn new(input: Arc<dyn InputAutomation>, runner: Arc<dyn SystemCommandRunner>) -> Self {
        Self::with_os(input, runner, HostOs::current())
    }

    pub fn with_os(
        input: Arc<dyn InputAutomation>,
        runner: Arc<dyn SystemCommandRunner>,
        os: HostOs,
    ) -> Self {
        Self { input, runner, os }
    }

    /// Moves the pointer by a (possibly fractional) delta and reports where
    /// it ended up.
    pub async fn move_pointer(&self, dx: f64, dy: f64) -> ActionResult {
        let outcome = async {
            self.input
                .move_pointer_by(dx.round() as i32, dy.round() as i32)
                .await?;
            self.input.pointer_position().await
        }
        .await;

        match outcome {
            Ok(position) => ActionResult::ok(ActionDetail::Moved { position }),
            Err(e) => failure("mouse move", e),
        }
    }

    pub async fn click(&self, button: MouseButton) -> ActionResult {
        match self.input.click(button, false).await {
            Ok(()) => ActionResult::ok(ActionDetail::Clicked { button }),
            Err(e) => failure("mouse click", e),
        }
    }

    pub async fn double_click(&self) -> ActionResult {
        match self.input.click(MouseButton::Left, true).await {
            Ok(()) => ActionResult::done(),
            Err(e) => failure("double click", e),
        }
    }

    /// Current pointer position, or `None` if the backend cannot tell.
    pub async fn pointer_position(&self) -> Option<Position> {
        match self.input.pointer_position().await {
            Ok(position) => Some(position),
            Err(e) => {
                debug!("pointer position unavailable: {e}");
                None
            }
        }
    }

    pub async fn type_text(&self, text: &str) -> ActionResult {
        match self.input.type_text(text).await {
            Ok(()) => ActionResult::ok(ActionDetail::Typed {
                text: text.to_string(),
            }),
            Err(e) => failure("keyboard type", e),
        }
    }

    /// Taps a controller-named key with controller-named modifiers.
    pub async fn press_key(&self, key: &str, modifiers: &[String]) -> ActionResult {
        match KeyChord::parse(key, modifiers) {
            Ok(chord) => self.tap(chord).await,
            Err(e) => failure("keyboard key", AutomationError::from(e)),
        }
    }

    pub async fn shortcut(&self, action: ShortcutAction) -> ActionResult {
        self.tap(action.chord()).await
    }

    /// Clipboard text; empty when the clipboard is empty, non-text, or
    /// unreadable.
    pub async fn clipboard_text(&self) -> String {
        match self.input.clipboard_text().await {
            Ok(text) => {
                debug!("clipboard read ({} chars)", text.chars().count());
                text
            }
            Err(e) => {
                warn!("clipboard read failed: {e}");
                String::new()
            }
        }
    }

    pub async fn media(&self, action: MediaAction) -> ActionResult {
        let named = |key| KeyChord::new(HostKey::Named(key), &[]);
        match action {
            MediaAction::PlayPause => self.tap(named(NamedKey::AudioPlay)).await,
            MediaAction::Next => self.tap(named(NamedKey::AudioNext)).await,
            MediaAction::Previous => self.tap(named(NamedKey::AudioPrev)).await,
            MediaAction::SkipBackward { seconds } => {
                self.skip(action, NamedKey::Left, SkipDirection::Backward, seconds)
                    .await
            }
            MediaAction::SkipForward { seconds } => {
                self.skip(action, NamedKey::Right, SkipDirection::Forward, seconds)
                    .await
            }
        }
    }

    /// Submits the power command for `action`; success means "submitted".
    pub fn system(&self, action: SystemAction) -> ActionResult {
        let command = power_command(self.os, action);
        match self.runner.submit(command) {
            Ok(()) => ActionResult::ok(ActionDetail::System { action }),
            Err(e) => failure(action.as_str(), e),
        }
    }

    async fn tap(&self, chord: KeyChord) -> ActionResult {
        match self.input.tap(&chord).await {
            Ok(()) => ActionResult::ok(ActionDetail::Pressed {
                key: chord.key.to_string(),
                modifiers: chord.modifier_names(),
            }),
            Err(e) => failure("key press", e),
        }
    }

    async fn skip(
        &self,
        action: MediaAction,
        key: NamedKey,
        direction: SkipDirection,
        seconds: u32,
    ) -> ActionResult {
        let chord = KeyChord::new(HostKey::Named(key), &[]);
        for _ in 0..action.presses() {
            if let Err(e) = self.input.tap(&chord).await {
                return failure("media skip", e);
            }
        }
        ActionResult::ok(ActionDetail::Skipped {
            action: direction,
            seconds,
        })
    }
}

fn failure(what: &str, error: AutomationError) -> ActionResult {
    warn!("{what} failed: {error}");
    ActionResult::failed(error.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::automation::mock::{MockAutomation, RecordedInput};
    use ermot_core::protocol::keys::Modifier;

    fn gateway_with(
        input: Arc<MockAutomation>,
        runner: MockSystemCommandRunner,
    ) -> HostActionGateway {
        HostActionGateway::with_os(input, Arc::new(runner), HostOs::Linux)
    }

    fn idle_runner() -> MockSystemCommandRunner {
        let mut runner = MockSystemCommandRunner::new();
        runner.expect_submit().never();
        runner
    }

    // ── Pointer ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_move_pointer_reports_absolute_position() {
        // Arrange
        let input = Arc::new(MockAutomation::at(100, 100));
        let gateway = gateway_with(Arc::clone(&input), idle_runner());

        // Act
        let result = gateway.move_pointer(10.0, -5.0).await;

        // Assert
        assert!(result.success);
        assert_eq!(result.position(), Some(Position { x: 110, y: 95 }));
        assert_eq!(input.recorded(), vec![RecordedInput::Move(10, -5)]);
    }

    #[tokio::test]
    async fn test_move_pointer_rounds_fractional_deltas() {
        let input = Arc::new(MockAutomation::at(0, 0));
        let gateway = gateway_with(Arc::clone(&input), idle_runner());

        gateway.move_pointer(2.6, -0.4).await;

        assert_eq!(input.recorded(), vec![RecordedInput::Move(3, 0)]);
    }

    #[tokio::test]
    async fn test_automation_failure_becomes_failed_result() {
        // Arrange
        let input = Arc::new(MockAutomation::failing());
        let gateway = gateway_with(input, idle_runner());

        // Act
        let result = gateway.move_pointer(1.0, 1.0).await;

        // Assert: no panic, no propagated error
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_double_click_is_left_button_twice() {
        let input = Arc::new(MockAutomation::at(0, 0));
        let gateway = gateway_with(Arc::clone(&input), idle_runner());

        let result = gateway.double_click().await;

        assert_eq!(result, ActionResult::done());
        assert_eq!(
            input.recorded(),
            vec![RecordedInput::Click(MouseButton::Left, true)]
        );
    }

    // ── Keyboard ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_press_key_reports_canonical_names() {
        let input = Arc::new(MockAutomation::at(0, 0));
        let gateway = gateway_with(Arc::clone(&input), idle_runner());

        let result = gateway
            .press_key("Enter", &["ctrl".to_string()])
            .await;

        assert_eq!(
            result,
            ActionResult::ok(ActionDetail::Pressed {
                key: "enter".to_string(),
                modifiers: vec!["control".to_string()],
            })
        );
        assert_eq!(
            input.recorded(),
            vec![RecordedInput::Tap(KeyChord::new(
                HostKey::Named(NamedKey::Enter),
                &[Modifier::Control]
            ))]
        );
    }

    #[tokio::test]
    async fn test_press_unknown_key_fails_without_touching_keyboard() {
        let input = Arc::new(MockAutomation::at(0, 0));
        let gateway = gateway_with(Arc::clone(&input), idle_runner());

        let result = gateway.press_key("warpdrive", &[]).await;

        assert!(!result.success);
        assert!(input.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_redo_shortcut_taps_ctrl_shift_z() {
        let input = Arc::new(MockAutomation::at(0, 0));
        let gateway = gateway_with(Arc::clone(&input), idle_runner());

        gateway.shortcut(ShortcutAction::Redo).await;

        assert_eq!(
            input.recorded(),
            vec![RecordedInput::Tap(KeyChord::new(
                HostKey::Char('z'),
                &[Modifier::Control, Modifier::Shift]
            ))]
        );
    }

    #[tokio::test]
    async fn test_clipboard_failure_yields_empty_text() {
        let input = Arc::new(MockAutomation::failing());
        let gateway = gateway_with(input, idle_runner());

        assert_eq!(gateway.clipboard_text().await, "");
    }

    // ── Media ─────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_skip_back_presses_left_twice() {
        // Arrange
        let input = Arc::new(MockAutomation::at(0, 0));
        let gateway = gateway_with(Arc::clone(&input), idle_runner());

        // Act
        let result = gateway
            .media(MediaAction::SkipBackward { seconds: 10 })
            .await;

        // Assert
        let left = RecordedInput::Tap(KeyChord::new(HostKey::Named(NamedKey::Left), &[]));
        assert_eq!(input.recorded(), vec![left.clone(), left]);
        assert_eq!(
            result,
            ActionResult::ok(ActionDetail::Skipped {
                action: SkipDirection::Backward,
                seconds: 10
            })
        );
    }

    #[tokio::test]
    async fn test_play_pause_taps_media_key() {
        let input = Arc::new(MockAutomation::at(0, 0));
        let gateway = gateway_with(Arc::clone(&input), idle_runner());

        let result = gateway.media(MediaAction::PlayPause).await;

        assert!(result.success);
        assert_eq!(
            input.recorded(),
            vec![RecordedInput::Tap(KeyChord::new(
                HostKey::Named(NamedKey::AudioPlay),
                &[]
            ))]
        );
    }

    // ── System ────────────────────────────────────────────────────────────────

    #[test]
    fn test_power_command_table() {
        assert_eq!(
            power_command(HostOs::Windows, SystemAction::Lock),
            "rundll32.exe user32.dll,LockWorkStation"
        );
        assert_eq!(power_command(HostOs::MacOs, SystemAction::Sleep), "pmset sleepnow");
        assert_eq!(
            power_command(HostOs::Linux, SystemAction::Shutdown),
            "shutdown -h now"
        );
        assert_eq!(
            power_command(HostOs::Windows, SystemAction::Restart),
            "shutdown /r /t 0"
        );
    }

    #[test]
    fn test_system_action_submits_command_for_host_os() {
        // Arrange
        let mut runner = MockSystemCommandRunner::new();
        runner
            .expect_submit()
            .withf(|cmd| cmd == "xdg-screensaver lock")
            .times(1)
            .returning(|_| Ok(()));
        let gateway = gateway_with(Arc::new(MockAutomation::at(0, 0)), runner);

        // Act
        let result = gateway.system(SystemAction::Lock);

        // Assert
        assert_eq!(
            result,
            ActionResult::ok(ActionDetail::System {
                action: SystemAction::Lock
            })
        );
    }

    #[test]
    fn test_system_submit_failure_is_reported() {
        let mut runner = MockSystemCommandRunner::new();
        runner.expect_submit().returning(|cmd| {
            Err(AutomationError::Submit {
                command: cmd.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no shell"),
            })
        });
        let gateway = gateway_with(Arc::new(MockAutomation::at(0, 0)), runner);

        let result = gateway.system(SystemAction::Sleep);

        assert!(!result.success);
        assert!(result.error.unwrap().contains("systemctl suspend"));
    }
}
