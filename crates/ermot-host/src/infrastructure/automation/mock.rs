//! Mock automation backend for testing.
//!
//! # Why a mock backend?
//!
//! The real backend moves the cursor and presses keys on whatever desktop
//! the tests happen to run on, and it needs a display server to exist at
//! all.  `MockAutomation` keeps a virtual pointer and records every call in
//! order so assertions can check exactly what would have been injected.
//!
//! # Usage in tests
//!
//! ```ignore
//! let input = Arc::new(MockAutomation::at(100, 100));
//! let gateway = HostActionGateway::new(input.clone(), runner);
//!
//! gateway.move_pointer(10.0, -5.0).await;
//!
//! assert_eq!(input.recorded(), vec![RecordedInput::Move(10, -5)]);
//! ```
//!
//! # `should_fail` flag
//!
//! A mock built with [`MockAutomation::failing`] returns
//! `AutomationError::Platform` from every method, which exercises the
//! gateway's error folding without a broken OS.

use std::sync::Mutex;

use async_trait::async_trait;

use ermot_core::protocol::command::MouseButton;
use ermot_core::protocol::keys::KeyChord;
use ermot_core::protocol::result::Position;

use crate::application::host_actions::{AutomationError, InputAutomation};

/// One recorded automation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedInput {
    Move(i32, i32),
    Click(MouseButton, bool),
    Type(String),
    Tap(KeyChord),
}

/// Records every call instead of touching the OS.
#[derive(Debug, Default)]
pub struct MockAutomation {
    position: Mutex<Position>,
    clipboard: String,
    recorded: Mutex<Vec<RecordedInput>>,
    /// When `true`, every method returns `AutomationError::Platform`.
    pub should_fail: bool,
    /// When `true`, only input synthesis fails; position and clipboard
    /// queries still answer.
    pub reject_input: bool,
}

impl MockAutomation {
    /// A working backend whose pointer starts at `(x, y)`.
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            position: Mutex::new(Position { x, y }),
            ..Self::default()
        }
    }

    /// A backend on which every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// A backend at `(x, y)` that refuses to move, click, type or press.
    pub fn rejecting_input(x: i32, y: i32) -> Self {
        Self {
            reject_input: true,
            ..Self::at(x, y)
        }
    }

    /// Sets the text `clipboard_text` returns.
    pub fn with_clipboard(mut self, text: impl Into<String>) -> Self {
        self.clipboard = text.into();
        self
    }

    /// Calls so far, oldest first.
    pub fn recorded(&self) -> Vec<RecordedInput> {
        self.recorded.lock().unwrap().clone()
    }

    fn record(&self, input: RecordedInput) -> Result<(), AutomationError> {
        self.check()?;
        if self.reject_input {
            return Err(AutomationError::Platform("input rejected".into()));
        }
        self.recorded.lock().unwrap().push(input);
        Ok(())
    }

    fn check(&self) -> Result<(), AutomationError> {
        if self.should_fail {
            return Err(AutomationError::Platform("mock failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl InputAutomation for MockAutomation {
    async fn move_pointer_by(&self, dx: i32, dy: i32) -> Result<(), AutomationError> {
        self.record(RecordedInput::Move(dx, dy))?;
        let mut position = self.position.lock().unwrap();
        position.x += dx;
        position.y += dy;
        Ok(())
    }

    async fn pointer_position(&self) -> Result<Position, AutomationError> {
        self.check()?;
        Ok(*self.position.lock().unwrap())
    }

    async fn click(&self, button: MouseButton, double: bool) -> Result<(), AutomationError> {
        self.record(RecordedInput::Click(button, double))
    }

    async fn type_text(&self, text: &str) -> Result<(), AutomationError> {
        self.record(RecordedInput::Type(text.to_string()))
    }

    async fn tap(&self, chord: &KeyChord) -> Result<(), AutomationError> {
        self.record(RecordedInput::Tap(chord.clone()))
    }

    async fn clipboard_text(&self) -> Result<String, AutomationError> {
        self.check()?;
        Ok(self.clipboard.clone())
    }
}
