//! Structured results returned to the controller that issued a command.

use serde::Serialize;

use crate::protocol::command::{MouseButton, SystemAction};

/// Absolute pointer position in host screen pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Direction of a media skip, as reported back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipDirection {
    #[serde(rename = "skipBackward")]
    Backward,
    #[serde(rename = "skipForward")]
    Forward,
}

/// Action-specific fields merged into the result object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionDetail {
    Moved { position: Position },
    Clicked { button: MouseButton },
    Typed { text: String },
    Pressed { key: String, modifiers: Vec<String> },
    Skipped { action: SkipDirection, seconds: u32 },
    System { action: SystemAction },
}

/// `{success, ...detail, error?}`.
///
/// Produced by the host action gateway; never retried or queued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(flatten)]
    pub detail: Option<ActionDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok(detail: ActionDetail) -> Self {
        Self {
            success: true,
            detail: Some(detail),
            error: None,
        }
    }

    /// Success with no extra fields (double-click).
    pub fn done() -> Self {
        Self {
            success: true,
            detail: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: None,
            error: Some(error.into()),
        }
    }

    /// Pointer position, when this is a successful move result.
    pub fn position(&self) -> Option<Position> {
        match self.detail {
            Some(ActionDetail::Moved { position }) => Some(position),
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
