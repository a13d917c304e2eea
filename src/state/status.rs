//! Session status machine.
//!
//! # State Diagram
//!
//! ```text
//!                correct (expected < count)
//!                 ┌───────────┐
//!                 │           ▼
//! ┌─────────────────────────────────┐  correct (expected == count)  ┌─────┐
//! │   AwaitingClick { expected }    │──────────────────────────────▶│ Won │
//! └───────┬────────────────┬────────┘                               └─────┘
//!         │ wrong          │ abandon
//!         ▼                ▼
//!     ┌──────┐       ┌───────────┐
//!     │ Lost │       │ Abandoned │
//!     └──────┘       └───────────┘
//! ```
//!
//! `Won`, `Lost` and `Abandoned` are terminal.

use std::fmt;

use serde::Serialize;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Waiting for the target numbered `expected`
    AwaitingClick { expected: u32 },
    /// Every target clicked in order
    Won,
    /// A target was clicked out of order
    Lost,
    /// Player quit before finishing
    Abandoned,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::AwaitingClick { expected: 1 }
    }
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingClick { .. } => "awaiting_click",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Abandoned => "abandoned",
        }
    }

    /// Check if the session can still receive clicks.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::AwaitingClick { .. })
    }

    /// Check if the session is finished (cannot change).
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Expected number while active.
    pub fn expected(&self) -> Option<u32> {
        match self {
            Self::AwaitingClick { expected } => Some(*expected),
            _ => None,
        }
    }

    /// Compute the status after `event` in a session of `count` targets.
    pub fn apply(&self, event: SessionEvent, count: u32) -> Result<Self, InvalidTransition> {
        use SessionEvent::*;
        use SessionStatus::*;

        let invalid = |reason: &'static str| InvalidTransition {
            from: *self,
            event,
            reason,
        };

        match (*self, event) {
            (AwaitingClick { expected }, CorrectClick) if expected >= count => Ok(Won),
            (AwaitingClick { expected }, CorrectClick) => Ok(AwaitingClick {
                expected: expected + 1,
            }),
            (AwaitingClick { .. }, WrongClick) => Ok(Lost),
            (AwaitingClick { .. }, Abandon) => Ok(Abandoned),

            (Won, _) => Err(invalid("Session already won")),
            (Lost, _) => Err(invalid("Session already lost")),
            (Abandoned, _) => Err(invalid("Session was abandoned")),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingClick { expected } => write!(f, "AwaitingClick({})", expected),
            Self::Won => write!(f, "Won"),
            Self::Lost => write!(f, "Lost"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}

/// Status transition events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    CorrectClick,
    WrongClick,
    Abandon,
}

/// Error when a status transition is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: SessionStatus,
    pub event: SessionEvent,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid transition from {} via {:?}: {}",
            self.from, self.event, self.reason
        )
    }
}

impl std::error::Error for InvalidTransition {}
