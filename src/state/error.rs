//! Engine errors.

use super::results::PersistenceError;

/// Errors surfaced to callers of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum GameError {
    /// No live session with this id
    SessionNotFound,
    /// Session already reached a terminal state
    SessionAlreadyCompleted,
    /// Request or configuration cannot be played
    InvalidConfiguration(String),
    /// The result store rejected a write
    Persistence(PersistenceError),
}

impl GameError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Short machine-readable code, suitable for a response body.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound => "session_not_found",
            Self::SessionAlreadyCompleted => "session_already_completed",
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::Persistence(_) => "persistence_error",
        }
    }
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionNotFound => write!(f, "Game session not found"),
            Self::SessionAlreadyCompleted => write!(f, "Game session is already completed"),
            Self::InvalidConfiguration(reason) => write!(f, "Invalid configuration: {}", reason),
            Self::Persistence(e) => write!(f, "Failed to record result: {}", e),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Persistence(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PersistenceError> for GameError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e)
    }
}
