//! Error types
//!
//! Everything here is a local validation rejection. Nothing is retried.

use thiserror::Error;

/// Rejected drag operation (puzzle tile or toss ball)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DragError {
    #[error("nothing to grab under the pointer")]
    NoTarget,
    #[error("tile {0} does not exist")]
    UnknownTile(u8),
    #[error("tile {0} is locked in place")]
    TileLocked(u8),
    #[error("tile {0} is already being dragged")]
    AlreadyDragging(u8),
    #[error("no drag in progress")]
    NoActiveDrag,
    #[error("engine has not been initialized")]
    NotInitialized,
    #[error("no attempts left")]
    OutOfAttempts,
    #[error("game is over")]
    GameOver,
}

/// Rejected screen transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("invalid screen index {0}")]
    InvalidScreen(usize),
    #[error("cannot go from screen {from} back to screen {to}")]
    NotForward { from: usize, to: usize },
    #[error("transition to screen {0} already in progress")]
    TransitionInProgress(usize),
    #[error("control is not available on this screen")]
    ControlHidden,
}

/// Tuning could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// A required host element or handle is missing
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("missing element #{0}")]
    MissingElement(String),
    #[error("no global window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("expected {expected} screens, found {found}")]
    ScreenCount { expected: usize, found: usize },
    #[error("host error: {0}")]
    Host(String),
}
