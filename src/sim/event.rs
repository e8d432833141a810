//! Events emitted by the engines and the flow controller.
//! The presentation layer consumes these for counters, effects and controls.

use glam::Vec2;
use serde::Serialize;

/// Why the ball went back to the launch point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// Dropped below the playfield
    OffScreen,
    /// Sat still in the bottom band for the settle delay
    Settled,
}

/// Buttons the flow reveals over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Control {
    Start,
    PuzzleNext,
    GameNext,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ScreenChanged { index: usize },
    ControlRevealed(Control),
    Restarted,

    // Puzzle
    /// `None` clears any highlight
    SlotHighlighted { slot: Option<u8> },
    TileLocked { tile: u8 },
    IncorrectPlacement { tile: u8 },
    ShakeCleared { tile: u8 },
    PuzzleProgress { placed: u8, percent: u8 },
    PuzzleCompleted,
    SuccessBannerHidden,

    // Hoop toss
    BallLaunched { velocity: Vec2 },
    AttemptConsumed { attempts: u32, remaining: u32 },
    Scored { score: u32, at: Vec2 },
    ScoreMarkerCleared,
    BallReset { reason: ResetReason },
    GameEnded { score: u32, max_attempts: u32 },
}
