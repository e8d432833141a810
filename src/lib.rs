//! Rosita Hoops - intro, tile puzzle, hoop toss, results
//!
//! Core modules:
//! - `sim`: Deterministic engines (tile puzzle, hoop toss, timers, input)
//! - `flow`: Screen sequencing and the shared session counters
//! - `geometry`: Distance and nearest-target helpers
//! - `config`: Data-driven tuning loaded from JSON
//! - `share`: Result and share-message text

pub mod config;
pub mod error;
pub mod flow;
pub mod geometry;
pub mod share;
pub mod sim;

pub use config::Tuning;
pub use error::{ConfigError, DragError, FlowError, SetupError};
pub use flow::{App, AppFlowState, Control, Screen, Scoreboard, Snapshot};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Puzzle grid is GRID_SIDE x GRID_SIDE
    pub const GRID_SIDE: usize = 4;
    pub const TILE_COUNT: usize = GRID_SIDE * GRID_SIDE;
    /// Rendered edge length of a tile / slot
    pub const TILE_SIZE: f32 = 80.0;
    pub const SLOT_GAP: f32 = 2.0;
    /// Pointer within this distance of a slot center highlights it
    pub const HIGHLIGHT_RADIUS: f32 = 50.0;
    /// Tile center within this distance of a slot center attempts placement
    pub const SNAP_RADIUS: f32 = 80.0;
    /// Wrong-slot shake feedback (seconds)
    pub const SHAKE_DURATION: f32 = 0.5;

    /// Playfield dimensions
    pub const FIELD_WIDTH: f32 = 400.0;
    pub const FIELD_HEIGHT: f32 = 600.0;
    /// Downward acceleration (units/s²)
    pub const GRAVITY: f32 = 800.0;
    /// Velocity retained after hitting a wall
    pub const BOUNCE: f32 = 0.6;

    /// Ball defaults
    pub const BALL_SIZE: f32 = 40.0;
    pub const LAUNCH_X: f32 = 200.0;
    pub const LAUNCH_Y: f32 = FIELD_HEIGHT - 100.0;

    /// Hoop: left edge x, vertical center y
    pub const HOOP_X: f32 = FIELD_WIDTH - 100.0;
    pub const HOOP_Y: f32 = 200.0;
    pub const HOOP_WIDTH: f32 = 120.0;
    pub const HOOP_HEIGHT: f32 = 20.0;

    /// Launch force per unit of drag distance
    pub const FORCE_PER_UNIT: f32 = 3.0;
    /// Launch force cap
    pub const MAX_FORCE: f32 = 800.0;
    /// Minimum downward speed for a basket to count
    pub const MIN_FALL_SPEED: f32 = 100.0;
    /// Ball counts as settled below this speed on each axis
    pub const SETTLE_SPEED: f32 = 10.0;
    /// Height of the bottom band where a settled ball gets recalled
    pub const SETTLE_BAND: f32 = 200.0;
    /// How far below the playfield the ball may drop before recall
    pub const OFFSCREEN_MARGIN: f32 = 50.0;

    pub const MAX_ATTEMPTS: u32 = 5;

    /// Deferred effect delays (seconds)
    pub const SETTLE_DELAY: f32 = 2.0;
    pub const GAME_END_GRACE: f32 = 3.0;
    pub const SCORE_MARKER_DURATION: f32 = 1.0;
    pub const SCREEN_TRANSITION: f32 = 0.15;
    pub const START_REVEAL_DELAY: f32 = 3.0;
    pub const PUZZLE_NEXT_REVEAL_DELAY: f32 = 2.0;
    pub const SUCCESS_BANNER_DURATION: f32 = 3.0;
    pub const GAME_NEXT_REVEAL_DELAY: f32 = 1.0;
}

/// Angle from `from` toward `to` (radians, screen coordinates)
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
