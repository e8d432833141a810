//! Data-driven tuning
//!
//! Every section falls back to the constants in [`crate::consts`], so a
//! partial JSON document only overrides what it names. The web host reads
//! an optional `<script id="tuning" type="application/json">` block.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Puzzle thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleTuning {
    pub highlight_radius: f32,
    pub snap_radius: f32,
    pub shake_duration: f32,
}

impl Default for PuzzleTuning {
    fn default() -> Self {
        Self {
            highlight_radius: HIGHLIGHT_RADIUS,
            snap_radius: SNAP_RADIUS,
            shake_duration: SHAKE_DURATION,
        }
    }
}

/// Hoop toss physics and pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TossTuning {
    pub max_attempts: u32,
    pub gravity: f32,
    pub bounce: f32,
    pub force_per_unit: f32,
    pub max_force: f32,
    pub min_fall_speed: f32,
    pub settle_speed: f32,
    pub settle_delay: f32,
    pub game_end_grace: f32,
    pub score_marker_duration: f32,
}

impl Default for TossTuning {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            gravity: GRAVITY,
            bounce: BOUNCE,
            force_per_unit: FORCE_PER_UNIT,
            max_force: MAX_FORCE,
            min_fall_speed: MIN_FALL_SPEED,
            settle_speed: SETTLE_SPEED,
            settle_delay: SETTLE_DELAY,
            game_end_grace: GAME_END_GRACE,
            score_marker_duration: SCORE_MARKER_DURATION,
        }
    }
}

/// Screen flow pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTuning {
    pub transition: f32,
    pub start_reveal_delay: f32,
    pub puzzle_next_reveal_delay: f32,
    pub success_banner_duration: f32,
    pub game_next_reveal_delay: f32,
}

impl Default for FlowTuning {
    fn default() -> Self {
        Self {
            transition: SCREEN_TRANSITION,
            start_reveal_delay: START_REVEAL_DELAY,
            puzzle_next_reveal_delay: PUZZLE_NEXT_REVEAL_DELAY,
            success_banner_duration: SUCCESS_BANNER_DURATION,
            game_next_reveal_delay: GAME_NEXT_REVEAL_DELAY,
        }
    }
}

/// All tuning sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub puzzle: PuzzleTuning,
    pub toss: TossTuning,
    pub flow: FlowTuning,
}

impl Tuning {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the engines cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: "must be a finite, non-negative number",
                })
            }
        }

        if self.toss.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "toss.max_attempts",
                reason: "must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.toss.bounce) {
            return Err(ConfigError::Invalid {
                field: "toss.bounce",
                reason: "must be between 0 and 1",
            });
        }

        non_negative("puzzle.highlight_radius", self.puzzle.highlight_radius)?;
        non_negative("puzzle.snap_radius", self.puzzle.snap_radius)?;
        non_negative("puzzle.shake_duration", self.puzzle.shake_duration)?;
        non_negative("toss.gravity", self.toss.gravity)?;
        non_negative("toss.force_per_unit", self.toss.force_per_unit)?;
        non_negative("toss.max_force", self.toss.max_force)?;
        non_negative("toss.min_fall_speed", self.toss.min_fall_speed)?;
        non_negative("toss.settle_speed", self.toss.settle_speed)?;
        non_negative("toss.settle_delay", self.toss.settle_delay)?;
        non_negative("toss.game_end_grace", self.toss.game_end_grace)?;
        non_negative("toss.score_marker_duration", self.toss.score_marker_duration)?;
        non_negative("flow.transition", self.flow.transition)?;
        non_negative("flow.start_reveal_delay", self.flow.start_reveal_delay)?;
        non_negative("flow.puzzle_next_reveal_delay", self.flow.puzzle_next_reveal_delay)?;
        non_negative("flow.success_banner_duration", self.flow.success_banner_duration)?;
        non_negative("flow.game_next_reveal_delay", self.flow.game_next_reveal_delay)?;
        Ok(())
    }
}
