//! Pointer input and the fixed-step frame clock
//!
//! Hosts translate mouse/touch/pointer events into [`PointerInput`] and hand
//! them to whichever engine owns the active screen.

use glam::Vec2;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::error::DragError;

/// One pointer event in playfield coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    /// Press on `target` (a tile id for the puzzle; ignored by the toss game)
    Start { target: Option<u8>, pos: Vec2 },
    Move { pos: Vec2 },
    End { pos: Vec2 },
}

/// Drag capability shared by both engines
pub trait DragHandler {
    fn on_drag_start(&mut self, target: Option<u8>, pos: Vec2) -> Result<(), DragError>;
    fn on_drag_move(&mut self, pos: Vec2) -> Result<(), DragError>;
    fn on_drag_end(&mut self, pos: Vec2) -> Result<(), DragError>;

    /// Dispatch one input. Rejections are expected (locked tiles, taps after
    /// game over) and only logged.
    fn handle(&mut self, input: PointerInput) -> bool {
        let result = match input {
            PointerInput::Start { target, pos } => self.on_drag_start(target, pos),
            PointerInput::Move { pos } => self.on_drag_move(pos),
            PointerInput::End { pos } => self.on_drag_end(pos),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Ignored {:?}: {}", input, e);
                false
            }
        }
    }
}

/// Fixed-timestep accumulator
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a frame delta (seconds) and get the number of [`SIM_DT`] steps to run
    pub fn push(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
