//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through explicit `tick`/`step` calls
//! - Seeded RNG only
//! - Deferred effects are keyed, cancellable timers
//! - No rendering or platform dependencies

pub mod event;
pub mod input;
pub mod physics;
pub mod puzzle;
pub mod timer;
pub mod toss;

pub use event::{Control, GameEvent, ResetReason};
pub use input::{DragHandler, FixedStep, PointerInput};
pub use physics::Body;
pub use puzzle::{Container, DropOutcome, PuzzleEngine, PuzzleLayout, Slot, Tile, shuffled_positions};
pub use timer::Scheduler;
pub use toss::{Ball, BallMarker, BallState, Hoop, Launch, TossEngine, TossSession, launch_for_drag};
