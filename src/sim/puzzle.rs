//! Sliding-tile puzzle
//!
//! Sixteen tiles start shuffled in a loose pool below a 4x4 grid of slots.
//! A tile dropped close enough to a slot is tried there: the matching slot
//! locks it for good, any other slot sends it back to the pool with a shake.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::event::GameEvent;
use super::input::DragHandler;
use super::timer::Scheduler;
use crate::config::PuzzleTuning;
use crate::consts::*;
use crate::error::DragError;
use crate::geometry::{Rect, nearest};

/// Where a tile currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Container {
    Pool,
    Slot(u8),
}

/// A puzzle piece. Its identity is the slot it belongs in.
#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub correct: u8,
    pub container: Container,
    /// Set once placed correctly; the tile never moves again
    pub locked: bool,
    /// Rendered top-left corner
    pub pos: Vec2,
    /// Wrong-slot feedback is playing
    pub shaking: bool,
}

impl Tile {
    #[inline]
    pub fn row(&self) -> usize {
        self.correct as usize / GRID_SIDE
    }

    #[inline]
    pub fn col(&self) -> usize {
        self.correct as usize % GRID_SIDE
    }

    /// Background image offset in percent, selecting this tile's part of the picture
    pub fn background_offset(&self) -> (f32, f32) {
        (-(self.col() as f32) * 100.0, -(self.row() as f32) * 100.0)
    }

    pub fn center(&self, size: f32) -> Vec2 {
        self.pos + Vec2::splat(size / 2.0)
    }
}

/// A placement target in the grid
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub position: u8,
    /// The locked tile, which is always the tile with `correct == position`
    pub occupant: Option<u8>,
    pub highlighted: bool,
}

/// Screen placement of the grid and the loose pool
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PuzzleLayout {
    pub grid_origin: Vec2,
    pub pool_origin: Vec2,
    pub tile_size: f32,
    pub gap: f32,
    pub pool_columns: usize,
}

impl Default for PuzzleLayout {
    fn default() -> Self {
        let grid_origin = Vec2::new(20.0, 20.0);
        let grid_extent = GRID_SIDE as f32 * (TILE_SIZE + SLOT_GAP);
        Self {
            grid_origin,
            pool_origin: grid_origin + Vec2::new(0.0, grid_extent + 30.0),
            tile_size: TILE_SIZE,
            gap: SLOT_GAP,
            pool_columns: GRID_SIDE,
        }
    }
}

impl PuzzleLayout {
    /// Layout measured from the host's grid and pool containers
    pub fn from_origins(grid_origin: Vec2, pool_origin: Vec2, tile_size: f32, pool_columns: usize) -> Self {
        Self {
            grid_origin,
            pool_origin,
            tile_size,
            gap: SLOT_GAP,
            pool_columns: pool_columns.max(1),
        }
    }

    #[inline]
    fn pitch(&self) -> f32 {
        self.tile_size + self.gap
    }

    fn cell(&self, origin: Vec2, index: usize, columns: usize) -> Rect {
        let (row, col) = (index / columns, index % columns);
        let min = origin + Vec2::new(col as f32, row as f32) * self.pitch();
        Rect {
            min,
            size: Vec2::splat(self.tile_size),
        }
    }

    pub fn slot_rect(&self, position: usize) -> Rect {
        self.cell(self.grid_origin, position, GRID_SIDE)
    }

    pub fn slot_center(&self, position: usize) -> Vec2 {
        self.slot_rect(position).center()
    }

    pub fn pool_rect(&self, index: usize) -> Rect {
        self.cell(self.pool_origin, index, self.pool_columns)
    }
}

/// What happened to a dropped tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Locked into its own slot
    Locked { slot: u8 },
    /// Tried in the wrong slot and sent back
    Incorrect { slot: u8 },
    /// Not near any slot
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PuzzleTimer {
    Shake(u8),
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    tile: u8,
    /// Pointer position relative to the tile's top-left at grab time
    offset: Vec2,
}

/// Uniform random permutation of `0..TILE_COUNT` (Fisher–Yates)
pub fn shuffled_positions<R: Rng + ?Sized>(rng: &mut R) -> [u8; TILE_COUNT] {
    let mut perm: [u8; TILE_COUNT] = std::array::from_fn(|i| i as u8);
    for i in (1..TILE_COUNT).rev() {
        let j = rng.random_range(0..=i);
        perm.swap(i, j);
    }
    perm
}

/// Puzzle engine: tiles, slots, drag state and completion
#[derive(Debug, Clone)]
pub struct PuzzleEngine {
    tuning: PuzzleTuning,
    layout: PuzzleLayout,
    /// Indexed by correct position
    tiles: Vec<Tile>,
    slots: Vec<Slot>,
    /// Tile ids in pool display order
    pool: Vec<u8>,
    correct_placements: u8,
    completed: bool,
    drag: Option<DragState>,
    highlighted: Option<u8>,
    timers: Scheduler<PuzzleTimer>,
    events: Vec<GameEvent>,
}

impl PuzzleEngine {
    pub fn new(tuning: PuzzleTuning, layout: PuzzleLayout) -> Self {
        Self {
            tuning,
            layout,
            tiles: Vec::new(),
            slots: Vec::new(),
            pool: Vec::new(),
            correct_placements: 0,
            completed: false,
            drag: None,
            highlighted: None,
            timers: Scheduler::new(),
            events: Vec::new(),
        }
    }

    /// Build a fresh shuffled session, discarding whatever came before
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let perm = shuffled_positions(rng);

        self.slots = (0..TILE_COUNT as u8)
            .map(|position| Slot {
                position,
                occupant: None,
                highlighted: false,
            })
            .collect();

        self.tiles = (0..TILE_COUNT as u8)
            .map(|correct| Tile {
                correct,
                container: Container::Pool,
                locked: false,
                pos: Vec2::ZERO,
                shaking: false,
            })
            .collect();

        // Tile i starts at pool index perm[i]
        let mut pool = [0u8; TILE_COUNT];
        for (tile, &slot) in perm.iter().enumerate() {
            pool[slot as usize] = tile as u8;
        }
        self.pool = pool.to_vec();

        self.correct_placements = 0;
        self.completed = false;
        self.drag = None;
        self.highlighted = None;
        self.timers.clear();
        self.events.clear();
        self.relayout_pool();

        log::info!("Puzzle initialized with {} tiles", TILE_COUNT);
        self.events.push(self.progress_event());
    }

    /// Back to the uninitialized state (next screen entry rebuilds)
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning.clone(), self.layout);
    }

    pub fn is_initialized(&self) -> bool {
        !self.tiles.is_empty()
    }

    pub fn begin_drag(&mut self, tile: u8, pointer: Vec2) -> Result<(), DragError> {
        if !self.is_initialized() {
            return Err(DragError::NotInitialized);
        }
        let t = self
            .tiles
            .get(tile as usize)
            .ok_or(DragError::UnknownTile(tile))?;
        if t.locked {
            return Err(DragError::TileLocked(tile));
        }
        if let Some(active) = self.drag {
            return Err(DragError::AlreadyDragging(active.tile));
        }

        self.drag = Some(DragState {
            tile,
            offset: pointer - t.pos,
        });
        self.update_drag(pointer)
    }

    /// Move the dragged tile with the pointer and highlight a nearby slot
    pub fn update_drag(&mut self, pointer: Vec2) -> Result<(), DragError> {
        let drag = self.drag.ok_or(DragError::NoActiveDrag)?;
        self.tiles[drag.tile as usize].pos = pointer - drag.offset;

        let target = self
            .nearest_slot(pointer)
            .filter(|&(_, d)| d < self.tuning.highlight_radius)
            .map(|(slot, _)| slot);
        self.set_highlight(target);
        Ok(())
    }

    /// Drop the dragged tile at its current position
    pub fn end_drag(&mut self) -> Result<DropOutcome, DragError> {
        let drag = self.drag.take().ok_or(DragError::NoActiveDrag)?;
        let tile = drag.tile;
        let center = self.tiles[tile as usize].center(self.layout.tile_size);

        let outcome = match self.nearest_slot(center) {
            Some((slot, d)) if d < self.tuning.snap_radius => self.place(tile, slot),
            _ => {
                self.return_to_pool(tile);
                DropOutcome::Missed
            }
        };

        self.set_highlight(None);
        Ok(outcome)
    }

    /// Advance feedback timers
    pub fn tick(&mut self, dt: f32) {
        for timer in self.timers.advance(dt) {
            match timer {
                PuzzleTimer::Shake(tile) => {
                    if let Some(t) = self.tiles.get_mut(tile as usize) {
                        t.shaking = false;
                    }
                    self.events.push(GameEvent::ShakeCleared { tile });
                }
            }
        }
    }

    /// Re-measure (host resize). Dragged tiles keep following the pointer.
    pub fn set_layout(&mut self, layout: PuzzleLayout) {
        self.layout = layout;
        for tile in &mut self.tiles {
            if let Container::Slot(slot) = tile.container {
                tile.pos = layout.slot_rect(slot as usize).min;
            }
        }
        self.relayout_pool();
    }

    fn place(&mut self, tile: u8, slot: u8) -> DropOutcome {
        if self.tiles[tile as usize].correct != slot || self.slots[slot as usize].occupant.is_some() {
            self.return_to_pool(tile);
            self.tiles[tile as usize].shaking = true;
            self.timers.schedule(PuzzleTimer::Shake(tile), self.tuning.shake_duration);
            self.events.push(GameEvent::IncorrectPlacement { tile });
            log::debug!("Tile {} rejected by slot {}", tile, slot);
            return DropOutcome::Incorrect { slot };
        }

        let rect = self.layout.slot_rect(slot as usize);
        let t = &mut self.tiles[tile as usize];
        t.container = Container::Slot(slot);
        t.locked = true;
        t.pos = rect.min;
        self.slots[slot as usize].occupant = Some(tile);
        self.pool.retain(|&id| id != tile);
        self.relayout_pool();

        self.correct_placements += 1;
        log::info!("Tile {} placed correctly", tile);
        self.events.push(GameEvent::TileLocked { tile });
        self.events.push(self.progress_event());

        if self.correct_placements as usize == TILE_COUNT {
            self.completed = true;
            log::info!("Puzzle completed");
            self.events.push(GameEvent::PuzzleCompleted);
        }
        DropOutcome::Locked { slot }
    }

    /// Send a tile to the end of the pool
    fn return_to_pool(&mut self, tile: u8) {
        self.pool.retain(|&id| id != tile);
        self.pool.push(tile);
        self.tiles[tile as usize].container = Container::Pool;
        self.relayout_pool();
    }

    fn relayout_pool(&mut self) {
        let dragged = self.drag.map(|d| d.tile);
        for (index, &id) in self.pool.iter().enumerate() {
            if Some(id) != dragged {
                self.tiles[id as usize].pos = self.layout.pool_rect(index).min;
            }
        }
    }

    fn nearest_slot(&self, point: Vec2) -> Option<(u8, f32)> {
        nearest(point, (0..self.slots.len()).map(|i| self.layout.slot_center(i)))
            .map(|(i, d)| (i as u8, d))
    }

    fn set_highlight(&mut self, slot: Option<u8>) {
        if self.highlighted == slot {
            return;
        }
        if let Some(prev) = self.highlighted {
            self.slots[prev as usize].highlighted = false;
        }
        if let Some(next) = slot {
            self.slots[next as usize].highlighted = true;
        }
        self.highlighted = slot;
        self.events.push(GameEvent::SlotHighlighted { slot });
    }

    fn progress_event(&self) -> GameEvent {
        GameEvent::PuzzleProgress {
            placed: self.correct_placements,
            percent: self.progress_percent(),
        }
    }

    /// Completion in whole percent
    pub fn progress_percent(&self) -> u8 {
        (self.correct_placements as f32 / TILE_COUNT as f32 * 100.0).round() as u8
    }

    pub fn correct_placements(&self) -> u8 {
        self.correct_placements
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Loose tiles in display order
    pub fn pool(&self) -> &[u8] {
        &self.pool
    }

    pub fn dragged_tile(&self) -> Option<u8> {
        self.drag.map(|d| d.tile)
    }

    pub fn highlighted_slot(&self) -> Option<u8> {
        self.highlighted
    }

    pub fn layout(&self) -> &PuzzleLayout {
        &self.layout
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl DragHandler for PuzzleEngine {
    fn on_drag_start(&mut self, target: Option<u8>, pos: Vec2) -> Result<(), DragError> {
        self.begin_drag(target.ok_or(DragError::NoTarget)?, pos)
    }

    fn on_drag_move(&mut self, pos: Vec2) -> Result<(), DragError> {
        self.update_drag(pos)
    }

    fn on_drag_end(&mut self, _pos: Vec2) -> Result<(), DragError> {
        self.end_drag().map(|_| ())
    }
}
