//! Screen flow: Intro -> Puzzle -> Game -> Results
//!
//! [`App`] owns both engines and routes input to whichever one the active
//! screen shows. Engines only report upward through events; the flow turns
//! those into revealed controls and the shared [`Scoreboard`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::config::Tuning;
use crate::error::FlowError;
use crate::sim::input::{DragHandler, PointerInput};
use crate::sim::puzzle::{PuzzleEngine, PuzzleLayout, Slot, Tile};
use crate::sim::timer::Scheduler;
use crate::sim::toss::{Ball, Hoop, TossEngine};
use crate::sim::GameEvent;

pub use crate::sim::event::Control;

/// The four screens, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Screen {
    Intro,
    Puzzle,
    Game,
    Results,
}

impl Screen {
    pub const COUNT: usize = 4;
    pub const ALL: [Screen; Self::COUNT] = [Screen::Intro, Screen::Puzzle, Screen::Game, Screen::Results];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Control that leaves this screen
    pub fn next_control(self) -> Option<Control> {
        match self {
            Screen::Intro => Some(Control::Start),
            Screen::Puzzle => Some(Control::PuzzleNext),
            Screen::Game => Some(Control::GameNext),
            Screen::Results => None,
        }
    }
}

/// Flow state visible to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppFlowState {
    pub screen: Screen,
    /// Screen being transitioned to (exit animation playing)
    pub transition: Option<Screen>,
    pub puzzle_completed: bool,
    pub success_banner: bool,
    visible: Vec<Control>,
}

impl Default for AppFlowState {
    fn default() -> Self {
        Self {
            screen: Screen::Intro,
            transition: None,
            puzzle_completed: false,
            success_banner: false,
            visible: Vec::new(),
        }
    }
}

impl AppFlowState {
    pub fn is_visible(&self, control: Control) -> bool {
        self.visible.contains(&control)
    }

    fn reveal(&mut self, control: Control) -> bool {
        if self.is_visible(control) {
            return false;
        }
        self.visible.push(control);
        true
    }
}

/// Score and attempt counters for HUD and results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub score: u32,
    pub attempts: u32,
    pub remaining: u32,
    pub max_attempts: u32,
}

/// Debug dump of the flow and both engines
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub seed: u64,
    pub flow: &'a AppFlowState,
    pub scoreboard: Scoreboard,
    pub layout: &'a PuzzleLayout,
    pub tiles: &'a [Tile],
    pub slots: &'a [Slot],
    pub ball: &'a Ball,
    pub hoop: &'a Hoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlowTimer {
    Activate(Screen),
    Reveal(Control),
    HideBanner,
}

/// Screen flow controller
#[derive(Debug)]
pub struct App {
    tuning: Tuning,
    seed: u64,
    rng: Pcg32,
    flow: AppFlowState,
    puzzle: PuzzleEngine,
    toss: TossEngine,
    timers: Scheduler<FlowTimer>,
    events: Vec<GameEvent>,
}

impl App {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let mut app = Self {
            puzzle: PuzzleEngine::new(tuning.puzzle.clone(), PuzzleLayout::default()),
            toss: TossEngine::new(tuning.toss.clone()),
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            flow: AppFlowState::default(),
            timers: Scheduler::new(),
            events: Vec::new(),
        };
        app.arm_start();
        log::info!("App started with seed: {}", seed);
        app
    }

    fn arm_start(&mut self) {
        self.timers
            .schedule(FlowTimer::Reveal(Control::Start), self.tuning.flow.start_reveal_delay);
    }

    /// Begin the exit animation toward screen `index`
    pub fn go_to(&mut self, index: usize) -> Result<(), FlowError> {
        let result = self.try_go_to(index);
        if let Err(e) = &result {
            log::error!("Screen transition aborted: {}", e);
        }
        result
    }

    fn try_go_to(&mut self, index: usize) -> Result<(), FlowError> {
        let to = Screen::from_index(index).ok_or(FlowError::InvalidScreen(index))?;
        if let Some(pending) = self.flow.transition {
            return Err(FlowError::TransitionInProgress(pending.index()));
        }
        let from = self.flow.screen;
        if to.index() <= from.index() {
            return Err(FlowError::NotForward {
                from: from.index(),
                to: index,
            });
        }

        log::info!("Navigating to screen {}", index);
        self.flow.transition = Some(to);
        self.timers
            .schedule(FlowTimer::Activate(to), self.tuning.flow.transition);
        Ok(())
    }

    /// A button press. Only visible controls on the current screen respond.
    pub fn press(&mut self, control: Control) -> Result<(), FlowError> {
        if !self.flow.is_visible(control) || self.flow.screen.next_control() != Some(control) {
            return Err(FlowError::ControlHidden);
        }
        self.go_to(self.flow.screen.index() + 1)
    }

    /// Back to the intro with every counter at its initial value
    pub fn restart(&mut self) {
        log::info!("Restarting");
        self.flow = AppFlowState::default();
        self.puzzle.reset();
        self.toss.reset();
        self.timers.clear();
        self.arm_start();
        self.events.push(GameEvent::Restarted);
    }

    /// Route pointer input to the active screen's engine
    pub fn handle_pointer(&mut self, input: PointerInput) -> bool {
        if self.flow.transition.is_some() {
            return false;
        }
        let handled = match self.flow.screen {
            Screen::Puzzle => self.puzzle.handle(input),
            Screen::Game => self.toss.handle(input),
            Screen::Intro | Screen::Results => false,
        };
        self.pump_engine_events();
        handled
    }

    /// Advance flow timers and the active engine
    pub fn tick(&mut self, dt: f32) {
        for timer in self.timers.advance(dt) {
            match timer {
                FlowTimer::Activate(screen) => self.activate(screen),
                FlowTimer::Reveal(control) => {
                    if self.flow.reveal(control) {
                        log::debug!("Revealed {:?}", control);
                        self.events.push(GameEvent::ControlRevealed(control));
                    }
                }
                FlowTimer::HideBanner => {
                    self.flow.success_banner = false;
                    self.events.push(GameEvent::SuccessBannerHidden);
                }
            }
        }

        if self.flow.screen == Screen::Puzzle {
            self.puzzle.tick(dt);
        }
        // The last toss keeps resolving after the player moves on
        let toss_pending = self.toss.is_initialized() && !self.toss.session().ended;
        if self.flow.screen == Screen::Game || toss_pending {
            self.toss.step(dt);
        }
        self.pump_engine_events();
    }

    fn activate(&mut self, screen: Screen) {
        self.flow.screen = screen;
        self.flow.transition = None;
        self.events.push(GameEvent::ScreenChanged {
            index: screen.index(),
        });
        log::info!("Screen {} active", screen.index());

        // Engines initialize lazily on entry
        match screen {
            Screen::Puzzle => self.puzzle.initialize(&mut self.rng),
            Screen::Game => self.toss.initialize(),
            Screen::Results => {
                let board = self.scoreboard();
                log::info!("Final score: {}/{}", board.score, board.max_attempts);
            }
            Screen::Intro => {}
        }
    }

    fn pump_engine_events(&mut self) {
        let mut events = self.puzzle.drain_events();
        events.extend(self.toss.drain_events());

        for event in &events {
            match *event {
                GameEvent::PuzzleCompleted => {
                    self.flow.puzzle_completed = true;
                    self.flow.success_banner = true;
                    self.timers
                        .schedule(FlowTimer::HideBanner, self.tuning.flow.success_banner_duration);
                    self.timers.schedule(
                        FlowTimer::Reveal(Control::PuzzleNext),
                        self.tuning.flow.puzzle_next_reveal_delay,
                    );
                }
                GameEvent::AttemptConsumed { remaining: 0, .. } => {
                    self.timers.schedule(
                        FlowTimer::Reveal(Control::GameNext),
                        self.tuning.flow.game_next_reveal_delay,
                    );
                }
                _ => {}
            }
        }
        self.events.extend(events);
    }

    /// Re-measure the puzzle for the host's layout
    pub fn set_puzzle_layout(&mut self, layout: PuzzleLayout) {
        self.puzzle.set_layout(layout);
    }

    pub fn screen(&self) -> Screen {
        self.flow.screen
    }

    pub fn flow(&self) -> &AppFlowState {
        &self.flow
    }

    pub fn scoreboard(&self) -> Scoreboard {
        let s = self.toss.session();
        Scoreboard {
            score: s.score,
            attempts: s.attempts,
            remaining: s.remaining(),
            max_attempts: s.max_attempts,
        }
    }

    pub fn puzzle(&self) -> &PuzzleEngine {
        &self.puzzle
    }

    pub fn toss(&self) -> &TossEngine {
        &self.toss
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Trajectory guide for the held ball
    pub fn aim_preview(&self, steps: usize, dt: f32) -> Vec<Vec2> {
        if self.flow.screen == Screen::Game {
            self.toss.trajectory_preview(steps, dt)
        } else {
            Vec::new()
        }
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            seed: self.seed,
            flow: &self.flow,
            scoreboard: self.scoreboard(),
            layout: self.puzzle.layout(),
            tiles: self.puzzle.tiles(),
            slots: self.puzzle.slots(),
            ball: self.toss.ball(),
            hoop: self.toss.hoop(),
        }
    }

    /// Pretty JSON of [`App::snapshot`] for logs and the native demo
    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    fn app() -> App {
        App::new(Tuning::default(), 42)
    }

    fn run(app: &mut App, seconds: f32) {
        let steps = (seconds / SIM_DT).ceil() as usize;
        for _ in 0..steps {
            app.tick(SIM_DT);
        }
    }

    fn advance_to(app: &mut App, control: Control) {
        run(app, 3.5);
        app.press(control).unwrap();
        run(app, 0.5);
    }

    fn solve_puzzle(app: &mut App) {
        for tile in 0..TILE_COUNT as u8 {
            let pos = app.puzzle().tiles()[tile as usize].pos;
            let half = Vec2::splat(app.puzzle().layout().tile_size / 2.0);
            let target = app.puzzle().layout().slot_center(tile as usize) - half;
            assert!(app.handle_pointer(PointerInput::Start {
                target: Some(tile),
                pos
            }));
            assert!(app.handle_pointer(PointerInput::Move { pos: target }));
            assert!(app.handle_pointer(PointerInput::End { pos: target }));
        }
    }

    fn toss(app: &mut App) -> bool {
        let p = app.toss().ball().pos();
        app.handle_pointer(PointerInput::Start { target: None, pos: p })
            && app.handle_pointer(PointerInput::End {
                pos: p + Vec2::new(0.0, -60.0),
            })
    }

    #[test]
    fn test_start_revealed_after_delay() {
        let mut app = app();
        assert_eq!(app.press(Control::Start), Err(FlowError::ControlHidden));
        run(&mut app, START_REVEAL_DELAY - 0.1);
        assert!(!app.flow().is_visible(Control::Start));
        run(&mut app, 0.2);
        assert!(app.flow().is_visible(Control::Start));
        assert!(app.drain_events().contains(&GameEvent::ControlRevealed(Control::Start)));
    }

    #[test]
    fn test_transition_broadcasts_and_initializes_puzzle() {
        let mut app = app();
        run(&mut app, 3.5);
        app.drain_events();
        app.press(Control::Start).unwrap();
        assert_eq!(app.screen(), Screen::Intro);
        assert_eq!(app.flow().transition, Some(Screen::Puzzle));
        assert!(!app.puzzle().is_initialized());

        run(&mut app, SCREEN_TRANSITION + 0.05);
        assert_eq!(app.screen(), Screen::Puzzle);
        assert_eq!(app.flow().transition, None);
        assert!(app.puzzle().is_initialized());
        assert!(app.drain_events().contains(&GameEvent::ScreenChanged { index: 1 }));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut app = app();
        assert_eq!(app.go_to(7), Err(FlowError::InvalidScreen(7)));
        assert_eq!(app.go_to(0), Err(FlowError::NotForward { from: 0, to: 0 }));
        app.go_to(1).unwrap();
        assert_eq!(app.go_to(2), Err(FlowError::TransitionInProgress(1)));
        run(&mut app, 0.5);
        assert_eq!(app.go_to(0), Err(FlowError::NotForward { from: 1, to: 0 }));
        assert_eq!(app.screen(), Screen::Puzzle);
    }

    #[test]
    fn test_input_ignored_off_game_screens() {
        let mut app = app();
        assert!(!app.handle_pointer(PointerInput::Start {
            target: Some(0),
            pos: Vec2::ZERO
        }));
    }

    #[test]
    fn test_puzzle_completion_reveals_next() {
        let mut app = app();
        advance_to(&mut app, Control::Start);
        solve_puzzle(&mut app);
        assert!(app.flow().puzzle_completed);
        assert!(app.flow().success_banner);
        assert_eq!(app.press(Control::PuzzleNext), Err(FlowError::ControlHidden));

        run(&mut app, PUZZLE_NEXT_REVEAL_DELAY + 0.1);
        assert!(app.flow().is_visible(Control::PuzzleNext));
        assert!(app.flow().success_banner);
        run(&mut app, SUCCESS_BANNER_DURATION - PUZZLE_NEXT_REVEAL_DELAY);
        assert!(!app.flow().success_banner);
    }

    #[test]
    fn test_full_run_and_restart() {
        let mut app = app();
        advance_to(&mut app, Control::Start);
        solve_puzzle(&mut app);
        advance_to(&mut app, Control::PuzzleNext);
        assert_eq!(app.screen(), Screen::Game);
        assert!(app.toss().is_initialized());

        for i in 1..=MAX_ATTEMPTS {
            assert!(toss(&mut app));
            // Counters update synchronously with the release
            assert_eq!(app.scoreboard().attempts, i);
            run(&mut app, 0.2);
        }
        assert!(!toss(&mut app));
        assert_eq!(app.scoreboard().remaining, 0);
        assert!(!app.flow().is_visible(Control::GameNext));
        run(&mut app, GAME_NEXT_REVEAL_DELAY);
        assert!(app.flow().is_visible(Control::GameNext));

        run(&mut app, GAME_END_GRACE);
        assert!(app.toss().session().ended);
        let events = app.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameEnded { .. })));

        app.press(Control::GameNext).unwrap();
        run(&mut app, 0.5);
        assert_eq!(app.screen(), Screen::Results);
        assert!(app.scoreboard().score <= app.scoreboard().attempts);

        app.restart();
        assert_eq!(app.screen(), Screen::Intro);
        assert_eq!(*app.flow(), AppFlowState::default());
        assert_eq!(app.scoreboard().attempts, 0);
        assert_eq!(app.scoreboard().score, 0);
        assert!(!app.puzzle().is_initialized());
        assert!(!app.toss().is_initialized());
        run(&mut app, START_REVEAL_DELAY + 0.1);
        assert!(app.flow().is_visible(Control::Start));
    }

    #[test]
    fn test_game_end_fires_after_leaving_game_screen() {
        let mut app = app();
        advance_to(&mut app, Control::Start);
        solve_puzzle(&mut app);
        advance_to(&mut app, Control::PuzzleNext);
        for _ in 0..MAX_ATTEMPTS {
            assert!(toss(&mut app));
        }

        // Move on as soon as the button shows, well inside the grace window
        run(&mut app, GAME_NEXT_REVEAL_DELAY + 0.05);
        app.press(Control::GameNext).unwrap();
        run(&mut app, 0.5);
        assert_eq!(app.screen(), Screen::Results);
        assert!(!app.toss().session().ended);

        run(&mut app, GAME_END_GRACE);
        assert!(app.toss().session().ended);
        assert_eq!(app.toss().game_end_in(), None);
        let ended = app
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_snapshot_json() {
        let mut app = app();
        advance_to(&mut app, Control::Start);
        let json: serde_json::Value = serde_json::from_str(&app.snapshot_json().unwrap()).unwrap();
        assert_eq!(json["seed"], 42);
        assert_eq!(json["flow"]["screen"], "Puzzle");
        assert_eq!(json["flow"]["visible"][0], "Start");
        assert_eq!(json["scoreboard"]["remaining"], MAX_ATTEMPTS);
        assert_eq!(json["tiles"].as_array().map(Vec::len), Some(TILE_COUNT));
        assert_eq!(json["ball"]["state"], "Resting");
    }

    #[test]
    fn test_wrong_screen_control() {
        let mut app = app();
        run(&mut app, 3.5);
        assert_eq!(app.press(Control::GameNext), Err(FlowError::ControlHidden));
    }

    #[test]
    fn test_screen_index_roundtrip() {
        for screen in Screen::ALL {
            assert_eq!(Screen::from_index(screen.index()), Some(screen));
        }
        assert_eq!(Screen::from_index(Screen::COUNT), None);
    }
}
