//! Rosita Hoops entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Document, Element, HtmlElement, PointerEvent};

    use rosita_hoops::consts::*;
    use rosita_hoops::share::{self, ShareOutcome};
    use rosita_hoops::sim::{BallMarker, FixedStep, GameEvent, PointerInput, PuzzleLayout};
    use rosita_hoops::{App, Control, Scoreboard, Screen, SetupError, Tuning};

    /// Dots in the aiming guide
    const GUIDE_DOTS: usize = 12;
    const GUIDE_DT: f32 = 0.05;
    const BOARD_MARGIN: f32 = 20.0;

    // Share sheet and clipboard both hand back promises
    #[wasm_bindgen(inline_js = "
        export function can_share() {
            return typeof navigator.share === 'function';
        }
        export function share_native(title, text, url) {
            return navigator.share({ title, text, url });
        }
        export function copy_text(text) {
            if (!navigator.clipboard) {
                return Promise.reject(new Error('clipboard unavailable'));
            }
            return navigator.clipboard.writeText(text);
        }
    ")]
    extern "C" {
        fn can_share() -> bool;
        fn share_native(title: &str, text: &str, url: &str) -> js_sys::Promise;
        fn copy_text(text: &str) -> js_sys::Promise;
    }

    fn js_err(e: JsValue) -> SetupError {
        SetupError::Host(format!("{:?}", e))
    }

    fn element(document: &Document, id: &str) -> Result<Element, SetupError> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| SetupError::MissingElement(id.to_string()))
    }

    fn html(document: &Document, id: &str) -> Result<HtmlElement, SetupError> {
        element(document, id)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| SetupError::Host(format!("#{} is not an HTML element", id)))
    }

    fn create_div(document: &Document, class: &str) -> Result<HtmlElement, SetupError> {
        let el = document
            .create_element("div")
            .map_err(js_err)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| SetupError::Host("div is not an HTML element".into()))?;
        el.set_class_name(class);
        Ok(el)
    }

    fn set_class(el: &Element, class: &str, on: bool) {
        let _ = el.class_list().toggle_with_force(class, on);
    }

    /// Absolute placement inside the positioned parent
    fn place(el: &HtmlElement, min: Vec2, size: Vec2) {
        let style = el.style();
        let _ = style.set_property("left", &format!("{}px", min.x));
        let _ = style.set_property("top", &format!("{}px", min.y));
        let _ = style.set_property("width", &format!("{}px", size.x));
        let _ = style.set_property("height", &format!("{}px", size.y));
    }

    /// Fit the grid to the board's width, capped at the design tile size
    fn measure_layout(board: &HtmlElement) -> PuzzleLayout {
        let width = board.client_width() as f32;
        let fit = (width - 2.0 * BOARD_MARGIN) / GRID_SIDE as f32 - SLOT_GAP;
        let tile = if fit > 0.0 { fit.min(TILE_SIZE) } else { TILE_SIZE };
        let grid = Vec2::splat(BOARD_MARGIN);
        let pool = grid + Vec2::new(0.0, GRID_SIDE as f32 * (tile + SLOT_GAP) + 30.0);
        PuzzleLayout::from_origins(grid, pool, tile, GRID_SIDE)
    }

    /// Optional JSON overrides in `<script id="tuning" type="application/json">`
    fn load_tuning(document: &Document) -> Tuning {
        let Some(json) = document
            .get_element_by_id("tuning")
            .and_then(|el| el.text_content())
        else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning block: {}", e);
                Tuning::default()
            }
        }
    }

    fn seed() -> u64 {
        getrandom::u64().unwrap_or_else(|e| {
            log::warn!("getrandom failed ({}), seeding from clock", e);
            js_sys::Date::now() as u64
        })
    }

    fn broadcast_screen(document: &Document, index: usize) {
        let detail = js_sys::Object::new();
        let _ = js_sys::Reflect::set(
            &detail,
            &JsValue::from_str("screenIndex"),
            &JsValue::from(index as u32),
        );
        let init = web_sys::CustomEventInit::new();
        init.set_detail(&detail);
        match web_sys::CustomEvent::new_with_event_init_dict("screenChanged", &init) {
            Ok(event) => {
                let _ = document.dispatch_event(&event);
            }
            Err(e) => log::warn!("Could not broadcast screen change: {:?}", e),
        }
    }

    /// Every element the host writes to
    struct Dom {
        document: Document,
        screens: Vec<Element>,
        controls: Vec<(Control, HtmlElement)>,
        board: HtmlElement,
        slots: Vec<HtmlElement>,
        tiles: Vec<HtmlElement>,
        progress_fill: HtmlElement,
        progress_text: Element,
        success: Element,
        field: HtmlElement,
        ball: HtmlElement,
        hoop: HtmlElement,
        guide: Vec<HtmlElement>,
        score: Element,
        attempts: Element,
        score_message: Element,
        game_over: Element,
        final_score: Element,
    }

    impl Dom {
        fn new(document: Document) -> Result<Self, SetupError> {
            let list = document.query_selector_all(".screen").map_err(js_err)?;
            let screens: Vec<Element> = (0..list.length())
                .filter_map(|i| list.get(i))
                .filter_map(|node| node.dyn_into::<Element>().ok())
                .collect();
            if screens.len() != Screen::COUNT {
                return Err(SetupError::ScreenCount {
                    expected: Screen::COUNT,
                    found: screens.len(),
                });
            }

            let controls = vec![
                (Control::Start, html(&document, "start-btn")?),
                (Control::PuzzleNext, html(&document, "puzzle-next-btn")?),
                (Control::GameNext, html(&document, "game-next-btn")?),
            ];

            let board = html(&document, "puzzle-board")?;
            board.set_inner_html("");
            let mut slots = Vec::with_capacity(TILE_COUNT);
            for position in 0..TILE_COUNT {
                let slot = create_div(&document, "puzzle-slot")?;
                let _ = slot.set_attribute("data-slot", &position.to_string());
                board.append_child(&slot).map_err(js_err)?;
                slots.push(slot);
            }
            // Tiles after slots so they stack on top
            let mut tiles = Vec::with_capacity(TILE_COUNT);
            for id in 0..TILE_COUNT {
                let tile = create_div(&document, "puzzle-piece")?;
                let _ = tile.set_attribute("data-tile", &id.to_string());
                let _ = tile.style().set_property("display", "none");
                board.append_child(&tile).map_err(js_err)?;
                tiles.push(tile);
            }

            let field = html(&document, "toss-field")?;
            let mut guide = Vec::with_capacity(GUIDE_DOTS);
            for _ in 0..GUIDE_DOTS {
                let dot = create_div(&document, "aim-dot hidden")?;
                field.append_child(&dot).map_err(js_err)?;
                guide.push(dot);
            }

            Ok(Self {
                controls,
                board,
                slots,
                tiles,
                progress_fill: html(&document, "progress-fill")?,
                progress_text: element(&document, "progress-text")?,
                success: element(&document, "puzzle-success")?,
                ball: html(&document, "ball")?,
                hoop: html(&document, "hoop")?,
                field,
                guide,
                score: element(&document, "score")?,
                attempts: element(&document, "attempts")?,
                score_message: element(&document, "score-message")?,
                game_over: element(&document, "game-over")?,
                final_score: element(&document, "final-score")?,
                screens,
                document,
            })
        }

        /// Field pixels per playfield unit
        fn field_scale(&self) -> f32 {
            let width = self.field.client_width() as f32;
            if width > 0.0 { width / FIELD_WIDTH } else { 1.0 }
        }
    }

    /// Game instance holding all state
    struct Host {
        app: App,
        stepper: FixedStep,
        last_time: f64,
        dom: Dom,
    }

    impl Host {
        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            for _ in 0..self.stepper.push(dt) {
                self.app.tick(SIM_DT);
            }
            self.apply_events();
        }

        fn remeasure_puzzle(&mut self) {
            let layout = measure_layout(&self.dom.board);
            let height = layout.pool_origin.y
                + GRID_SIDE as f32 * (layout.tile_size + layout.gap)
                + BOARD_MARGIN;
            let _ = self
                .dom
                .board
                .style()
                .set_property("height", &format!("{}px", height));
            self.app.set_puzzle_layout(layout);
        }

        /// One-shot reactions; persistent state is mirrored in `render`
        fn apply_events(&mut self) {
            for event in self.app.drain_events() {
                match event {
                    GameEvent::ScreenChanged { index } => {
                        broadcast_screen(&self.dom.document, index);
                        if index == Screen::Puzzle.index() {
                            self.remeasure_puzzle();
                        }
                    }
                    GameEvent::Restarted => {
                        self.stepper.reset();
                        set_class(&self.dom.score_message, "hidden", true);
                    }
                    GameEvent::Scored { score, .. } => {
                        log::info!("Basket! Score: {}", score);
                        set_class(&self.dom.score_message, "hidden", false);
                    }
                    GameEvent::ScoreMarkerCleared => {
                        set_class(&self.dom.score_message, "hidden", true);
                    }
                    GameEvent::GameEnded { .. } => {
                        if let Ok(json) = self.app.snapshot_json() {
                            log::debug!("Final state: {}", json);
                        }
                        let board = self.app.scoreboard();
                        self.dom
                            .game_over
                            .set_text_content(Some(&share::game_over_banner(&board)));
                    }
                    GameEvent::PuzzleCompleted => log::info!("Puzzle completed"),
                    _ => {}
                }
            }
        }

        /// Mirror engine state into the DOM
        fn render(&self) {
            let flow = self.app.flow();
            let current = flow.screen.index();
            for (i, el) in self.dom.screens.iter().enumerate() {
                let leaving = i == current && flow.transition.is_some();
                set_class(el, "active", i == current && !leaving);
                set_class(el, "prev", i < current || leaving);
            }
            for (control, el) in &self.dom.controls {
                set_class(el, "hidden", !flow.is_visible(*control));
            }
            set_class(&self.dom.success, "hidden", !flow.success_banner);
            set_class(&self.dom.success, "show", flow.success_banner);

            match flow.screen {
                Screen::Puzzle => self.render_puzzle(),
                Screen::Game => self.render_toss(),
                Screen::Results => {
                    let board = self.app.scoreboard();
                    self.dom
                        .final_score
                        .set_text_content(Some(&share::final_score_line(&board)));
                }
                Screen::Intro => {}
            }
        }

        fn render_puzzle(&self) {
            let puzzle = self.app.puzzle();
            let layout = puzzle.layout();
            let size = Vec2::splat(layout.tile_size);

            for (slot, el) in puzzle.slots().iter().zip(&self.dom.slots) {
                place(el, layout.slot_rect(slot.position as usize).min, size);
                set_class(el, "highlight", slot.highlighted);
            }
            let picture = size * GRID_SIDE as f32;
            for (tile, el) in puzzle.tiles().iter().zip(&self.dom.tiles) {
                // Offsets are in tile widths, the picture spans the whole grid
                let (ox, oy) = tile.background_offset();
                let style = el.style();
                let _ = style.set_property("display", "block");
                let _ = style.set_property("background-size", &format!("{}px {}px", picture.x, picture.y));
                let _ = style.set_property(
                    "background-position",
                    &format!("{}px {}px", ox / 100.0 * size.x, oy / 100.0 * size.y),
                );
                place(el, tile.pos, size);
                set_class(el, "dragging", puzzle.dragged_tile() == Some(tile.correct));
                set_class(el, "correct", tile.locked);
                set_class(el, "shake", tile.shaking);
            }

            let percent = puzzle.progress_percent();
            let _ = self
                .dom
                .progress_fill
                .style()
                .set_property("width", &format!("{}%", percent));
            self.dom
                .progress_text
                .set_text_content(Some(&share::progress_label(percent)));
        }

        fn render_toss(&self) {
            let toss = self.app.toss();
            let scale = self.dom.field_scale();

            let ball = toss.ball();
            let aabb = ball.body.aabb();
            place(&self.dom.ball, aabb.min * scale, aabb.size * scale);
            set_class(&self.dom.ball, "aiming", ball.marker == Some(BallMarker::Aiming));
            set_class(&self.dom.ball, "scored", ball.marker == Some(BallMarker::Scored));

            let hoop = toss.hoop().rect;
            place(&self.dom.hoop, hoop.min * scale, hoop.size * scale);

            let preview = self.app.aim_preview(GUIDE_DOTS, GUIDE_DT);
            for (i, dot) in self.dom.guide.iter().enumerate() {
                match preview.get(i) {
                    Some(p) => {
                        place(dot, *p * scale - Vec2::splat(3.0), Vec2::splat(6.0));
                        set_class(dot, "hidden", false);
                    }
                    None => set_class(dot, "hidden", true),
                }
            }

            let board = self.app.scoreboard();
            self.dom.score.set_text_content(Some(&share::score_label(&board)));
            self.dom
                .attempts
                .set_text_content(Some(&share::attempts_label(&board)));
            set_class(&self.dom.game_over, "hidden", !toss.session().ended);
        }

        /// Client coordinates to the active engine's frame
        fn local_pos(&self, event: &PointerEvent) -> Option<Vec2> {
            let client = Vec2::new(event.client_x() as f32, event.client_y() as f32);
            match self.app.screen() {
                Screen::Puzzle => {
                    let rect = self.dom.board.get_bounding_client_rect();
                    Some(client - Vec2::new(rect.left() as f32, rect.top() as f32))
                }
                Screen::Game => {
                    let rect = self.dom.field.get_bounding_client_rect();
                    let origin = Vec2::new(rect.left() as f32, rect.top() as f32);
                    Some((client - origin) / self.dom.field_scale())
                }
                Screen::Intro | Screen::Results => None,
            }
        }
    }

    /// Tile id under the pointer, if any
    fn tile_target(event: &PointerEvent) -> Option<u8> {
        event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| el.closest("[data-tile]").ok().flatten())
            .and_then(|el| el.get_attribute("data-tile"))
            .and_then(|id| id.parse().ok())
    }

    pub fn run() -> Result<(), SetupError> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("Failed to init logger: {}", e).into());
        }

        log::info!("Rosita Hoops starting...");

        let window = web_sys::window().ok_or(SetupError::NoWindow)?;
        let document = window.document().ok_or(SetupError::NoDocument)?;

        if let Some(loading) = document.get_element_by_id("loading") {
            set_class(&loading, "hidden", true);
        }

        let tuning = load_tuning(&document);
        let dom = Dom::new(document)?;
        let seed = seed();
        let host = Rc::new(RefCell::new(Host {
            app: App::new(tuning, seed),
            stepper: FixedStep::new(),
            last_time: 0.0,
            dom,
        }));

        setup_pointer_handlers(&window, host.clone())?;
        setup_buttons(host.clone())?;

        request_animation_frame(host);

        log::info!("Rosita Hoops running!");
        Ok(())
    }

    fn setup_pointer_handlers(
        window: &web_sys::Window,
        host: Rc<RefCell<Host>>,
    ) -> Result<(), SetupError> {
        type Map = fn(&PointerEvent, Vec2) -> PointerInput;
        let handlers: [(&str, Map); 4] = [
            ("pointerdown", |e, pos| PointerInput::Start {
                target: tile_target(e),
                pos,
            }),
            ("pointermove", |_, pos| PointerInput::Move { pos }),
            ("pointerup", |_, pos| PointerInput::End { pos }),
            ("pointercancel", |_, pos| PointerInput::End { pos }),
        ];

        // On the window so drags keep tracking outside the board
        for (name, map) in handlers {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut h = host.borrow_mut();
                let Some(pos) = h.local_pos(&event) else {
                    return;
                };
                if h.app.handle_pointer(map(&event, pos)) {
                    event.prevent_default();
                }
            });
            window
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_buttons(host: Rc<RefCell<Host>>) -> Result<(), SetupError> {
        let document = host.borrow().dom.document.clone();

        for (control, id) in [
            (Control::Start, "start-btn"),
            (Control::PuzzleNext, "puzzle-next-btn"),
            (Control::GameNext, "game-next-btn"),
        ] {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if let Err(e) = host.borrow_mut().app.press(control) {
                    log::warn!("Ignored {:?} press: {}", control, e);
                }
            });
            element(&document, id)?
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }

        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                host.borrow_mut().app.restart();
            });
            element(&document, "restart-btn")?
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let board = host.borrow().app.scoreboard();
                wasm_bindgen_futures::spawn_local(async move {
                    let outcome = share_results(board).await;
                    log::info!("Share outcome: {:?}", outcome);
                    if let (Some(message), Some(window)) =
                        (share::outcome_message(&outcome), web_sys::window())
                    {
                        let _ = window.alert_with_message(&message);
                    }
                });
            });
            element(&document, "share-btn")?
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closure.forget();
        }
        Ok(())
    }

    /// Native share sheet, then clipboard, then the bare URL
    async fn share_results(board: Scoreboard) -> ShareOutcome {
        let url = web_sys::window()
            .and_then(|w| w.location().href().ok())
            .unwrap_or_default();

        if can_share() {
            let text = share::share_text(&board);
            match JsFuture::from(share_native(share::SHARE_TITLE, &text, &url)).await {
                Ok(_) => return ShareOutcome::Shared,
                Err(e) => log::warn!("Share sheet failed: {:?}", e),
            }
        }

        match JsFuture::from(copy_text(&share::clipboard_text(&board, &url))).await {
            Ok(_) => ShareOutcome::Copied,
            Err(e) => {
                log::warn!("Clipboard copy failed: {:?}", e);
                ShareOutcome::Manual(url)
            }
        }
    }

    fn request_animation_frame(host: Rc<RefCell<Host>>) {
        let Some(window) = web_sys::window() else {
            log::error!("Window gone, stopping frame loop");
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame(host, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(host: Rc<RefCell<Host>>, time: f64) {
        {
            let mut h = host.borrow_mut();

            let dt = if h.last_time > 0.0 {
                ((time - h.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            h.last_time = time;

            h.update(dt);
            h.render();
        }

        request_animation_frame(host);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_app::run().map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Rosita Hoops (native) starting...");
    log::info!("Native mode plays a scripted session - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    if let Err(e) = demo::run(seed) {
        eprintln!("Demo stopped: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless walk through all four screens
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;

    use rosita_hoops::consts::*;
    use rosita_hoops::share;
    use rosita_hoops::sim::PointerInput;
    use rosita_hoops::{App, Control, FlowError, Tuning};

    /// Release offsets from the grab point, one per throw
    const AIMS: [(f32, f32); 5] = [
        (40.0, -160.0),
        (60.0, -200.0),
        (80.0, -220.0),
        (50.0, -240.0),
        (70.0, -180.0),
    ];

    fn run_for(app: &mut App, seconds: f32) {
        let steps = (seconds / SIM_DT).ceil() as usize;
        for _ in 0..steps {
            app.tick(SIM_DT);
        }
    }

    fn advance(app: &mut App, control: Control) -> Result<(), FlowError> {
        app.press(control)?;
        let transition = app.tuning().flow.transition;
        run_for(app, transition + 0.05);
        println!("Screen: {:?}", app.screen());
        Ok(())
    }

    fn solve_puzzle(app: &mut App) {
        for tile in 0..TILE_COUNT as u8 {
            let from = app.puzzle().tiles()[tile as usize].pos;
            let to = app.puzzle().layout().slot_rect(tile as usize).min;
            app.handle_pointer(PointerInput::Start {
                target: Some(tile),
                pos: from,
            });
            app.handle_pointer(PointerInput::Move { pos: to });
            app.handle_pointer(PointerInput::End { pos: to });
        }
        println!(
            "Puzzle: {}% ({} tiles placed)",
            app.puzzle().progress_percent(),
            app.puzzle().correct_placements()
        );
    }

    fn play_toss(app: &mut App) {
        for (dx, dy) in AIMS {
            let grab = app.toss().ball().pos();
            let release = grab + Vec2::new(dx, dy);
            app.handle_pointer(PointerInput::Start {
                target: None,
                pos: grab,
            });
            app.handle_pointer(PointerInput::End { pos: release });
            // Let the ball fly and come back
            let settle = app.tuning().toss.settle_delay;
            run_for(app, settle + 1.0);
            let board = app.scoreboard();
            println!(
                "{} | {}",
                share::score_label(&board),
                share::attempts_label(&board)
            );
        }
    }

    pub fn run(seed: u64) -> Result<(), FlowError> {
        let tuning = Tuning::default();
        let mut app = App::new(tuning.clone(), seed);
        println!("Rosita Hoops - seed {}", seed);

        run_for(&mut app, tuning.flow.start_reveal_delay + 0.05);
        advance(&mut app, Control::Start)?;

        solve_puzzle(&mut app);
        run_for(&mut app, tuning.flow.puzzle_next_reveal_delay + 0.05);
        advance(&mut app, Control::PuzzleNext)?;

        play_toss(&mut app);
        run_for(&mut app, tuning.toss.game_end_grace);
        let board = app.scoreboard();
        println!("{}", share::game_over_banner(&board));
        advance(&mut app, Control::GameNext)?;

        println!("{}", share::final_score_line(&board));
        println!("{}", share::share_text(&board));
        match app.snapshot_json() {
            Ok(json) => log::debug!("Final state: {}", json),
            Err(e) => log::warn!("Snapshot failed: {}", e),
        }
        Ok(())
    }
}
