//! Tank Arena entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use glam::Vec2;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use tank_arena::Settings;
    use tank_arena::audio::AudioManager;
    use tank_arena::consts::*;
    use tank_arena::platform::{self, DomHud, PlatformError, ids};
    use tank_arena::sim::{Camera, GameState, HudBridge, PlayerInput, tick};

    // Hand frames to the page's renderer, if it installed one
    #[wasm_bindgen(inline_js = "
        export function publish_frame(json) {
            if (typeof window.renderArenaFrame === 'function') {
                window.renderArenaFrame(json);
            }
        }
    ")]
    extern "C" {
        fn publish_frame(json: &str);
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        input: PlayerInput,
        hud: HudBridge,
        dom_hud: DomHud,
        camera: Camera,
        audio: AudioManager,
        settings: Settings,
        accumulator: f32,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        fn new(seed: u64, dom_hud: DomHud, settings: Settings) -> Self {
            Self {
                state: GameState::new(seed),
                input: PlayerInput::new(),
                hud: HudBridge::new(),
                dom_hud,
                camera: Camera::default(),
                audio: AudioManager::new(&settings),
                settings,
                accumulator: 0.0,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.sample();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
            }

            for event in self.state.drain_events() {
                self.audio.play_event(&event);
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 && time > oldest_time {
                self.fps = (60000.0 / (time - oldest_time)).round() as u32;
            }
        }

        /// Publish the current frame to the host renderer
        fn render(&self) {
            match self.state.snapshot_json() {
                Ok(json) => publish_frame(&json),
                Err(e) => log::warn!("Failed to serialize frame: {e}"),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self, frame_ms: f64) {
            self.hud
                .update(self.state.player.health, frame_ms, &mut self.dom_hud);

            if self.settings.show_fps {
                if let Some(el) = platform::document()
                    .ok()
                    .and_then(|d| d.get_element_by_id("fps"))
                {
                    el.set_text_content(Some(&self.fps.to_string()));
                }
            }
        }

        /// Pick the first surface under a pointer position
        fn pick(&self, canvas: &HtmlCanvasElement, event: &PointerEvent) -> Option<glam::Vec3> {
            let pixel = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
            let viewport = Vec2::new(canvas.client_width() as f32, canvas.client_height() as f32);
            self.camera.pick(pixel, viewport, &self.state.pick_targets())
        }
    }

    pub fn run() -> Result<(), PlatformError> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Tank Arena starting...");

        let document = platform::document()?;

        // Without a start button the game begins immediately
        let Ok(button) = platform::html_element(&document, ids::START_BUTTON) else {
            return start_game();
        };

        let started = Cell::new(false);
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            if started.replace(true) {
                return;
            }
            if let Err(e) = start_game() {
                log::error!("Failed to start game: {e}");
            }
        });
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();

        Ok(())
    }

    fn start_game() -> Result<(), PlatformError> {
        let window = platform::window()?;
        let document = platform::document()?;

        platform::set_display(&document, ids::MAIN_MENU, "none");
        let canvas = platform::canvas(&document)?;
        let _ = canvas.style().set_property("display", "block");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        canvas.set_width((canvas.client_width() as f64 * dpr) as u32);
        canvas.set_height((canvas.client_height() as f64 * dpr) as u32);

        let settings = Settings::load();
        let dom_hud = DomHud::new(&document);
        platform::set_display(&document, ids::LOADING_SCREEN, "none");
        dom_hud.show_health();

        // Initialize game
        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed, dom_hud, settings)));
        // Reached from the start button, so the click counts as a user gesture
        game.borrow_mut().audio.start_music();

        setup_input_handlers(&canvas, game.clone())?;
        setup_focus_handlers(game.clone())?;

        // Start game loop
        request_animation_frame(game);

        log::info!("Tank Arena running!");
        Ok(())
    }

    fn setup_input_handlers(
        canvas: &HtmlCanvasElement,
        game: Rc<RefCell<Game>>,
    ) -> Result<(), PlatformError> {
        let window = platform::window()?;

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let code = event.code();
                if code == Settings::MUTE_KEY && !event.repeat() {
                    let muted = g.settings.toggle_muted();
                    g.audio.set_muted(muted);
                    g.settings.save();
                    log::info!("Audio {}", if muted { "muted" } else { "unmuted" });
                    return;
                }
                if g.input.key_down(&code) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input.key_up(&event.code());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer down fires and resumes audio (first user gesture)
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                let mut g = game.borrow_mut();
                g.input.pointer_down();
                g.audio.resume();
                g.audio.start_music();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                game.borrow_mut().input.pointer_up();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer move retargets the turret
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                let pick = g.pick(&canvas_clone, &event);
                g.input.pointer_move(pick);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        Ok(())
    }

    fn setup_focus_handlers(game: Rc<RefCell<Game>>) -> Result<(), PlatformError> {
        let window = platform::window()?;

        // Window blur: drop held keys so the tank doesn't keep driving
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.input.release_all();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                let muted = g.settings.muted;
                g.audio.set_muted(muted);
            });
            let _ = window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        Ok(())
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Ok(window) = platform::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let finished = {
            let mut g = game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            g.update_hud(dt as f64 * 1000.0);
            g.hud.finished()
        };

        // The game-over panel is terminal
        if finished {
            log::info!("Game over, stopping frame loop");
            return;
        }
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Tank Arena failed to start: {e}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Tank Arena (native) starting...");
    log::info!("Native mode runs a headless scripted match - use `trunk serve` for the web version");

    let seconds: u32 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(30);
    headless::run(42, seconds);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use tank_arena::consts::*;
    use tank_arena::sim::{
        GameEvent, GamePhase, GameState, HudBridge, HudSink, Intent, PhysicsService, TickInput,
        tick,
    };

    /// HUD that writes to the log
    struct LogHud;

    impl HudSink for LogHud {
        fn set_player_health(&mut self, _percent: f32) {}

        fn hide_player_health(&mut self) {
            log::info!("HUD: health bar hidden");
        }

        fn show_game_over(&mut self, message: &str) {
            log::info!("HUD: {message}");
        }
    }

    /// Player that holds the trigger and keeps its turret on the nearest enemy
    fn scripted_input(state: &GameState) -> TickInput {
        let player = state.player_position();
        let target = state
            .director
            .roster()
            .iter()
            .filter_map(|slot| state.physics.position(slot.vehicle.body))
            .min_by(|a, b| a.distance(player).total_cmp(&b.distance(player)));

        TickInput {
            intent: Intent {
                fire: target.is_some(),
                ..Default::default()
            },
            turret_target: target,
        }
    }

    pub fn run(seed: u64, seconds: u32) {
        let mut state = GameState::new(seed);
        let mut hud = HudBridge::new();
        let mut sink = LogHud;
        let (mut shots, mut hits, mut kills) = (0u32, 0u32, 0u32);

        let total_ticks = (seconds as f32 / SIM_DT) as u64;
        let frame_ms = SIM_DT as f64 * 1000.0;
        for _ in 0..total_ticks {
            let input = scripted_input(&state);
            tick(&mut state, &input, SIM_DT);
            hud.update(state.player.health, frame_ms, &mut sink);

            for event in state.drain_events() {
                match event {
                    GameEvent::ShotFired { .. } => shots += 1,
                    GameEvent::VehicleHit { .. } => hits += 1,
                    GameEvent::EnemyDestroyed { .. } => kills += 1,
                    _ => {}
                }
            }
            if hud.finished() {
                break;
            }
        }

        log::info!(
            "Headless run finished: {} ticks, wave {}, {} shots, {} hits, {} kills, player health {}{}",
            state.time_ticks,
            state.director.wave_number,
            shots,
            hits,
            kills,
            state.player.health,
            if state.phase == GamePhase::GameOver {
                " (destroyed)"
            } else {
                ""
            }
        );
    }
}
