//! The per-frame cycle.
//!
//! One iteration is one frame, always in the same order:
//!
//!   1. pump OS events (quit, focus, raw buttons)
//!   2. measure dt and apply the debug time scale
//!   3. update renderer, textures, game state, screens, audio
//!   4. process input, after the update so it acts on this frame's state
//!   5. draw the active screen
//!   6. idle briefly to yield to the OS
//!
//! The loop ends only when the run state is quitting, checked at the top of
//! each iteration.

use std::time::Duration;

use beat_core::{DeviceInput, FrameClock, InputPhase, Key, TimeScale};
use beat_platform::{EventSource, OsEvent, PriorityHint};

use crate::dispatch;
use crate::error::FatalRuntimeError;
use crate::registry::{Live, Subsystems};

pub const FOCUSED_IDLE: Duration = Duration::from_millis(1);
pub const UNFOCUSED_IDLE: Duration = Duration::from_millis(10);

/// Held to run time 4x faster.
pub const FAST_KEY: Key = Key::Tab;
/// Held to run time 4x slower. Both held freezes time.
pub const SLOW_KEY: Key = Key::Backquote;

const FPS_LOG_INTERVAL_FRAMES: u64 = 600;

/// Process-wide quit flag. Goes from running to quitting once and stays there.
#[derive(Debug, Default)]
pub struct RunState {
    quitting: bool,
}

impl RunState {
    pub fn request_exit(&mut self) {
        if !self.quitting {
            log::info!("Exit requested");
        }
        self.quitting = true;
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }
}

/// Unscaled seconds since the previous frame.
pub trait DeltaSource {
    fn delta(&mut self) -> f32;
}

impl DeltaSource for FrameClock {
    fn delta(&mut self) -> f32 {
        let dt = self.tick();
        if self.frame_count % FPS_LOG_INTERVAL_FRAMES == 0 {
            log::debug!(
                "{:.1} fps ({:.2}ms/frame)",
                self.smoothed_fps,
                self.smoothed_frame_time_ms
            );
        }
        dt
    }
}

/// End-of-frame yield.
pub trait Idle {
    fn idle(&mut self, has_focus: bool);
}

pub struct SleepIdle;

impl Idle for SleepIdle {
    fn idle(&mut self, has_focus: bool) {
        std::thread::sleep(if has_focus {
            FOCUSED_IDLE
        } else {
            UNFOCUSED_IDLE
        });
    }
}

pub struct FrameLoop<'a> {
    events: &'a mut dyn EventSource,
    clock: &'a mut dyn DeltaSource,
    idle: &'a mut dyn Idle,
    priority: PriorityHint,
    run: RunState,
    has_focus: bool,
    elapsed: f64,
    frames: u64,
    pending: Vec<OsEvent>,
}

impl<'a> FrameLoop<'a> {
    pub fn new(
        events: &'a mut dyn EventSource,
        clock: &'a mut dyn DeltaSource,
        idle: &'a mut dyn Idle,
        priority: PriorityHint,
    ) -> Self {
        Self {
            events,
            clock,
            idle,
            priority,
            run: RunState::default(),
            has_focus: true,
            elapsed: 0.0,
            frames: 0,
            pending: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn run(&mut self, subsystems: &mut Subsystems) -> Result<(), FatalRuntimeError> {
        self.priority.boost();
        while !self.run.is_quitting() {
            let mut live = subsystems.live()?;
            self.step(&mut live)?;
        }
        self.priority.restore();
        log::info!("Frame loop finished after {} frames", self.frames);
        Ok(())
    }

    /// One frame.
    pub fn step(&mut self, live: &mut Live<'_>) -> Result<(), FatalRuntimeError> {
        self.frames += 1;
        self.pump_os_events(live);

        let real_dt = self.clock.delta();
        self.elapsed += f64::from(real_dt);
        let scale = TimeScale::from_modifiers(
            live.input_filter.is_being_pressed(DeviceInput::Key(FAST_KEY)),
            live.input_filter.is_being_pressed(DeviceInput::Key(SLOW_KEY)),
        );
        let dt = scale.apply(real_dt);

        live.renderer.update(dt);
        live.textures.update(dt);
        live.game_state.update(dt);
        live.screens.update(dt);
        live.audio.update(dt);
        live.game_state.on_system_menu = live.screens.on_system_screen();

        self.handle_input(live, dt)?;

        live.screens.draw(&mut *live.renderer)?;

        self.idle.idle(self.has_focus);
        Ok(())
    }

    fn pump_os_events(&mut self, live: &mut Live<'_>) {
        let mut events = std::mem::take(&mut self.pending);
        self.events.pump(&mut events);
        for event in events.drain(..) {
            match event {
                OsEvent::Quit => self.run.request_exit(),
                OsEvent::FocusChanged(focused) => {
                    log::trace!(
                        "App {} focus",
                        if focused { "has" } else { "doesn't have" }
                    );
                    self.has_focus = focused;
                    if focused {
                        self.priority.boost();
                    } else {
                        self.priority.restore();
                        // Key-ups are not delivered while unfocused.
                        live.input_filter.release_all();
                    }
                }
                OsEvent::Button { input, pressed } => {
                    live.input_filter.button_pressed(input, pressed);
                }
                OsEvent::Resized { width, height } => live.renderer.resize(width, height),
            }
        }
        self.pending = events;
    }

    fn handle_input(&mut self, live: &mut Live<'_>, dt: f32) -> Result<(), FatalRuntimeError> {
        live.input_filter.update(dt);
        for event in live.input_filter.take_events() {
            let mapped = live.input_mapper.map(event.input);
            if let Some(game) = mapped.game {
                if event.is_first_press() {
                    live.input_queue.remember(game, self.elapsed);
                }
            }

            // NumLock reads as held while its light is on; only the toggle counts.
            if event.input == DeviceInput::Key(Key::NumLock) && event.phase != InputPhase::FirstPress
            {
                continue;
            }

            if dispatch::handle(live, &mut self.run, &event, &mapped)? {
                continue;
            }
            live.screens.dispatch_input(&event, &mapped);
        }
        Ok(())
    }
}
