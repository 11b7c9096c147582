//! Startup and shutdown sequencing.
//!
//! ```text
//! Uninitialized -> CoreHooksReady -> LoggingReady -> SubsystemsConstructing
//!     -> Running -> SubsystemsTearingDown -> Terminated
//! ```
//!
//! A failure while constructing or running jumps straight to
//! `SubsystemsTearingDown`. Teardown always runs, and the failure is kept as
//! the error report for the player.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use beat_core::{ConfigError, Preferences};
use beat_platform::{EventSource, PriorityHint};

use crate::error::{panic_message, FatalRuntimeError, LifecycleError, SubsystemInitError};
use crate::frame_loop::{DeltaSource, FrameLoop, Idle};
use crate::registry::{Handle, Live, SubsystemId, Subsystems};

pub const FIRST_RUN_SCREEN: &str = "ScreenAutoGraphicDetail";
pub const SYSTEM_FONT: &str = "Common normal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Uninitialized,
    CoreHooksReady,
    LoggingReady,
    SubsystemsConstructing,
    Running,
    SubsystemsTearingDown,
    Terminated,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Builds each subsystem on request. `built` holds everything constructed
/// so far, so later subsystems can read earlier ones (preferences above all).
pub trait SubsystemFactory<H> {
    fn create(
        &mut self,
        id: SubsystemId,
        built: &mut Subsystems,
        host: &H,
    ) -> Result<Handle, SubsystemInitError>;

    fn save_preferences(&mut self, prefs: &Preferences) -> Result<(), ConfigError>;
}

pub struct Sequencer {
    state: LifecycleState,
    error_report: Option<String>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
            error_report: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn error_report(&self) -> Option<&str> {
        self.error_report.as_deref().filter(|r| !r.is_empty())
    }

    /// Moves forward. States are never revisited.
    pub fn advance(&mut self, next: LifecycleState) {
        if next <= self.state {
            log::warn!("Ignoring lifecycle transition {} -> {}", self.state, next);
            return;
        }
        log::info!("Lifecycle: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Records a failure that happened before subsystems existed and
    /// finishes the lifecycle.
    pub fn abort(&mut self, err: LifecycleError) {
        log::error!("{err}");
        self.error_report = Some(err.to_string());
        self.advance(LifecycleState::SubsystemsTearingDown);
        self.advance(LifecycleState::Terminated);
    }

    /// Constructs every subsystem, runs the frame loop until exit, then tears
    /// everything down. Preferences are saved only when the loop exits
    /// cleanly. A panic during construction or a frame is reported like any
    /// other fatal error.
    pub fn run<H: EventSource>(
        &mut self,
        host: &mut H,
        factory: &mut dyn SubsystemFactory<H>,
        clock: &mut dyn DeltaSource,
        idle: &mut dyn Idle,
    ) -> Result<(), LifecycleError> {
        self.advance(LifecycleState::SubsystemsConstructing);
        let mut subsystems = Subsystems::new();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.construct_and_run(&mut subsystems, host, factory, clock, idle)
        }))
        .unwrap_or_else(|payload| {
            Err(FatalRuntimeError::Panic(panic_message(&*payload)).into())
        });

        self.advance(LifecycleState::SubsystemsTearingDown);
        let destroyed = subsystems.teardown();
        log::debug!("Destroyed {} subsystems", destroyed.len());
        self.advance(LifecycleState::Terminated);

        if let Err(err) = &outcome {
            log::error!("{err}");
            self.error_report = Some(err.to_string());
        }
        outcome
    }

    fn construct_and_run<H: EventSource>(
        &mut self,
        subsystems: &mut Subsystems,
        host: &mut H,
        factory: &mut dyn SubsystemFactory<H>,
        clock: &mut dyn DeltaSource,
        idle: &mut dyn Idle,
    ) -> Result<(), LifecycleError> {
        for id in SubsystemId::ORDER {
            let handle = factory.create(id, subsystems, host)?;
            subsystems.install(handle)?;
        }
        log_inventory(subsystems);

        let pads = host.connected_pads();
        let boost = {
            let mut live = subsystems.live()?;
            reset_game(&mut live, &pads);
            live.prefs.wants_priority_boost()
        };

        self.advance(LifecycleState::Running);
        let mut frame_loop = FrameLoop::new(host, clock, idle, PriorityHint::new(boost));
        frame_loop.run(subsystems)?;

        factory.save_preferences(subsystems.prefs()?)?;
        Ok(())
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Puts the session back at its starting screen: fresh game state, input
/// mappings re-read from preferences, first-run screen once.
pub fn reset_game(live: &mut Live<'_>, connected_pads: &[u8]) {
    live.game_state.reset();
    live.input_mapper.reset_to_defaults();
    live.input_mapper.apply_remaps(&live.prefs.key_remaps);
    live.textures.delayed_delete();

    let screen = if live.prefs.first_run {
        FIRST_RUN_SCREEN
    } else {
        live.prefs.initial_screen.as_str()
    };
    live.screens.set_active_screen(screen);
    live.prefs.first_run = false;

    if live.prefs.auto_map_joysticks {
        live.input_mapper.auto_map_joysticks(connected_pads);
    }
}

fn log_inventory(subsystems: &Subsystems) {
    log::info!("{} subsystems constructed", subsystems.constructed().len());
    if let Some(content) = subsystems.content() {
        log::info!(
            "{} songs in {} groups",
            content.song_count(),
            content.group_count()
        );
    }
    if let Some(announcer) = subsystems.announcer() {
        log::info!(
            "Announcers: {} available, current {}",
            announcer.available().len(),
            announcer.current().unwrap_or("<none>")
        );
    }
    if let Some(fonts) = subsystems.fonts() {
        log::debug!("{} fonts preloaded", fonts.loaded_count());
    }
}
