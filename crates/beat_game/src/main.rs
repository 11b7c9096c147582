//! Beat -- rhythm game entry point.
//!
//! The game owns its loop: `main` sets up crash hooks and logging, then hands
//! control to the `Sequencer`, which builds every subsystem in dependency
//! order (see `registry::SubsystemId::ORDER`), runs the `FrameLoop` until an
//! exit is requested, and tears everything down in reverse. Any fatal error
//! ends up as a dialog after teardown; the process always exits with 0.

mod audio;
mod content;
mod dispatch;
mod error;
mod frame_loop;
mod game_state;
mod graphics;
mod registry;
mod screens;
mod startup;
#[cfg(test)]
mod testing;
mod textures;

use std::path::{Path, PathBuf};

use beat_core::{ConfigError, FrameClock, InputFilter, InputMapper, InputQueue, Preferences};
use beat_platform::hooks::{change_to_executable_dir, install_crash_hook};
use beat_platform::{DialogErrorSurface, ErrorSurface, Platform};
use beat_render::{create_renderer, SelectionConfig, WgpuBackendFactory, DEFAULT_COMPAT_RULES};

use audio::{AudioManager, AudioThread};
use content::{
    AnnouncerSet, ContentIndex, ContentManager, FontManager, ANNOUNCERS_DIR, CACHE_INDEX_PATH,
    SONGS_DIR,
};
use error::SubsystemInitError;
use frame_loop::SleepIdle;
use game_state::GameState;
use registry::{Handle, SubsystemId, Subsystems};
use screens::ScreenStack;
use startup::{LifecycleState, Sequencer, SubsystemFactory, SYSTEM_FONT};
use textures::TextureCache;

const DEFAULT_ANNOUNCER: &str = "default";

/// Builds the real subsystems: threaded audio, wgpu renderer, on-disk content.
struct GameFactory {
    prefs_path: PathBuf,
}

impl GameFactory {
    fn new(prefs_path: PathBuf) -> Self {
        Self { prefs_path }
    }
}

impl SubsystemFactory<Platform> for GameFactory {
    fn create(
        &mut self,
        id: SubsystemId,
        built: &mut Subsystems,
        host: &Platform,
    ) -> Result<Handle, SubsystemInitError> {
        if id == SubsystemId::Preferences {
            return Ok(Handle::Preferences(Preferences::load_or_default(
                &self.prefs_path,
            )));
        }
        if id == SubsystemId::ContentManager {
            let index = built.content_index_mut()?;
            if index.is_empty() {
                log::info!("No song cache yet; every song folder will be scanned");
            }
            let content = ContentManager::load(Path::new(SONGS_DIR), index);
            log::debug!("Song cache tracks {} folders", index.len());
            return Ok(Handle::ContentManager(content));
        }
        if id == SubsystemId::FontManager {
            let mut fonts = FontManager::new();
            fonts.load(SYSTEM_FONT, built.textures_mut()?);
            return Ok(Handle::FontManager(fonts));
        }

        let prefs = built.prefs()?;
        let handle = match id {
            SubsystemId::GameState => Handle::GameState(GameState::new()),
            SubsystemId::Audio => {
                let mut audio = AudioThread::start(&prefs.sound_drivers).map_err(|source| {
                    SubsystemInitError::Io {
                        subsystem: id,
                        source,
                    }
                })?;
                audio.set_volume(prefs.sound_volume);
                Handle::Audio(Box::new(audio))
            }
            SubsystemId::Announcer => {
                let mut announcers = AnnouncerSet::scan(Path::new(ANNOUNCERS_DIR));
                if !announcers.select(DEFAULT_ANNOUNCER) {
                    if let Some(first) = announcers.available().first().cloned() {
                        announcers.select(&first);
                    }
                }
                Handle::Announcer(announcers)
            }
            SubsystemId::InputFilter => Handle::InputFilter(InputFilter::new()),
            SubsystemId::InputMapper => {
                Handle::InputMapper(InputMapper::from_remaps(&prefs.key_remaps))
            }
            SubsystemId::InputQueue => Handle::InputQueue(InputQueue::new()),
            SubsystemId::ContentIndex => {
                Handle::ContentIndex(ContentIndex::open(Path::new(CACHE_INDEX_PATH)))
            }
            SubsystemId::Renderer => {
                let mut backends = WgpuBackendFactory::new(host, graphics::video_mode(prefs));
                let renderer = create_renderer(
                    SelectionConfig {
                        forced: Some(prefs.renderer.as_str()),
                        allow_unaccelerated: prefs.allow_unaccelerated_renderer,
                        rules: DEFAULT_COMPAT_RULES,
                    },
                    &mut backends,
                )?;
                log::info!(
                    "Renderer: {} on {}{}",
                    renderer.backend(),
                    renderer.adapter_name(),
                    if renderer.is_software_renderer() {
                        " (unaccelerated)"
                    } else {
                        ""
                    }
                );
                Handle::Renderer(renderer)
            }
            SubsystemId::TextureManager => Handle::TextureManager(Box::new(TextureCache::new(
                graphics::texture_limits(prefs),
            ))),
            SubsystemId::ScreenManager => Handle::ScreenManager(Box::new(ScreenStack::new())),
            SubsystemId::Preferences
            | SubsystemId::ContentManager
            | SubsystemId::FontManager => {
                return Err(SubsystemInitError::OutOfOrder { subsystem: id })
            }
        };
        Ok(handle)
    }

    fn save_preferences(&mut self, prefs: &Preferences) -> Result<(), ConfigError> {
        prefs.save(&self.prefs_path)?;
        log::info!("Preferences saved to {}", self.prefs_path.display());
        Ok(())
    }
}

fn main() {
    let mut sequencer = Sequencer::new();

    install_crash_hook();
    sequencer.advance(LifecycleState::CoreHooksReady);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    sequencer.advance(LifecycleState::LoggingReady);

    log::info!("Beat starting...");
    if let Err(err) = change_to_executable_dir(SONGS_DIR) {
        log::warn!("Could not change to the executable's directory: {err}");
    }

    match Platform::new() {
        Ok(mut platform) => {
            let mut factory = GameFactory::new(Preferences::resolve_path());
            let mut clock = FrameClock::new();
            let mut idle = SleepIdle;
            // The error, if any, is kept as the sequencer's report.
            let _ = sequencer.run(&mut platform, &mut factory, &mut clock, &mut idle);
        }
        Err(err) => sequencer.abort(SubsystemInitError::from(err).into()),
    }
    log::info!("Beat finished ({})", sequencer.state());

    if let Some(report) = sequencer.error_report() {
        DialogErrorSurface::default().show_error(report);
    }
}
