//! Ownership container for every process-lifetime subsystem.
//!
//! Subsystems are installed one at a time in `SubsystemId::ORDER` and torn
//! down in exactly the reverse of the order they were installed, whether or
//! not construction finished. Teardown of one subsystem cannot prevent
//! teardown of the rest: each drop runs under `catch_unwind`.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use beat_core::{InputFilter, InputMapper, InputQueue, Preferences};
use beat_render::Renderer;

use crate::audio::AudioManager;
use crate::content::{AnnouncerSet, ContentIndex, ContentManager, FontManager};
use crate::error::{panic_message, SubsystemInitError};
use crate::game_state::GameState;
use crate::screens::ScreenManager;
use crate::textures::TextureManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemId {
    Preferences,
    GameState,
    Audio,
    Announcer,
    InputFilter,
    InputMapper,
    InputQueue,
    ContentIndex,
    ContentManager,
    Renderer,
    TextureManager,
    FontManager,
    ScreenManager,
}

impl SubsystemId {
    /// Construction order. Each entry may depend on any entry before it.
    pub const ORDER: [SubsystemId; 13] = [
        SubsystemId::Preferences,
        SubsystemId::GameState,
        SubsystemId::Audio,
        SubsystemId::Announcer,
        SubsystemId::InputFilter,
        SubsystemId::InputMapper,
        SubsystemId::InputQueue,
        SubsystemId::ContentIndex,
        SubsystemId::ContentManager,
        SubsystemId::Renderer,
        SubsystemId::TextureManager,
        SubsystemId::FontManager,
        SubsystemId::ScreenManager,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Preferences => "preferences",
            Self::GameState => "game state",
            Self::Audio => "audio",
            Self::Announcer => "announcer",
            Self::InputFilter => "input filter",
            Self::InputMapper => "input mapper",
            Self::InputQueue => "input queue",
            Self::ContentIndex => "content index",
            Self::ContentManager => "content manager",
            Self::Renderer => "renderer",
            Self::TextureManager => "texture manager",
            Self::FontManager => "font manager",
            Self::ScreenManager => "screen manager",
        }
    }

    fn position(self) -> usize {
        Self::ORDER
            .iter()
            .position(|&id| id == self)
            .unwrap_or(Self::ORDER.len())
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A freshly constructed subsystem, ready to be installed.
pub enum Handle {
    Preferences(Preferences),
    GameState(GameState),
    Audio(Box<dyn AudioManager>),
    Announcer(AnnouncerSet),
    InputFilter(InputFilter),
    InputMapper(InputMapper),
    InputQueue(InputQueue),
    ContentIndex(ContentIndex),
    ContentManager(ContentManager),
    Renderer(Box<dyn Renderer>),
    TextureManager(Box<dyn TextureManager>),
    FontManager(FontManager),
    ScreenManager(Box<dyn ScreenManager>),
}

impl Handle {
    pub fn id(&self) -> SubsystemId {
        match self {
            Self::Preferences(_) => SubsystemId::Preferences,
            Self::GameState(_) => SubsystemId::GameState,
            Self::Audio(_) => SubsystemId::Audio,
            Self::Announcer(_) => SubsystemId::Announcer,
            Self::InputFilter(_) => SubsystemId::InputFilter,
            Self::InputMapper(_) => SubsystemId::InputMapper,
            Self::InputQueue(_) => SubsystemId::InputQueue,
            Self::ContentIndex(_) => SubsystemId::ContentIndex,
            Self::ContentManager(_) => SubsystemId::ContentManager,
            Self::Renderer(_) => SubsystemId::Renderer,
            Self::TextureManager(_) => SubsystemId::TextureManager,
            Self::FontManager(_) => SubsystemId::FontManager,
            Self::ScreenManager(_) => SubsystemId::ScreenManager,
        }
    }
}

#[derive(Default)]
pub struct Subsystems {
    constructed: Vec<SubsystemId>,
    prefs: Option<Preferences>,
    game_state: Option<GameState>,
    audio: Option<Box<dyn AudioManager>>,
    announcer: Option<AnnouncerSet>,
    input_filter: Option<InputFilter>,
    input_mapper: Option<InputMapper>,
    input_queue: Option<InputQueue>,
    content_index: Option<ContentIndex>,
    content: Option<ContentManager>,
    renderer: Option<Box<dyn Renderer>>,
    textures: Option<Box<dyn TextureManager>>,
    fonts: Option<FontManager>,
    screens: Option<Box<dyn ScreenManager>>,
}

/// Mutable access to everything the frame loop touches, split per field so
/// callers can hold several at once.
pub struct Live<'a> {
    pub prefs: &'a mut Preferences,
    pub game_state: &'a mut GameState,
    pub audio: &'a mut dyn AudioManager,
    pub input_filter: &'a mut InputFilter,
    pub input_mapper: &'a mut InputMapper,
    pub input_queue: &'a mut InputQueue,
    pub renderer: &'a mut dyn Renderer,
    pub textures: &'a mut dyn TextureManager,
    pub screens: &'a mut dyn ScreenManager,
}

impl Subsystems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the next subsystem. Handles must arrive in `ORDER`; each id
    /// exactly once.
    pub fn install(&mut self, handle: Handle) -> Result<(), SubsystemInitError> {
        let id = handle.id();
        let after_last = self
            .constructed
            .last()
            .is_none_or(|last| last.position() < id.position());
        if !after_last {
            return Err(SubsystemInitError::OutOfOrder { subsystem: id });
        }
        match handle {
            Handle::Preferences(v) => self.prefs = Some(v),
            Handle::GameState(v) => self.game_state = Some(v),
            Handle::Audio(v) => self.audio = Some(v),
            Handle::Announcer(v) => self.announcer = Some(v),
            Handle::InputFilter(v) => self.input_filter = Some(v),
            Handle::InputMapper(v) => self.input_mapper = Some(v),
            Handle::InputQueue(v) => self.input_queue = Some(v),
            Handle::ContentIndex(v) => self.content_index = Some(v),
            Handle::ContentManager(v) => self.content = Some(v),
            Handle::Renderer(v) => self.renderer = Some(v),
            Handle::TextureManager(v) => self.textures = Some(v),
            Handle::FontManager(v) => self.fonts = Some(v),
            Handle::ScreenManager(v) => self.screens = Some(v),
        }
        self.constructed.push(id);
        log::debug!("Constructed {id}");
        Ok(())
    }

    pub fn constructed(&self) -> &[SubsystemId] {
        &self.constructed
    }

    pub fn prefs(&self) -> Result<&Preferences, SubsystemInitError> {
        self.prefs
            .as_ref()
            .ok_or(SubsystemInitError::Missing(SubsystemId::Preferences))
    }

    pub fn content_index_mut(&mut self) -> Result<&mut ContentIndex, SubsystemInitError> {
        self.content_index
            .as_mut()
            .ok_or(SubsystemInitError::Missing(SubsystemId::ContentIndex))
    }

    pub fn textures_mut(&mut self) -> Result<&mut (dyn TextureManager + 'static), SubsystemInitError> {
        self.textures
            .as_deref_mut()
            .ok_or(SubsystemInitError::Missing(SubsystemId::TextureManager))
    }

    pub fn content(&self) -> Option<&ContentManager> {
        self.content.as_ref()
    }

    pub fn announcer(&self) -> Option<&AnnouncerSet> {
        self.announcer.as_ref()
    }

    pub fn fonts(&self) -> Option<&FontManager> {
        self.fonts.as_ref()
    }

    pub fn live(&mut self) -> Result<Live<'_>, SubsystemInitError> {
        use SubsystemId as Id;
        Ok(Live {
            prefs: self.prefs.as_mut().ok_or(SubsystemInitError::Missing(Id::Preferences))?,
            game_state: self
                .game_state
                .as_mut()
                .ok_or(SubsystemInitError::Missing(Id::GameState))?,
            audio: self
                .audio
                .as_deref_mut()
                .ok_or(SubsystemInitError::Missing(Id::Audio))?,
            input_filter: self
                .input_filter
                .as_mut()
                .ok_or(SubsystemInitError::Missing(Id::InputFilter))?,
            input_mapper: self
                .input_mapper
                .as_mut()
                .ok_or(SubsystemInitError::Missing(Id::InputMapper))?,
            input_queue: self
                .input_queue
                .as_mut()
                .ok_or(SubsystemInitError::Missing(Id::InputQueue))?,
            renderer: self
                .renderer
                .as_deref_mut()
                .ok_or(SubsystemInitError::Missing(Id::Renderer))?,
            textures: self
                .textures
                .as_deref_mut()
                .ok_or(SubsystemInitError::Missing(Id::TextureManager))?,
            screens: self
                .screens
                .as_deref_mut()
                .ok_or(SubsystemInitError::Missing(Id::ScreenManager))?,
        })
    }

    /// Destroys every constructed subsystem in reverse order of construction
    /// and returns the order used. Safe to call more than once.
    pub fn teardown(&mut self) -> Vec<SubsystemId> {
        let mut destroyed = Vec::with_capacity(self.constructed.len());
        while let Some(id) = self.constructed.pop() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| self.destroy(id)));
            match result {
                Ok(()) => log::debug!("Destroyed {id}"),
                Err(payload) => log::error!(
                    "Panic while destroying {id}: {}; continuing teardown",
                    panic_message(&*payload)
                ),
            }
            destroyed.push(id);
        }
        destroyed
    }

    fn destroy(&mut self, id: SubsystemId) {
        match id {
            SubsystemId::Preferences => drop(self.prefs.take()),
            SubsystemId::GameState => drop(self.game_state.take()),
            SubsystemId::Audio => drop(self.audio.take()),
            SubsystemId::Announcer => drop(self.announcer.take()),
            SubsystemId::InputFilter => drop(self.input_filter.take()),
            SubsystemId::InputMapper => drop(self.input_mapper.take()),
            SubsystemId::InputQueue => drop(self.input_queue.take()),
            SubsystemId::ContentIndex => drop(self.content_index.take()),
            SubsystemId::ContentManager => drop(self.content.take()),
            SubsystemId::Renderer => drop(self.renderer.take()),
            SubsystemId::TextureManager => drop(self.textures.take()),
            SubsystemId::FontManager => drop(self.fonts.take()),
            SubsystemId::ScreenManager => drop(self.screens.take()),
        }
    }
}

impl Drop for Subsystems {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{full_handles, PanickingAudio, Recorder};

    #[test]
    fn teardown_reverses_construction() {
        let rec = Recorder::default();
        let mut subsystems = Subsystems::new();
        for handle in full_handles(&rec) {
            subsystems.install(handle).expect("install in order");
        }
        assert_eq!(subsystems.constructed(), &SubsystemId::ORDER);

        let destroyed = subsystems.teardown();
        let mut expected = SubsystemId::ORDER.to_vec();
        expected.reverse();
        assert_eq!(destroyed, expected);
        assert_eq!(
            rec.dropped(),
            vec![
                SubsystemId::ScreenManager,
                SubsystemId::TextureManager,
                SubsystemId::Renderer,
                SubsystemId::Audio,
            ]
        );
    }

    #[test]
    fn partial_construction_tears_down_only_what_exists() {
        let rec = Recorder::default();
        let mut subsystems = Subsystems::new();
        for handle in full_handles(&rec).into_iter().take(4) {
            subsystems.install(handle).expect("install in order");
        }
        let destroyed = subsystems.teardown();
        assert_eq!(
            destroyed,
            vec![
                SubsystemId::Announcer,
                SubsystemId::Audio,
                SubsystemId::GameState,
                SubsystemId::Preferences,
            ]
        );
        assert!(subsystems.teardown().is_empty());
    }

    #[test]
    fn out_of_order_install_is_rejected() {
        let mut subsystems = Subsystems::new();
        subsystems
            .install(Handle::GameState(GameState::new()))
            .expect("first install");
        let err = subsystems
            .install(Handle::Preferences(Preferences::default()))
            .expect_err("preferences after game state");
        assert!(matches!(
            err,
            SubsystemInitError::OutOfOrder {
                subsystem: SubsystemId::Preferences
            }
        ));
        let err = subsystems
            .install(Handle::GameState(GameState::new()))
            .expect_err("duplicate");
        assert!(matches!(err, SubsystemInitError::OutOfOrder { .. }));
    }

    #[test]
    fn live_requires_every_loop_subsystem() {
        let rec = Recorder::default();
        let mut subsystems = Subsystems::new();
        for handle in full_handles(&rec).into_iter().take(9) {
            subsystems.install(handle).expect("install in order");
        }
        assert!(matches!(
            subsystems.live(),
            Err(SubsystemInitError::Missing(SubsystemId::Renderer))
        ));
    }

    #[test]
    fn panicking_teardown_does_not_stop_the_rest() {
        let rec = Recorder::default();
        let mut subsystems = Subsystems::new();
        for handle in full_handles(&rec) {
            let handle = match handle {
                Handle::Audio(_) => Handle::Audio(Box::new(PanickingAudio)),
                other => other,
            };
            subsystems.install(handle).expect("install in order");
        }
        let destroyed = subsystems.teardown();
        assert_eq!(destroyed.len(), SubsystemId::ORDER.len());
        assert_eq!(destroyed.last(), Some(&SubsystemId::Preferences));
    }
}
