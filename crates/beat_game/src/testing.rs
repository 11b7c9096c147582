//! In-memory collaborators for exercising the loop, dispatcher, registry
//! and sequencer without a window, GPU or audio device.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use beat_core::{
    ConfigError, InputEvent, InputFilter, InputMapper, InputQueue, MappedInput, Preferences,
};
use beat_platform::{EventSource, OsEvent};
use beat_render::{BackendKind, Frame, Renderer, RendererError, VideoMode};

use crate::audio::AudioManager;
use crate::content::{AnnouncerSet, ContentIndex, ContentManager, FontManager};
use crate::error::{FatalRuntimeError, SubsystemInitError};
use crate::frame_loop::{DeltaSource, Idle};
use crate::game_state::GameState;
use crate::registry::{Handle, Live, SubsystemId, Subsystems};
use crate::screens::ScreenManager;
use crate::startup::SubsystemFactory;
use crate::textures::{TextureLimits, TextureManager};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RendererUpdate(f32),
    TexturesUpdate(f32),
    GameStateUpdate(f32),
    ScreensUpdate(f32),
    AudioUpdate(f32),
    Draw,
    Resize(u32, u32),
    SetVideoMode(VideoMode),
    Screenshot(PathBuf),
    SetLimits(TextureLimits),
    ReloadAll,
    SetScreen(String),
    Message(String),
    Credits(u32),
    Dispatched(InputEvent),
    PlayOnce(String),
    Dropped(SubsystemId),
}

/// Shared, ordered log of every call the fakes receive.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Vec<Call>>>);

impl Recorder {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn dropped(&self) -> Vec<SubsystemId> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Dropped(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn dispatched(&self) -> Vec<InputEvent> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Dispatched(event) => Some(*event),
                _ => None,
            })
            .collect()
    }
}

pub struct FakeRenderer {
    rec: Recorder,
    pub reload_on_mode_change: bool,
    pub fail_draw: bool,
}

impl FakeRenderer {
    pub fn new(rec: &Recorder) -> Self {
        Self {
            rec: rec.clone(),
            reload_on_mode_change: false,
            fail_draw: false,
        }
    }
}

impl Renderer for FakeRenderer {
    fn backend(&self) -> BackendKind {
        BackendKind::Native
    }

    fn adapter_name(&self) -> &str {
        "Fake Adapter"
    }

    fn is_software_renderer(&self) -> bool {
        false
    }

    fn set_video_mode(&mut self, mode: &VideoMode) -> Result<bool, RendererError> {
        self.rec.push(Call::SetVideoMode(mode.clone()));
        Ok(self.reload_on_mode_change)
    }

    fn update(&mut self, dt: f32) {
        self.rec.push(Call::RendererUpdate(dt));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.rec.push(Call::Resize(width, height));
    }

    fn draw(&mut self, _frame: &Frame) -> Result<(), RendererError> {
        if self.fail_draw {
            return Err(RendererError::Generic("device lost".to_string()));
        }
        self.rec.push(Call::Draw);
        Ok(())
    }

    fn save_screenshot(&mut self, path: &Path) -> Result<(), RendererError> {
        self.rec.push(Call::Screenshot(path.to_path_buf()));
        Ok(())
    }
}

impl Drop for FakeRenderer {
    fn drop(&mut self) {
        self.rec.push(Call::Dropped(SubsystemId::Renderer));
    }
}

pub struct FakeTextures {
    rec: Recorder,
    pub reload_on_limits: bool,
    pub fail_reload: bool,
}

impl FakeTextures {
    pub fn new(rec: &Recorder) -> Self {
        Self {
            rec: rec.clone(),
            reload_on_limits: false,
            fail_reload: false,
        }
    }
}

impl TextureManager for FakeTextures {
    fn set_limits(&mut self, limits: TextureLimits) -> bool {
        self.rec.push(Call::SetLimits(limits));
        self.reload_on_limits
    }

    fn reload_all(&mut self) -> Result<(), FatalRuntimeError> {
        if self.fail_reload {
            return Err(FatalRuntimeError::TextureReload("out of video memory".to_string()));
        }
        self.rec.push(Call::ReloadAll);
        Ok(())
    }

    fn update(&mut self, dt: f32) {
        self.rec.push(Call::TexturesUpdate(dt));
    }

    fn acquire(&mut self, _name: &str) {}

    fn delayed_delete(&mut self) {}
}

impl Drop for FakeTextures {
    fn drop(&mut self) {
        self.rec.push(Call::Dropped(SubsystemId::TextureManager));
    }
}

pub struct FakeScreens {
    rec: Recorder,
    active: Option<String>,
}

impl FakeScreens {
    pub fn new(rec: &Recorder) -> Self {
        Self {
            rec: rec.clone(),
            active: None,
        }
    }
}

impl ScreenManager for FakeScreens {
    fn set_active_screen(&mut self, name: &str) {
        self.active = Some(name.to_string());
        self.rec.push(Call::SetScreen(name.to_string()));
    }

    fn active_screen(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn update(&mut self, dt: f32) {
        self.rec.push(Call::ScreensUpdate(dt));
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RendererError> {
        renderer.draw(&Frame::default())
    }

    fn dispatch_input(&mut self, event: &InputEvent, _mapped: &MappedInput) {
        self.rec.push(Call::Dispatched(*event));
    }

    fn post_system_message(&mut self, text: &str) {
        self.rec.push(Call::Message(text.to_string()));
    }

    fn refresh_credits(&mut self, coins: u32) {
        self.rec.push(Call::Credits(coins));
    }
}

impl Drop for FakeScreens {
    fn drop(&mut self) {
        self.rec.push(Call::Dropped(SubsystemId::ScreenManager));
    }
}

pub struct FakeAudio {
    rec: Recorder,
    pub panic_on_update: bool,
}

impl FakeAudio {
    pub fn new(rec: &Recorder) -> Self {
        Self {
            rec: rec.clone(),
            panic_on_update: false,
        }
    }
}

impl AudioManager for FakeAudio {
    fn play_once(&mut self, sound: &str) {
        self.rec.push(Call::PlayOnce(sound.to_string()));
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn update(&mut self, dt: f32) {
        if self.panic_on_update {
            panic!("mixer underrun");
        }
        self.rec.push(Call::AudioUpdate(dt));
    }
}

impl Drop for FakeAudio {
    fn drop(&mut self) {
        self.rec.push(Call::Dropped(SubsystemId::Audio));
    }
}

pub struct PanickingAudio;

impl AudioManager for PanickingAudio {
    fn play_once(&mut self, _sound: &str) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn update(&mut self, _dt: f32) {}
}

impl Drop for PanickingAudio {
    fn drop(&mut self) {
        panic!("audio device vanished");
    }
}

fn fake_handle(id: SubsystemId, rec: &Recorder) -> Handle {
    match id {
        SubsystemId::Preferences => Handle::Preferences(Preferences::default()),
        SubsystemId::GameState => {
            let mut state = GameState::new();
            state.observer = Some(rec.clone());
            Handle::GameState(state)
        }
        SubsystemId::Audio => Handle::Audio(Box::new(FakeAudio::new(rec))),
        SubsystemId::Announcer => Handle::Announcer(AnnouncerSet::default()),
        SubsystemId::InputFilter => Handle::InputFilter(InputFilter::new()),
        SubsystemId::InputMapper => Handle::InputMapper(InputMapper::default()),
        SubsystemId::InputQueue => Handle::InputQueue(InputQueue::new()),
        SubsystemId::ContentIndex => Handle::ContentIndex(ContentIndex::in_memory()),
        SubsystemId::ContentManager => Handle::ContentManager(ContentManager::default()),
        SubsystemId::Renderer => Handle::Renderer(Box::new(FakeRenderer::new(rec))),
        SubsystemId::TextureManager => Handle::TextureManager(Box::new(FakeTextures::new(rec))),
        SubsystemId::FontManager => Handle::FontManager(FontManager::new()),
        SubsystemId::ScreenManager => Handle::ScreenManager(Box::new(FakeScreens::new(rec))),
    }
}

/// One fake handle per subsystem, in construction order.
pub fn full_handles(rec: &Recorder) -> Vec<Handle> {
    SubsystemId::ORDER
        .iter()
        .map(|&id| fake_handle(id, rec))
        .collect()
}

/// A fully constructed registry of fakes.
pub struct LiveFixture {
    pub subsystems: Subsystems,
    pub recorder: Recorder,
}

impl LiveFixture {
    pub fn new() -> Self {
        let recorder = Recorder::default();
        let mut subsystems = Subsystems::new();
        for handle in full_handles(&recorder) {
            subsystems.install(handle).expect("install fake");
        }
        Self {
            subsystems,
            recorder,
        }
    }

    pub fn with_live<R>(&mut self, f: impl FnOnce(&mut Live<'_>) -> R) -> R {
        let mut live = self.subsystems.live().expect("all subsystems installed");
        f(&mut live)
    }

    pub fn game_state_coins(&mut self) -> u32 {
        self.with_live(|live| live.game_state.coins)
    }
}

/// Replays one batch of OS events per pump. Once the script runs out every
/// pump reports `Quit`.
pub struct ScriptedEvents {
    frames: VecDeque<Vec<OsEvent>>,
    pub pads: Vec<u8>,
}

impl ScriptedEvents {
    pub fn new(frames: Vec<Vec<OsEvent>>) -> Self {
        Self {
            frames: frames.into(),
            pads: Vec::new(),
        }
    }
}

impl EventSource for ScriptedEvents {
    fn pump(&mut self, out: &mut Vec<OsEvent>) {
        match self.frames.pop_front() {
            Some(frame) => out.extend(frame),
            None => out.push(OsEvent::Quit),
        }
    }

    fn connected_pads(&self) -> Vec<u8> {
        self.pads.clone()
    }
}

pub struct ManualClock {
    dt: f32,
}

impl ManualClock {
    pub fn new(dt: f32) -> Self {
        Self { dt }
    }
}

impl DeltaSource for ManualClock {
    fn delta(&mut self) -> f32 {
        self.dt
    }
}

/// Records the focus state passed to each idle instead of sleeping.
#[derive(Debug, Default)]
pub struct NoIdle {
    pub focus: Vec<bool>,
}

impl Idle for NoIdle {
    fn idle(&mut self, has_focus: bool) {
        self.focus.push(has_focus);
    }
}

pub struct TestFactory {
    rec: Recorder,
    pub created: Vec<SubsystemId>,
    pub saved: Option<Preferences>,
    pub fail_at: Option<SubsystemId>,
    pub fail_draw: bool,
    pub panic_in_audio_update: bool,
}

impl TestFactory {
    pub fn new(rec: &Recorder) -> Self {
        Self {
            rec: rec.clone(),
            created: Vec::new(),
            saved: None,
            fail_at: None,
            fail_draw: false,
            panic_in_audio_update: false,
        }
    }
}

impl SubsystemFactory<ScriptedEvents> for TestFactory {
    fn create(
        &mut self,
        id: SubsystemId,
        built: &mut Subsystems,
        _host: &ScriptedEvents,
    ) -> Result<Handle, SubsystemInitError> {
        self.created.push(id);
        if id != SubsystemId::Preferences {
            built.prefs()?;
        }
        if self.fail_at == Some(id) {
            return Err(match id {
                SubsystemId::Renderer => RendererError::NoHardwareAcceleration {
                    backend: BackendKind::Native,
                }
                .into(),
                _ => SubsystemInitError::Io {
                    subsystem: id,
                    source: std::io::Error::other("scripted failure"),
                },
            });
        }
        if id == SubsystemId::Renderer {
            let mut renderer = FakeRenderer::new(&self.rec);
            renderer.fail_draw = self.fail_draw;
            return Ok(Handle::Renderer(Box::new(renderer)));
        }
        if id == SubsystemId::Audio {
            let mut audio = FakeAudio::new(&self.rec);
            audio.panic_on_update = self.panic_in_audio_update;
            return Ok(Handle::Audio(Box::new(audio)));
        }
        Ok(fake_handle(id, &self.rec))
    }

    fn save_preferences(&mut self, prefs: &Preferences) -> Result<(), ConfigError> {
        self.saved = Some(prefs.clone());
        Ok(())
    }
}
