//! Screen navigation.
//!
//! Screen contents (layout, widgets, gameplay) belong to the screens
//! themselves; the manager only tracks which one is active, forwards input
//! and frame callbacks to it, and overlays system messages.

use beat_core::{InputEvent, MappedInput, MenuButton};
use beat_render::{Frame, Renderer, RendererError};

/// How long a system message stays on screen.
pub const SYSTEM_MESSAGE_SECS: f32 = 3.0;

/// Screens the operator key must not interrupt.
pub const SYSTEM_SCREENS: &[&str] = &["ScreenOptionsMenu", "ScreenEditMenu", "ScreenEdit"];

pub fn is_system_screen(name: &str) -> bool {
    SYSTEM_SCREENS.contains(&name)
}

pub trait ScreenManager {
    /// Takes effect at the next `update`, so the outgoing screen finishes
    /// the current frame.
    fn set_active_screen(&mut self, name: &str);

    fn active_screen(&self) -> Option<&str>;

    fn on_system_screen(&self) -> bool {
        self.active_screen().is_some_and(is_system_screen)
    }

    fn update(&mut self, dt: f32);

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RendererError>;

    fn dispatch_input(&mut self, event: &InputEvent, mapped: &MappedInput);

    fn post_system_message(&mut self, text: &str);

    fn refresh_credits(&mut self, coins: u32);
}

#[derive(Debug, Clone, PartialEq)]
struct SystemMessage {
    text: String,
    remaining: f32,
}

#[derive(Debug, Default)]
pub struct ScreenStack {
    active: Option<String>,
    pending: Option<String>,
    message: Option<SystemMessage>,
    credits_text: String,
}

impl ScreenStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn system_message(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }

    #[cfg(test)]
    pub fn credits_text(&self) -> &str {
        &self.credits_text
    }
}

impl ScreenManager for ScreenStack {
    fn set_active_screen(&mut self, name: &str) {
        log::debug!("Screen change requested: {name}");
        self.pending = Some(name.to_string());
    }

    fn active_screen(&self) -> Option<&str> {
        self.pending.as_deref().or(self.active.as_deref())
    }

    fn update(&mut self, dt: f32) {
        if let Some(next) = self.pending.take() {
            log::info!(
                "Screen: {} -> {}",
                self.active.as_deref().unwrap_or("<none>"),
                next
            );
            self.active = Some(next);
        }
        if let Some(message) = &mut self.message {
            message.remaining -= dt;
            if message.remaining <= 0.0 {
                self.message = None;
            }
        }
    }

    fn draw(&mut self, renderer: &mut dyn Renderer) -> Result<(), RendererError> {
        renderer.draw(&Frame::default())
    }

    fn dispatch_input(&mut self, event: &InputEvent, mapped: &MappedInput) {
        let Some(screen) = self.active.as_deref() else {
            return;
        };
        if event.is_first_press() && mapped.menu_button() == Some(MenuButton::Back) {
            log::debug!("{screen}: back");
        }
        log::trace!("{screen}: {:?} {:?}", event.input, event.phase);
    }

    fn post_system_message(&mut self, text: &str) {
        log::info!("{text}");
        self.message = Some(SystemMessage {
            text: text.to_string(),
            remaining: SYSTEM_MESSAGE_SECS,
        });
    }

    fn refresh_credits(&mut self, coins: u32) {
        self.credits_text = match coins {
            1 => "CREDIT: 1".to_string(),
            n => format!("CREDITS: {n}"),
        };
    }
}
