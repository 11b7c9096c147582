//! OS event pump.
//!
//! The frame loop owns control flow, so instead of handing the process to
//! `EventLoop::run_app` the platform pumps pending winit events once per
//! frame with a zero timeout and translates them into `OsEvent`s. Gamepad
//! events from gilrs are appended after the window events of the same pump.

use std::sync::Arc;
use std::time::Duration;

use beat_core::input::{DeviceInput, Key};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::gamepad::GamepadPoller;
use crate::window::{create_window, PlatformConfig};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsEvent {
    Quit,
    /// Input focus gained (`true`) or lost (`false`).
    FocusChanged(bool),
    Button { input: DeviceInput, pressed: bool },
    Resized { width: u32, height: u32 },
}

/// Anything the frame loop can pump for OS events.
pub trait EventSource {
    /// Appends every event that arrived since the previous pump. Never blocks.
    fn pump(&mut self, out: &mut Vec<OsEvent>);

    /// Gamepads currently connected, by pad index.
    fn connected_pads(&self) -> Vec<u8> {
        Vec::new()
    }
}

pub struct Platform {
    event_loop: EventLoop<()>,
    gamepads: GamepadPoller,
}

impl Platform {
    pub fn new() -> Result<Self, PlatformError> {
        let event_loop = EventLoop::new()?;
        Ok(Self {
            event_loop,
            gamepads: GamepadPoller::new(),
        })
    }

    pub fn create_window(&self, config: &PlatformConfig) -> Result<Arc<Window>, PlatformError> {
        let window = create_window(&self.event_loop, config)?;
        log::info!(
            "Window created: {}x{} ({})",
            config.width,
            config.height,
            if config.windowed { "windowed" } else { "fullscreen" }
        );
        Ok(window)
    }
}

impl EventSource for Platform {
    fn pump(&mut self, out: &mut Vec<OsEvent>) {
        let mut collector = Collector { out: &mut *out };
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut collector);
        if let PumpStatus::Exit(code) = status {
            log::trace!("Event loop exited with code {code}");
            out.push(OsEvent::Quit);
        }
        self.gamepads.poll(out);
    }

    fn connected_pads(&self) -> Vec<u8> {
        self.gamepads.connected_pads()
    }
}

struct Collector<'a> {
    out: &'a mut Vec<OsEvent>,
}

impl ApplicationHandler for Collector<'_> {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::trace!("Close requested");
                self.out.push(OsEvent::Quit);
            }
            WindowEvent::Focused(focused) => self.out.push(OsEvent::FocusChanged(focused)),
            WindowEvent::Resized(size) => self.out.push(OsEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput { event, .. } => {
                // Held keys are tracked by the input filter; OS repeats add nothing.
                if event.repeat {
                    return;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = map_key(code) {
                        self.out.push(OsEvent::Button {
                            input: DeviceInput::Key(key),
                            pressed: event.state == ElementState::Pressed,
                        });
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn map_key(key_code: KeyCode) -> Option<Key> {
    let key = match key_code {
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Escape => Key::Escape,
        KeyCode::Space => Key::Space,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Backquote => Key::Backquote,
        KeyCode::AltLeft => Key::LAlt,
        KeyCode::AltRight => Key::RAlt,
        KeyCode::ShiftLeft => Key::LShift,
        KeyCode::ShiftRight => Key::RShift,
        KeyCode::ControlLeft => Key::LCtrl,
        KeyCode::ControlRight => Key::RCtrl,
        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::NumLock => Key::NumLock,
        KeyCode::ScrollLock => Key::ScrollLock,
        KeyCode::Pause => Key::Pause,
        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,
        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,
        KeyCode::Digit0 => Key::Digit0,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6,
        KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8,
        KeyCode::Digit9 => Key::Digit9,
        _ => return None,
    };
    Some(key)
}
