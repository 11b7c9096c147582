//! Device-level input: raw button identities, press phases, and the filter that
//! turns driver up/down reports into an ordered stream of phased events.
//!
//! - **Held (level-triggered):** `is_being_pressed(input)` is true from the
//!   driver's down report until its up report. The frame loop and the global
//!   dispatcher use it for modifier checks (Alt, Tab, backquote).
//!
//! - **Events (edge-triggered):** a down report queues `FirstPress`, an up report
//!   queues `Release`, and `update(dt)` queues `Repeat` for buttons that stay
//!   held. `take_events()` drains the queue in exactly the order the driver
//!   reported; events from different devices are never reordered.

use serde::{Deserialize, Serialize};

/// Seconds a button must be held before the first repeat.
pub const REPEAT_DELAY: f32 = 0.25;
/// Seconds between repeats while in the slow phase.
pub const SLOW_REPEAT_INTERVAL: f32 = 0.25;
/// Seconds held after which repeats switch to the fast interval.
pub const FAST_REPEAT_AFTER: f32 = 1.5;
/// Seconds between repeats while in the fast phase.
pub const FAST_REPEAT_INTERVAL: f32 = 0.125;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Enter,
    Escape,
    Space,
    Tab,
    Backspace,
    Backquote,
    LAlt,
    RAlt,
    LShift,
    RShift,
    LCtrl,
    RCtrl,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    NumLock,
    ScrollLock,
    Pause,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
}

/// Gamepad buttons in Xbox layout naming (South = A, East = B, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoyButton {
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    South,
    East,
    West,
    North,
    LeftBumper,
    RightBumper,
    Start,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Keyboard,
    Joystick,
}

/// One physical button on one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceInput {
    Key(Key),
    Joy { pad: u8, button: JoyButton },
}

impl DeviceInput {
    pub fn device_class(self) -> DeviceClass {
        match self {
            Self::Key(_) => DeviceClass::Keyboard,
            Self::Joy { .. } => DeviceClass::Joystick,
        }
    }

    /// Index of the device within its class. The keyboard is always device 0.
    pub fn device_id(self) -> u8 {
        match self {
            Self::Key(_) => 0,
            Self::Joy { pad, .. } => pad,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputPhase {
    FirstPress,
    Repeat,
    Release,
}

/// Immutable record of one phased button event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub input: DeviceInput,
    pub phase: InputPhase,
}

impl InputEvent {
    pub fn new(input: DeviceInput, phase: InputPhase) -> Self {
        Self { input, phase }
    }

    pub fn is_first_press(&self) -> bool {
        self.phase == InputPhase::FirstPress
    }
}

#[derive(Debug, Clone, Copy)]
struct HeldButton {
    input: DeviceInput,
    held_for: f32,
    since_last_repeat: f32,
    /// Pressed since the last `update`. That update's `dt` elapsed before the
    /// press was reported, so it does not count toward the hold.
    fresh: bool,
}

pub struct InputFilter {
    // Kept in press order so generated repeats are deterministic.
    held: Vec<HeldButton>,
    queue: Vec<InputEvent>,
}

impl InputFilter {
    pub fn new() -> Self {
        Self {
            held: Vec::new(),
            queue: Vec::new(),
        }
    }

    /// Records a driver report. Driver auto-repeat (a down report for a button
    /// already held) is ignored; repeats are generated by `update`.
    pub fn button_pressed(&mut self, input: DeviceInput, pressed: bool) {
        if pressed {
            if self.is_being_pressed(input) {
                return;
            }
            self.held.push(HeldButton {
                input,
                held_for: 0.0,
                since_last_repeat: 0.0,
                fresh: true,
            });
            self.queue
                .push(InputEvent::new(input, InputPhase::FirstPress));
        } else if let Some(index) = self.held.iter().position(|b| b.input == input) {
            self.held.remove(index);
            self.queue.push(InputEvent::new(input, InputPhase::Release));
        }
    }

    /// Releases every held button, queueing a `Release` for each. Used when the
    /// window loses focus and the OS stops reporting key-ups.
    pub fn release_all(&mut self) {
        for button in self.held.drain(..) {
            self.queue
                .push(InputEvent::new(button.input, InputPhase::Release));
        }
    }

    pub fn update(&mut self, dt: f32) {
        for button in &mut self.held {
            if button.fresh {
                button.fresh = false;
                continue;
            }
            button.held_for += dt;
            button.since_last_repeat += dt;
            let interval = if button.held_for >= FAST_REPEAT_AFTER {
                FAST_REPEAT_INTERVAL
            } else {
                SLOW_REPEAT_INTERVAL
            };
            if button.held_for >= REPEAT_DELAY && button.since_last_repeat >= interval {
                button.since_last_repeat = 0.0;
                self.queue
                    .push(InputEvent::new(button.input, InputPhase::Repeat));
            }
        }
    }

    pub fn is_being_pressed(&self, input: DeviceInput) -> bool {
        self.held.iter().any(|b| b.input == input)
    }

    /// True while either of two alternatives is held (left/right modifier pairs).
    pub fn is_either_pressed(&self, a: DeviceInput, b: DeviceInput) -> bool {
        self.is_being_pressed(a) || self.is_being_pressed(b)
    }

    pub fn take_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.queue)
    }
}

impl Default for InputFilter {
    fn default() -> Self {
        Self::new()
    }
}
