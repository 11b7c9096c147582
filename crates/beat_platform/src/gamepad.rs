//! Gamepad polling via gilrs.
//!
//! Each connected pad gets the lowest free pad index, which becomes the
//! device id of its `DeviceInput::Joy` events. Indices are reused after a
//! disconnect so remaps stay valid across replugging. Buttons still held
//! when a pad disconnects are released, since the pad will never report it.

use std::collections::HashMap;

use beat_core::input::{DeviceInput, JoyButton};
use gilrs::{Button, EventType, GamepadId, Gilrs};

use crate::events::OsEvent;

pub const MAX_PADS: u8 = 8;

pub struct GamepadPoller {
    /// None if gilrs failed to initialize; keyboard input still works.
    gilrs: Option<Gilrs>,
    pads: HashMap<GamepadId, u8>,
    held: Vec<(u8, JoyButton)>,
}

impl GamepadPoller {
    pub fn new() -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => Some(g),
            Err(e) => {
                log::warn!("Gamepad support unavailable: {}", e);
                None
            }
        };
        let mut poller = Self {
            gilrs,
            pads: HashMap::new(),
            held: Vec::new(),
        };
        let already_connected: Vec<GamepadId> = poller
            .gilrs
            .as_ref()
            .map(|g| g.gamepads().map(|(id, _)| id).collect())
            .unwrap_or_default();
        for id in already_connected {
            poller.assign(id);
        }
        poller
    }

    pub fn poll(&mut self, out: &mut Vec<OsEvent>) {
        let Some(gilrs) = self.gilrs.as_mut() else {
            return;
        };
        let mut events = Vec::new();
        while let Some(event) = gilrs.next_event() {
            events.push((event.id, event.event));
        }
        for (id, event) in events {
            match event {
                EventType::Connected => self.assign(id),
                EventType::Disconnected => {
                    if let Some(pad) = self.pads.remove(&id) {
                        log::info!("Gamepad {} disconnected (pad {})", id, pad);
                        self.release_pad(pad, out);
                    }
                }
                EventType::ButtonPressed(button, _) => self.push_button(out, id, button, true),
                EventType::ButtonReleased(button, _) => self.push_button(out, id, button, false),
                _ => {}
            }
        }
    }

    pub fn connected_pads(&self) -> Vec<u8> {
        let mut pads: Vec<u8> = self.pads.values().copied().collect();
        pads.sort_unstable();
        pads
    }

    fn assign(&mut self, id: GamepadId) {
        if self.pads.contains_key(&id) {
            return;
        }
        match lowest_free_pad(self.pads.values().copied()) {
            Some(pad) => {
                self.pads.insert(id, pad);
                log::info!("Gamepad {} connected as pad {}", id, pad);
            }
            None => log::warn!("Gamepad {} connected but no free pad slots", id),
        }
    }

    fn push_button(
        &mut self,
        out: &mut Vec<OsEvent>,
        id: GamepadId,
        button: Button,
        pressed: bool,
    ) {
        let (Some(&pad), Some(button)) = (self.pads.get(&id), map_button(button)) else {
            return;
        };
        self.record(out, pad, button, pressed);
    }

    fn record(&mut self, out: &mut Vec<OsEvent>, pad: u8, button: JoyButton, pressed: bool) {
        if pressed {
            if !self.held.contains(&(pad, button)) {
                self.held.push((pad, button));
            }
        } else {
            self.held.retain(|&held| held != (pad, button));
        }
        out.push(OsEvent::Button {
            input: DeviceInput::Joy { pad, button },
            pressed,
        });
    }

    fn release_pad(&mut self, pad: u8, out: &mut Vec<OsEvent>) {
        let (released, kept): (Vec<_>, Vec<_>) =
            self.held.drain(..).partition(|&(held_pad, _)| held_pad == pad);
        self.held = kept;
        for (pad, button) in released {
            out.push(OsEvent::Button {
                input: DeviceInput::Joy { pad, button },
                pressed: false,
            });
        }
    }
}

impl Default for GamepadPoller {
    fn default() -> Self {
        Self::new()
    }
}

fn lowest_free_pad(taken: impl Iterator<Item = u8>) -> Option<u8> {
    let taken: Vec<u8> = taken.collect();
    (0..MAX_PADS).find(|pad| !taken.contains(pad))
}

pub fn map_button(button: Button) -> Option<JoyButton> {
    let mapped = match button {
        Button::DPadUp => JoyButton::DPadUp,
        Button::DPadDown => JoyButton::DPadDown,
        Button::DPadLeft => JoyButton::DPadLeft,
        Button::DPadRight => JoyButton::DPadRight,
        Button::South => JoyButton::South,
        Button::East => JoyButton::East,
        Button::West => JoyButton::West,
        Button::North => JoyButton::North,
        Button::LeftTrigger => JoyButton::LeftBumper,
        Button::RightTrigger => JoyButton::RightBumper,
        Button::Start => JoyButton::Start,
        Button::Select => JoyButton::Select,
        _ => return None,
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_poller() -> GamepadPoller {
        GamepadPoller {
            gilrs: None,
            pads: HashMap::new(),
            held: Vec::new(),
        }
    }

    #[test]
    fn disconnect_releases_only_that_pads_held_buttons() {
        let mut poller = offline_poller();
        let mut out = Vec::new();
        poller.record(&mut out, 0, JoyButton::DPadLeft, true);
        poller.record(&mut out, 0, JoyButton::Start, true);
        poller.record(&mut out, 0, JoyButton::Start, false);
        poller.record(&mut out, 1, JoyButton::South, true);
        out.clear();

        poller.release_pad(0, &mut out);
        assert_eq!(
            out,
            vec![OsEvent::Button {
                input: DeviceInput::Joy {
                    pad: 0,
                    button: JoyButton::DPadLeft
                },
                pressed: false,
            }]
        );
        assert_eq!(poller.held, vec![(1, JoyButton::South)]);

        out.clear();
        poller.release_pad(0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn lowest_free_pad_fills_gaps() {
        assert_eq!(lowest_free_pad(std::iter::empty()), Some(0));
        assert_eq!(lowest_free_pad([0, 2].into_iter()), Some(1));
        assert_eq!(lowest_free_pad(0..MAX_PADS), None);
    }

    #[test]
    fn face_and_dpad_buttons_map() {
        assert_eq!(map_button(Button::DPadLeft), Some(JoyButton::DPadLeft));
        assert_eq!(map_button(Button::Start), Some(JoyButton::Start));
        assert_eq!(map_button(Button::Mode), None);
    }
}
