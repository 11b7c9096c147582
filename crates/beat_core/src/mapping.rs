//! Device → game → menu/style mapping.
//!
//! A device input maps to at most one game input through the active map. A
//! valid game input then derives its menu and gameplay-style interpretations
//! independently; either may be absent (a dance arrow has a style column and
//! a menu direction, the coin button has only a menu meaning).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::KeyRemap;
use crate::input::{DeviceInput, JoyButton, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameController {
    One,
    Two,
}

impl GameController {
    pub const ALL: [GameController; 2] = [GameController::One, GameController::Two];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameButton {
    Left,
    Down,
    Up,
    Right,
    MenuLeft,
    MenuRight,
    MenuUp,
    MenuDown,
    Start,
    Back,
    Coin,
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameInput {
    pub controller: GameController,
    pub button: GameButton,
}

impl GameInput {
    pub const fn new(controller: GameController, button: GameButton) -> Self {
        Self { controller, button }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuButton {
    Left,
    Right,
    Up,
    Down,
    Start,
    Back,
    Coin,
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuInput {
    pub player: GameController,
    pub button: MenuButton,
}

/// A gameplay column for the current style (dance-single: L D U R = 0..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleInput {
    pub player: GameController,
    pub column: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappedInput {
    pub game: Option<GameInput>,
    pub menu: Option<MenuInput>,
    pub style: Option<StyleInput>,
}

impl MappedInput {
    pub fn menu_button(&self) -> Option<MenuButton> {
        self.menu.map(|m| m.button)
    }
}

const DEFAULT_KEYBOARD_P1: &[(Key, GameButton)] = &[
    (Key::Left, GameButton::Left),
    (Key::Down, GameButton::Down),
    (Key::Up, GameButton::Up),
    (Key::Right, GameButton::Right),
    (Key::Delete, GameButton::MenuLeft),
    (Key::PageDown, GameButton::MenuRight),
    (Key::Home, GameButton::MenuUp),
    (Key::End, GameButton::MenuDown),
    (Key::Enter, GameButton::Start),
    (Key::Escape, GameButton::Back),
    (Key::F1, GameButton::Coin),
    (Key::ScrollLock, GameButton::Operator),
];

const DEFAULT_JOYSTICK: &[(JoyButton, GameButton)] = &[
    (JoyButton::DPadLeft, GameButton::Left),
    (JoyButton::DPadDown, GameButton::Down),
    (JoyButton::DPadUp, GameButton::Up),
    (JoyButton::DPadRight, GameButton::Right),
    (JoyButton::West, GameButton::MenuLeft),
    (JoyButton::East, GameButton::MenuRight),
    (JoyButton::Start, GameButton::Start),
    (JoyButton::Select, GameButton::Back),
];

pub struct InputMapper {
    device_to_game: HashMap<DeviceInput, GameInput>,
}

impl InputMapper {
    pub fn new() -> Self {
        Self {
            device_to_game: HashMap::new(),
        }
    }

    /// Default keyboard layout for player one plus any user remaps on top.
    pub fn from_remaps(remaps: &[KeyRemap]) -> Self {
        let mut mapper = Self::new();
        mapper.reset_to_defaults();
        mapper.apply_remaps(remaps);
        mapper
    }

    pub fn reset_to_defaults(&mut self) {
        self.device_to_game.clear();
        for &(key, button) in DEFAULT_KEYBOARD_P1 {
            self.set(
                DeviceInput::Key(key),
                GameInput::new(GameController::One, button),
            );
        }
    }

    pub fn apply_remaps(&mut self, remaps: &[KeyRemap]) {
        for remap in remaps {
            // A game input is bound to one device input at a time.
            self.device_to_game.retain(|_, game| *game != remap.game);
            self.set(remap.device, remap.game);
        }
    }

    pub fn set(&mut self, device: DeviceInput, game: GameInput) {
        self.device_to_game.insert(device, game);
    }

    pub fn clear(&mut self, device: DeviceInput) {
        self.device_to_game.remove(&device);
    }

    /// Binds the default pad layout for each connected pad; the first pad
    /// drives player one, the second player two. Extra pads stay unmapped.
    pub fn auto_map_joysticks(&mut self, pads: &[u8]) {
        for (&pad, controller) in pads.iter().zip(GameController::ALL) {
            for &(button, game_button) in DEFAULT_JOYSTICK {
                self.set(
                    DeviceInput::Joy { pad, button },
                    GameInput::new(controller, game_button),
                );
            }
            log::info!("Auto-mapped joystick {} to {:?}", pad, controller);
        }
    }

    pub fn device_to_game(&self, device: DeviceInput) -> Option<GameInput> {
        self.device_to_game.get(&device).copied()
    }

    pub fn game_to_menu(&self, game: GameInput) -> Option<MenuInput> {
        let button = match game.button {
            GameButton::Left | GameButton::MenuLeft => MenuButton::Left,
            GameButton::Right | GameButton::MenuRight => MenuButton::Right,
            GameButton::Up | GameButton::MenuUp => MenuButton::Up,
            GameButton::Down | GameButton::MenuDown => MenuButton::Down,
            GameButton::Start => MenuButton::Start,
            GameButton::Back => MenuButton::Back,
            GameButton::Coin => MenuButton::Coin,
            GameButton::Operator => MenuButton::Operator,
        };
        Some(MenuInput {
            player: game.controller,
            button,
        })
    }

    pub fn game_to_style(&self, game: GameInput) -> Option<StyleInput> {
        let column = match game.button {
            GameButton::Left => 0,
            GameButton::Down => 1,
            GameButton::Up => 2,
            GameButton::Right => 3,
            _ => return None,
        };
        Some(StyleInput {
            player: game.controller,
            column,
        })
    }

    /// Full interpretation of one device input. Unmapped devices yield an
    /// all-`None` result; the raw event still goes to the dispatcher.
    pub fn map(&self, device: DeviceInput) -> MappedInput {
        let Some(game) = self.device_to_game(device) else {
            return MappedInput::default();
        };
        MappedInput {
            game: Some(game),
            menu: self.game_to_menu(game),
            style: self.game_to_style(game),
        }
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::from_remaps(&[])
    }
}
