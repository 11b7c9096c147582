pub mod config;
pub mod error;
pub mod input;
pub mod mapping;
pub mod queue;
pub mod time;

pub use config::{KeyRemap, Preferences};
pub use error::ConfigError;
pub use input::{DeviceClass, DeviceInput, InputEvent, InputFilter, InputPhase, JoyButton, Key};
pub use mapping::{
    GameButton, GameController, GameInput, InputMapper, MappedInput, MenuButton, MenuInput,
    StyleInput,
};
pub use queue::InputQueue;
pub use time::{FrameClock, TimeScale};
