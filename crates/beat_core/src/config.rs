//! Persistent preferences.
//!
//! Stored as pretty JSON. Every field has a default so older or hand-edited
//! files load with whatever they omit filled in. A missing file is a first
//! run; a malformed one is logged and replaced by defaults rather than
//! blocking startup.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::input::DeviceInput;
use crate::mapping::GameInput;

pub const DEFAULT_PREFS_PATH: &str = "Data/Preferences.json";
pub const PREFS_PATH_ENV: &str = "BEAT_PREFS";

/// One user binding on top of the default layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRemap {
    pub device: DeviceInput,
    pub game: GameInput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Forced renderer backend name; empty selects automatically.
    pub renderer: String,
    pub allow_unaccelerated_renderer: bool,

    pub windowed: bool,
    pub display_width: u32,
    pub display_height: u32,
    pub display_color_depth: u32,
    pub refresh_rate: u32,
    pub vsync: bool,
    pub window_title: String,
    pub window_icon: Option<PathBuf>,

    pub texture_color_depth: u32,
    pub delayed_texture_delete: bool,
    pub max_texture_resolution: u32,

    /// 0 never, 1 always, -1 automatic (off in debug builds).
    pub boost_app_priority: i32,

    pub sound_drivers: String,
    pub sound_volume: f32,

    pub first_run: bool,
    pub initial_screen: String,
    pub auto_map_joysticks: bool,
    pub key_remaps: Vec<KeyRemap>,

    pub screenshot_dir: PathBuf,
    pub screenshot_format: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            renderer: String::new(),
            allow_unaccelerated_renderer: false,
            windowed: true,
            display_width: 640,
            display_height: 480,
            display_color_depth: 16,
            refresh_rate: 60,
            vsync: true,
            window_title: "Beat".to_string(),
            window_icon: None,
            texture_color_depth: 16,
            delayed_texture_delete: true,
            max_texture_resolution: 2048,
            boost_app_priority: -1,
            sound_drivers: String::new(),
            sound_volume: 1.0,
            first_run: true,
            initial_screen: "ScreenCompany".to_string(),
            auto_map_joysticks: true,
            key_remaps: Vec::new(),
            screenshot_dir: PathBuf::from("."),
            screenshot_format: "bmp".to_string(),
        }
    }
}

impl Preferences {
    /// Location from the environment override, else the default path.
    pub fn resolve_path() -> PathBuf {
        std::env::var_os(PREFS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_PATH))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like `load`, but a missing or malformed file yields defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!(
                "No preferences at '{}', using defaults (first run)",
                path.display()
            );
            return Self::default();
        }
        match Self::load(path) {
            Ok(prefs) => prefs,
            Err(err) => {
                log::warn!("{err}; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let body = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, body).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Human-readable summary of the display settings, as shown to the
    /// player after graphics options are applied.
    pub fn display_summary(&self) -> String {
        format!(
            "{} {}x{} {} color {} texture {}Hz {}",
            if self.windowed { "Windowed" } else { "Fullscreen" },
            self.display_width,
            self.display_height,
            self.display_color_depth,
            self.texture_color_depth,
            self.refresh_rate,
            if self.vsync { "Vsync" } else { "NoSync" }
        )
    }

    /// Whether the priority boost applies in this build.
    pub fn wants_priority_boost(&self) -> bool {
        match self.boost_app_priority {
            0 => false,
            -1 => !cfg!(debug_assertions),
            _ => true,
        }
    }
}
