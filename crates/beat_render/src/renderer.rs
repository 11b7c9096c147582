use std::path::{Path, PathBuf};

use beat_platform::PlatformConfig;

use crate::backend::BackendKind;
use crate::error::RendererError;

/// Everything `set_video_mode` applies to the window and swap chain.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMode {
    pub windowed: bool,
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
    pub refresh_rate: u32,
    pub vsync: bool,
    pub title: String,
    pub icon: Option<PathBuf>,
}

impl Default for VideoMode {
    fn default() -> Self {
        Self {
            windowed: true,
            width: 640,
            height: 480,
            color_depth: 16,
            refresh_rate: 60,
            vsync: true,
            title: "Beat".to_string(),
            icon: None,
        }
    }
}

impl VideoMode {
    pub fn platform_config(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
            windowed: self.windowed,
            icon: self.icon.clone(),
        }
    }
}

/// What the active screen hands the renderer each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub clear_color: [f64; 4],
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// A constructed graphics backend. Owns the application window and surface.
pub trait Renderer {
    fn backend(&self) -> BackendKind;

    fn adapter_name(&self) -> &str;

    /// True when the backend runs without hardware acceleration.
    fn is_software_renderer(&self) -> bool;

    /// Applies a display mode. Returns whether GPU-side texture data must be
    /// reloaded as a consequence.
    fn set_video_mode(&mut self, mode: &VideoMode) -> Result<bool, RendererError>;

    fn update(&mut self, dt: f32);

    fn resize(&mut self, width: u32, height: u32);

    fn draw(&mut self, frame: &Frame) -> Result<(), RendererError>;

    fn save_screenshot(&mut self, path: &Path) -> Result<(), RendererError>;
}
