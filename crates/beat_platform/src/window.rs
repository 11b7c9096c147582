use std::path::{Path, PathBuf};
use std::sync::Arc;

use winit::event_loop::EventLoop;
use winit::window::{Fullscreen, Icon, Window, WindowAttributes};

#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub windowed: bool,
    pub icon: Option<PathBuf>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Beat".to_string(),
            width: 640,
            height: 480,
            windowed: true,
            icon: None,
        }
    }
}

impl PlatformConfig {
    pub fn fullscreen(&self) -> Option<Fullscreen> {
        if self.windowed {
            None
        } else {
            Some(Fullscreen::Borderless(None))
        }
    }
}

pub fn create_window(
    event_loop: &EventLoop<()>,
    config: &PlatformConfig,
) -> Result<Arc<Window>, winit::error::OsError> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
        .with_fullscreen(config.fullscreen())
        .with_window_icon(config.icon.as_deref().and_then(load_icon));

    // The frame loop pumps events itself, so windows are created outside
    // `ApplicationHandler::resumed`.
    #[allow(deprecated)]
    let window = event_loop.create_window(attrs)?;
    Ok(Arc::new(window))
}

/// Decodes an icon file. A missing or unreadable icon is not an error; the
/// window simply keeps the platform default.
pub fn load_icon(path: &Path) -> Option<Icon> {
    let image = match image::open(path) {
        Ok(image) => image.into_rgba8(),
        Err(err) => {
            log::warn!("Window icon '{}' not loaded: {}", path.display(), err);
            return None;
        }
    };
    let (width, height) = image.dimensions();
    match Icon::from_rgba(image.into_raw(), width, height) {
        Ok(icon) => Some(icon),
        Err(err) => {
            log::warn!("Window icon '{}' rejected: {}", path.display(), err);
            None
        }
    }
}
