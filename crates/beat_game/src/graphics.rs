use beat_core::Preferences;
use beat_render::{Renderer, VideoMode};

use crate::error::FatalRuntimeError;
use crate::screens::ScreenManager;
use crate::textures::{TextureLimits, TextureManager};

pub fn video_mode(prefs: &Preferences) -> VideoMode {
    VideoMode {
        windowed: prefs.windowed,
        width: prefs.display_width,
        height: prefs.display_height,
        color_depth: prefs.display_color_depth,
        refresh_rate: prefs.refresh_rate,
        vsync: prefs.vsync,
        title: prefs.window_title.clone(),
        icon: prefs.window_icon.clone(),
    }
}

pub fn texture_limits(prefs: &Preferences) -> TextureLimits {
    TextureLimits {
        color_depth: prefs.texture_color_depth,
        delayed_delete: prefs.delayed_texture_delete,
        max_resolution: prefs.max_texture_resolution,
    }
}

/// Re-applies the display mode and texture limits from preferences. When
/// either change invalidates GPU resources every texture is reloaded before
/// returning. Returns whether that reload happened.
pub fn apply_graphics_options(
    prefs: &Preferences,
    renderer: &mut dyn Renderer,
    textures: &mut dyn TextureManager,
    screens: &mut dyn ScreenManager,
) -> Result<bool, FatalRuntimeError> {
    let mut reload = renderer.set_video_mode(&video_mode(prefs))?;
    reload |= textures.set_limits(texture_limits(prefs));
    if reload {
        textures.reload_all()?;
    }
    screens.post_system_message(&prefs.display_summary());
    Ok(reload)
}
