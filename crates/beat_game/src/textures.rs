//! Texture cache policy.
//!
//! Pixel data lives with the renderer; this tracks which textures are loaded,
//! who holds them, and the limits they were loaded under.

use std::collections::HashMap;

use crate::error::FatalRuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureLimits {
    pub color_depth: u32,
    /// Keep unreferenced textures until `delayed_delete`, so screens that
    /// reload the same art don't pay for it twice.
    pub delayed_delete: bool,
    pub max_resolution: u32,
}

impl Default for TextureLimits {
    fn default() -> Self {
        Self {
            color_depth: 16,
            delayed_delete: true,
            max_resolution: 2048,
        }
    }
}

pub trait TextureManager {
    /// Returns whether textures already loaded no longer satisfy the limits.
    fn set_limits(&mut self, limits: TextureLimits) -> bool;

    /// Rebuilds every cached texture. All or nothing: an error leaves the
    /// cache unusable.
    fn reload_all(&mut self) -> Result<(), FatalRuntimeError>;

    fn update(&mut self, dt: f32);

    /// Takes a reference on a texture, loading it under the current limits.
    fn acquire(&mut self, name: &str);

    fn delayed_delete(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
struct CachedTexture {
    refs: u32,
    generation: u32,
}

#[derive(Debug, Default)]
pub struct TextureCache {
    limits: TextureLimits,
    textures: HashMap<String, CachedTexture>,
    generation: u32,
}

impl TextureCache {
    pub fn new(limits: TextureLimits) -> Self {
        Self {
            limits,
            textures: HashMap::new(),
            generation: 0,
        }
    }

    #[cfg(test)]
    pub fn release(&mut self, name: &str) {
        if let Some(texture) = self.textures.get_mut(name) {
            texture.refs = texture.refs.saturating_sub(1);
        }
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn drop_unreferenced(&mut self) {
        let before = self.textures.len();
        self.textures.retain(|_, t| t.refs > 0);
        let dropped = before - self.textures.len();
        if dropped > 0 {
            log::debug!("Deleted {dropped} unreferenced textures");
        }
    }
}

impl TextureManager for TextureCache {
    fn set_limits(&mut self, limits: TextureLimits) -> bool {
        let reload = !self.is_empty()
            && (limits.color_depth != self.limits.color_depth
                || limits.max_resolution != self.limits.max_resolution);
        self.limits = limits;
        reload
    }

    fn reload_all(&mut self) -> Result<(), FatalRuntimeError> {
        self.generation += 1;
        let generation = self.generation;
        for texture in self.textures.values_mut() {
            texture.generation = generation;
        }
        log::info!(
            "Reloaded {} textures ({}bpp, max {}px)",
            self.len(),
            self.limits.color_depth,
            self.limits.max_resolution
        );
        Ok(())
    }

    fn update(&mut self, _dt: f32) {
        if !self.limits.delayed_delete {
            self.drop_unreferenced();
        }
    }

    fn acquire(&mut self, name: &str) {
        let generation = self.generation;
        self.textures
            .entry(name.to_string())
            .or_insert(CachedTexture { refs: 0, generation })
            .refs += 1;
    }

    fn delayed_delete(&mut self) {
        self.drop_unreferenced();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_change_requires_reload_only_with_loaded_textures() {
        let mut cache = TextureCache::new(TextureLimits::default());
        let deeper = TextureLimits {
            color_depth: 32,
            ..TextureLimits::default()
        };
        assert!(!cache.set_limits(deeper));

        cache.acquire("banner");
        assert!(!cache.set_limits(deeper));
        assert!(cache.set_limits(TextureLimits::default()));
    }

    #[test]
    fn unreferenced_textures_wait_for_delayed_delete() {
        let mut cache = TextureCache::new(TextureLimits::default());
        cache.acquire("banner");
        cache.release("banner");
        cache.update(0.016);
        assert_eq!(cache.len(), 1);
        cache.delayed_delete();
        assert!(cache.is_empty());
    }

    #[test]
    fn immediate_delete_without_delayed_policy() {
        let mut cache = TextureCache::new(TextureLimits {
            delayed_delete: false,
            ..TextureLimits::default()
        });
        cache.acquire("banner");
        cache.acquire("background");
        cache.release("banner");
        cache.update(0.016);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reload_advances_generation() {
        let mut cache = TextureCache::new(TextureLimits::default());
        cache.acquire("banner");
        cache.reload_all().expect("reload");
        assert!(cache.textures.values().all(|t| t.generation == 1));
    }
}
