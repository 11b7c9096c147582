//! Content-side subsystems: the song cache index, the song library, the
//! announcer set and fonts. Parsing charts and rendering glyphs happens
//! elsewhere; these only keep track of what exists on disk.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

use crate::textures::TextureManager;

pub const SONGS_DIR: &str = "Songs";
pub const ANNOUNCERS_DIR: &str = "Announcers";
pub const CACHE_INDEX_PATH: &str = "Cache/index.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    songs: BTreeMap<String, u64>,
}

/// Modification stamps of song folders seen on previous runs. Written back on
/// drop when anything changed.
#[derive(Debug)]
pub struct ContentIndex {
    path: Option<PathBuf>,
    file: IndexFile,
    dirty: bool,
}

impl ContentIndex {
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            file: IndexFile::default(),
            dirty: false,
        }
    }

    /// A missing or unreadable index starts empty; it is only a cache.
    pub fn open(path: &Path) -> Self {
        let file = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                log::warn!("Cache index '{}' is corrupt: {err}", path.display());
                IndexFile::default()
            }),
            Err(_) => IndexFile::default(),
        };
        Self {
            path: Some(path.to_path_buf()),
            file,
            dirty: false,
        }
    }

    pub fn is_current(&self, dir: &str, stamp: u64) -> bool {
        self.file.songs.get(dir) == Some(&stamp)
    }

    pub fn record(&mut self, dir: &str, stamp: u64) {
        if !self.is_current(dir, stamp) {
            self.file.songs.insert(dir.to_string(), stamp);
            self.dirty = true;
        }
    }

    pub fn len(&self) -> usize {
        self.file.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file.songs.is_empty()
    }

    fn save(&self, path: &Path) -> std::io::Result<()> {
        let body = serde_json::to_string_pretty(&self.file)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, body)
    }
}

impl Drop for ContentIndex {
    fn drop(&mut self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        if !self.dirty {
            return;
        }
        if let Err(err) = self.save(path) {
            log::error!("Failed to write cache index '{}': {err}", path.display());
        }
    }
}

/// Song folders grouped the way they are laid out on disk:
/// `Songs/<group>/<song>/`.
#[derive(Debug, Default)]
pub struct ContentManager {
    groups: BTreeMap<String, Vec<String>>,
    refreshed: usize,
}

impl ContentManager {
    pub fn load(root: &Path, index: &mut ContentIndex) -> Self {
        let mut manager = Self::default();
        for group in subdirectories(root) {
            let mut songs = Vec::new();
            for song in subdirectories(&root.join(&group)) {
                let key = format!("{group}/{song}");
                let stamp = modified_stamp(&root.join(&group).join(&song));
                if !index.is_current(&key, stamp) {
                    manager.refreshed += 1;
                    index.record(&key, stamp);
                }
                songs.push(song);
            }
            manager.groups.insert(group, songs);
        }
        log::info!(
            "Found {} songs in {} groups ({} new or changed)",
            manager.song_count(),
            manager.groups.len(),
            manager.refreshed
        );
        manager
    }

    pub fn song_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

#[derive(Debug, Default)]
pub struct AnnouncerSet {
    available: Vec<String>,
    current: Option<String>,
}

impl AnnouncerSet {
    pub fn scan(root: &Path) -> Self {
        let mut available: Vec<String> = subdirectories(root).collect();
        available.sort();
        Self {
            available,
            current: None,
        }
    }

    /// Returns false, leaving the selection unchanged, for an unknown name.
    pub fn select(&mut self, name: &str) -> bool {
        if !self.available.iter().any(|a| a == name) {
            return false;
        }
        self.current = Some(name.to_string());
        true
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn available(&self) -> &[String] {
        &self.available
    }
}

/// Texture holding a font's glyph page.
pub fn font_page_texture(font: &str) -> String {
    format!("Fonts/{font} page")
}

/// Reference-counted font handles. The first load of a font takes a
/// reference on its glyph page texture.
#[derive(Debug, Default)]
pub struct FontManager {
    loaded: HashMap<String, u32>,
}

impl FontManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, name: &str, textures: &mut dyn TextureManager) {
        let refs = self.loaded.entry(name.to_string()).or_insert(0);
        if *refs == 0 {
            textures.acquire(&font_page_texture(name));
        }
        *refs += 1;
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

impl Drop for FontManager {
    fn drop(&mut self) {
        if !self.loaded.is_empty() {
            log::debug!("Releasing {} fonts still loaded", self.loaded.len());
        }
    }
}

fn subdirectories(dir: &Path) -> impl Iterator<Item = String> {
    fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|entry| entry.file_name().into_string().ok())
}

fn modified_stamp(path: &Path) -> u64 {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textures::{TextureCache, TextureLimits, TextureManager};
    use std::time::SystemTime;

    fn scratch_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "beat_content_{}_{}_{}",
            tag,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn songs_are_grouped_and_indexed() {
        let root = scratch_dir("songs");
        fs::create_dir_all(root.join("Pack A/Song 1")).expect("mkdir");
        fs::create_dir_all(root.join("Pack A/Song 2")).expect("mkdir");
        fs::create_dir_all(root.join("Pack B/Song 3")).expect("mkdir");

        let mut index = ContentIndex::in_memory();
        let songs = ContentManager::load(&root, &mut index);
        assert_eq!(songs.song_count(), 3);
        assert_eq!(songs.group_count(), 2);
        assert_eq!(index.len(), 3);

        let again = ContentManager::load(&root, &mut index);
        assert_eq!(again.refreshed, 0);

        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn missing_songs_dir_is_empty() {
        let mut index = ContentIndex::in_memory();
        let songs = ContentManager::load(Path::new("definitely/not/here"), &mut index);
        assert_eq!(songs.song_count(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn index_is_written_on_drop_and_reopened() {
        let dir = scratch_dir("index");
        let path = dir.join("index.json");
        {
            let mut index = ContentIndex::open(&path);
            index.record("Pack/Song", 42);
        }
        let index = ContentIndex::open(&path);
        assert!(index.is_current("Pack/Song", 42));
        assert!(!index.is_current("Pack/Song", 43));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn announcer_selection_requires_known_name() {
        let root = scratch_dir("announcers");
        fs::create_dir_all(root.join("default")).expect("mkdir");
        let mut announcers = AnnouncerSet::scan(&root);
        assert!(!announcers.select("missing"));
        assert_eq!(announcers.current(), None);
        assert!(announcers.select("default"));
        assert_eq!(announcers.current(), Some("default"));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn fonts_take_their_page_texture_once() {
        let mut textures = TextureCache::new(TextureLimits::default());
        let mut fonts = FontManager::new();
        fonts.load("Common normal", &mut textures);
        fonts.load("Common normal", &mut textures);
        fonts.load("Common title", &mut textures);
        assert_eq!(fonts.loaded_count(), 2);
        assert_eq!(textures.len(), 2);

        // The held page keeps a limit change from being free.
        let deeper = TextureLimits {
            color_depth: 32,
            ..TextureLimits::default()
        };
        assert!(textures.set_limits(deeper));
    }
}
