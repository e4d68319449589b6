// Photo catalog: bundler URLs, the story map, and filename matching.
// Bundled URLs may carry an 8-character content hash (`name-AbC123_x.webp`),
// so lookups try the exact filename first and the unhashed name second.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::types::{CatalogSettings, PhotoStory};

/// Last path segment with any query string or fragment removed.
pub fn filename_of(url: &str) -> &str {
    let last = url.rsplit('/').next().unwrap_or(url);
    let last = last.split('?').next().unwrap_or(last);
    last.split('#').next().unwrap_or(last)
}

fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot..]),
        None => (name, ""),
    }
}

/// `name-XXXXXXXX.ext` → `name.ext` when the suffix looks like a bundler hash.
pub fn strip_bundler_hash(filename: &str) -> Option<String> {
    let (stem, ext) = split_extension(filename);
    if ext.is_empty() || stem.len() <= 9 || !stem.is_char_boundary(stem.len() - 9) {
        return None;
    }
    let (base, tail) = stem.split_at(stem.len() - 9);
    let hash = tail.strip_prefix('-')?;
    let is_hash = hash.len() == 8
        && hash
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    is_hash.then(|| format!("{base}{ext}"))
}

/// Whether `url` points at `target` (exact filename, or same stem prefix and extension).
pub fn is_photo_match(url: &str, target: &str) -> bool {
    let filename = filename_of(url);
    if filename == target {
        return true;
    }
    let (base, ext) = split_extension(target);
    if ext.is_empty() {
        return false;
    }
    filename.starts_with(base) && filename.ends_with(ext)
}

/// Parse a story date written as `YYYY.MM.DD` or `YYYY-MM-DD`.
pub fn parse_story_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y.%m.%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .ok()
}

/// Resolved photo list with story lookups.
#[derive(Debug, Clone)]
pub struct PhotoCatalog {
    photos: Vec<String>,
    stories: HashMap<String, PhotoStory>,
    chat_trigger: String,
}

impl PhotoCatalog {
    pub fn new(settings: &CatalogSettings) -> Self {
        PhotoCatalog {
            photos: settings.photos.clone(),
            stories: settings.stories.clone(),
            chat_trigger: settings.chat_trigger.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn story_count(&self) -> usize {
        self.stories.len()
    }

    /// Story attached to a photo URL, if any.
    pub fn story_for(&self, url: &str) -> Option<&PhotoStory> {
        let filename = filename_of(url);
        if let Some(story) = self.stories.get(filename) {
            return Some(story);
        }
        strip_bundler_hash(filename).and_then(|original| self.stories.get(&original))
    }

    pub fn is_chat_trigger(&self, url: &str) -> bool {
        is_photo_match(url, &self.chat_trigger)
    }

    /// Display order. Memory mode sorts dated stories chronologically; undated photos
    /// keep their relative order after them.
    pub fn ordered(&self, memory_mode: bool) -> Vec<String> {
        let mut photos = self.photos.clone();
        if memory_mode {
            photos.sort_by_key(|url| {
                let date = self
                    .story_for(url)
                    .and_then(|s| s.date.as_deref())
                    .and_then(parse_story_date);
                (date.is_none(), date)
            });
        }
        photos
    }
}
