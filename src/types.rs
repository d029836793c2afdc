//! Types serialized into the generated JSON artifacts.
//!
//! Field names are snake_case and must stay stable: the site's client-side
//! scripts (listing pages, mega menu, search) read these files directly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One entry of `news-index.json`, projected from a content record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEntry {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    /// `YYYY-MM-DD`, or empty for undated records (sorted last).
    pub date_iso: String,
    pub date_display: String,
    pub location: String,
    /// Root-absolute path or full URL.
    pub image: String,
    pub popular_score: serde_json::Number,
}

/// One entry of the cross-category `pages-index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub title: String,
    /// Site URL: `/profil/` for folder index pages, `/faq.html` otherwise.
    pub url: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
}

/// One category in the gallery `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryManifestEntry {
    pub category_slug: String,
    pub title: String,
    pub tag: String,
    /// Output-root-relative folder, with trailing slash.
    pub folder: String,
    /// Output-root-relative cover path (may name a placeholder).
    pub cover: String,
    /// Valid image filenames in display order.
    pub images: Vec<String>,
}

/// Write `value` as pretty JSON with a trailing newline, replacing any
/// previous file. Parent directories are created.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)
}
