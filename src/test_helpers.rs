//! Shared test utilities for the warta test suite.
//!
//! Builds throwaway sites inside a `TempDir` and provides lookup helpers over
//! the generated index entries.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let mut config = SiteConfig::default();
//! add_category(&mut config, "kegiatan", "Kegiatan");
//! let site = site_in(tmp.path(), config);
//!
//! write_record(tmp.path(), "a.json", json!({"title": "Contoh Acara", "body": ["x"]}));
//! touch(&tmp.path().join("assets/img/galeri/kegiatan/kegiatan-01.jpg"));
//!
//! let (entries, _) = collect_news(&site).unwrap();
//! assert_eq!(find_entry(&entries, "contoh-acara").title, "Contoh Acara");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::{CategoryConfig, Site, SiteConfig};
use crate::record::{ContentRecord, normalize_record};
use crate::types::{NewsEntry, PageEntry};

// =========================================================================
// Site setup
// =========================================================================

/// A site rooted at `root` with `config`, skipping file loading.
pub fn site_in(root: &Path, config: SiteConfig) -> Site {
    Site::new(root, config)
}

/// Append a gallery category with no tag or narrative.
pub fn add_category(config: &mut SiteConfig, slug: &str, title: &str) {
    config.gallery.categories.push(CategoryConfig {
        slug: slug.to_string(),
        title: title.to_string(),
        tag: String::new(),
        narrative: String::new(),
    });
}

/// Create an empty file, creating parent directories.
pub fn touch(path: &Path) {
    write_file(path, "");
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Write a record file into the default records directory.
pub fn write_record(root: &Path, name: &str, record: Value) -> PathBuf {
    let path = root.join(SiteConfig::default().news.records_dir).join(name);
    write_file(&path, &serde_json::to_string_pretty(&record).unwrap());
    path
}

/// Write `html` at `rel` under the output root.
pub fn write_page_html(root: &Path, rel: &str, html: &str) -> PathBuf {
    let path = root.join(rel);
    write_file(&path, html);
    path
}

/// A normalized record with default config.
pub fn make_record(title: &str, body: &[&str]) -> ContentRecord {
    let raw = serde_json::json!({"title": title, "body": body});
    let Value::Object(map) = raw else {
        unreachable!("json! object literal")
    };
    normalize_record(&map, &SiteConfig::default()).unwrap()
}

// =========================================================================
// Index lookups (panic with a clear message on miss)
// =========================================================================

/// Find a news index entry by slug. Panics if not found.
pub fn find_entry<'a>(entries: &'a [NewsEntry], slug: &str) -> &'a NewsEntry {
    entries.iter().find(|e| e.slug == slug).unwrap_or_else(|| {
        let slugs: Vec<&str> = entries.iter().map(|e| e.slug.as_str()).collect();
        panic!("news entry '{slug}' not found. Available: {slugs:?}")
    })
}

/// Find a pages index entry by URL. Panics if not found.
pub fn find_page<'a>(entries: &'a [PageEntry], url: &str) -> &'a PageEntry {
    entries.iter().find(|e| e.url == url).unwrap_or_else(|| {
        let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();
        panic!("page '{url}' not found. Available: {urls:?}")
    })
}
