//! Site configuration module.
//!
//! Handles loading, validating, and merging `warta.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a site
//! only needs to spell out what differs from the defaults.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── warta.toml               # Site config (optional)
//! ├── berita/data/*.json       # News records (news.records_dir)
//! ├── templates/news.html      # News page template (news.template, optional)
//! └── assets/img/galeri/<slug>/ # Gallery photos (gallery.asset_url)
//! ```
//!
//! ## Paths
//!
//! - `news.records_dir` and `news.template` are relative to the site root.
//! - `output_root` is relative to the site root; every other output path
//!   (`news.output_dir`, `news.index_path`, `gallery.*`, `pages.*`) is relative
//!   to the output root.
//! - `*_url` values are site-root-absolute URLs; on disk they live under the
//!   output root.
//!
//! Unknown keys are rejected to catch typos early. Run `warta gen-config` for
//! a documented file with every option.

use crate::naming::{is_canonical_slug, join_url};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file in the site root.
pub const CONFIG_FILENAME: &str = "warta.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `warta.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site name used in default captions, summaries, and page titles.
    pub site_name: String,
    /// `lang` attribute of generated pages.
    pub lang: String,
    /// Output tree, relative to the site root.
    pub output_root: String,
    /// Stylesheets linked from generated gallery pages.
    pub stylesheets: Vec<String>,
    /// Scripts loaded by generated gallery pages.
    pub scripts: Vec<String>,
    pub news: NewsConfig,
    pub gallery: GalleryConfig,
    pub pages: PagesConfig,
    pub banner: BannerConfig,
    pub check: CheckConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "IKSASS".to_string(),
            lang: "id".to_string(),
            output_root: ".".to_string(),
            stylesheets: vec!["/assets/css/main.css".to_string()],
            scripts: vec!["/assets/js/main.js".to_string()],
            news: NewsConfig::default(),
            gallery: GalleryConfig::default(),
            pages: PagesConfig::default(),
            banner: BannerConfig::default(),
            check: CheckConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.news.excerpt_length < 2 {
            return Err(ConfigError::Validation(
                "news.excerpt_length must be at least 2".into(),
            ));
        }
        for (key, url) in [
            ("news.asset_url", &self.news.asset_url),
            ("gallery.asset_url", &self.gallery.asset_url),
        ] {
            if !url.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "{key} must be site-root-absolute (start with '/'), got '{url}'"
                )));
            }
        }
        if self.news.cta.enabled && self.news.cta.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "news.cta.url must not be empty when the CTA is enabled".into(),
            ));
        }

        let mut seen = HashSet::new();
        for category in &self.gallery.categories {
            if !is_canonical_slug(&category.slug) {
                return Err(ConfigError::Validation(format!(
                    "gallery category slug '{}' is not a canonical slug",
                    category.slug
                )));
            }
            if !seen.insert(category.slug.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate gallery category slug '{}'",
                    category.slug
                )));
            }
            if category.title.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "gallery category '{}' has an empty title",
                    category.slug
                )));
            }
        }

        if self.banner.width == 0 || self.banner.height == 0 {
            return Err(ConfigError::Validation(
                "banner.width and banner.height must be non-zero".into(),
            ));
        }
        for (key, value) in [
            ("banner.background", &self.banner.background),
            ("banner.accent", &self.banner.accent),
            ("banner.rule", &self.banner.rule),
        ] {
            if parse_hex_color(value).is_none() {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a #rrggbb color, got '{value}'"
                )));
            }
        }

        if self.check.sample_size == 0 {
            return Err(ConfigError::Validation(
                "check.sample_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// News records, page template, and the news index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewsConfig {
    /// Directory of `*.json` records, relative to the site root.
    pub records_dir: String,
    /// Directory receiving `<slug>/index.html`, relative to the output root.
    pub output_dir: String,
    /// Page template, relative to the site root. Built-in template when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// News index JSON, relative to the output root.
    pub index_path: String,
    /// URL directory for news images and generated banners.
    pub asset_url: String,
    /// Image used in the index when a record has neither image nor banner.
    pub default_image: String,
    /// Maximum excerpt length in characters, ellipsis included.
    pub excerpt_length: usize,
    pub cta: CtaConfig,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            records_dir: "berita/data".to_string(),
            output_dir: "berita".to_string(),
            template: None,
            index_path: "berita/news-index.json".to_string(),
            asset_url: "/assets/img/berita".to_string(),
            default_image: "/assets/img/berita/default-berita.jpg".to_string(),
            excerpt_length: 180,
            cta: CtaConfig::default(),
        }
    }
}

impl NewsConfig {
    /// URL of the generated banner for `slug`.
    pub fn banner_url(&self, slug: &str) -> String {
        join_url(&self.asset_url, &format!("{slug}.png"))
    }
}

/// The call-to-action block appended to every news page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CtaConfig {
    pub enabled: bool,
    pub heading: String,
    pub text: String,
    pub url: String,
    pub label: String,
}

impl Default for CtaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heading: "Gabung Channel IKSASS".to_string(),
            text: "Dapatkan update kegiatan, agenda, dan berita terbaru langsung dari IKSASS."
                .to_string(),
            url: "https://whatsapp.com/channel/0029Vb6q9hnKLaHnmhqaR53G".to_string(),
            label: "Gabung Sekarang".to_string(),
        }
    }
}

/// Photo categories and the generated gallery pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// URL directory holding one folder per category.
    pub asset_url: String,
    /// Directory receiving `index.html` and `<slug>.html`, relative to the output root.
    pub output_dir: String,
    /// Manifest JSON, relative to the output root.
    pub manifest_path: String,
    /// Landing page heading.
    pub title: String,
    /// Landing page lead paragraph and meta description.
    pub intro: String,
    pub categories: Vec<CategoryConfig>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            asset_url: "/assets/img/galeri".to_string(),
            output_dir: "galeri".to_string(),
            manifest_path: "assets/img/galeri/manifest.json".to_string(),
            title: "Galeri".to_string(),
            intro: "Merekam perjalanan, merawat kenangan, menguatkan kebersamaan.".to_string(),
            categories: Vec::new(),
        }
    }
}

/// One photo category (`[[gallery.categories]]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub tag: String,
    /// Markdown narrative shown on the category page.
    #[serde(default)]
    pub narrative: String,
}

/// The cross-category page and document index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    /// Pages index JSON, relative to the output root.
    pub index_path: String,
    /// Directory names skipped anywhere in the tree.
    pub exclude_dirs: Vec<String>,
    /// File names skipped anywhere in the tree.
    pub exclude_files: Vec<String>,
    /// Exact relative paths skipped.
    pub exclude_paths: Vec<String>,
    /// Category when no other rule matches.
    pub default_category: String,
    /// First path segment → category label.
    pub categories: BTreeMap<String, String>,
    /// Exact relative path → category label (wins over `categories`).
    pub path_categories: BTreeMap<String, String>,
    pub documents: DocumentsConfig,
}

impl Default for PagesConfig {
    fn default() -> Self {
        let categories = [
            ("profil", "Profil"),
            ("tentang", "Tentang"),
            ("kelembagaan", "Kelembagaan"),
            ("agenda", "Agenda"),
            ("dokumen", "Dokumen"),
            ("galeri", "Galeri"),
            ("info", "Info"),
            ("kontak", "Kontak"),
            ("wasiat", "Wasiat"),
        ];
        let path_categories = [
            ("index.html", "Beranda"),
            ("faq.html", "FAQ"),
            ("kebijakan-privasi.html", "Kebijakan"),
        ];
        Self {
            index_path: "assets/data/pages-index.json".to_string(),
            exclude_dirs: [".git", "node_modules", "partials", "assets", "auth", "tools"]
                .map(String::from)
                .to_vec(),
            exclude_files: vec!["search.html".to_string()],
            exclude_paths: Vec::new(),
            default_category: "Halaman".to_string(),
            categories: categories
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            path_categories: path_categories
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            documents: DocumentsConfig::default(),
        }
    }
}

/// Downloadable documents indexed alongside pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Folder scanned for documents, relative to the output root.
    pub dir: String,
    /// Listing page whose links are indexed, relative to the output root.
    pub listing: String,
    /// Lower-case extension of indexed documents.
    pub extension: String,
    pub category: String,
    pub excerpt: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: "dokumen".to_string(),
            listing: "dokumen/index.html".to_string(),
            extension: "pdf".to_string(),
            category: "Dokumen".to_string(),
            excerpt: "Dokumen PDF (klik untuk membuka).".to_string(),
        }
    }
}

/// Generated share banner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BannerConfig {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub background: String,
    pub accent: String,
    pub rule: String,
    /// Logo composited top-left, relative to the output root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

impl Default for BannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 1200,
            height: 630,
            background: "#f8fafc".to_string(),
            accent: "#0f766e".to_string(),
            rule: "#e2e8f0".to_string(),
            logo: None,
        }
    }
}

/// Site validator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    /// Pages whose text starts with this are reported as placeholders.
    pub placeholder_prefix: String,
    /// Maximum offending items printed per failed check.
    pub sample_size: usize,
    /// Top-level directories that are not public pages.
    pub skip_dirs: Vec<String>,
    /// Raw keys every record file must carry.
    pub required_record_fields: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            placeholder_prefix: "Mengarahkan ke".to_string(),
            sample_size: 12,
            skip_dirs: ["assets", "partials", "tools"].map(String::from).to_vec(),
            required_record_fields: vec!["title".to_string(), "body".to_string()],
        }
    }
}

/// Parse `#rrggbb` into RGB bytes.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

// =============================================================================
// Resolved site
// =============================================================================

/// A loaded config anchored at a site root.
///
/// This is the one value every pipeline phase receives; all filesystem
/// locations are derived from it, so tests can point a whole build at a
/// temporary directory.
#[derive(Debug, Clone)]
pub struct Site {
    pub root: PathBuf,
    pub config: SiteConfig,
}

impl Site {
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Load `warta.toml` from `root` (stock defaults when absent).
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new(root, load_config(root)?))
    }

    pub fn output_root(&self) -> PathBuf {
        match self.config.output_root.trim() {
            "" | "." => self.root.clone(),
            dir => self.root.join(dir),
        }
    }

    pub fn records_dir(&self) -> PathBuf {
        self.root.join(&self.config.news.records_dir)
    }

    pub fn template_path(&self) -> Option<PathBuf> {
        self.config.news.template.as_ref().map(|t| self.root.join(t))
    }

    pub fn news_output_dir(&self) -> PathBuf {
        self.output_root().join(&self.config.news.output_dir)
    }

    pub fn news_index_path(&self) -> PathBuf {
        self.output_root().join(&self.config.news.index_path)
    }

    pub fn gallery_output_dir(&self) -> PathBuf {
        self.output_root().join(&self.config.gallery.output_dir)
    }

    pub fn gallery_manifest_path(&self) -> PathBuf {
        self.output_root().join(&self.config.gallery.manifest_path)
    }

    pub fn pages_index_path(&self) -> PathBuf {
        self.output_root().join(&self.config.pages.index_path)
    }

    /// On-disk location of a site-root-absolute URL.
    pub fn url_to_path(&self, url: &str) -> PathBuf {
        self.output_root().join(url.trim_start_matches('/'))
    }

    /// URL directory of one gallery category.
    pub fn category_url(&self, slug: &str) -> String {
        join_url(&self.config.gallery.asset_url, slug)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay, arrays included, replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `warta.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `warta.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(root)?)
}

/// Returns a fully-commented stock `warta.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# warta configuration
# ===================
# All settings are optional. Values shown below are the defaults.
# Unknown keys cause an error.

# Name used in default subtitles, captions, summaries and page titles.
site_name = "IKSASS"

# lang attribute of generated gallery pages.
lang = "id"

# Output tree, relative to this file. Output paths below are relative to it.
output_root = "."

# Assets linked from generated gallery pages.
stylesheets = ["/assets/css/main.css"]
scripts = ["/assets/js/main.js"]

# ---------------------------------------------------------------------------
# News
# ---------------------------------------------------------------------------
[news]
# One JSON record per article, relative to this file.
records_dir = "berita/data"

# Rendered pages land in <output_dir>/<slug>/index.html.
output_dir = "berita"

# Page template, relative to this file. Omit to use the built-in template.
# template = "templates/news.html"

# Aggregate news index (newest first by date_iso).
index_path = "berita/news-index.json"

# URL directory for article images and generated banners (<slug>.png).
asset_url = "/assets/img/berita"

# Index image when a record has no image and no banner exists.
default_image = "/assets/img/berita/default-berita.jpg"

# Excerpt length in characters, ellipsis included.
excerpt_length = 180

# Call-to-action block appended once to every news page.
[news.cta]
enabled = true
heading = "Gabung Channel IKSASS"
text = "Dapatkan update kegiatan, agenda, dan berita terbaru langsung dari IKSASS."
url = "https://whatsapp.com/channel/0029Vb6q9hnKLaHnmhqaR53G"
label = "Gabung Sekarang"

# ---------------------------------------------------------------------------
# Gallery
# ---------------------------------------------------------------------------
[gallery]
# Photos live in <asset_url>/<category-slug>/<category-slug>-NN.<jpg|jpeg|png|webp>.
asset_url = "/assets/img/galeri"
output_dir = "galeri"
manifest_path = "assets/img/galeri/manifest.json"
title = "Galeri"
intro = "Merekam perjalanan, merawat kenangan, menguatkan kebersamaan."

# One block per category:
# [[gallery.categories]]
# slug = "khidmah-sosial"
# title = "Khidmah Sosial — Hadir untuk Umat"
# tag = "Sosial"
# narrative = "Markdown text shown on the category page."

# ---------------------------------------------------------------------------
# Cross-category page index
# ---------------------------------------------------------------------------
[pages]
index_path = "assets/data/pages-index.json"
exclude_dirs = [".git", "node_modules", "partials", "assets", "auth", "tools"]
exclude_files = ["search.html"]
exclude_paths = []
default_category = "Halaman"

[pages.categories]
agenda = "Agenda"
dokumen = "Dokumen"
galeri = "Galeri"
info = "Info"
kelembagaan = "Kelembagaan"
kontak = "Kontak"
profil = "Profil"
tentang = "Tentang"
wasiat = "Wasiat"

[pages.path_categories]
"index.html" = "Beranda"
"faq.html" = "FAQ"
"kebijakan-privasi.html" = "Kebijakan"

[pages.documents]
dir = "dokumen"
listing = "dokumen/index.html"
extension = "pdf"
category = "Dokumen"
excerpt = "Dokumen PDF (klik untuk membuka)."

# ---------------------------------------------------------------------------
# Share banners
# ---------------------------------------------------------------------------
[banner]
enabled = true
width = 1200
height = 630
background = "#f8fafc"
accent = "#0f766e"
rule = "#e2e8f0"
# logo = "assets/img/logo.png"

# ---------------------------------------------------------------------------
# Site checks (warta check)
# ---------------------------------------------------------------------------
[check]
placeholder_prefix = "Mengarahkan ke"
sample_size = 12
skip_dirs = ["assets", "partials", "tools"]
required_record_fields = ["title", "body"]
"##
}
