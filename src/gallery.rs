//! Photo gallery discovery and page generation.
//!
//! Each `[[gallery.categories]]` entry owns one folder under
//! `gallery.asset_url`. Photos are dropped into that folder following the
//! `<category>-NN.<ext>` convention (see [`crate::naming`]); this module scans
//! the folders, orders and validates the files, picks covers, and writes:
//!
//! ```text
//! <output>/
//! ├── galeri/index.html              # landing page, one card per category
//! ├── galeri/<slug>.html             # category page with the photo grid
//! └── assets/img/galeri/manifest.json
//! ```
//!
//! ## Ordering and covers
//!
//! Valid photos sort by `(index, lower-cased filename)`, so `foo-02.jpg` comes
//! before `foo-10.jpg`. The cover is the photo with index `01`, else the first
//! photo, else the conventional `<slug>/<slug>-01.jpg` placeholder.
//!
//! ## Invalid filenames
//!
//! Any file in a category folder that breaks the convention makes the category
//! unpublishable: its page is not written (a stale one is removed), it is left
//! out of the landing page and the manifest, and it is reported. In
//! [`BuildMode::FailFast`] the first such category aborts the whole run.
//! Dotfiles and subdirectories are ignored.

use crate::config::{CategoryConfig, Site, SiteConfig};
use crate::naming::{NameViolation, join_url, parse_asset_name};
use crate::text::visible_text;
use crate::types::{GalleryManifestEntry, write_json};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Event, Parser, html as md_html};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("category '{category}' has invalid image filenames: {}", .files.join("; "))]
    InvalidAssets { category: String, files: Vec<String> },
}

/// How asset validation failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Block the failing category, keep building the rest, report at the end.
    #[default]
    Report,
    /// Abort at the first failing category.
    FailFast,
}

const GALLERY_CSS: &str = include_str!("../static/gallery.css");

/// A photo that satisfies the naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryImage {
    pub filename: String,
    pub index: u32,
}

/// A file that does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAsset {
    pub filename: String,
    pub reason: NameViolation,
}

impl std::fmt::Display for InvalidAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.filename, self.reason)
    }
}

/// Result of scanning one category folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Valid photos in display order.
    pub images: Vec<GalleryImage>,
    /// Rejected files, sorted by name.
    pub invalid: Vec<InvalidAsset>,
}

/// Scan `dir` (non-recursively) for the photos of `category`.
///
/// A missing folder is an empty category, not an error.
pub fn discover(dir: &Path, category: &str) -> Result<Discovery, GalleryError> {
    let mut discovery = Discovery::default();
    if !dir.is_dir() {
        return Ok(discovery);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        if filename.starts_with('.') {
            tracing::debug!(file = %filename, "skipping hidden file");
            continue;
        }
        match parse_asset_name(category, &filename) {
            Ok(name) => discovery.images.push(GalleryImage {
                filename,
                index: name.index,
            }),
            Err(reason) => discovery.invalid.push(InvalidAsset { filename, reason }),
        }
    }

    discovery
        .images
        .sort_by_cached_key(|img| (img.index, img.filename.to_lowercase()));
    discovery.invalid.sort_by(|a, b| a.filename.cmp(&b.filename));

    for pair in discovery.images.windows(2) {
        if pair[0].index == pair[1].index {
            tracing::warn!(
                category,
                first = %pair[0].filename,
                second = %pair[1].filename,
                "two photos share index {:02}",
                pair[0].index
            );
        }
    }
    Ok(discovery)
}

/// Cover URL: index `01`, else the first photo, else the placeholder.
pub fn cover_url(category_url: &str, category: &str, images: &[GalleryImage]) -> String {
    let chosen = images
        .iter()
        .find(|img| img.index == 1)
        .or_else(|| images.first());
    match chosen {
        Some(img) => join_url(category_url, &img.filename),
        None => join_url(category_url, &format!("{category}-01.jpg")),
    }
}

/// Markdown to HTML with raw HTML passed through as escaped text.
pub fn render_markdown(text: &str) -> String {
    let parser = Parser::new(text).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    md_html::push_html(&mut out, parser);
    out
}

// ============================================================================
// Build
// ============================================================================

/// A category that made it onto the site.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedCategory {
    pub slug: String,
    pub title: String,
    pub cover: String,
    pub image_count: usize,
}

/// A category held back because of invalid filenames.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockedCategory {
    pub slug: String,
    pub invalid: Vec<InvalidAsset>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryReport {
    pub published: Vec<PublishedCategory>,
    pub blocked: Vec<BlockedCategory>,
}

/// Everything needed to render one category.
struct CategoryView<'a> {
    config: &'a CategoryConfig,
    images: Vec<GalleryImage>,
    cover: String,
    folder_url: String,
}

/// Scan every configured category and write pages plus the manifest.
pub fn build_galleries(site: &Site, mode: BuildMode) -> Result<GalleryReport, GalleryError> {
    let config = &site.config;
    let out_dir = site.gallery_output_dir();
    fs::create_dir_all(&out_dir)?;

    let mut report = GalleryReport::default();
    let mut views = Vec::new();

    for category in &config.gallery.categories {
        let folder_url = site.category_url(&category.slug);
        let discovery = discover(&site.url_to_path(&folder_url), &category.slug)?;
        let page_path = out_dir.join(format!("{}.html", category.slug));

        if !discovery.invalid.is_empty() {
            let files: Vec<String> = discovery.invalid.iter().map(ToString::to_string).collect();
            if mode == BuildMode::FailFast {
                return Err(GalleryError::InvalidAssets {
                    category: category.slug.clone(),
                    files,
                });
            }
            tracing::warn!(
                category = %category.slug,
                invalid = %files.join("; "),
                "category blocked until filenames are fixed"
            );
            if page_path.exists() {
                fs::remove_file(&page_path)?;
            }
            report.blocked.push(BlockedCategory {
                slug: category.slug.clone(),
                invalid: discovery.invalid,
            });
            continue;
        }

        let cover = cover_url(&folder_url, &category.slug, &discovery.images);
        let view = CategoryView {
            config: category,
            images: discovery.images,
            cover,
            folder_url,
        };
        fs::write(&page_path, render_category_page(config, &view).into_string())?;
        tracing::info!(category = %category.slug, path = %page_path.display(), "wrote gallery page");

        report.published.push(PublishedCategory {
            slug: category.slug.clone(),
            title: category.title.clone(),
            cover: view.cover.clone(),
            image_count: view.images.len(),
        });
        views.push(view);
    }

    let landing = out_dir.join("index.html");
    fs::write(&landing, render_landing(config, &views).into_string())?;
    tracing::info!(path = %landing.display(), "wrote gallery landing page");

    let manifest: Vec<GalleryManifestEntry> = views.iter().map(manifest_entry).collect();
    write_json(&site.gallery_manifest_path(), &manifest)?;

    Ok(report)
}

fn manifest_entry(view: &CategoryView<'_>) -> GalleryManifestEntry {
    GalleryManifestEntry {
        category_slug: view.config.slug.clone(),
        title: view.config.title.clone(),
        tag: view.config.tag.clone(),
        folder: format!("{}/", view.folder_url.trim_start_matches('/')),
        cover: view.cover.trim_start_matches('/').to_string(),
        images: view.images.iter().map(|img| img.filename.clone()).collect(),
    }
}

fn landing_url(config: &SiteConfig) -> String {
    format!("/{}/", config.gallery.output_dir.trim_matches('/'))
}

fn category_page_url(config: &SiteConfig, slug: &str) -> String {
    join_url(&landing_url(config), &format!("{slug}.html"))
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(config: &SiteConfig, title: &str, description: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(config.lang) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                meta name="description" content=(description);
                meta property="og:type" content="website";
                meta property="og:site_name" content=(config.site_name);
                meta property="og:title" content=(title);
                meta property="og:description" content=(description);
                @for href in &config.stylesheets {
                    link rel="stylesheet" href=(href);
                }
                style { (PreEscaped(GALLERY_CSS)) }
            }
            body {
                div data-include="header" {}
                main.page id="konten" tabindex="-1" {
                    div.container { (content) }
                }
                div data-include="footer" {}
                @for src in &config.scripts {
                    script src=(src) {}
                }
            }
        }
    }
}

fn render_landing(config: &SiteConfig, views: &[CategoryView<'_>]) -> Markup {
    let tags: BTreeSet<&str> = views
        .iter()
        .map(|v| v.config.tag.as_str())
        .filter(|t| !t.is_empty())
        .collect();

    let content = html! {
        div.breadcrumb { "Media" }
        h1.page-title { (config.gallery.title) }
        p.page-sub { (config.gallery.intro) }
        @if !tags.is_empty() {
            div.hero-card {
                @for tag in &tags { div.pill { (tag) } }
            }
        }
        div.gallery-grid {
            @for view in views {
                a.gallery-card href=(category_page_url(config, &view.config.slug)) {
                    div.gallery-card__media {
                        img src=(view.cover) alt=(view.config.title) loading="lazy";
                    }
                    div.gallery-card__body {
                        @if !view.config.tag.is_empty() { div.pill { (view.config.tag) } }
                        h3.title { (view.config.title) }
                        p.desc { (visible_text(&render_markdown(&view.config.narrative))) }
                    }
                }
            }
        }
    };

    let title = format!("{} — {}", config.site_name, config.gallery.title);
    base_document(config, &title, &config.gallery.intro, content)
}

fn render_category_page(config: &SiteConfig, view: &CategoryView<'_>) -> Markup {
    let category = view.config;
    let content = html! {
        div.breadcrumb {
            a href=(landing_url(config)) { (config.gallery.title) }
            @if !category.tag.is_empty() { " / " (category.tag) }
        }
        h1.page-title { (category.title) }
        @if !category.narrative.trim().is_empty() {
            div.prose { (PreEscaped(render_markdown(&category.narrative))) }
        }
        div.hero-card {
            @if !category.tag.is_empty() { div.pill { (category.tag) } }
            div.pill { (config.site_name) }
            div.pill { "Dokumentasi" }
        }
        section.album-grid aria-label="Foto album" {
            @if view.images.is_empty() {
                div.album-empty {
                    p { strong { "Belum ada foto di album ini." } }
                    p {
                        "Taruh foto di "
                        code { (view.folder_url) "/" }
                        " dengan pola "
                        code { (category.slug) "-NN.jpg" }
                        " (NN dua digit; jpg, jpeg, png atau webp), lalu jalankan "
                        code { "warta gallery" }
                        "."
                    }
                }
            }
            @for img in &view.images {
                @let src = join_url(&view.folder_url, &img.filename);
                a.album-item href=(src) target="_blank" rel="noopener" {
                    img src=(src) alt=(category.title) loading="lazy";
                }
            }
        }
    };

    let title = format!("{} | {} {}", category.title, config.gallery.title, config.site_name);
    let description = visible_text(&render_markdown(&category.narrative));
    base_document(config, &title, &description, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{add_category, site_in, touch};
    use tempfile::TempDir;

    fn filenames(discovery: &Discovery) -> Vec<&str> {
        discovery.images.iter().map(|i| i.filename.as_str()).collect()
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    #[test]
    fn discover_orders_numerically() {
        let tmp = TempDir::new().unwrap();
        for name in ["cat-10.jpg", "cat-02.png", "cat-01.webp"] {
            touch(&tmp.path().join(name));
        }
        let discovery = discover(tmp.path(), "cat").unwrap();
        assert_eq!(filenames(&discovery), vec!["cat-01.webp", "cat-02.png", "cat-10.jpg"]);
        assert!(discovery.invalid.is_empty());
    }

    #[test]
    fn discover_partitions_invalid_names() {
        let tmp = TempDir::new().unwrap();
        for name in ["foo-01.jpg", "foo-1.jpg", "bar-02.jpg", "foo-03.gif", "notes.txt"] {
            touch(&tmp.path().join(name));
        }
        let discovery = discover(tmp.path(), "foo").unwrap();
        assert_eq!(filenames(&discovery), vec!["foo-01.jpg"]);
        let invalid: Vec<&str> = discovery.invalid.iter().map(|a| a.filename.as_str()).collect();
        assert_eq!(invalid, vec!["bar-02.jpg", "foo-03.gif", "foo-1.jpg", "notes.txt"]);
    }

    #[test]
    fn discover_skips_hidden_files_and_subdirectories() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join(".DS_Store"));
        touch(&tmp.path().join("foo-01.jpg"));
        fs::create_dir(tmp.path().join("foo-02.jpg")).unwrap();
        let discovery = discover(tmp.path(), "foo").unwrap();
        assert_eq!(filenames(&discovery), vec!["foo-01.jpg"]);
        assert!(discovery.invalid.is_empty());
    }

    #[test]
    fn discover_missing_folder_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(discover(&tmp.path().join("nope"), "foo").unwrap(), Discovery::default());
    }

    #[test]
    fn discover_ties_broken_by_lowercased_name() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("foo-01.png"));
        touch(&tmp.path().join("foo-01.JPG"));
        let discovery = discover(tmp.path(), "foo").unwrap();
        assert_eq!(filenames(&discovery), vec!["foo-01.JPG", "foo-01.png"]);
    }

    // =========================================================================
    // Covers and markdown
    // =========================================================================

    fn image(filename: &str, index: u32) -> GalleryImage {
        GalleryImage {
            filename: filename.to_string(),
            index,
        }
    }

    #[test]
    fn cover_prefers_index_one() {
        let images = vec![image("foo-00.jpg", 0), image("foo-01.jpg", 1)];
        assert_eq!(cover_url("/g/foo", "foo", &images), "/g/foo/foo-01.jpg");
    }

    #[test]
    fn cover_falls_back_to_first() {
        let images = vec![image("foo-03.jpg", 3), image("foo-07.jpg", 7)];
        assert_eq!(cover_url("/g/foo", "foo", &images), "/g/foo/foo-03.jpg");
    }

    #[test]
    fn cover_placeholder_when_empty() {
        assert_eq!(cover_url("/g/foo", "foo", &[]), "/g/foo/foo-01.jpg");
    }

    #[test]
    fn markdown_neutralizes_raw_html() {
        let html = render_markdown("Teks **tebal**\n\n<script>alert(1)</script>");
        assert!(html.contains("<strong>tebal</strong>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_writes_pages_and_manifest() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        add_category(&mut config, "foo", "Foo Album");
        let site = site_in(tmp.path(), config);
        let dir = tmp.path().join("assets/img/galeri/foo");
        touch(&dir.join("foo-02.jpg"));
        touch(&dir.join("foo-01.jpg"));

        let report = build_galleries(&site, BuildMode::Report).unwrap();
        assert_eq!(report.published.len(), 1);
        assert!(report.blocked.is_empty());

        let page = fs::read_to_string(tmp.path().join("galeri/foo.html")).unwrap();
        assert!(page.contains("/assets/img/galeri/foo/foo-01.jpg"));
        assert!(page.find("foo-01.jpg").unwrap() < page.find("foo-02.jpg").unwrap());

        let landing = fs::read_to_string(tmp.path().join("galeri/index.html")).unwrap();
        assert!(landing.contains("href=\"/galeri/foo.html\""));

        let manifest: Vec<GalleryManifestEntry> = serde_json::from_str(
            &fs::read_to_string(tmp.path().join("assets/img/galeri/manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].category_slug, "foo");
        assert_eq!(manifest[0].folder, "assets/img/galeri/foo/");
        assert_eq!(manifest[0].cover, "assets/img/galeri/foo/foo-01.jpg");
        assert_eq!(manifest[0].images, vec!["foo-01.jpg", "foo-02.jpg"]);
    }

    #[test]
    fn invalid_name_blocks_category() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        add_category(&mut config, "foo", "Foo");
        add_category(&mut config, "bar", "Bar");
        let site = site_in(tmp.path(), config);
        touch(&tmp.path().join("assets/img/galeri/foo/foo-1.jpg"));
        touch(&tmp.path().join("assets/img/galeri/foo/foo-02.jpg"));
        touch(&tmp.path().join("assets/img/galeri/bar/bar-01.jpg"));
        fs::create_dir_all(tmp.path().join("galeri")).unwrap();
        fs::write(tmp.path().join("galeri/foo.html"), "stale").unwrap();

        let report = build_galleries(&site, BuildMode::Report).unwrap();
        assert_eq!(report.blocked.len(), 1);
        assert_eq!(report.blocked[0].slug, "foo");
        assert_eq!(report.blocked[0].invalid[0].filename, "foo-1.jpg");
        assert_eq!(report.published.len(), 1);

        assert!(!tmp.path().join("galeri/foo.html").exists());
        let landing = fs::read_to_string(tmp.path().join("galeri/index.html")).unwrap();
        assert!(!landing.contains("foo-1.jpg"));
        assert!(!landing.contains("/galeri/foo.html"));

        let manifest = fs::read_to_string(tmp.path().join("assets/img/galeri/manifest.json")).unwrap();
        assert!(!manifest.contains("foo-1.jpg"));
        assert!(!manifest.contains("\"foo\""));
        assert!(manifest.contains("bar-01.jpg"));
    }

    #[test]
    fn fail_fast_aborts_on_invalid_name() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        add_category(&mut config, "foo", "Foo");
        let site = site_in(tmp.path(), config);
        touch(&tmp.path().join("assets/img/galeri/foo/foo-1.jpg"));

        let err = build_galleries(&site, BuildMode::FailFast).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("foo-1.jpg"), "{message}");
        assert!(message.contains("two digits"), "{message}");
    }

    #[test]
    fn empty_category_published_with_placeholder() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        add_category(&mut config, "kosong", "Kosong");
        let site = site_in(tmp.path(), config);

        let report = build_galleries(&site, BuildMode::Report).unwrap();
        assert_eq!(report.published[0].cover, "/assets/img/galeri/kosong/kosong-01.jpg");
        let page = fs::read_to_string(tmp.path().join("galeri/kosong.html")).unwrap();
        assert!(page.contains("Belum ada foto"));
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        add_category(&mut config, "foo", "Foo");
        let site = site_in(tmp.path(), config);
        touch(&tmp.path().join("assets/img/galeri/foo/foo-01.jpg"));

        build_galleries(&site, BuildMode::Report).unwrap();
        let manifest_path = tmp.path().join("assets/img/galeri/manifest.json");
        let page_path = tmp.path().join("galeri/foo.html");
        let first = (fs::read(&manifest_path).unwrap(), fs::read(&page_path).unwrap());
        build_galleries(&site, BuildMode::Report).unwrap();
        let second = (fs::read(&manifest_path).unwrap(), fs::read(&page_path).unwrap());
        assert_eq!(first, second);
    }
}
