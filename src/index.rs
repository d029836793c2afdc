//! Aggregate JSON indices.
//!
//! Two indices are rebuilt from scratch on every run and written as complete
//! replacements of the previous file, so they always match what is on disk:
//!
//! - **News index** (`news.index_path`): one [`NewsEntry`] per record in
//!   `news.records_dir`, newest first by `date_iso`, undated records last.
//! - **Pages index** (`pages.index_path`): one [`PageEntry`] per static HTML
//!   page in the output tree plus one per linked or stored document.
//!
//! Both are keyed sets: the news index by slug (a later record with the same
//! slug replaces the earlier one), the pages index by URL (the first entry for
//! a URL wins).
//!
//! ## Page URLs and categories
//!
//! ```text
//! profil/index.html        → /profil/        category from [pages.categories].profil
//! profil/visi-misi.html    → /profil/visi-misi.html
//! faq.html                 → /faq.html       category from [pages.path_categories]
//! ```

use crate::config::Site;
use crate::naming::{display_title, is_external_url, slugify};
use crate::record::{ContentRecord, load_record, parse_iso_date, record_files};
use crate::scrape;
use crate::text::truncate_excerpt;
use crate::types::{NewsEntry, PageEntry, write_json};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

// ============================================================================
// Keyed set
// ============================================================================

/// Insertion-ordered collection with at most one item per key.
#[derive(Debug, Clone)]
pub struct KeyedSet<T> {
    items: Vec<T>,
    positions: HashMap<String, usize>,
}

impl<T> Default for KeyedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<T> KeyedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, or replace the existing item for `key` in place.
    ///
    /// Returns `true` when an earlier item was replaced.
    pub fn upsert(&mut self, key: &str, item: T) -> bool {
        match self.positions.get(key) {
            Some(&pos) => {
                self.items[pos] = item;
                true
            }
            None => {
                self.positions.insert(key.to_string(), self.items.len());
                self.items.push(item);
                false
            }
        }
    }

    /// Insert unless `key` is already present. Returns `true` if inserted.
    pub fn insert_first(&mut self, key: &str, item: T) -> bool {
        if self.positions.contains_key(key) {
            return false;
        }
        self.positions.insert(key.to_string(), self.items.len());
        self.items.push(item);
        true
    }

    pub fn contains(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

// ============================================================================
// News index
// ============================================================================

/// Outcome of a news index rebuild.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewsIndexReport {
    pub entries: usize,
    pub undated: usize,
    /// Record files that failed validation, with the reason.
    pub skipped: Vec<String>,
}

/// Project a record into its index entry.
///
/// Image chain: the record's own image, else its banner if one exists on disk,
/// else the configured default.
pub fn news_entry(site: &Site, record: &ContentRecord) -> NewsEntry {
    let image = match &record.featured_image {
        Some(image) => image.clone(),
        None if site.url_to_path(&record.banner_url).is_file() => record.banner_url.clone(),
        None => site.config.news.default_image.clone(),
    };
    NewsEntry {
        slug: record.slug.clone(),
        title: record.title.clone(),
        excerpt: record.excerpt.clone(),
        date_iso: record.date_iso(),
        date_display: record.date_display.clone(),
        location: record.location.clone(),
        image,
        popular_score: record.popular_score.clone(),
    }
}

/// Newest first; entries without a valid date after all dated ones.
pub fn compare_news(a: &NewsEntry, b: &NewsEntry) -> Ordering {
    match (parse_iso_date(&a.date_iso), parse_iso_date(&b.date_iso)) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort by [`compare_news`]; ties keep discovery order.
pub fn sort_news(entries: &mut [NewsEntry]) {
    entries.sort_by(compare_news);
}

/// Collect entries for every valid record in `news.records_dir`.
///
/// Invalid records are skipped with a warning; they never reach the index.
pub fn collect_news(site: &Site) -> Result<(Vec<NewsEntry>, Vec<String>), IndexError> {
    let mut set = KeyedSet::new();
    let mut skipped = Vec::new();

    for path in record_files(&site.records_dir())? {
        let record = match load_record(&path, &site.config) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("skipping record: {e}");
                skipped.push(e.to_string());
                continue;
            }
        };
        let slug = record.slug.clone();
        if set.upsert(&slug, news_entry(site, &record)) {
            tracing::warn!(
                slug = %slug,
                file = %path.display(),
                "slug already indexed; the later record replaces it"
            );
        }
    }

    let mut entries = set.into_vec();
    sort_news(&mut entries);
    Ok((entries, skipped))
}

/// Rebuild and write the news index.
pub fn build_news_index(site: &Site) -> Result<NewsIndexReport, IndexError> {
    let (entries, skipped) = collect_news(site)?;
    let path = site.news_index_path();
    write_json(&path, &entries)?;
    tracing::info!(path = %path.display(), entries = entries.len(), "wrote news index");

    Ok(NewsIndexReport {
        entries: entries.len(),
        undated: entries.iter().filter(|e| e.date_iso.is_empty()).count(),
        skipped,
    })
}

// ============================================================================
// Pages index
// ============================================================================

/// Outcome of a pages index rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagesIndexReport {
    pub pages: usize,
    pub documents: usize,
}

/// Site URL for an output-relative page path.
pub fn page_url(rel: &str) -> String {
    match rel.strip_suffix("index.html") {
        Some(dir) if dir.is_empty() || dir.ends_with('/') => format!("/{dir}"),
        _ => format!("/{rel}"),
    }
}

/// Category label: exact path override, else first path segment, else default.
pub fn page_category(site: &Site, rel: &str) -> String {
    let pages = &site.config.pages;
    if let Some(label) = pages.path_categories.get(rel) {
        return label.clone();
    }
    rel.split_once('/')
        .and_then(|(first, _)| pages.categories.get(first))
        .cloned()
        .unwrap_or_else(|| pages.default_category.clone())
}

/// Lower-case hyphen-safe tokens from the path, the title, and the category.
pub fn page_tags(rel: &str, title: &str, category: &str) -> Vec<String> {
    let path_tokens = rel
        .split(['/', '.', '_', '-'])
        .filter(|t| !t.is_empty() && *t != "html");
    let mut tags: Vec<String> = Vec::new();
    for token in path_tokens
        .chain(title.split_whitespace())
        .chain(std::iter::once(category))
    {
        let tag = slugify(token);
        if tag.len() >= 2 && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Build the entry for one page from its HTML.
pub fn page_entry(site: &Site, rel: &str, html: &str) -> PageEntry {
    let category = page_category(site, rel);
    let title = scrape::page_title(html).unwrap_or_else(|| fallback_title(rel));
    let excerpt = scrape::page_description(html)
        .map(|d| truncate_excerpt(&d, site.config.news.excerpt_length))
        .unwrap_or_default();
    PageEntry {
        tags: page_tags(rel, &title, &category),
        url: page_url(rel),
        title,
        excerpt,
        category,
    }
}

fn fallback_title(rel: &str) -> String {
    let path = Path::new(rel);
    let stem = match path.file_stem().and_then(|s| s.to_str()) {
        Some("index") => path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str()),
        other => other,
    };
    display_title(stem.unwrap_or_default())
}

/// Output-relative, `/`-separated path.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Every indexable page, in file-name order.
fn collect_pages(site: &Site) -> Result<Vec<PageEntry>, IndexError> {
    let root = site.output_root();
    let pages = &site.config.pages;
    let news_dir = site.config.news.output_dir.trim_matches('/');
    let mut entries = Vec::new();

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if pages.exclude_dirs.iter().any(|d| *d == name) {
                return false;
            }
            relative_path(&root, entry.path()).is_none_or(|rel| rel != news_dir)
        });

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        let is_html = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("html"));
        if !entry.file_type().is_file() || !is_html {
            continue;
        }
        let Some(rel) = relative_path(&root, path) else {
            continue;
        };
        let name = entry.file_name().to_string_lossy();
        if pages.exclude_files.iter().any(|f| *f == name) || pages.exclude_paths.contains(&rel) {
            tracing::debug!(page = %rel, "excluded from pages index");
            continue;
        }
        let html = String::from_utf8_lossy(&fs::read(path)?).into_owned();
        entries.push(page_entry(site, &rel, &html));
    }
    Ok(entries)
}

/// Documents linked from the listing page, then any others in the folder.
fn collect_documents(site: &Site) -> Result<Vec<PageEntry>, IndexError> {
    let docs = &site.config.pages.documents;
    let dir = docs.dir.trim_matches('/');
    let ext = format!(".{}", docs.extension.to_ascii_lowercase());
    let mut set = KeyedSet::new();

    let document = |url_path: String, title: String| PageEntry {
        tags: page_tags(&url_path, &title, &docs.category),
        url: format!("/{url_path}"),
        title,
        excerpt: docs.excerpt.clone(),
        category: docs.category.clone(),
    };

    let listing = site.output_root().join(&docs.listing);
    if listing.is_file() {
        let html = String::from_utf8_lossy(&fs::read(&listing)?).into_owned();
        for link in scrape::links(&html) {
            let href = link.href.split(['#', '?']).next().unwrap_or_default();
            if is_external_url(href) || !href.to_ascii_lowercase().ends_with(&ext) {
                continue;
            }
            let trimmed = href.trim_start_matches("./").trim_start_matches('/');
            let url_path = if trimmed.starts_with(&format!("{dir}/")) && !trimmed.contains("..") {
                trimmed.to_string()
            } else {
                let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
                format!("{dir}/{name}")
            };
            let title = if link.text.is_empty() {
                display_title(document_stem(&url_path))
            } else {
                link.text
            };
            let key = url_path.clone();
            set.insert_first(&key, document(url_path, title));
        }
    }

    let folder = site.output_root().join(dir);
    if folder.is_dir() {
        let mut names: Vec<String> = fs::read_dir(&folder)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.to_ascii_lowercase().ends_with(&ext))
            .collect();
        names.sort();
        for name in names {
            let url_path = format!("{dir}/{name}");
            if !set.contains(&url_path) {
                let title = display_title(document_stem(&url_path));
                let key = url_path.clone();
                set.insert_first(&key, document(url_path, title));
            }
        }
    }

    Ok(set.into_vec())
}

fn document_stem(url_path: &str) -> &str {
    let name = url_path.rsplit('/').next().unwrap_or(url_path);
    name.rsplit_once('.').map_or(name, |(stem, _)| stem)
}

/// Pages then documents, de-duplicated by URL (first wins).
pub fn collect_page_index(site: &Site) -> Result<(Vec<PageEntry>, PagesIndexReport), IndexError> {
    let pages = collect_pages(site)?;
    let documents = collect_documents(site)?;
    let mut report = PagesIndexReport::default();
    let mut set = KeyedSet::new();

    for page in pages {
        let url = page.url.clone();
        if set.insert_first(&url, page) {
            report.pages += 1;
        }
    }
    for doc in documents {
        let url = doc.url.clone();
        if set.insert_first(&url, doc) {
            report.documents += 1;
        }
    }
    Ok((set.into_vec(), report))
}

/// Rebuild and write the pages index.
pub fn build_pages_index(site: &Site) -> Result<PagesIndexReport, IndexError> {
    let (entries, report) = collect_page_index(site)?;
    let path = site.pages_index_path();
    write_json(&path, &entries)?;
    tracing::info!(path = %path.display(), entries = entries.len(), "wrote pages index");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_helpers::{find_entry, find_page, site_in, touch, write_page_html, write_record};
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(slug: &str, date: &str) -> NewsEntry {
        NewsEntry {
            slug: slug.to_string(),
            title: slug.to_string(),
            excerpt: String::new(),
            date_iso: date.to_string(),
            date_display: String::new(),
            location: String::new(),
            image: String::new(),
            popular_score: 0.into(),
        }
    }

    fn slugs(entries: &[NewsEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.slug.as_str()).collect()
    }

    // =========================================================================
    // KeyedSet
    // =========================================================================

    #[test]
    fn upsert_replaces_in_place() {
        let mut set = KeyedSet::new();
        assert!(!set.upsert("a", 1));
        assert!(!set.upsert("b", 2));
        assert!(set.upsert("a", 3));
        assert_eq!(set.len(), 2);
        assert_eq!(set.into_vec(), vec![3, 2]);
    }

    #[test]
    fn insert_first_keeps_original() {
        let mut set = KeyedSet::new();
        assert!(set.insert_first("u", "first"));
        assert!(!set.insert_first("u", "second"));
        assert_eq!(set.into_vec(), vec!["first"]);
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    #[test]
    fn sort_newest_first_undated_last() {
        let mut entries = vec![
            entry("undated-1", ""),
            entry("old", "2024-01-05"),
            entry("new", "2025-11-11"),
            entry("bad", "not-a-date"),
            entry("mid", "2025-03-01"),
        ];
        sort_news(&mut entries);
        assert_eq!(slugs(&entries), vec!["new", "mid", "old", "undated-1", "bad"]);
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let mut entries = vec![
            entry("x", "2025-01-01"),
            entry("u1", ""),
            entry("y", "2025-01-01"),
            entry("u2", ""),
        ];
        sort_news(&mut entries);
        assert_eq!(slugs(&entries), vec!["x", "y", "u1", "u2"]);
    }

    // =========================================================================
    // News index
    // =========================================================================

    #[test]
    fn news_index_upserts_by_slug() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        write_record(tmp.path(), "1-first.json", json!({"title": "Pertama", "slug": "a", "body": ["satu"]}));
        write_record(tmp.path(), "2-second.json", json!({"title": "Kedua", "slug": "a", "body": ["dua"]}));

        let report = build_news_index(&site).unwrap();
        assert_eq!(report.entries, 1);

        let entries: Vec<NewsEntry> =
            serde_json::from_str(&fs::read_to_string(site.news_index_path()).unwrap()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Kedua");
        assert_eq!(entries[0].excerpt, "dua");
    }

    #[test]
    fn news_index_skips_invalid_records() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        write_record(tmp.path(), "ok.json", json!({"title": "Baik", "body": ["x"]}));
        write_record(tmp.path(), "bad.json", json!({"title": "Buruk", "body": [{"type": "quote", "content": "x"}]}));

        let report = build_news_index(&site).unwrap();
        assert_eq!(report.entries, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].contains("bad.json"));
    }

    #[test]
    fn image_chain_explicit_banner_default() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        write_record(tmp.path(), "a.json", json!({"title": "Punya Foto", "image": "foto.jpg", "body": ["x"]}));
        write_record(tmp.path(), "b.json", json!({"title": "Punya Banner", "body": ["x"]}));
        write_record(tmp.path(), "c.json", json!({"title": "Tanpa Apa Pun", "body": ["x"]}));
        touch(&tmp.path().join("assets/img/berita/punya-banner.png"));

        let (entries, _) = collect_news(&site).unwrap();
        assert_eq!(find_entry(&entries, "punya-foto").image, "/assets/img/berita/foto.jpg");
        assert_eq!(find_entry(&entries, "punya-banner").image, "/assets/img/berita/punya-banner.png");
        assert_eq!(
            find_entry(&entries, "tanpa-apa-pun").image,
            "/assets/img/berita/default-berita.jpg"
        );
    }

    #[test]
    fn news_index_rebuild_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        write_record(tmp.path(), "a.json", json!({"title": "A", "date_iso": "2025-01-01", "body": ["x"]}));
        write_record(tmp.path(), "b.json", json!({"title": "B", "body": ["y"]}));

        build_news_index(&site).unwrap();
        let first = fs::read(site.news_index_path()).unwrap();
        build_news_index(&site).unwrap();
        assert_eq!(first, fs::read(site.news_index_path()).unwrap());
    }

    #[test]
    fn news_index_replaces_stale_file() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        fs::create_dir_all(site.news_index_path().parent().unwrap()).unwrap();
        fs::write(site.news_index_path(), r#"[{"slug": "orphan"}]"#).unwrap();

        build_news_index(&site).unwrap();
        let text = fs::read_to_string(site.news_index_path()).unwrap();
        assert_eq!(text, "[]\n");
    }

    // =========================================================================
    // Pages index
    // =========================================================================

    #[test]
    fn page_url_mapping() {
        assert_eq!(page_url("profil/index.html"), "/profil/");
        assert_eq!(page_url("profil/visi-misi.html"), "/profil/visi-misi.html");
        assert_eq!(page_url("index.html"), "/");
        assert_eq!(page_url("faq.html"), "/faq.html");
        assert_eq!(page_url("myindex.html"), "/myindex.html");
    }

    #[test]
    fn category_rules() {
        let site = site_in(Path::new("/site"), SiteConfig::default());
        assert_eq!(page_category(&site, "faq.html"), "FAQ");
        assert_eq!(page_category(&site, "index.html"), "Beranda");
        assert_eq!(page_category(&site, "profil/visi-misi.html"), "Profil");
        assert_eq!(page_category(&site, "lain/halaman.html"), "Halaman");
        assert_eq!(page_category(&site, "profil.html"), "Halaman");
    }

    #[test]
    fn tags_deduplicated_and_filtered() {
        let tags = page_tags("profil/visi-misi.html", "Visi & Misi IKSASS", "Profil");
        assert_eq!(tags, vec!["profil", "visi", "misi", "iksass"]);
    }

    #[test]
    fn pages_index_walks_tree_with_exclusions() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        write_page_html(tmp.path(), "index.html", "<h1>Beranda</h1>");
        write_page_html(tmp.path(), "search.html", "<h1>Cari</h1>");
        write_page_html(tmp.path(), "partials/header.html", "<h1>Header</h1>");
        write_page_html(tmp.path(), "berita/contoh/index.html", "<h1>Berita</h1>");
        write_page_html(
            tmp.path(),
            "profil/index.html",
            r#"<meta name="description" content="Tentang kami."><h1>Profil IKSASS</h1>"#,
        );
        write_page_html(tmp.path(), "profil/visi-misi.html", "<main><p>Visi kami.</p></main>");

        let (entries, report) = collect_page_index(&site).unwrap();
        let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["/", "/profil/", "/profil/visi-misi.html"]);
        assert_eq!(report.pages, 3);

        let home = find_page(&entries, "/");
        assert_eq!(home.title, "Beranda");
        assert_eq!(home.category, "Beranda");

        let profil = find_page(&entries, "/profil/");
        assert_eq!(profil.title, "Profil IKSASS");
        assert_eq!(profil.excerpt, "Tentang kami.");
        assert_eq!(profil.category, "Profil");

        let visi = find_page(&entries, "/profil/visi-misi.html");
        assert_eq!(visi.title, "Visi Misi");
        assert_eq!(visi.excerpt, "Visi kami.");
    }

    #[test]
    fn documents_from_listing_and_folder() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        write_page_html(
            tmp.path(),
            "dokumen/index.html",
            r#"<h1>Dokumen</h1>
<a href="/dokumen/ad-art.pdf">AD/ART IKSASS</a>
<a href="../files/pedoman.PDF"></a>
<a href="https://example.com/luar.pdf">Luar</a>
<a href="/dokumen/ad-art.pdf">Duplikat</a>"#,
        );
        touch(&tmp.path().join("dokumen/ad-art.pdf"));
        touch(&tmp.path().join("dokumen/laporan-tahunan.pdf"));
        touch(&tmp.path().join("dokumen/catatan.txt"));

        let (entries, report) = collect_page_index(&site).unwrap();
        assert_eq!(report.pages, 1);
        assert_eq!(report.documents, 3);

        assert_eq!(find_page(&entries, "/dokumen/ad-art.pdf").title, "AD/ART IKSASS");
        assert_eq!(find_page(&entries, "/dokumen/pedoman.PDF").title, "Pedoman");
        let laporan = find_page(&entries, "/dokumen/laporan-tahunan.pdf");
        assert_eq!(laporan.title, "Laporan Tahunan");
        assert_eq!(laporan.category, "Dokumen");
        assert_eq!(laporan.excerpt, "Dokumen PDF (klik untuk membuka).");
        assert!(!entries.iter().any(|e| e.url.contains("luar")));
    }

    #[test]
    fn long_description_truncated() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        let long = "kata ".repeat(60);
        write_page_html(tmp.path(), "info/a.html", &format!("<main><p>{long}</p></main>"));
        let (entries, _) = collect_page_index(&site).unwrap();
        assert!(entries[0].excerpt.ends_with('…'));
        assert!(entries[0].excerpt.chars().count() <= 180);
    }
}
