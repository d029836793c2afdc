//! News page rendering.
//!
//! Pages are rendered from an HTML template with named `{{slot}}` markers and a
//! body insertion point. The template is parsed once into a list of literal
//! and slot segments, so a typo in a slot name or a missing body marker is an
//! error at load time instead of a page silently missing its content.
//!
//! ## Slots
//!
//! | Slot | Value |
//! |------|-------|
//! | `{{title}}`, `{{alt}}` | record title |
//! | `{{summary}}` | SEO description |
//! | `{{subtitle}}` | lead line |
//! | `{{meta_line}}` | `"{location} — {date_display}"`, dangling separator trimmed |
//! | `{{caption}}` | image caption |
//! | `{{banner_image}}` | generated banner URL |
//! | `{{featured_image}}` | featured image, else the banner |
//! | `{{slug}}`, `{{date_iso}}`, `{{date_display}}`, `{{location}}` | record fields |
//!
//! Every value is HTML-escaped. `{{title}}` is required.
//!
//! ## Body
//!
//! Paragraphs replace `<!-- BODY_PARAGRAPHS -->`. Templates predating the marker
//! carry a four-paragraph placeholder block (`<p>[Paragraf 1: lead]</p>` …
//! `<p>[Paragraf 4: penutup]</p>`); that block is replaced instead, once.
//!
//! ## Call to action
//!
//! [`ensure_cta`] inserts the configured CTA block before the first
//! `</article>` unless the page already has a `news-cta__btn` link, so
//! re-rendering never duplicates it.

use crate::config::{CtaConfig, Site};
use crate::record::ContentRecord;
use crate::text::escape_html;
use maud::{Markup, html};
use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("cannot read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unknown template slot '{0}'")]
    UnknownSlot(String),
    #[error("template is missing the required '{0}' slot")]
    MissingSlot(&'static str),
    #[error(
        "template has no body insertion point (expected <!-- BODY_PARAGRAPHS --> or the legacy paragraph placeholders)"
    )]
    MissingBody,
    #[error("template contains <!-- BODY_PARAGRAPHS --> more than once")]
    DuplicateBody,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

/// Marker replaced by the rendered body paragraphs.
pub const BODY_MARKER: &str = "<!-- BODY_PARAGRAPHS -->";

/// Class of the CTA link; its presence means the CTA is already on the page.
pub const CTA_BUTTON_CLASS: &str = "news-cta__btn";

const BUILTIN_TEMPLATE: &str = include_str!("../static/news-template.html");

static SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid slot regex")
});

static LEGACY_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"<p>\[Paragraf 1: lead\]</p>\s*<p>\[Paragraf 2: detail\]</p>\s*<p>\[Paragraf 3: konteks\]</p>\s*<p>\[Paragraf 4: penutup\]</p>",
    )
    .expect("valid legacy body regex")
});

static CTA_PRESENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#"class\s*=\s*"[^"]*\b{CTA_BUTTON_CLASS}\b"#)).expect("valid CTA regex")
});

/// A named value a template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Title,
    Alt,
    Summary,
    Subtitle,
    MetaLine,
    Caption,
    BannerImage,
    FeaturedImage,
    Slug,
    DateIso,
    DateDisplay,
    Location,
}

impl Slot {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "title" => Slot::Title,
            "alt" => Slot::Alt,
            "summary" => Slot::Summary,
            "subtitle" => Slot::Subtitle,
            "meta_line" => Slot::MetaLine,
            "caption" => Slot::Caption,
            "banner_image" => Slot::BannerImage,
            "featured_image" => Slot::FeaturedImage,
            "slug" => Slot::Slug,
            "date_iso" => Slot::DateIso,
            "date_display" => Slot::DateDisplay,
            "location" => Slot::Location,
            _ => return None,
        })
    }

    fn value(self, record: &ContentRecord) -> String {
        match self {
            Slot::Title | Slot::Alt => record.title.clone(),
            Slot::Summary => record.summary.clone(),
            Slot::Subtitle => record.subtitle.clone(),
            Slot::MetaLine => meta_line(&record.location, &record.date_display),
            Slot::Caption => record.caption.clone(),
            Slot::BannerImage => record.banner_url.clone(),
            Slot::FeaturedImage => record.page_image().to_string(),
            Slot::Slug => record.slug.clone(),
            Slot::DateIso => record.date_iso(),
            Slot::DateDisplay => record.date_display.clone(),
            Slot::Location => record.location.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Slot(Slot),
    Body,
}

/// A parsed news page template.
#[derive(Debug, Clone)]
pub struct NewsTemplate {
    segments: Vec<Segment>,
}

impl NewsTemplate {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let body_range = match source.matches(BODY_MARKER).count() {
            0 => LEGACY_BODY
                .find(source)
                .map(|m| m.range())
                .ok_or(TemplateError::MissingBody)?,
            1 => {
                let start = source.find(BODY_MARKER).ok_or(TemplateError::MissingBody)?;
                start..start + BODY_MARKER.len()
            }
            _ => return Err(TemplateError::DuplicateBody),
        };

        let mut segments = Vec::new();
        tokenize(&source[..body_range.start], &mut segments)?;
        segments.push(Segment::Body);
        tokenize(&source[body_range.end..], &mut segments)?;

        if !segments.contains(&Segment::Slot(Slot::Title)) {
            return Err(TemplateError::MissingSlot("title"));
        }
        Ok(Self { segments })
    }

    /// The configured template file, or the built-in one.
    pub fn load(site: &Site) -> Result<Self, TemplateError> {
        match site.template_path() {
            Some(path) => {
                let source = fs::read_to_string(&path)
                    .map_err(|source| TemplateError::Read { path, source })?;
                Self::parse(&source)
            }
            None => Self::builtin(),
        }
    }

    pub fn builtin() -> Result<Self, TemplateError> {
        Self::parse(BUILTIN_TEMPLATE)
    }

    /// Fill every slot and the body. The CTA is not added here.
    pub fn fill(&self, record: &ContentRecord) -> String {
        let mut html = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => html.push_str(text),
                Segment::Slot(slot) => html.push_str(&escape_html(&slot.value(record))),
                Segment::Body => html.push_str(&body_paragraphs(&record.body)),
            }
        }
        html
    }

    /// The complete page: slots, body, and the CTA when enabled.
    pub fn render(&self, record: &ContentRecord, cta: &CtaConfig) -> String {
        let html = self.fill(record);
        if cta.enabled {
            ensure_cta(&html, cta)
        } else {
            html
        }
    }
}

fn tokenize(source: &str, segments: &mut Vec<Segment>) -> Result<(), TemplateError> {
    let mut last = 0;
    for caps in SLOT.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        let name = &caps[1];
        let slot = Slot::from_name(name).ok_or_else(|| TemplateError::UnknownSlot(name.into()))?;
        if whole.start() > last {
            segments.push(Segment::Literal(source[last..whole.start()].to_string()));
        }
        segments.push(Segment::Slot(slot));
        last = whole.end();
    }
    if last < source.len() {
        segments.push(Segment::Literal(source[last..].to_string()));
    }
    Ok(())
}

/// `"{location} — {date}"` with the separator dropped when either side is blank.
pub fn meta_line(location: &str, date_display: &str) -> String {
    format!("{location} — {date_display}")
        .trim_matches(|c| c == ' ' || c == '—')
        .to_string()
}

fn body_paragraphs(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn cta_fragment(cta: &CtaConfig) -> Markup {
    html! {
        div.news-cta aria-label=(cta.heading) {
            div.news-cta__content {
                h3 { (cta.heading) }
                p { (cta.text) }
            }
            a class=(CTA_BUTTON_CLASS) href=(cta.url) rel="noopener" target="_blank" {
                (cta.label)
            }
        }
    }
}

/// Insert the CTA block unless the page already has one.
///
/// Placed before the first `</article>`, else `</main>`, else `</body>`, else
/// appended. Idempotent.
pub fn ensure_cta(html: &str, cta: &CtaConfig) -> String {
    if CTA_PRESENT.is_match(html) {
        return html.to_string();
    }
    let fragment = format!("\n{}\n", cta_fragment(cta).into_string());
    let anchor = ["</article>", "</main>", "</body>"]
        .iter()
        .find_map(|tag| html.find(tag));
    match anchor {
        Some(at) => format!("{}{}{}", &html[..at], fragment, &html[at..]),
        None => format!("{html}{fragment}"),
    }
}

/// Render `record` and write `<news.output_dir>/<slug>/index.html`.
pub fn write_page(
    site: &Site,
    template: &NewsTemplate,
    record: &ContentRecord,
) -> Result<PathBuf, RenderError> {
    let dir = site.news_output_dir().join(&record.slug);
    fs::create_dir_all(&dir)?;
    let path = dir.join("index.html");
    fs::write(&path, template.render(record, &site.config.news.cta))?;
    tracing::info!(slug = %record.slug, path = %path.display(), "rendered news page");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::test_helpers::{make_record, site_in};
    use tempfile::TempDir;

    const MINIMAL: &str = "<html><head><title>{{title}}</title></head><body><article>\n<h1>{{ title }}</h1>\n<!-- BODY_PARAGRAPHS -->\n</article></body></html>";

    fn cta() -> CtaConfig {
        CtaConfig::default()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    // =========================================================================
    // Template parsing
    // =========================================================================

    #[test]
    fn parse_accepts_whitespace_in_slots() {
        let template = NewsTemplate::parse(MINIMAL).unwrap();
        let html = template.fill(&make_record("Contoh Acara", &["Paragraf satu."]));
        assert_eq!(count(&html, "Contoh Acara"), 2);
        assert!(!html.contains("{{"));
    }

    #[test]
    fn unknown_slot_rejected() {
        let err = NewsTemplate::parse("{{title}} {{tittle}} <!-- BODY_PARAGRAPHS -->").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownSlot(ref s) if s == "tittle"));
    }

    #[test]
    fn title_slot_required() {
        let err = NewsTemplate::parse("<p>{{summary}}</p><!-- BODY_PARAGRAPHS -->").unwrap_err();
        assert!(matches!(err, TemplateError::MissingSlot("title")));
    }

    #[test]
    fn missing_body_marker_is_structural_error() {
        let err = NewsTemplate::parse("<h1>{{title}}</h1>").unwrap_err();
        assert!(matches!(err, TemplateError::MissingBody));
    }

    #[test]
    fn duplicate_body_marker_rejected() {
        let err =
            NewsTemplate::parse("{{title}}<!-- BODY_PARAGRAPHS --><!-- BODY_PARAGRAPHS -->")
                .unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateBody));
    }

    #[test]
    fn builtin_template_parses() {
        let template = NewsTemplate::builtin().unwrap();
        let html = template.render(&make_record("Contoh Acara", &["x"]), &cta());
        assert!(html.contains("<h1"));
        assert!(html.contains("/assets/img/berita/contoh-acara.png"));
    }

    // =========================================================================
    // Body insertion
    // =========================================================================

    #[test]
    fn body_paragraphs_escaped() {
        let template = NewsTemplate::parse(MINIMAL).unwrap();
        let html = template.fill(&make_record("T", &["<script>alert(1)</script>", "a & b"]));
        assert!(html.contains("<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>"));
        assert!(html.contains("<p>a &amp; b</p>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn slot_values_escaped() {
        let template = NewsTemplate::parse(MINIMAL).unwrap();
        let html = template.fill(&make_record(r#"Judul "kutip" <b>"#, &["x"]));
        assert!(html.contains("Judul &quot;kutip&quot; &lt;b&gt;"));
    }

    #[test]
    fn legacy_placeholder_block_replaced_once() {
        let legacy = "<h1>{{title}}</h1>\n<p>[Paragraf 1: lead]</p>\n  <p>[Paragraf 2: detail]</p>\n<p>[Paragraf 3: konteks]</p>\n<p>[Paragraf 4: penutup]</p>\n<footer>[Paragraf 1: lead]</footer>";
        let template = NewsTemplate::parse(legacy).unwrap();
        let html = template.fill(&make_record("T", &["satu", "dua"]));
        assert!(html.contains("<p>satu</p>\n<p>dua</p>"));
        assert!(!html.contains("[Paragraf 2: detail]"));
        assert!(html.contains("<footer>[Paragraf 1: lead]</footer>"));
    }

    // =========================================================================
    // Meta line and CTA
    // =========================================================================

    #[test]
    fn meta_line_trims_dangling_separator() {
        assert_eq!(meta_line("Sukorejo", "11 November 2025"), "Sukorejo — 11 November 2025");
        assert_eq!(meta_line("Sukorejo", ""), "Sukorejo");
        assert_eq!(meta_line("", "11 November 2025"), "11 November 2025");
        assert_eq!(meta_line("", ""), "");
    }

    #[test]
    fn cta_inserted_before_article_close() {
        let html = ensure_cta("<main><article><p>x</p></article></main>", &cta());
        let cta_at = html.find("news-cta__btn").unwrap();
        let close_at = html.find("</article>").unwrap();
        assert!(cta_at < close_at);
        assert!(html.contains("Gabung Sekarang"));
    }

    #[test]
    fn cta_falls_back_to_body_then_append() {
        let html = ensure_cta("<body><p>x</p></body>", &cta());
        assert!(html.find("news-cta__btn").unwrap() < html.find("</body>").unwrap());

        let html = ensure_cta("<p>x</p>", &cta());
        assert!(html.starts_with("<p>x</p>"));
        assert_eq!(count(&html, "news-cta__btn"), 1);
    }

    #[test]
    fn cta_insertion_is_idempotent() {
        let once = ensure_cta("<article></article>", &cta());
        let twice = ensure_cta(&once, &cta());
        assert_eq!(once, twice);
        assert_eq!(count(&twice, "news-cta__btn"), 1);
    }

    #[test]
    fn cta_already_in_template_not_duplicated() {
        let template = NewsTemplate::parse(
            "{{title}}<article><!-- BODY_PARAGRAPHS --><a class=\"news-cta__btn\" href=\"#\">Ikut</a></article>",
        )
        .unwrap();
        let html = template.render(&make_record("T", &["x"]), &cta());
        assert_eq!(count(&html, "news-cta__btn"), 1);
    }

    #[test]
    fn disabled_cta_not_inserted() {
        let template = NewsTemplate::parse(MINIMAL).unwrap();
        let mut config = cta();
        config.enabled = false;
        let html = template.render(&make_record("T", &["x"]), &config);
        assert!(!html.contains("news-cta"));
    }

    // =========================================================================
    // Writing
    // =========================================================================

    #[test]
    fn write_page_creates_slug_directory() {
        let tmp = TempDir::new().unwrap();
        let site = site_in(tmp.path(), SiteConfig::default());
        let template = NewsTemplate::parse(MINIMAL).unwrap();
        let record = make_record("Contoh Acara", &["Paragraf satu."]);

        let path = write_page(&site, &template, &record).unwrap();
        assert_eq!(path, tmp.path().join("berita/contoh-acara/index.html"));

        let first = fs::read_to_string(&path).unwrap();
        write_page(&site, &template, &record).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(count(&second, "<p>Paragraf satu.</p>"), 1);
        assert_eq!(count(&second, "news-cta__btn"), 1);
    }

    #[test]
    fn load_reads_configured_template() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("custom.html"), MINIMAL).unwrap();
        let mut config = SiteConfig::default();
        config.news.template = Some("custom.html".to_string());
        let site = site_in(tmp.path(), config);
        let template = NewsTemplate::load(&site).unwrap();
        assert!(template.fill(&make_record("T", &["x"])).starts_with("<html>"));
    }

    #[test]
    fn load_missing_template_names_path() {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.news.template = Some("nope.html".to_string());
        let site = site_in(tmp.path(), config);
        let err = NewsTemplate::load(&site).unwrap_err();
        assert!(err.to_string().contains("nope.html"));
    }
}
