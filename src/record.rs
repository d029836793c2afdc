//! News record loading and validation.
//!
//! A record is one JSON object per article in `news.records_dir`. Authors have
//! written these by hand (and with several generations of tooling), so field
//! names vary; the loader accepts the known aliases and normalizes everything
//! into a [`ContentRecord`] that the renderer and the index builder can use
//! without further checks.
//!
//! ## Record Format
//!
//! ```json
//! {
//!   "title": "Contoh Acara",
//!   "slug": "contoh-acara",
//!   "subtitle": "Lead singkat",
//!   "location": "Sukorejo",
//!   "date_display": "Selasa (11/11/2025)",
//!   "date_iso": "2025-11-11",
//!   "caption": "Sukorejo • 11 November 2025.",
//!   "description": "Ringkasan untuk SEO dan preview share.",
//!   "featured_image": "foto-utama.jpg",
//!   "popular_score": 12,
//!   "body": [
//!     "Paragraf satu.",
//!     { "type": "paragraph", "content": "Paragraf dua." }
//!   ]
//! }
//! ```
//!
//! ## Rules
//!
//! Applied in order; the first violation is reported with the offending field:
//!
//! 1. `title` is required and non-blank.
//! 2. `slug`, when given, must already be canonical; otherwise it is derived
//!    from the title.
//! 3. `body` is a non-empty array of strings or `{type, content}` blocks with
//!    `type` one of `paragraph`, `p`, `text`. Paragraphs are trimmed and empty
//!    ones dropped; at least one must remain.
//! 4. `date_iso`, when given, must be a real `YYYY-MM-DD` date. When absent it
//!    is inferred from a `D/M/YYYY` pattern in `date_display`, then `caption`.
//! 5. Blank optional fields get defaults derived from the title, the subtitle
//!    and the configured site name.
//!
//! | Field | Aliases |
//! |-------|---------|
//! | `date_iso` | `dateIso`, `date` |
//! | `date_display` | `dateDisplay` |
//! | `location` | `locationLabel` |
//! | `summary` | `description` |
//! | `featured_image` | `featuredImage`, `image` |
//! | `popular_score` | `popularityScore` |

use crate::config::SiteConfig;
use crate::naming::{is_canonical_slug, normalize_asset_path, slugify};
use crate::text::truncate_excerpt;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record must be a JSON object")]
    NotAnObject,
    #[error("field '{field}': {reason}")]
    Field { field: String, reason: String },
}

impl RecordError {
    fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RecordError::Field {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A [`RecordError`] tied to the file it came from.
#[derive(Error, Debug)]
#[error("{}: {source}", .path.display())]
pub struct RecordFileError {
    pub path: PathBuf,
    #[source]
    pub source: RecordError,
}

/// Body block tags rendered as paragraphs.
pub const PARAGRAPH_TYPES: &[&str] = &["paragraph", "p", "text"];

/// Indonesian month names, January first.
pub const MONTHS_ID: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

static DMY_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s*[/-]\s*(\d{1,2})\s*[/-]\s*(\d{4})").expect("valid date regex")
});

const DATE_ALIASES: &[&str] = &["date_iso", "dateIso", "date"];
const DATE_DISPLAY_ALIASES: &[&str] = &["date_display", "dateDisplay"];
const LOCATION_ALIASES: &[&str] = &["location", "locationLabel"];
const SUMMARY_ALIASES: &[&str] = &["summary", "description"];
const IMAGE_ALIASES: &[&str] = &["featured_image", "featuredImage", "image"];
const SCORE_ALIASES: &[&str] = &["popular_score", "popularityScore"];

/// A fully normalized news record.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub location: String,
    pub date_display: String,
    /// Sort key; `None` for undated records.
    pub date: Option<NaiveDate>,
    pub caption: String,
    /// SEO description.
    pub summary: String,
    /// Listing excerpt, already truncated.
    pub excerpt: String,
    /// Trimmed, non-empty paragraphs (plain text, unescaped).
    pub body: Vec<String>,
    /// Normalized author-supplied image, if any.
    pub featured_image: Option<String>,
    /// URL of the generated share banner for this slug.
    pub banner_url: String,
    pub popular_score: Number,
}

impl ContentRecord {
    /// `YYYY-MM-DD`, or empty when undated.
    pub fn date_iso(&self) -> String {
        self.date.map(format_iso).unwrap_or_default()
    }

    /// Image shown on the page: the featured image, else the banner.
    pub fn page_image(&self) -> &str {
        self.featured_image.as_deref().unwrap_or(&self.banner_url)
    }
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `2025-11-11` → `11 November 2025`.
pub fn format_date_display(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_ID[date.month0() as usize],
        date.year()
    )
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// Rejects unpadded components (`2025-1-5`) and impossible dates (`2025-02-30`).
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    (format_iso(date) == text).then_some(date)
}

/// Find a `D/M/YYYY` (or `D-M-YYYY`) date in free text.
pub fn infer_date(text: &str) -> Option<NaiveDate> {
    let caps = DMY_DATE.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

// ============================================================================
// Loading
// ============================================================================

/// Sorted `*.json` files in `dir`. A missing directory has no records.
pub fn record_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read a record file as a raw JSON object.
pub fn load_raw(path: &Path) -> Result<Map<String, Value>, RecordFileError> {
    let wrap = |source: RecordError| RecordFileError {
        path: path.to_path_buf(),
        source,
    };
    let content = fs::read_to_string(path).map_err(|e| wrap(e.into()))?;
    match serde_json::from_str(&content).map_err(|e| wrap(e.into()))? {
        Value::Object(map) => Ok(map),
        _ => Err(wrap(RecordError::NotAnObject)),
    }
}

/// Read and normalize one record file.
pub fn load_record(path: &Path, config: &SiteConfig) -> Result<ContentRecord, RecordFileError> {
    let raw = load_raw(path)?;
    let record = normalize_record(&raw, config).map_err(|source| RecordFileError {
        path: path.to_path_buf(),
        source,
    })?;
    if record.date.is_none() {
        tracing::warn!(
            slug = %record.slug,
            file = %path.display(),
            "record has no date_iso; it will sort after dated news"
        );
    }
    Ok(record)
}

/// Raw keys from `required` that `raw` lacks.
pub fn missing_fields(raw: &Map<String, Value>, required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|key| !raw.contains_key(key.as_str()))
        .cloned()
        .collect()
}

// ============================================================================
// Normalization
// ============================================================================

/// Validate a raw record and fill in every derived field.
pub fn normalize_record(
    raw: &Map<String, Value>,
    config: &SiteConfig,
) -> Result<ContentRecord, RecordError> {
    let site = &config.site_name;

    let title = string_field(raw, &["title"])?;
    if title.is_empty() {
        return Err(RecordError::field("title", "is required"));
    }

    let slug = match string_field(raw, &["slug"])? {
        s if s.is_empty() => {
            let derived = slugify(&title);
            if derived.is_empty() {
                return Err(RecordError::field(
                    "title",
                    "contains no characters usable in a slug",
                ));
            }
            derived
        }
        s if is_canonical_slug(&s) => s,
        s => {
            return Err(RecordError::field(
                "slug",
                format!("'{s}' is not a canonical slug (expected '{}')", slugify(&s)),
            ));
        }
    };

    let body = normalize_body(raw.get("body"))?;

    let date_display_raw = string_field(raw, DATE_DISPLAY_ALIASES)?;
    let caption_raw = string_field(raw, &["caption"])?;
    let date = match keyed_field(raw, DATE_ALIASES)? {
        None => infer_date(&date_display_raw).or_else(|| infer_date(&caption_raw)),
        Some((key, s)) => Some(parse_iso_date(&s).ok_or_else(|| {
            RecordError::field(key, format!("'{s}' is not a valid YYYY-MM-DD date"))
        })?),
    };

    let date_display = match (date_display_raw.is_empty(), date) {
        (true, Some(d)) => format_date_display(d),
        _ => date_display_raw,
    };

    let subtitle = non_blank_or(string_field(raw, &["subtitle"])?, || {
        format!("{site} • Berita")
    });
    let caption = non_blank_or(caption_raw, || {
        format!("{subtitle}. Dokumentasi kegiatan {site}.")
    });
    let summary_raw = string_field(raw, SUMMARY_ALIASES)?;
    let excerpt_source = [string_field(raw, &["excerpt"])?, summary_raw.clone()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| body[0].clone());
    let summary = non_blank_or(summary_raw, || {
        format!("{title} — informasi resmi dari {site}.")
    });

    let asset_url = &config.news.asset_url;
    let featured_image = normalize_asset_path(&string_field(raw, IMAGE_ALIASES)?, asset_url);

    Ok(ContentRecord {
        banner_url: config.news.banner_url(&slug),
        excerpt: truncate_excerpt(&excerpt_source, config.news.excerpt_length),
        location: string_field(raw, LOCATION_ALIASES)?,
        popular_score: popular_score(raw),
        slug,
        title,
        subtitle,
        date_display,
        date,
        caption,
        summary,
        body,
        featured_image,
    })
}

fn normalize_body(body: Option<&Value>) -> Result<Vec<String>, RecordError> {
    let blocks = match body {
        Some(Value::Array(blocks)) if !blocks.is_empty() => blocks,
        Some(Value::Array(_)) | None | Some(Value::Null) => {
            return Err(RecordError::field("body", "must contain at least one paragraph"));
        }
        Some(_) => return Err(RecordError::field("body", "must be an array of paragraphs")),
    };

    let mut paragraphs = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        let text = match block {
            Value::String(s) => s.as_str(),
            Value::Object(map) => {
                let kind = map.get("type").and_then(Value::as_str).unwrap_or_default();
                if !PARAGRAPH_TYPES.contains(&kind) {
                    return Err(RecordError::field(
                        format!("body[{i}].type"),
                        format!(
                            "unsupported block type '{kind}' (expected one of: {})",
                            PARAGRAPH_TYPES.join(", ")
                        ),
                    ));
                }
                map.get("content").and_then(Value::as_str).ok_or_else(|| {
                    RecordError::field(format!("body[{i}].content"), "must be a string")
                })?
            }
            _ => {
                return Err(RecordError::field(
                    format!("body[{i}]"),
                    "expected a string or a {type, content} block",
                ));
            }
        };
        let text = text.trim();
        if !text.is_empty() {
            paragraphs.push(text.to_string());
        }
    }

    if paragraphs.is_empty() {
        return Err(RecordError::field("body", "has no non-empty paragraphs"));
    }
    Ok(paragraphs)
}

/// First present alias as a trimmed string; absent and `null` are empty.
fn string_field(raw: &Map<String, Value>, aliases: &[&str]) -> Result<String, RecordError> {
    Ok(keyed_field(raw, aliases)?.map(|(_, s)| s).unwrap_or_default())
}

/// First non-blank alias, with the key it was read from.
fn keyed_field<'a>(
    raw: &Map<String, Value>,
    aliases: &[&'a str],
) -> Result<Option<(&'a str, String)>, RecordError> {
    for key in aliases {
        match raw.get(*key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.trim().is_empty() => continue,
            Some(Value::String(s)) => return Ok(Some((*key, s.trim().to_string()))),
            Some(_) => return Err(RecordError::field(*key, "must be a string")),
        }
    }
    Ok(None)
}

fn popular_score(raw: &Map<String, Value>) -> Number {
    SCORE_ALIASES
        .iter()
        .find_map(|key| match raw.get(*key) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        })
        .unwrap_or_else(|| Number::from(0))
}

fn non_blank_or(value: String, default: impl FnOnce() -> String) -> String {
    if value.is_empty() { default() } else { value }
}
