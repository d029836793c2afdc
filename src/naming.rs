//! Slugs, asset paths, and the `<category>-NN.<ext>` filename convention.
//!
//! Everything an author types ends up in a URL somewhere: article titles become
//! page directories, image references become `src` attributes, and photos
//! dropped into a gallery folder become ordered gallery entries. This module
//! holds the pure functions that map that free-form input onto canonical names.
//!
//! ## Slugs
//!
//! [`slugify`] is deterministic and idempotent:
//! - `"Contoh Acara"` → `"contoh-acara"`
//! - `"Ma'had Aly: Wisuda 2025!"` → `"mahad-aly-wisuda-2025"`
//! - `"--already-a-slug--"` → `"already-a-slug"`
//!
//! ## Asset paths
//!
//! [`normalize_asset_path`] turns whatever an author wrote in a `featured_image`
//! field into a site-root-absolute path (or leaves a full URL alone), and never
//! lets `..` segments through.
//!
//! ## Gallery filenames
//!
//! Gallery images must be named `<category-slug>-NN.<ext>` where `NN` is
//! exactly two digits and the extension is one of [`ASSET_EXTENSIONS`]
//! (case-insensitive):
//! - `mubes-2025-01.jpg` in category `mubes-2025` → index 1
//! - `mubes-2025-1.jpg` → rejected, single digit
//! - `mubes-2025-001.jpg` → rejected, three digits
//! - `other-01.jpg` → rejected, wrong category prefix

use std::fmt;

/// Image extensions accepted by the gallery naming contract (lowercase).
pub const ASSET_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Site-relative prefix that is rewritten to root-absolute form.
const ASSET_PREFIX: &str = "assets/";

/// Convert arbitrary text into a URL-safe slug.
///
/// Lower-cases ASCII, drops apostrophes and quotes, collapses every run of
/// other non-alphanumeric characters into a single `-`, and trims dashes from
/// both ends. Non-ASCII characters count as separators.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if matches!(c, '\'' | '\u{2019}' | '\u{2018}' | '"' | '\u{201C}' | '\u{201D}') {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// True if `slug` is already in canonical [`slugify`] form and non-empty.
pub fn is_canonical_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

/// True for references that must be passed through untouched.
pub fn is_external_url(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
}

/// Normalize an author-supplied image reference.
///
/// Resolution order:
/// 1. `http://`, `https://` and `data:` references are returned unchanged.
/// 2. Root-absolute paths (`/...`) are returned unchanged.
/// 3. Paths rooted at `assets/` (optionally `./assets/`) gain a leading `/`.
/// 4. Anything else is reduced to its basename and placed under `default_dir`.
///
/// A path containing a `..` segment never survives steps 2 and 3; it falls
/// through to step 4. Returns `None` when nothing usable is left (blank input,
/// or a path that is nothing but separators and dots).
///
/// ```text
/// ("https://cdn.example/x.jpg", _)          → "https://cdn.example/x.jpg"
/// ("/assets/img/a.jpg", _)                  → "/assets/img/a.jpg"
/// ("./assets/img/a.jpg", _)                 → "/assets/img/a.jpg"
/// ("photos/a.jpg", "/assets/img/berita")    → "/assets/img/berita/a.jpg"
/// ("/../../etc/passwd", "/assets/img")      → "/assets/img/passwd"
/// ```
pub fn normalize_asset_path(raw: &str, default_dir: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if is_external_url(raw) {
        return Some(raw.to_string());
    }

    if raw.starts_with('/') {
        if !has_parent_segment(raw) {
            return Some(raw.to_string());
        }
    } else {
        let mut relative = raw;
        while let Some(rest) = relative.strip_prefix("./") {
            relative = rest;
        }
        if relative.starts_with(ASSET_PREFIX) && !has_parent_segment(relative) {
            return Some(format!("/{relative}"));
        }
    }

    let base = basename(raw)?;
    Some(join_url(default_dir, base))
}

/// Join a root-absolute directory URL and a file name with exactly one `/`.
pub fn join_url(dir: &str, name: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), name.trim_start_matches('/'))
}

fn has_parent_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| segment == "..")
}

fn basename(path: &str) -> Option<&str> {
    path.split(['/', '\\'])
        .rev()
        .find(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
}

/// Title-cased display name from a file stem: `visi-misi` → `Visi Misi`.
pub fn display_title(stem: &str) -> String {
    stem.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A gallery filename that satisfies the naming contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetName {
    /// Positional index from the `NN` part (`01` → 1).
    pub index: u32,
    /// Lower-cased extension.
    pub extension: String,
}

/// Why a gallery filename was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameViolation {
    /// No `.ext` suffix at all.
    MissingExtension,
    /// Extension outside [`ASSET_EXTENSIONS`].
    UnsupportedExtension(String),
    /// Stem does not start with `<category>-`.
    WrongPrefix,
    /// The part after `<category>-` is not exactly two digits.
    BadIndex(String),
}

impl fmt::Display for NameViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameViolation::MissingExtension => write!(f, "missing file extension"),
            NameViolation::UnsupportedExtension(ext) => {
                write!(f, "unsupported extension '.{ext}' (expected jpg, jpeg, png or webp)")
            }
            NameViolation::WrongPrefix => write!(f, "name does not start with the category slug"),
            NameViolation::BadIndex(index) => {
                write!(f, "index '{index}' is not exactly two digits")
            }
        }
    }
}

/// Parse a gallery filename against `<category>-NN.<ext>`.
///
/// The category prefix is matched exactly; only the extension is
/// case-insensitive.
pub fn parse_asset_name(category: &str, filename: &str) -> Result<AssetName, NameViolation> {
    let (stem, ext) = filename
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .ok_or(NameViolation::MissingExtension)?;

    let extension = ext.to_ascii_lowercase();
    if !ASSET_EXTENSIONS.contains(&extension.as_str()) {
        return Err(NameViolation::UnsupportedExtension(ext.to_string()));
    }

    let digits = stem
        .strip_prefix(category)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or(NameViolation::WrongPrefix)?;

    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NameViolation::BadIndex(digits.to_string()));
    }

    let index = digits
        .parse::<u32>()
        .map_err(|_| NameViolation::BadIndex(digits.to_string()))?;

    Ok(AssetName { index, extension })
}
