//! Post-build site validation.
//!
//! `warta check` inspects the output tree the way a visitor would see it and
//! runs four checks in a fixed order, stopping at the first one that fails:
//!
//! 1. **Placeholders**: no public page is a leftover redirect stub whose text
//!    starts with `check.placeholder_prefix`.
//! 2. **Links**: every internal `href` on a public page resolves to a file.
//! 3. **Records**: every record file normalizes and carries the configured
//!    raw fields.
//! 4. **News index**: dates are valid, undated entries come last, and dated
//!    entries are newest first.
//!
//! A failure carries the total number of problems and a sample bounded by
//! `check.sample_size`.
//!
//! ## Link resolution
//!
//! Root-absolute links resolve against the output root; relative links resolve
//! against the page's directory and are ignored if they climb out of the root.
//! A target is found when it is a file, a folder with an `index.html`, or a
//! name whose `.html` sibling exists:
//!
//! ```text
//! /profil/         → profil/index.html
//! /profil          → profil/index.html  or  profil.html
//! ../faq           → faq.html
//! ```

use crate::config::Site;
use crate::record::{load_raw, missing_fields, normalize_record, parse_iso_date, record_files};
use crate::scrape;
use crate::text::visible_text;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Schemes and prefixes that are never checked.
const IGNORED_PREFIXES: &[&str] = &[
    "http://",
    "https://",
    "//",
    "mailto:",
    "tel:",
    "data:",
    "javascript:",
    "#",
];

/// The checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Placeholders,
    Links,
    Records,
    NewsIndex,
}

impl Check {
    pub const ALL: [Check; 4] = [
        Check::Placeholders,
        Check::Links,
        Check::Records,
        Check::NewsIndex,
    ];
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Check::Placeholders => "placeholder pages",
            Check::Links => "internal links",
            Check::Records => "news records",
            Check::NewsIndex => "news index order",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{check} failed ({total} problem(s)): {}", .sample.join("; "))]
    Failed {
        check: Check,
        total: usize,
        sample: Vec<String>,
    },
}

/// Result of a clean run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub passed: Vec<Check>,
    /// Advisory findings that do not fail the run.
    pub warnings: Vec<String>,
}

/// Outcome of resolving one `href`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// External, fragment-only, or outside the site.
    Ignored,
    Found,
    Broken,
}

/// Run every check in order.
pub fn run_checks(site: &Site) -> Result<CheckReport, CheckError> {
    let mut report = CheckReport::default();
    for check in Check::ALL {
        let problems = match check {
            Check::Placeholders => placeholder_pages(site)?,
            Check::Links => broken_links(site)?,
            Check::Records => record_problems(site, &mut report.warnings)?,
            Check::NewsIndex => news_index_problems(site, &mut report.warnings)?,
        };
        if !problems.is_empty() {
            return Err(failure(check, problems, site.config.check.sample_size));
        }
        tracing::info!(check = %check, "check passed");
        report.passed.push(check);
    }
    Ok(report)
}

fn failure(check: Check, mut problems: Vec<String>, sample_size: usize) -> CheckError {
    let total = problems.len();
    problems.truncate(sample_size);
    CheckError::Failed {
        check,
        total,
        sample: problems,
    }
}

/// Public HTML pages as `(path, output-relative path)`, in file-name order.
fn public_pages(site: &Site) -> Result<Vec<(PathBuf, String)>, CheckError> {
    let root = site.output_root();
    let skip = &site.config.check.skip_dirs;
    let mut pages = Vec::new();

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let top_level_dir = entry.depth() == 1 && entry.file_type().is_dir();
            !(top_level_dir && skip.iter().any(|d| *d == entry.file_name().to_string_lossy()))
        });

    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "html") {
            continue;
        }
        let rel = path
            .strip_prefix(&root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        pages.push((path.to_path_buf(), rel));
    }
    Ok(pages)
}

fn read_lossy(path: &Path) -> Result<String, CheckError> {
    Ok(String::from_utf8_lossy(&fs::read(path)?).into_owned())
}

// ============================================================================
// Placeholders
// ============================================================================

/// True when a page's raw text or its visible text starts with `prefix`.
pub fn is_placeholder(html: &str, prefix: &str) -> bool {
    html.trim_start().starts_with(prefix) || visible_text(html).starts_with(prefix)
}

fn placeholder_pages(site: &Site) -> Result<Vec<String>, CheckError> {
    let prefix = &site.config.check.placeholder_prefix;
    let mut found = Vec::new();
    for (path, rel) in public_pages(site)? {
        if is_placeholder(&read_lossy(&path)?, prefix) {
            found.push(rel);
        }
    }
    Ok(found)
}

// ============================================================================
// Links
// ============================================================================

/// Resolve `href` as it appears on `page` inside the site at `root`.
pub fn check_link(root: &Path, page: &Path, href: &str) -> LinkStatus {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if IGNORED_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return LinkStatus::Ignored;
    }
    let href = href.split(['#', '?']).next().unwrap_or_default();
    if href.is_empty() {
        return LinkStatus::Ignored;
    }

    let target = if let Some(rel) = href.strip_prefix('/') {
        root.join(rel.trim_start_matches('/'))
    } else {
        let base = page.parent().unwrap_or(root);
        match normalize_within(root, &base.join(href)) {
            Some(target) => target,
            None => return LinkStatus::Ignored,
        }
    };

    if target_exists(&target) {
        LinkStatus::Found
    } else {
        LinkStatus::Broken
    }
}

fn target_exists(target: &Path) -> bool {
    if target.is_file() || (target.is_dir() && target.join("index.html").is_file()) {
        return true;
    }
    let name = target.to_string_lossy();
    let trimmed = name.trim_end_matches('/');
    !trimmed.is_empty() && Path::new(&format!("{trimmed}.html")).is_file()
}

/// Lexically resolve `.` and `..`; `None` if the path leaves `root`.
fn normalize_within(root: &Path, path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    let root = normalize_lexically(root);
    out.starts_with(&root).then_some(out)
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

fn broken_links(site: &Site) -> Result<Vec<String>, CheckError> {
    let root = site.output_root();
    let mut broken = Vec::new();
    for (path, rel) in public_pages(site)? {
        for href in scrape::hrefs(&read_lossy(&path)?) {
            if check_link(&root, &path, &href) == LinkStatus::Broken {
                broken.push(format!("{rel} -> {href}"));
            }
        }
    }
    Ok(broken)
}

// ============================================================================
// Records
// ============================================================================

fn record_problems(site: &Site, warnings: &mut Vec<String>) -> Result<Vec<String>, CheckError> {
    let dir = site.records_dir();
    if !dir.is_dir() {
        warnings.push(format!("no records directory at {}", dir.display()));
        return Ok(Vec::new());
    }

    let required = &site.config.check.required_record_fields;
    let mut problems = Vec::new();
    for path in record_files(&dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raw = match load_raw(&path) {
            Ok(raw) => raw,
            Err(e) => {
                problems.push(e.to_string());
                continue;
            }
        };
        let missing = missing_fields(&raw, required);
        if !missing.is_empty() {
            problems.push(format!("{name}: missing fields {}", missing.join(", ")));
            continue;
        }
        if let Err(e) = normalize_record(&raw, &site.config) {
            problems.push(format!("{name}: {e}"));
        }
    }
    Ok(problems)
}

// ============================================================================
// News index
// ============================================================================

/// Ordering problems in a list of `date_iso` values.
///
/// Blank dates are undated (reported through `warnings`) and must trail every
/// dated entry; dated entries must not increase.
pub fn date_order_problems(dates: &[&str], warnings: &mut Vec<String>) -> Vec<String> {
    let mut problems = Vec::new();
    let mut previous = None;
    let mut seen_undated = false;

    for (i, date) in dates.iter().enumerate() {
        if date.is_empty() {
            warnings.push(format!("news index entry {i} has no date_iso"));
            seen_undated = true;
            continue;
        }
        let Some(parsed) = parse_iso_date(date) else {
            problems.push(format!("entry {i}: invalid date_iso '{date}'"));
            continue;
        };
        if seen_undated {
            problems.push(format!("entry {i}: dated entry {date} after an undated one"));
        }
        if previous.is_some_and(|prev| parsed > prev) {
            problems.push(format!("entry {i}: {date} is newer than the entry before it"));
        }
        previous = Some(parsed);
    }
    problems
}

fn news_index_problems(site: &Site, warnings: &mut Vec<String>) -> Result<Vec<String>, CheckError> {
    let path = site.news_index_path();
    if !path.is_file() {
        warnings.push(format!("no news index at {}", path.display()));
        return Ok(Vec::new());
    }
    let entries: Vec<Value> = match serde_json::from_str(&read_lossy(&path)?) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => return Ok(vec!["news index is not a JSON array".to_string()]),
        Err(e) => return Ok(vec![format!("news index is not valid JSON: {e}")]),
    };
    let dates: Vec<&str> = entries
        .iter()
        .map(|entry| entry.get("date_iso").and_then(Value::as_str).unwrap_or_default())
        .collect();
    Ok(date_order_problems(&dates, warnings))
}
