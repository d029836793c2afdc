//! CLI output formatting for every command.
//!
//! Output leads with what was produced (slug, category title, counts) and
//! shows file paths as secondary context, relative to the output root.
//!
//! # Output Format
//!
//! ## Records
//!
//! ```text
//! Records
//! 001 contoh-acara → berita/contoh-acara/index.html
//!     Banner: assets/img/berita/contoh-acara.png
//!     Undated: sorted after dated news
//! Failed
//!     berita/data/rusak.json: field 'body[0].type': unsupported block type 'quote' ...
//! Rendered 1 record, 1 failed
//! ```
//!
//! ## Galleries
//!
//! ```text
//! Galleries
//! 001 Kegiatan (12 photos)
//!     Cover: /assets/img/galeri/kegiatan/kegiatan-01.jpg
//! Blocked
//!     foo: foo-1.jpg (index '1' is not exactly two digits)
//! Published 1 category, 1 blocked
//! ```
//!
//! ## Indices and checks
//!
//! ```text
//! Indices
//!     News: 12 entries (1 undated, 0 skipped)
//!     Pages: 30 pages, 4 documents
//!
//! [OK] placeholder pages
//! [FAIL] internal links (5 problems)
//!     index.html -> /hilang/
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::check::{CheckError, CheckReport};
use crate::gallery::GalleryReport;
use crate::pipeline::{BuildReport, IndexReport, RecordsReport};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 record`, `2 records`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    format!("{} {}", n, if n == 1 { singular } else { plural })
}

/// `path` relative to `root`, `/`-separated; unchanged if outside it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

// ============================================================================
// Records
// ============================================================================

pub fn format_records(report: &RecordsReport, root: &Path) -> Vec<String> {
    let mut lines = vec!["Records".to_string()];
    for (i, rendered) in report.rendered.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            rendered.slug,
            display_path(&rendered.page, root)
        ));
        if let Some(banner) = &rendered.banner {
            lines.push(format!("{}Banner: {}", indent(1), display_path(banner, root)));
        }
        if rendered.undated {
            lines.push(format!("{}Undated: sorted after dated news", indent(1)));
        }
    }
    if !report.failed.is_empty() {
        lines.push("Failed".to_string());
        for failure in &report.failed {
            lines.push(format!("{}{}", indent(1), failure.message));
        }
    }
    lines.push(format!(
        "Rendered {}, {} failed",
        count(report.rendered.len(), "record", "records"),
        report.failed.len()
    ));
    lines
}

pub fn print_records(report: &RecordsReport, root: &Path) {
    for line in format_records(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Galleries
// ============================================================================

pub fn format_galleries(report: &GalleryReport) -> Vec<String> {
    let mut lines = vec!["Galleries".to_string()];
    for (i, category) in report.published.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            category.title,
            count(category.image_count, "photo", "photos")
        ));
        lines.push(format!("{}Cover: {}", indent(1), category.cover));
    }
    if !report.blocked.is_empty() {
        lines.push("Blocked".to_string());
        for blocked in &report.blocked {
            let files: Vec<String> = blocked.invalid.iter().map(|a| a.to_string()).collect();
            lines.push(format!("{}{}: {}", indent(1), blocked.slug, files.join(", ")));
        }
    }
    lines.push(format!(
        "Published {}, {} blocked",
        count(report.published.len(), "category", "categories"),
        report.blocked.len()
    ));
    lines
}

pub fn print_galleries(report: &GalleryReport) {
    for line in format_galleries(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Indices
// ============================================================================

pub fn format_indices(report: &IndexReport) -> Vec<String> {
    let news = &report.news;
    vec![
        "Indices".to_string(),
        format!(
            "{}News: {} ({} undated, {} skipped)",
            indent(1),
            count(news.entries, "entry", "entries"),
            news.undated,
            news.skipped.len()
        ),
        format!(
            "{}Pages: {}, {}",
            indent(1),
            count(report.pages.pages, "page", "pages"),
            count(report.pages.documents, "document", "documents")
        ),
    ]
}

pub fn print_indices(report: &IndexReport) {
    for line in format_indices(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Full build
// ============================================================================

pub fn format_build(report: &BuildReport, root: &Path) -> Vec<String> {
    let mut lines = vec!["==> Phase 1: Records".to_string()];
    lines.extend(format_records(&report.records, root));
    lines.push("==> Phase 2: Galleries".to_string());
    lines.extend(format_galleries(&report.galleries));
    lines.push("==> Phase 3: Indices".to_string());
    lines.extend(format_indices(&report.indices));
    lines.push(match report.failures() {
        0 => "==> Build complete".to_string(),
        n => format!("==> Build finished with {}", count(n, "failure", "failures")),
    });
    lines
}

pub fn print_build(report: &BuildReport, root: &Path) {
    for line in format_build(report, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Checks
// ============================================================================

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines: Vec<String> = report.passed.iter().map(|c| format!("[OK] {c}")).collect();
    lines.extend(report.warnings.iter().map(|w| format!("[WARN] {w}")));
    lines.push("All checks passed".to_string());
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}

/// Lines for a failed check; other errors are a single line.
pub fn format_check_failure(err: &CheckError) -> Vec<String> {
    match err {
        CheckError::Failed {
            check,
            total,
            sample,
        } => {
            let mut lines = vec![format!("[FAIL] {check} ({})", count(*total, "problem", "problems"))];
            lines.extend(sample.iter().map(|item| format!("{}{}", indent(1), item)));
            if *total > sample.len() {
                lines.push(format!("{}... and {} more", indent(1), total - sample.len()));
            }
            lines
        }
        other => vec![format!("[FAIL] {other}")],
    }
}

pub fn print_check_failure(err: &CheckError) {
    for line in format_check_failure(err) {
        println!("{}", line);
    }
}
