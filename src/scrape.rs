//! Lightweight extraction from static HTML pages.
//!
//! The page index and the site checker only need a handful of facts from each
//! page: its heading, its `<title>`, its meta description, the first paragraph
//! of the main content, and its links. Pages in the tree are hand-written but
//! regular, so pattern matching over the markup is enough; nothing here builds
//! a DOM.

use crate::text::visible_text;
use regex::Regex;
use std::sync::LazyLock;

static H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").expect("valid h1 regex"));

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("valid title regex")
});

static META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b([^>]*)>").expect("valid meta regex"));

static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid anchor regex"));

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid href regex")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z][a-z0-9:_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid attr regex")
});

static MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main\s*>").expect("valid main regex"));

static KONTEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[a-z][a-z0-9]*\b[^>]*\bid\s*=\s*["']konten["'][^>]*>(.*)"#)
        .expect("valid content region regex")
});

static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)").expect("valid body regex"));

static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").expect("valid paragraph regex"));

/// An `<a href>` with its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// Visible text of the first `<h1>`, if non-blank.
pub fn heading(html: &str) -> Option<String> {
    first_text(&H1, html)
}

/// Visible text of `<title>`, if non-blank.
pub fn document_title(html: &str) -> Option<String> {
    first_text(&TITLE, html)
}

/// Page title: the first heading, else `<title>`.
pub fn page_title(html: &str) -> Option<String> {
    heading(html).or_else(|| document_title(html))
}

/// `content` of `<meta name="description">`, if non-blank.
pub fn meta_description(html: &str) -> Option<String> {
    META.captures_iter(html).find_map(|caps| {
        let attrs = attributes(&caps[1]);
        let is_description = attrs
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("name") && v.eq_ignore_ascii_case("description"));
        if !is_description {
            return None;
        }
        attrs
            .into_iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content"))
            .map(|(_, v)| visible_text(&v))
            .filter(|v| !v.is_empty())
    })
}

/// First non-blank paragraph of the main content region.
///
/// The region is `<main>`, else the element with `id="konten"`, else `<body>`,
/// else the whole document.
pub fn first_paragraph(html: &str) -> Option<String> {
    let region = [&*MAIN, &*KONTEN, &*BODY]
        .into_iter()
        .find_map(|re| re.captures(html).and_then(|c| c.get(1)))
        .map_or(html, |m| m.as_str());
    PARAGRAPH
        .captures_iter(region)
        .map(|caps| visible_text(&caps[1]))
        .find(|text| !text.is_empty())
}

/// Page excerpt: the meta description, else the first main paragraph.
pub fn page_description(html: &str) -> Option<String> {
    meta_description(html).or_else(|| first_paragraph(html))
}

/// Every `href` value in the document, anchors or not, in order.
pub fn hrefs(html: &str) -> Vec<String> {
    HREF.captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Every `<a>` that carries an `href`, with its visible text.
pub fn links(html: &str) -> Vec<Link> {
    ANCHOR
        .captures_iter(html)
        .filter_map(|caps| {
            let href = attributes(&caps[1])
                .into_iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("href"))?
                .1;
            Some(Link {
                href: href.trim().to_string(),
                text: visible_text(&caps[2]),
            })
        })
        .collect()
}

fn first_text(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .map(|caps| visible_text(&caps[1]))
        .filter(|text| !text.is_empty())
}

fn attributes(tag_body: &str) -> Vec<(String, String)> {
    ATTR.captures_iter(tag_body)
        .map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
            (caps[1].to_string(), value.to_string())
        })
        .collect()
}
