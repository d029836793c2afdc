//! Small text helpers shared by the renderer, the indices, and the checker.

use maud::Render;

/// Escape `&`, `<`, `>` and `"` so author text is never read as markup.
///
/// Uses maud's escaper, the same one that protects every `html!` interpolation.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    text.render_to(&mut out);
    out
}

/// Collapse whitespace runs into single spaces and trim.
pub fn clean_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
pub fn strip_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Decode the handful of entities static pages actually contain.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Visible text of an HTML fragment: tags stripped, entities decoded,
/// whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    clean_whitespace(&decode_entities(&strip_tags(html)))
}

/// Truncate to at most `max` characters, ending with `…` when shortened.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate_excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
