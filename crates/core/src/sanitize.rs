//! Text, HTML, URL, and filename sanitizers.
//!
//! Used by the import and migration flows before entity data reaches the
//! repositories. These are normalizers, not an XSS defense for rendered
//! output; the presentation layer does its own escaping.

use std::sync::OnceLock;

use regex::Regex;

/// Maximum length of a sanitized filename.
pub const MAX_FILENAME_LEN: usize = 255;

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Normalize free text: drop control characters, collapse whitespace, trim.
pub fn sanitize_text(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| !c.is_control()).collect();
    whitespace_re().replace_all(&cleaned, " ").trim().to_string()
}

/// Strip HTML tags from a string, then normalize the remaining text.
pub fn strip_html(input: &str) -> String {
    let without_tags = html_tag_re().replace_all(input, "");
    sanitize_text(&without_tags)
}

/// Check whether a URL is acceptable for stored entity links.
///
/// Only absolute `http`/`https` URLs without embedded whitespace pass;
/// scheme tricks (`javascript:`, `data:`) are rejected by construction.
pub fn is_safe_url(url: &str) -> bool {
    if url.chars().any(char::is_whitespace) {
        return false;
    }
    let lower = url.to_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")) && url.len() > 8
}

/// Sanitize a filename for export downloads.
///
/// Replaces path separators and shell-hostile characters with `_`, strips
/// leading dots, and truncates to [`MAX_FILENAME_LEN`].
pub fn sanitize_filename(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim().trim_start_matches('.');
    trimmed.chars().take(MAX_FILENAME_LEN).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
