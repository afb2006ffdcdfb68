//! URL slugs derived from article titles.

use chrono::{DateTime, Utc};

/// Base used when a title contains nothing slug-worthy (e.g. only punctuation).
pub const FALLBACK_SLUG: &str = "article";

/// slugify
///
/// Lowercases and trims `text`, drops everything outside `[a-z0-9]`, whitespace and
/// `-`, then collapses runs of whitespace, `_` and `-` into a single hyphen with no
/// hyphen at either end.
///
/// `"Hello World!"` becomes `"hello-world"`, `"_Ini-Percobaan-"` becomes `"ini-percobaan"`.
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .to_lowercase()
        .trim()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    kept.split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug base for a title, never empty.
pub fn base_slug(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// disambiguate
///
/// Appends a millisecond timestamp to a slug that collided with an existing one.
pub fn disambiguate(slug: &str, at: DateTime<Utc>) -> String {
    format!("{slug}-{}", at.timestamp_millis())
}
