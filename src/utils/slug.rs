//! Slug Helpers
//!
//! Status keys are lowercase ASCII slugs (`[a-z0-9_]`).

use std::sync::LazyLock;

use regex::Regex;

/// Longest slug accepted from callers or stored as a key
pub const MAX_KEY_LEN: usize = 64;

/// Length a derived base slug is truncated to before a numeric suffix is added
pub const DERIVED_BASE_LEN: usize = 48;

/// Fallback base when a label has no slug-able characters
pub const EMPTY_SLUG_BASE: &str = "status";

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug regex"));

static VALID_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9_]*[a-z0-9])?$").expect("static slug regex"));

/// Lowercase `input`, collapse every run of non `[a-z0-9]` characters into a
/// single underscore and trim underscores from both ends.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    NON_SLUG_RUN
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Whether `key` is already a well-formed slug
pub fn is_valid_slug(key: &str) -> bool {
    key.len() <= MAX_KEY_LEN && VALID_SLUG.is_match(key)
}

/// Truncate a slug to `max` bytes (slugs are ASCII) without leaving a
/// trailing underscore.
pub fn truncate_slug(slug: &str, max: usize) -> String {
    let cut = if slug.len() > max { &slug[..max] } else { slug };
    cut.trim_end_matches('_').to_string()
}
