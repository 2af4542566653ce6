//! Utility functions for link targets and identifiers.

use regex::Regex;
use std::sync::LazyLock;

/// Path prefix of every internal link on the site.
pub const MUSIC_PREFIX: &str = "/music/";

/// Runs of characters that cannot appear in a slug.
static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}]+").unwrap());

/// Converts a display name into a path identifier.
///
/// Lowercases the name and collapses every run of non-alphanumeric
/// characters into a single hyphen: `"Game & Watch"` becomes `"game-watch"`.
/// Letters outside ASCII are kept as they are.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_SLUG
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Removes the `/music/` prefix from a link target, if present.
pub fn strip_music_prefix(href: &str) -> &str {
    href.strip_prefix(MUSIC_PREFIX).unwrap_or(href)
}

/// Returns the path part of a link target, without query or fragment.
pub fn raw_path(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    &href[..end]
}

/// Returns the last segment of the link target's path.
pub fn file_name(href: &str) -> &str {
    let path = raw_path(href);
    path.rsplit('/').next().unwrap_or(path)
}

/// Returns the lowercased file extension (no leading dot) of a link target.
pub fn extension(href: &str) -> Option<String> {
    let name = file_name(href);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_lowercase()),
        _ => None,
    }
}
