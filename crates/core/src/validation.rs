//! Field rules for page input, shared by the DTO validators.

use std::sync::LazyLock;

use regex::Regex;

/// Lowercase letters, digits and hyphens.
pub static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid regex"));

pub const SLUG_MIN_LEN: u64 = 3;
pub const SLUG_MAX_LEN: u64 = 100;
pub const TITLE_MIN_LEN: u64 = 3;
pub const TITLE_MAX_LEN: u64 = 200;
pub const META_TITLE_MAX_LEN: u64 = 60;
pub const META_DESCRIPTION_MAX_LEN: u64 = 160;

/// Trim and lowercase a slug the way it is stored.
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}
