//! Slug derivation for profile URLs.

use std::sync::LazyLock;

use regex::Regex;

// Static patterns, cannot fail to compile
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// Fallback used when a username has no sluggable characters.
pub const FALLBACK_SLUG: &str = "user";

/// Convert `value` into a lowercase ASCII slug.
///
/// Characters other than ASCII letters, digits, underscores, hyphens and
/// whitespace are dropped, runs of whitespace and hyphens collapse into a
/// single hyphen, and leading/trailing hyphens or underscores are stripped.
#[must_use]
pub fn slugify(value: &str) -> String {
    let ascii: String = value.chars().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(&cleaned, "-");
    let slug = joined.trim_matches(|c| c == '-' || c == '_');

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// The n-th candidate for `base`: `base` itself for 0, `base-n` otherwise.
#[must_use]
pub fn slug_with_suffix(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Alice"), "alice");
        assert_eq!(slugify("jean pierre"), "jean-pierre");
        assert_eq!(slugify("  a -- b  "), "a-b");
    }

    #[test]
    fn test_slugify_drops_punctuation() {
        assert_eq!(slugify("o'neil@ensae"), "oneilensae");
        assert_eq!(slugify("user.name+1"), "username1");
        assert_eq!(slugify("_under_"), "under");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(slugify("@@@"), FALLBACK_SLUG);
        assert_eq!(slugify(""), FALLBACK_SLUG);
    }

    #[test]
    fn test_suffix_sequence() {
        let base = slugify("Bob");
        let seq: Vec<String> = (0..3).map(|n| slug_with_suffix(&base, n)).collect();
        assert_eq!(seq, vec!["bob", "bob-1", "bob-2"]);
    }
}
