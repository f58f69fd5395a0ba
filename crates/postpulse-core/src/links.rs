//! Post-link extraction from free-form chat text.

use std::sync::LazyLock;

use regex::Regex;

static POST_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:www\.)?(?:x\.com|twitter\.com)/\w+/status/\d+")
        .expect("post url pattern is valid")
});

static POST_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"status/(\d+)").expect("post id pattern is valid"));

/// Returns every post URL in `text`, in order of appearance, duplicates included.
#[must_use]
pub fn extract_post_urls(text: &str) -> Vec<String> {
    POST_URL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Extracts the numeric post identifier from a post URL.
#[must_use]
pub fn parse_post_id(url: &str) -> Option<&str> {
    POST_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
