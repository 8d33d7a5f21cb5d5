//! Shared utility functions used across multiple modules.

use std::sync::OnceLock;

use regex::Regex;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next stamp for a clock that last ticked at `previous`.
///
/// Never returns a value `<= previous`, even if the wall clock stalls or steps back.
pub fn next_stamp(previous: i64) -> i64 {
    now_millis().max(previous.saturating_add(1))
}

/// Extract a remote file id from a pasted share link or a bare id.
///
/// Accepts `.../file/d/<id>/...` paths, `?id=<id>` query parameters, and ids of
/// at least ten `[A-Za-z0-9_-]` characters.
pub fn extract_file_id(input: &str) -> Option<String> {
    static BARE_ID: OnceLock<Regex> = OnceLock::new();
    static PATH_ID: OnceLock<Regex> = OnceLock::new();
    static QUERY_ID: OnceLock<Regex> = OnceLock::new();

    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let bare = BARE_ID.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("valid regex"));
    if bare.is_match(input) {
        return Some(input.to_string());
    }

    if !input.contains("://") {
        return None;
    }

    let path = PATH_ID.get_or_init(|| Regex::new(r"/file/d/([^/?#]+)").expect("valid regex"));
    if let Some(captures) = path.captures(input) {
        return Some(captures[1].to_string());
    }

    let query =
        QUERY_ID.get_or_init(|| Regex::new(r"[?&]id=([^&#]+)").expect("valid regex"));
    query
        .captures(input)
        .map(|captures| captures[1].to_string())
}
