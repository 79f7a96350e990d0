//! Title sanitization for use as a file stem.

/// Maximum length of a sanitized title, in characters.
pub const MAX_TITLE_CHARS: usize = 50;

/// Stem used when nothing usable is left of the title.
const FALLBACK_STEM: &str = "video";

const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitizes a video title into a file stem.
///
/// - Replaces each of `<>:"/\|?*` and control characters with `_`
/// - Truncates to [`MAX_TITLE_CHARS`] characters (not bytes)
/// - Trims trailing spaces and dots, which some filesystems reject
/// - Falls back to `"video"` when nothing remains
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .take(MAX_TITLE_CHARS)
        .collect();

    let trimmed = replaced.trim_end_matches(|c| c == ' ' || c == '.');
    if trimmed.trim().is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}
