//! Line normalization shared by ingestion and the query path.

/// Lines starting with this prefix are treated as in-band comments.
pub const COMMENT_PREFIX: &str = "!#comment:";

/// Normalizes a raw source line into a storable word.
///
/// Returns `None` for lines that carry no word: blank lines and
/// comment lines. Surviving lines are trimmed, case-folded unless the
/// list is case-sensitive, and truncated to `max_length` characters.
#[must_use]
pub fn normalize_line(line: &str, case_sensitive: bool, max_length: usize) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
        return None;
    }

    let word = if case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    };

    if max_length > 0 && word.chars().count() > max_length {
        Some(word.chars().take(max_length).collect())
    } else {
        Some(word)
    }
}
