//! Small pure text helpers.

/// Truncate to at most `max` characters, ending in `...` when shortened.
///
/// - Trims surrounding whitespace first.
/// - Counts `char`s, not bytes, so multi-byte text is never split.
/// - `max` is raised to 3 so the ellipsis always fits.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let trimmed = raw.trim();
    if trimmed.chars().count() <= max {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(max - 3).collect();
    format!("{head}...")
}

/// First non-blank line of `raw`, trimmed.
#[must_use]
pub fn first_line(raw: &str) -> &str {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
}
