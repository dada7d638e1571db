//! Text helpers shared by the storefront and admin views.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

/// Words per minute used for reading-time estimates.
pub const WORDS_PER_MINUTE: usize = 200;

/// Maximum length of a lesson excerpt, in characters.
pub const EXCERPT_MAX_CHARS: usize = 150;

/// Maximum length of a meta description, in characters.
pub const META_DESCRIPTION_MAX_CHARS: usize = 160;

/// Placeholder shown for lessons without a title.
pub const UNTITLED: &str = "Untitled lesson";

static MARKDOWN_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#>*`\-\n]").expect("Invalid regex"));

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Number of whitespace-separated words.
#[must_use]
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

/// Reading time in minutes at [`WORDS_PER_MINUTE`], never less than one.
#[must_use]
pub fn reading_time_minutes(content: &str) -> u32 {
    let minutes = word_count(content).div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

/// Plain-text excerpt of markdown content.
///
/// Heading, quote, emphasis, code and list markers are blanked, whitespace
/// is collapsed and the result is cut to [`EXCERPT_MAX_CHARS`].
#[must_use]
pub fn excerpt_from_content(content: &str) -> String {
    let cleaned = MARKDOWN_NOISE.replace_all(content, " ");
    let collapsed = WHITESPACE.replace_all(&cleaned, " ");
    take_chars(collapsed.trim(), EXCERPT_MAX_CHARS)
}

/// Meta description derived from an excerpt.
#[must_use]
pub fn meta_from_excerpt(excerpt: &str) -> String {
    take_chars(excerpt, META_DESCRIPTION_MAX_CHARS)
}

/// First `max` characters of `text`.
#[must_use]
pub fn take_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Shorten a title for compact listings.
///
/// Empty titles become [`UNTITLED`]; titles longer than `max` characters
/// keep `max - 1` characters followed by an ellipsis.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.is_empty() {
        return UNTITLED.to_string();
    }
    if text.chars().count() > max {
        let mut short = take_chars(text, max.saturating_sub(1));
        short.push('…');
        short
    } else {
        text.to_string()
    }
}

/// Human-friendly age of a timestamp relative to `now`.
///
/// Anything thirty days or older is shown as a calendar date.
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }
    let days = hours / 24;
    if days < 30 {
        return plural(days, "day");
    }
    then.format("%b %-d, %Y").to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_reading_time_rounds_up_with_minimum() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(200)), 1);
        assert_eq!(reading_time_minutes(&"word ".repeat(201)), 2);
    }

    #[test]
    fn test_excerpt_strips_markdown() {
        let excerpt = excerpt_from_content("# Title\n\n> quoted **bold** `code`\n- item");
        assert_eq!(excerpt, "Title quoted bold code item");
    }

    #[test]
    fn test_excerpt_is_capped() {
        let excerpt = excerpt_from_content(&"abc ".repeat(100));
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("", 10), UNTITLED);
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly ten", 11), "exactly ten");
        assert_eq!(truncate("a long lesson title", 7), "a long…");
    }

    #[test]
    fn test_relative_time_units() {
        let now = Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap();

        assert_eq!(relative_time(now - Duration::seconds(30), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::minutes(45), now), "45 minutes ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_time(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_time(now - Duration::days(29), now), "29 days ago");
        assert_eq!(relative_time(now - Duration::days(30), now), "Apr 20, 2026");
    }
}
