//! Display helpers shared by the views.

use chrono::Duration;

use crate::models::Location;
use crate::types::Timestamp;

/// Human-readable age of `ts` relative to `now`.
///
/// Future timestamps (clock skew) are reported as "just now". Anything
/// older than a week falls back to the calendar date.
pub fn relative_age(ts: Timestamp, now: Timestamp) -> String {
    let elapsed = now.signed_duration_since(ts);
    if elapsed < Duration::minutes(1) {
        "just now".to_string()
    } else if elapsed < Duration::hours(1) {
        format!("{}m ago", elapsed.num_minutes())
    } else if elapsed < Duration::days(1) {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed < Duration::days(7) {
        format!("{}d ago", elapsed.num_days())
    } else {
        ts.format("%Y-%m-%d").to_string()
    }
}

/// Fixed five-decimal rendering (roughly one metre of precision).
pub fn coordinates(location: &Location) -> String {
    format!("{:.5}, {:.5}", location.latitude, location.longitude)
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
