//! Spaced-repetition scheduling over store snapshots.
//!
//! # Responsibility
//! - Derive the "due today" review list.
//! - Derive the forward calendar of study sessions.
//!
//! # Invariants
//! - Every function here is pure over a snapshot and a reference instant.
//! - Day arithmetic uses UTC calendar days.

pub mod calendar;
pub mod review;

use chrono::{DateTime, Utc};

pub use calendar::{upcoming_sessions, SessionEntry, SessionTag};
pub use review::{days_since, due_for_review, review_bucket, DueReviewEntry};

/// Formats a study timestamp for display, e.g. `Mon, Jan 5`.
pub fn format_study_date(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(at) => at.format("%a, %b %-d").to_string(),
        None => "Not started yet".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::format_study_date;
    use chrono::{TimeZone, Utc};

    #[test]
    fn format_study_date_handles_missing_and_present_values() {
        assert_eq!(format_study_date(None), "Not started yet");
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        assert_eq!(format_study_date(Some(at)), "Mon, Jan 5");
    }
}
