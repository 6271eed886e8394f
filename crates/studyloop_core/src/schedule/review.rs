//! Spaced-repetition due list.
//!
//! # Responsibility
//! - Bucket studied units by whole days elapsed since their last study.
//! - List every unit that currently sits inside a review bucket.
//!
//! # Invariants
//! - Output follows topic-then-unit traversal order; nothing is re-sorted.
//! - Units past the last breakpoint stay due indefinitely.
//! - Units studied less than one breakpoint ago (or in the future) are not due.

use crate::model::topic::UnitRef;
use crate::store::StoreSnapshot;
use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Derived review row handed to presentation layers.
pub type DueReviewEntry = UnitRef;

/// Whole days from `last_studied` to `today`, floored.
///
/// Negative when `last_studied` lies after `today`.
pub fn days_since(last_studied: DateTime<Utc>, today: DateTime<Utc>) -> i64 {
    (today - last_studied)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_DAY)
}

/// Returns the 0-based review bucket for `days_since`, if any.
///
/// Bucket `i` covers `[offsets[i], offsets[i + 1])`; the last bucket is
/// unbounded. `offsets` must be strictly ascending.
pub fn review_bucket(days_since: i64, offsets: &[u32]) -> Option<usize> {
    offsets
        .iter()
        .rposition(|&offset| days_since >= i64::from(offset))
}

/// Lists units due for review at `today`.
pub fn due_for_review(
    snapshot: &StoreSnapshot,
    today: DateTime<Utc>,
    offsets: &[u32],
) -> Vec<DueReviewEntry> {
    let mut entries = Vec::new();
    for topic in snapshot.topics() {
        for unit in &topic.units {
            let Some(last_studied) = unit.last_studied else {
                continue;
            };
            if review_bucket(days_since(last_studied, today), offsets).is_some() {
                entries.push(UnitRef::new(topic, unit));
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::{days_since, review_bucket};
    use crate::config::DEFAULT_REVIEW_OFFSETS_DAYS;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn days_since_floors_partial_days() {
        let studied = Utc.with_ymd_and_hms(2026, 5, 1, 18, 0, 0).unwrap();
        assert_eq!(days_since(studied, studied + Duration::hours(23)), 0);
        assert_eq!(days_since(studied, studied + Duration::hours(24)), 1);
        assert_eq!(days_since(studied, studied + Duration::hours(71)), 2);
        assert_eq!(days_since(studied, studied - Duration::hours(1)), -1);
    }

    #[test]
    fn buckets_follow_breakpoints() {
        let offsets = DEFAULT_REVIEW_OFFSETS_DAYS;
        assert_eq!(review_bucket(0, &offsets), None);
        assert_eq!(review_bucket(-3, &offsets), None);
        assert_eq!(review_bucket(1, &offsets), Some(0));
        assert_eq!(review_bucket(2, &offsets), Some(0));
        assert_eq!(review_bucket(3, &offsets), Some(1));
        assert_eq!(review_bucket(13, &offsets), Some(2));
        assert_eq!(review_bucket(14, &offsets), Some(3));
        assert_eq!(review_bucket(30, &offsets), Some(4));
        assert_eq!(review_bucket(365, &offsets), Some(4));
    }
}
