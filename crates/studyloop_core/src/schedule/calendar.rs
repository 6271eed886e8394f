//! Forward study calendar.
//!
//! # Responsibility
//! - Spread never-studied units over the first days starting today.
//! - Project each studied unit's future review dates.
//! - Group everything into one session per calendar day.
//!
//! # Invariants
//! - Sessions are strictly ascending by date.
//! - Units inside a session keep generation order: initial placements first,
//!   then review projections in traversal/offset order.
//! - The same unit may appear more than once in one session when several
//!   offsets land on that day.
//! - Calendar days are UTC dates.

use crate::model::topic::UnitRef;
use crate::store::StoreSnapshot;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Why a unit was placed on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionTag {
    /// First pass over a never-studied unit.
    Initial,
    /// Review at the n-th schedule offset, 1-based.
    Review(usize),
}

impl Display for SessionTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Review(stage) => write!(f, "review-{stage}"),
        }
    }
}

impl Serialize for SessionTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One calendar day of planned study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEntry {
    pub date: NaiveDate,
    pub units: Vec<UnitRef>,
    pub tags: BTreeSet<SessionTag>,
}

struct Placement {
    date: NaiveDate,
    unit: UnitRef,
    tag: SessionTag,
}

/// Builds the day-by-day plan from `today` onward.
///
/// `spread_days` is clamped to at least 1. `offsets` are the review
/// breakpoints in days.
pub fn upcoming_sessions(
    snapshot: &StoreSnapshot,
    today: DateTime<Utc>,
    offsets: &[u32],
    spread_days: u32,
) -> Vec<SessionEntry> {
    let today_date = today.date_naive();

    let mut unstudied = Vec::new();
    let mut studied = Vec::new();
    for topic in snapshot.topics() {
        for unit in &topic.units {
            match unit.last_studied {
                None => unstudied.push(UnitRef::new(topic, unit)),
                Some(last_studied) => studied.push((UnitRef::new(topic, unit), last_studied)),
            }
        }
    }

    let per_day = unstudied
        .len()
        .div_ceil(spread_days.max(1) as usize)
        .max(1);

    let mut placements = Vec::new();
    for (index, unit) in unstudied.into_iter().enumerate() {
        let day_offset = (index / per_day) as u64;
        let Some(date) = today_date.checked_add_days(Days::new(day_offset)) else {
            continue;
        };
        placements.push(Placement {
            date,
            unit,
            tag: SessionTag::Initial,
        });
    }

    for (unit, last_studied) in studied {
        let studied_date = last_studied.date_naive();
        for (stage, &offset) in offsets.iter().enumerate() {
            let Some(date) = studied_date.checked_add_days(Days::new(u64::from(offset))) else {
                continue;
            };
            if date < today_date {
                continue;
            }
            placements.push(Placement {
                date,
                unit: unit.clone(),
                tag: SessionTag::Review(stage + 1),
            });
        }
    }

    // Stable: same-day entries keep generation order.
    placements.sort_by_key(|placement| placement.date);

    let mut sessions: Vec<SessionEntry> = Vec::new();
    for placement in placements {
        match sessions.last_mut() {
            Some(session) if session.date == placement.date => {
                session.units.push(placement.unit);
                session.tags.insert(placement.tag);
            }
            _ => sessions.push(SessionEntry {
                date: placement.date,
                units: vec![placement.unit],
                tags: BTreeSet::from([placement.tag]),
            }),
        }
    }
    sessions
}
