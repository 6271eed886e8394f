//! Quick wins: incomplete units that fit a time budget.

use crate::model::topic::UnitRef;
use crate::store::StoreSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickWinEntry {
    #[serde(flatten)]
    pub unit: UnitRef,
    pub estimated_minutes: u32,
}

/// Lists incomplete units estimated at `max_minutes` or less.
///
/// Sorted by estimate ascending; ties keep traversal order. Units without an
/// estimate are never included.
pub fn quick_wins(snapshot: &StoreSnapshot, max_minutes: u32) -> Vec<QuickWinEntry> {
    let mut entries: Vec<QuickWinEntry> = snapshot
        .topics()
        .flat_map(|topic| {
            topic.units.iter().filter_map(move |unit| {
                let minutes = unit.estimated_minutes?;
                (!unit.completed && minutes <= max_minutes).then(|| QuickWinEntry {
                    unit: UnitRef::new(topic, unit),
                    estimated_minutes: minutes,
                })
            })
        })
        .collect();
    entries.sort_by_key(|entry| entry.estimated_minutes);
    entries
}
