//! Mixed/interleaved sessions: at most one unit per topic.
//!
//! The candidate pool is an explicit choice. `InterleavePool::Incomplete`
//! samples units not studied yet; `InterleavePool::Studied` samples units
//! with a recorded study pass. The two are never combined.

use crate::config::InterleavePool;
use crate::model::topic::{Unit, UnitRef};
use crate::store::StoreSnapshot;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MixedSessionEntry {
    #[serde(flatten)]
    pub unit: UnitRef,
    pub estimated_minutes: Option<u32>,
}

/// Picks one random candidate unit from each topic, in topic order.
///
/// Topics with no candidate in `pool` are skipped, not emitted empty.
pub fn mixed_session<R: Rng + ?Sized>(
    snapshot: &StoreSnapshot,
    pool: InterleavePool,
    rng: &mut R,
) -> Vec<MixedSessionEntry> {
    snapshot
        .topics()
        .filter_map(|topic| {
            let candidates: Vec<&Unit> = topic
                .units
                .iter()
                .filter(|unit| in_pool(unit, pool))
                .collect();
            let unit = candidates.choose(rng)?;
            Some(MixedSessionEntry {
                unit: UnitRef::new(topic, unit),
                estimated_minutes: unit.estimated_minutes,
            })
        })
        .collect()
}

fn in_pool(unit: &Unit, pool: InterleavePool) -> bool {
    match pool {
        InterleavePool::Incomplete => !unit.completed,
        InterleavePool::Studied => unit.last_studied.is_some(),
    }
}
