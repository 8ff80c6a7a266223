//! Placeholder stats for when no real data can be obtained

use crate::models::{PlayerStats, UniverseId};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::ops::Range;

/// Range of the random live count
pub const LIVE_COUNT_RANGE: Range<u64> = 100..600;

/// Visits depend only on the id, so repeated calls agree
pub fn synthetic_visits(id: UniverseId) -> u64 {
    1_000_000 + (id % 1000) * 1000
}

pub fn synthetic_likes(id: UniverseId) -> u64 {
    5000 + id % 100
}

/// One placeholder record per requested id
pub fn synthesize<R: Rng + ?Sized>(
    ids: &[UniverseId],
    rng: &mut R,
    now: DateTime<Utc>,
) -> HashMap<UniverseId, PlayerStats> {
    ids.iter()
        .map(|&id| {
            let record = PlayerStats {
                game_id: id,
                live_count: rng.gen_range(LIVE_COUNT_RANGE),
                visits: synthetic_visits(id),
                likes: synthetic_likes(id),
                last_updated: now,
                synthesized: true,
            };
            (id, record)
        })
        .collect()
}
