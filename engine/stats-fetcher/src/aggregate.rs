use crate::models::{GlobalStats, PlayerStats, UniverseId};
use std::collections::HashMap;

/// Sum live players and visits across every game in `stats`
pub fn calculate_global_stats(stats: &HashMap<UniverseId, PlayerStats>) -> GlobalStats {
    stats.values().fold(
        GlobalStats { active_games: stats.len(), ..GlobalStats::default() },
        |mut global, s| {
            global.total_live_players = global.total_live_players.saturating_add(s.live_count);
            global.total_visits = global.total_visits.saturating_add(s.visits);
            global
        },
    )
}
