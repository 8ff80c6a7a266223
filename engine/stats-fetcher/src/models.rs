use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Roblox universe id of a published game (`masterId` on the site)
pub type UniverseId = u64;

/// API response wrapper
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Vec<T>,
}

/// Game entry from the batch games endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamGame {
    pub id: UniverseId,

    #[serde(default)]
    pub playing: Option<i64>,

    #[serde(default)]
    pub visits: Option<i64>,

    #[serde(rename = "favoritedCount", default)]
    pub favorited_count: Option<i64>,
}

/// Entry from the batch thumbnail endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct ThumbnailBatch {
    #[serde(rename = "universeId")]
    pub universe_id: UniverseId,

    #[serde(default)]
    pub thumbnails: Vec<ImageRef>,
}

/// Entry from the batch icon endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct IconEntry {
    #[serde(rename = "targetId")]
    pub target_id: UniverseId,

    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageRef {
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
}

/// Live statistics for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    pub game_id: UniverseId,
    pub live_count: u64,
    pub visits: u64,
    pub likes: u64,
    pub last_updated: DateTime<Utc>,

    /// Placeholder numbers, not real upstream data
    pub synthesized: bool,
}

impl PlayerStats {
    /// All-zero record for a game the upstream did not report
    pub fn empty(game_id: UniverseId, now: DateTime<Utc>) -> Self {
        Self { game_id, live_count: 0, visits: 0, likes: 0, last_updated: now, synthesized: false }
    }
}

/// Site-wide totals derived from a per-game stats map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub total_live_players: u64,
    pub total_visits: u64,
    pub active_games: usize,
}

/// Where a [`LiveStats`] result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatsSource {
    /// Fetched from upstream during this call
    Fresh,
    /// Served from a snapshot younger than the freshness window
    Cached,
    /// Every route failed; last snapshot returned regardless of age
    Stale,
    /// Every route failed with nothing cached; placeholder numbers
    Synthesized,
}

/// Result of a stats fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveStats {
    pub stats: HashMap<UniverseId, PlayerStats>,
    pub source: StatsSource,
}

impl LiveStats {
    pub fn is_synthesized(&self) -> bool {
        self.source == StatsSource::Synthesized
    }

    pub fn get(&self, id: UniverseId) -> Option<&PlayerStats> {
        self.stats.get(&id)
    }
}

/// Image URLs resolved for one game; either field may be missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameMedia {
    pub master_id: UniverseId,
    pub thumbnail_url: Option<String>,
    pub icon_url: Option<String>,
}

impl GameMedia {
    pub fn new(master_id: UniverseId) -> Self {
        Self { master_id, thumbnail_url: None, icon_url: None }
    }
}

/// Display status kept by the poller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Events emitted by the fetcher
#[derive(Debug, Clone, Serialize)]
pub enum FetcherEvent {
    /// Stats cycle completed
    StatsUpdated {
        games: usize,
        source: StatsSource,
        timestamp: DateTime<Utc>,
    },

    /// Media lookup completed
    MediaUpdated {
        games: usize,
        timestamp: DateTime<Utc>,
    },

    /// A poll tick was dropped because the previous cycle is still running
    TickSkipped {
        timestamp: DateTime<Utc>,
    },

    /// A cycle task panicked
    CycleFailed {
        error: String,
        timestamp: DateTime<Utc>,
    },
}

fn non_negative(value: Option<i64>) -> u64 {
    value.unwrap_or(0).max(0) as u64
}

impl UpstreamGame {
    /// Convert to the internal stats record
    pub fn to_player_stats(&self, now: DateTime<Utc>) -> PlayerStats {
        PlayerStats {
            game_id: self.id,
            live_count: non_negative(self.playing),
            visits: non_negative(self.visits),
            likes: non_negative(self.favorited_count),
            last_updated: now,
            synthesized: false,
        }
    }
}
