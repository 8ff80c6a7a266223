use crate::models::{PlayerStats, UniverseId};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::time::Instant;

/// One generation of fetched stats
///
/// A new generation replaces the previous one wholesale; entries and the
/// fetch timestamp are never updated separately.
#[derive(Debug, Clone)]
pub struct StatsCache {
    entries: HashMap<UniverseId, PlayerStats>,
    requested: HashSet<UniverseId>,
    fetched_at: Instant,
    fetched_at_utc: DateTime<Utc>,
}

impl StatsCache {
    /// Create a generation fetched now for the given request
    pub fn new(entries: HashMap<UniverseId, PlayerStats>, requested: &[UniverseId]) -> Self {
        Self {
            entries,
            requested: requested.iter().copied().collect(),
            fetched_at: Instant::now(),
            fetched_at_utc: Utc::now(),
        }
    }

    pub fn entries(&self) -> &HashMap<UniverseId, PlayerStats> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    /// Non-empty and younger than `window`
    pub fn is_fresh(&self, window: Duration) -> bool {
        !self.is_empty() && self.age() < window
    }

    /// Whether this generation was fetched for every id in `ids`
    pub fn covers(&self, ids: &[UniverseId]) -> bool {
        ids.iter().all(|id| self.requested.contains(id))
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            age: self.age(),
            last_refresh: self.fetched_at_utc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub age: Duration,
    pub last_refresh: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HashMap<UniverseId, PlayerStats> {
        let mut entries = HashMap::new();
        entries.insert(1, PlayerStats::empty(1, Utc::now()));
        entries.insert(2, PlayerStats::empty(2, Utc::now()));
        entries
    }

    #[tokio::test(start_paused = true)]
    async fn test_freshness_window() {
        let cache = StatsCache::new(sample(), &[1, 2]);
        let window = Duration::from_secs(30);
        assert!(cache.is_fresh(window));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(cache.is_fresh(window));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!cache.is_fresh(window));
    }

    #[tokio::test]
    async fn test_empty_generation_never_fresh() {
        let cache = StatsCache::new(HashMap::new(), &[1]);
        assert!(!cache.is_fresh(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_covers_requested_subset() {
        let cache = StatsCache::new(sample(), &[1, 2, 3]);
        assert!(cache.covers(&[1, 3]));
        assert!(cache.covers(&[2, 2]));
        assert!(!cache.covers(&[4]));
        assert_eq!(cache.stats().size, 2);
    }
}
