use crate::cache::{CacheStats, StatsCache};
use crate::config::FetcherConfig;
use crate::error::FetchResult;
use crate::models::*;
use crate::relay::ResolutionChain;
use crate::synth;
use crate::transport::{HttpTransport, ReqwestTransport};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Comma-joined id list as the upstream endpoints expect it
pub(crate) fn join_ids(ids: &[UniverseId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

/// Live stats service with a freshness cache and layered fallbacks
pub struct StatsFetcher {
    config: FetcherConfig,
    transport: Arc<dyn HttpTransport>,
    chain: ResolutionChain,
    cache: RwLock<Option<Arc<StatsCache>>>,
    /// Held for the whole network part of a cycle so only one runs at a time
    cycle: Mutex<()>,
}

impl StatsFetcher {
    /// Create a new fetcher instance using the network
    pub fn new(config: FetcherConfig) -> anyhow::Result<Self> {
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a fetcher over an existing transport
    pub fn with_transport(config: FetcherConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let chain = ResolutionChain::new(&config.relays);
        Self { config, transport, chain, cache: RwLock::new(None), cycle: Mutex::new(()) }
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Upstream URL for a batch of ids
    pub fn stats_url(&self, ids: &[UniverseId]) -> String {
        format!("{}?universeIds={}", self.config.upstream.games_api, join_ids(ids))
    }

    /// Fetch live stats for `ids`
    ///
    /// Never fails. In order of preference the result is a fresh snapshot
    /// from the cache, a new upstream fetch, the last snapshot regardless of
    /// age, or synthesized placeholder numbers. [`LiveStats::source`] tells
    /// which one was returned.
    pub async fn get_live_stats(&self, ids: &[UniverseId]) -> LiveStats {
        if ids.is_empty() {
            return LiveStats { stats: HashMap::new(), source: StatsSource::Fresh };
        }

        if let Some(hit) = self.fresh_hit(ids).await {
            return hit;
        }

        let _cycle = self.cycle.lock().await;

        // a cycle that finished while we waited may already cover us
        if let Some(hit) = self.fresh_hit(ids).await {
            return hit;
        }

        match self.fetch_upstream(ids).await {
            Ok(stats) => {
                let generation = StatsCache::new(stats.clone(), ids);
                *self.cache.write().await = Some(Arc::new(generation));

                info!("Fetched live stats for {} games", stats.len());
                LiveStats { stats, source: StatsSource::Fresh }
            }
            Err(e) => {
                warn!("Failed to fetch live stats, falling back to cache or placeholders: {}", e);

                if let Some(previous) = self.cache.read().await.as_ref().filter(|c| !c.is_empty()) {
                    info!("Serving stale stats ({:?} old)", previous.age());
                    return LiveStats { stats: previous.entries().clone(), source: StatsSource::Stale };
                }

                warn!("No cached stats available, synthesizing placeholders for {} games", ids.len());
                let stats = synth::synthesize(ids, &mut rand::thread_rng(), Utc::now());
                LiveStats { stats, source: StatsSource::Synthesized }
            }
        }
    }

    async fn fresh_hit(&self, ids: &[UniverseId]) -> Option<LiveStats> {
        let cache = self.cache.read().await;
        let generation = cache.as_ref()?;

        if generation.is_fresh(self.config.freshness_window()) && generation.covers(ids) {
            debug!("Serving cached stats ({:?} old)", generation.age());
            return Some(LiveStats {
                stats: generation.entries().clone(),
                source: StatsSource::Cached,
            });
        }

        None
    }

    async fn fetch_upstream(&self, ids: &[UniverseId]) -> FetchResult<HashMap<UniverseId, PlayerStats>> {
        let url = self.stats_url(ids);
        info!("Fetching live stats from: {}", url);

        let response: ApiResponse<UpstreamGame> =
            self.chain.resolve(self.transport.as_ref(), &url).await?;

        let now = Utc::now();
        let mut stats: HashMap<UniverseId, PlayerStats> =
            response.data.iter().map(|game| (game.id, game.to_player_stats(now))).collect();

        for &id in ids {
            stats.entry(id).or_insert_with(|| {
                debug!("Upstream returned no entry for {}, recording zeros", id);
                PlayerStats::empty(id, now)
            });
        }

        Ok(stats)
    }

    /// Drop the cached generation
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Statistics about the current generation, if any
    pub async fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.read().await.as_ref().map(|c| c.stats())
    }
}
