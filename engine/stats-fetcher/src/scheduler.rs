use crate::aggregate::calculate_global_stats;
use crate::catalog::{self, CatalogEntry};
use crate::config::FetcherConfig;
use crate::fetcher::StatsFetcher;
use crate::media::MediaFetcher;
use crate::models::*;
use crate::relay::ResolutionChain;
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

/// Everything the site needs to render the live widget
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub state: LoadingState,
    pub stats: HashMap<UniverseId, PlayerStats>,
    pub source: Option<StatsSource>,
    pub global: Option<GlobalStats>,
    pub catalog: Vec<CatalogEntry>,
}

/// Polls live stats on a fixed interval, never running two cycles at once
pub struct StatsScheduler {
    config: FetcherConfig,
    fetcher: Arc<StatsFetcher>,
    media: MediaFetcher,
    in_flight: Arc<AtomicBool>,
    snapshot_tx: Arc<watch::Sender<DashboardSnapshot>>,
}

impl StatsScheduler {
    /// Create a new scheduler
    pub fn new(config: FetcherConfig) -> anyhow::Result<Self> {
        let fetcher = StatsFetcher::new(config)?;
        Ok(Self::with_fetcher(Arc::new(fetcher)))
    }

    /// Create a scheduler around an existing fetcher, sharing its transport
    pub fn with_fetcher(fetcher: Arc<StatsFetcher>) -> Self {
        let config = fetcher.config().clone();
        let media = MediaFetcher::new(
            config.upstream.clone(),
            ResolutionChain::new(&config.relays),
            fetcher.transport(),
        );

        let initial = DashboardSnapshot {
            catalog: config.catalog.iter().map(|game| game.to_entry()).collect(),
            ..Default::default()
        };
        let (snapshot_tx, _) = watch::channel(initial);

        Self {
            config,
            fetcher,
            media,
            in_flight: Arc::new(AtomicBool::new(false)),
            snapshot_tx: Arc::new(snapshot_tx),
        }
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Run until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting stats scheduler for {} games, polling every {:?}",
            self.config.catalog.len(),
            self.config.poll_interval()
        );
        tokio::pin!(shutdown);

        // media runs alongside polling so a slow relay chain never delays stats
        let mut media_pending = self.config.scheduler.refresh_media_on_start;
        let media_refresh = self.refresh_media();
        tokio::pin!(media_refresh);

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Stats scheduler shutting down");
                    break;
                }
                _ = &mut media_refresh, if media_pending => {
                    media_pending = false;
                }
                _ = ticker.tick() => {
                    self.on_tick();
                }
            }
        }
    }

    /// Start a stats cycle unless the previous one is still running
    pub fn on_tick(&self) -> Option<JoinHandle<()>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            let event = FetcherEvent::TickSkipped { timestamp: Utc::now() };
            debug!("Previous stats cycle still running: {:?}", event);
            return None;
        }

        let fetcher = Arc::clone(&self.fetcher);
        let snapshot_tx = Arc::clone(&self.snapshot_tx);
        let in_flight = Arc::clone(&self.in_flight);
        let ids = self.config.universe_ids();

        Some(tokio::spawn(async move {
            snapshot_tx.send_modify(|s| s.state = LoadingState::Loading);

            let cycle = tokio::spawn(Self::run_stats_cycle(fetcher, ids, Arc::clone(&snapshot_tx)));
            if let Err(e) = cycle.await {
                let event = FetcherEvent::CycleFailed { error: e.to_string(), timestamp: Utc::now() };
                error!("Stats cycle failed: {:?}", event);
                snapshot_tx.send_modify(|s| s.state = LoadingState::Error);
            }

            in_flight.store(false, Ordering::SeqCst);
        }))
    }

    async fn run_stats_cycle(
        fetcher: Arc<StatsFetcher>,
        ids: Vec<UniverseId>,
        snapshot_tx: Arc<watch::Sender<DashboardSnapshot>>,
    ) {
        let live = fetcher.get_live_stats(&ids).await;
        let global = calculate_global_stats(&live.stats);

        let event = FetcherEvent::StatsUpdated {
            games: live.stats.len(),
            source: live.source,
            timestamp: Utc::now(),
        };
        info!("Stats cycle completed: {:?}", event);

        snapshot_tx.send_modify(|s| {
            s.stats = live.stats;
            s.source = Some(live.source);
            s.global = Some(global);
            s.state = LoadingState::Success;
        });
    }

    /// Look up thumbnails and icons for the catalogue and publish them
    pub async fn refresh_media(&self) {
        let media = self.media.fetch_game_media(&self.config.universe_ids()).await;
        let entries = catalog::with_media(&self.config.catalog, &media);

        let event = FetcherEvent::MediaUpdated { games: media.len(), timestamp: Utc::now() };
        info!("Media refresh completed: {:?}", event);

        self.snapshot_tx.send_modify(|s| s.catalog = entries);
    }
}
