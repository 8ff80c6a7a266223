use stats_fetcher::{calculate_global_stats, FetcherConfig, MediaFetcher, ResolutionChain, StatsFetcher};
use tracing::{info, warn};

/// One-shot stats and media lookup. Ids come from the command line, or the
/// configured catalogue when none are given.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = FetcherConfig::from_env()?;

    let mut ids = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.parse::<u64>() {
            Ok(id) => ids.push(id),
            Err(_) => warn!("Ignoring non-numeric id '{}'", arg),
        }
    }
    if ids.is_empty() {
        ids = config.universe_ids();
    }

    info!("Probing {} games", ids.len());

    let fetcher = StatsFetcher::new(config.clone())?;
    let media = MediaFetcher::new(
        config.upstream.clone(),
        ResolutionChain::new(&config.relays),
        fetcher.transport(),
    );

    let (live, images) = tokio::join!(fetcher.get_live_stats(&ids), media.fetch_game_media(&ids));

    info!("Stats source: {:?}", live.source);
    for id in &ids {
        match live.get(*id) {
            Some(stats) => info!(
                "  {} - {} live, {} visits, {} likes{}",
                id,
                stats.live_count,
                stats.visits,
                stats.likes,
                if stats.synthesized { " (placeholder)" } else { "" }
            ),
            None => warn!("  {} - no stats", id),
        }

        if let Some(found) = images.get(id) {
            info!("    thumbnail: {:?}", found.thumbnail_url);
            info!("    icon: {:?}", found.icon_url);
        }
    }

    let global = calculate_global_stats(&live.stats);
    info!(
        "Total: {} players live, {} visits, {} games",
        global.total_live_players, global.total_visits, global.active_games
    );

    Ok(())
}
