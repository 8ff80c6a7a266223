use stats_fetcher::{FetcherConfig, StatsScheduler};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting live stats fetcher");

    let config = FetcherConfig::from_env()?;
    info!("Loaded configuration: {:?}", config);

    let scheduler = StatsScheduler::new(config)?;

    let mut updates = scheduler.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if let Some(global) = snapshot.global {
                info!(
                    "{:?}: {} players live across {} games, {} total visits ({:?})",
                    snapshot.state,
                    global.total_live_players,
                    global.active_games,
                    global.total_visits,
                    snapshot.source
                );
            }
        }
    });

    scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await;

    Ok(())
}
