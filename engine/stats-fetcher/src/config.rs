use crate::catalog::CatalogGame;
use crate::relay::RelayTemplate;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `STATS_FETCHER__CACHE__FRESHNESS_SECS=10`
pub const ENV_PREFIX: &str = "STATS_FETCHER";

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "STATS_FETCHER_CONFIG";

/// Configuration for the stats fetcher service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Upstream API endpoints
    pub upstream: UpstreamConfig,

    /// Relay templates, tried in order after the direct request
    pub relays: Vec<RelayTemplate>,

    /// Stats cache configuration
    pub cache: CacheConfig,

    /// Polling configuration
    pub scheduler: SchedulerConfig,

    /// HTTP client configuration
    pub http: HttpConfig,

    /// Published titles to poll
    pub catalog: Vec<CatalogGame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Batch game details endpoint (takes `universeIds`)
    pub games_api: String,

    /// Batch thumbnail endpoint
    pub thumbnails_api: String,

    /// Batch icon endpoint
    pub icons_api: String,

    /// Requested thumbnail size (WxH)
    pub thumbnail_size: String,

    /// Requested icon size (WxH)
    pub icon_size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a fetched snapshot is served without touching the network
    pub freshness_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Polling interval for live stats
    pub poll_interval_secs: u64,

    /// Fetch thumbnails and icons once before polling starts
    pub refresh_media_on_start: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout_secs: u64,

    /// User agent sent on every request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig {
                games_api: "https://games.roblox.com/v1/games".to_string(),
                thumbnails_api: "https://thumbnails.roblox.com/v1/games/multiget/thumbnails"
                    .to_string(),
                icons_api: "https://thumbnails.roblox.com/v1/games/icons".to_string(),
                thumbnail_size: "768x432".to_string(),
                icon_size: "512x512".to_string(),
            },
            relays: RelayTemplate::defaults(),
            cache: CacheConfig { freshness_secs: 30 },
            scheduler: SchedulerConfig { poll_interval_secs: 30, refresh_media_on_start: true },
            http: HttpConfig {
                timeout_secs: 10,
                user_agent: concat!("stats-fetcher/", env!("CARGO_PKG_VERSION")).to_string(),
            },
            catalog: CatalogGame::published(),
        }
    }
}

impl FetcherConfig {
    /// Load configuration from environment variables, plus the file named by
    /// `STATS_FETCHER_CONFIG` if it is set
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load(Some(Path::new(&path))),
            Err(_) => Self::load(None),
        }
    }

    /// Layer defaults, an optional TOML file and `STATS_FETCHER__*` overrides
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true),
        );

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would break the fetch cycle
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.cache.freshness_secs > 0, "cache.freshness_secs must be positive");
        anyhow::ensure!(
            self.scheduler.poll_interval_secs > 0,
            "scheduler.poll_interval_secs must be positive"
        );
        anyhow::ensure!(self.http.timeout_secs > 0, "http.timeout_secs must be positive");

        for relay in &self.relays {
            anyhow::ensure!(
                relay.has_placeholder(),
                "relay '{}' has no {{url}} or {{raw_url}} placeholder",
                relay.name
            );
        }

        Ok(())
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.cache.freshness_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Universe ids of every catalogue entry, in catalogue order
    pub fn universe_ids(&self) -> Vec<u64> {
        self.catalog.iter().map(|game| game.master_id).collect()
    }
}
