//! Live Stats Fetcher
//!
//! Fetches live player counts, visits and likes for the studio's published
//! games from the Roblox games API. Requests go direct first and then through
//! a fixed list of public relays; results are cached for a short freshness
//! window, and callers always get something to render: fresh data, the last
//! snapshot, or placeholder numbers flagged as synthesized.

pub mod aggregate;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod media;
pub mod models;
pub mod relay;
pub mod scheduler;
pub mod synth;
pub mod transport;

#[cfg(test)]
mod test_support;


pub use aggregate::calculate_global_stats;
pub use catalog::{CatalogEntry, CatalogGame};
pub use config::FetcherConfig;
pub use error::{FetchError, FetchResult};
pub use fetcher::StatsFetcher;
pub use media::MediaFetcher;
pub use models::*;
pub use relay::{RelayTemplate, ResolutionChain, Route};
pub use scheduler::{DashboardSnapshot, StatsScheduler};
pub use transport::{HttpReply, HttpTransport, ReqwestTransport};
