//! Error types for the stats fetcher
//!
//! None of these reach callers of [`crate::StatsFetcher::get_live_stats`] or
//! [`crate::MediaFetcher::fetch_game_media`]; they drive the fallback chain
//! and end up in the logs.

use thiserror::Error;

/// Errors produced while resolving a single upstream request
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Relay {relay} rejected the request with status {status}")]
    Rejected { relay: String, status: u16 },

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Malformed body from {url}: {source}")]
    MalformedBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("All {attempts} routes failed for {target}")]
    Exhausted { target: String, attempts: usize },
}

impl FetchError {
    /// Build a transport error from anything displayable
    pub fn transport(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        FetchError::Transport { url: url.into(), message: message.to_string() }
    }

    /// Whether the failure came from a relay refusing to forward
    pub fn is_rejection(&self) -> bool {
        matches!(self, FetchError::Rejected { .. })
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;
