//! HTTP transport abstraction

use crate::config::FetcherConfig;
use crate::error::{FetchError, FetchResult};
use anyhow::Context;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Relays answer 401/403 when they refuse to forward
    pub fn is_rejection(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Issues GET requests for the resolution chain
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url`, asking for JSON when `accept_json` is set
    async fn get(&self, url: &str, accept_json: bool) -> FetchResult<HttpReply>;
}

/// Production transport backed by `reqwest`
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a new transport instance
    pub fn new(config: &FetcherConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(&config.http.user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, accept_json: bool) -> FetchResult<HttpReply> {
        let mut request = self.client.get(url);
        if accept_json {
            request = request.header(ACCEPT, "application/json");
        }

        let response = request.send().await.map_err(|e| FetchError::transport(url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|e| FetchError::transport(url, e))?;

        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpReply { status, content_type, body })
    }
}
