use crate::config::UpstreamConfig;
use crate::fetcher::join_ids;
use crate::models::{ApiResponse, GameMedia, IconEntry, ThumbnailBatch, UniverseId};
use crate::relay::ResolutionChain;
use crate::transport::HttpTransport;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Thumbnail and icon lookup; no cache and no placeholder data
pub struct MediaFetcher {
    upstream: UpstreamConfig,
    transport: Arc<dyn HttpTransport>,
    chain: ResolutionChain,
}

impl MediaFetcher {
    pub fn new(upstream: UpstreamConfig, chain: ResolutionChain, transport: Arc<dyn HttpTransport>) -> Self {
        Self { upstream, transport, chain }
    }

    pub fn thumbnails_url(&self, ids: &[UniverseId]) -> String {
        format!(
            "{}?universeIds={}&countPerUniverse=1&defaults=true&size={}&format=Png",
            self.upstream.thumbnails_api,
            join_ids(ids),
            self.upstream.thumbnail_size
        )
    }

    pub fn icons_url(&self, ids: &[UniverseId]) -> String {
        format!(
            "{}?universeIds={}&size={}&format=Png&isCircular=false",
            self.upstream.icons_api,
            join_ids(ids),
            self.upstream.icon_size
        )
    }

    /// Resolve image URLs for `ids`
    ///
    /// Both lookups run concurrently. Games with no image found are absent
    /// from the result, and a failed lookup contributes nothing.
    pub async fn fetch_game_media(&self, ids: &[UniverseId]) -> HashMap<UniverseId, GameMedia> {
        let mut results: HashMap<UniverseId, GameMedia> = HashMap::new();
        if ids.is_empty() {
            return results;
        }

        let thumbnails_url = self.thumbnails_url(ids);
        let icons_url = self.icons_url(ids);
        let transport = self.transport.as_ref();

        let (thumbnails, icons) = tokio::join!(
            self.chain.resolve::<ApiResponse<ThumbnailBatch>>(transport, &thumbnails_url),
            self.chain.resolve::<ApiResponse<IconEntry>>(transport, &icons_url),
        );

        match thumbnails {
            Ok(response) => {
                for batch in response.data {
                    let url = batch.thumbnails.into_iter().next().and_then(|image| image.image_url);
                    if let Some(url) = url.filter(|u| !u.is_empty()) {
                        results
                            .entry(batch.universe_id)
                            .or_insert_with(|| GameMedia::new(batch.universe_id))
                            .thumbnail_url = Some(url);
                    }
                }
            }
            Err(e) => warn!("Thumbnail lookup failed: {}", e),
        }

        match icons {
            Ok(response) => {
                for icon in response.data {
                    if let Some(url) = icon.image_url.filter(|u| !u.is_empty()) {
                        results
                            .entry(icon.target_id)
                            .or_insert_with(|| GameMedia::new(icon.target_id))
                            .icon_url = Some(url);
                    }
                }
            }
            Err(e) => warn!("Icon lookup failed: {}", e),
        }

        info!("Resolved media for {} of {} games", results.len(), ids.len());
        results
    }
}
