//! Cached, rate-limited post lookups.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::cache::ResponseCache;
use crate::error::ExtractResult;
use crate::twitter::{PostReference, TwitterApi};

/// Fetches raw post responses through the response cache.
pub struct TweetFetcher {
    api: Arc<dyn TwitterApi>,
    cache: Arc<ResponseCache>,
    delay: Duration,
}

impl TweetFetcher {
    /// Create a fetcher that waits `delay` before every uncached request.
    pub fn new(api: Arc<dyn TwitterApi>, cache: Arc<ResponseCache>, delay: Duration) -> Self {
        Self { api, cache, delay }
    }

    /// Get the raw conversation response for a post.
    ///
    /// Served from cache when possible; otherwise sleeps the configured delay
    /// and performs exactly one request.
    pub async fn fetch_post(&self, post: &PostReference, guest_token: &str) -> ExtractResult<Value> {
        let key = post.cache_key();
        self.cache
            .get_or_compute(&key, || async {
                tokio::time::sleep(self.delay).await;
                tracing::info!(id = %post.post_id, "Cache miss for tweet");
                self.api.conversation(&post.post_id, guest_token).await
            })
            .await
    }
}
