//! Extraction pipeline - orchestrates the bucketed fetch-classify flow.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;

use crate::cache::ResponseCache;
use crate::error::{ExtractError, ExtractResult};
use crate::fetcher::TweetFetcher;
use crate::twitter::{classify, ExtractionResult, PostReference, TwitterApi};

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of URLs processed concurrently under one guest token.
    pub bucket_size: usize,
    /// Delay before every uncached request.
    pub delay: Duration,
    /// When set, raw responses are dumped to `debug-<id>.json` in this directory.
    pub debug_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bucket_size: 5,
            delay: Duration::from_millis(1000),
            debug_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Check values clap cannot check on its own.
    pub fn validate(&self) -> ExtractResult<()> {
        if self.bucket_size == 0 {
            return Err(ExtractError::InvalidConfig {
                key: "bucket".to_string(),
                reason: "bucket size must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Rough duration of a run over `url_count` URLs with a cold cache.
    #[must_use]
    pub fn estimated_duration(&self, url_count: usize) -> Duration {
        let buckets = url_count.div_ceil(self.bucket_size.max(1));
        self.delay * u32::try_from(buckets).unwrap_or(u32::MAX)
    }
}

/// Bucketed extraction orchestrator.
pub struct Pipeline {
    config: PipelineConfig,
    api: Arc<dyn TwitterApi>,
    fetcher: TweetFetcher,
}

impl Pipeline {
    /// Create a new pipeline.
    pub fn new(
        config: PipelineConfig,
        api: Arc<dyn TwitterApi>,
        cache: Arc<ResponseCache>,
    ) -> ExtractResult<Self> {
        config.validate()?;
        let fetcher = TweetFetcher::new(api.clone(), cache, config.delay);
        Ok(Self {
            config,
            api,
            fetcher,
        })
    }

    /// Extract metrics for every URL, preserving input order.
    ///
    /// Buckets run one after another, each under a freshly acquired guest
    /// token; URLs inside a bucket are fetched concurrently. Only a guest
    /// token failure aborts the run.
    pub async fn run(&self, urls: &[String]) -> ExtractResult<Vec<ExtractionResult>> {
        let bucket_count = urls.len().div_ceil(self.config.bucket_size);
        tracing::info!(
            urls = urls.len(),
            buckets = bucket_count,
            bucket_size = self.config.bucket_size,
            estimated_minutes = self.config.estimated_duration(urls.len()).as_secs_f64() / 60.0,
            "Starting extraction"
        );

        let mut results = Vec::with_capacity(urls.len());
        for (index, bucket) in urls.chunks(self.config.bucket_size).enumerate() {
            tracing::info!(bucket = index, size = bucket.len(), "Processing bucket");

            let guest_token = self.api.guest_token().await?;
            let extracted = join_all(bucket.iter().map(|url| self.extract_one(url, &guest_token))).await;

            let errors = extracted.iter().filter(|r| r.is_error()).count();
            tracing::info!(bucket = index, errors, "Bucket complete");
            results.extend(extracted);
        }

        tracing::info!(
            processed = results.len(),
            errors = results.iter().filter(|r| r.is_error()).count(),
            "Extraction complete"
        );
        Ok(results)
    }

    /// Fetch and classify a single URL. Failures become `ERROR` records.
    async fn extract_one(&self, url: &str, guest_token: &str) -> ExtractionResult {
        let Some(post) = PostReference::parse(url) else {
            tracing::warn!(url, "Not a post URL");
            return ExtractionResult::error(url);
        };

        let raw = match self.fetcher.fetch_post(&post, guest_token).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(url, id = %post.post_id, error = %e, "Fetch failed");
                return ExtractionResult::error(url);
            }
        };

        if let Some(dir) = &self.config.debug_dir {
            write_debug_dump(dir, &post.post_id, &raw).await;
        }

        classify(&raw, &post)
    }
}

/// Dump a raw response for inspection. Failures are logged only.
async fn write_debug_dump(dir: &std::path::Path, post_id: &str, raw: &Value) {
    let path = dir.join(format!("debug-{post_id}.json"));
    let content = match serde_json::to_string_pretty(raw) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(id = post_id, error = %e, "Failed to serialize debug dump");
            return;
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!(path = %dir.display(), error = %e, "Failed to create debug directory");
        return;
    }
    match tokio::fs::write(&path, content).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Wrote debug dump"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to write debug dump"),
    }
}
