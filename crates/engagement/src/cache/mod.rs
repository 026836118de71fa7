//! Persistent response cache.
//!
//! A moka cache sits in front of the on-disk store. moka coalesces
//! concurrent initialisations of the same key, which gives the
//! compute-once-per-key guarantee; the disk store makes entries survive
//! restarts.

mod disk;

pub use disk::{DiskStore, PruneStats};

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;

use crate::error::{ExtractError, ExtractResult};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Configuration for the response cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding cache entries.
    pub path: PathBuf,
    /// Time-to-live of an entry.
    pub ttl: Duration,
    /// Upper bound on the cache size, in bytes.
    pub max_bytes: u64,
}

impl CacheConfig {
    /// Config with a TTL expressed in days.
    #[must_use]
    pub fn with_days(path: impl Into<PathBuf>, days: u64) -> Self {
        Self {
            path: path.into(),
            ttl: Duration::from_secs(days * SECONDS_PER_DAY),
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("uke-cache"),
            ttl: Duration::from_secs(31 * SECONDS_PER_DAY),
            max_bytes: 1_000_000_000, // 1GB
        }
    }
}

/// Key/value cache of raw API responses with a compute-once contract.
pub struct ResponseCache {
    memory: Cache<String, Value>,
    disk: DiskStore,
}

impl ResponseCache {
    /// Open the cache, creating the directory and dropping expired entries.
    pub async fn open(config: &CacheConfig) -> ExtractResult<Self> {
        let disk = DiskStore::open(&config.path, config.ttl, config.max_bytes).await?;
        let memory = Cache::builder()
            .max_capacity(config.max_bytes)
            .weigher(|key: &String, value: &Value| {
                u32::try_from(key.len() + value.to_string().len()).unwrap_or(u32::MAX)
            })
            .time_to_live(config.ttl)
            .build();

        tracing::info!(path = %config.path.display(), ttl_secs = config.ttl.as_secs(), "Cache ready");
        Ok(Self { memory, disk })
    }

    /// Return the cached value for `key`, running `producer` only on a miss.
    ///
    /// Concurrent callers with the same key share one producer invocation and
    /// its outcome. Producer errors are not cached.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, producer: F) -> ExtractResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ExtractResult<Value>>,
    {
        let disk = &self.disk;
        let init = async move {
            if let Some(value) = disk.get(key).await? {
                tracing::debug!(key, "Cache hit on disk");
                return Ok(value);
            }

            let value = producer().await?;
            if let Err(e) = disk.put(key, &value).await {
                tracing::warn!(key, error = %e, "Failed to persist cache entry");
            }
            Ok::<_, ExtractError>(value)
        };

        self.memory
            .try_get_with(key.to_string(), init)
            .await
            .map_err(ExtractError::from)
    }

    /// Flush pending maintenance and enforce the size bound on disk.
    pub async fn close(self) -> ExtractResult<PruneStats> {
        self.memory.run_pending_tasks().await;
        let stats = self.disk.prune().await?;
        tracing::debug!(
            expired = stats.expired,
            evicted = stats.evicted,
            bytes = stats.remaining_bytes,
            "Cache closed"
        );
        Ok(stats)
    }

    /// Close a shared cache at the end of a run.
    ///
    /// Failures are logged rather than returned: by the time this runs the
    /// results are already written. Returns `None` when the cache was not
    /// closed.
    pub async fn close_shared(cache: Arc<Self>) -> Option<PruneStats> {
        let Ok(cache) = Arc::try_unwrap(cache) else {
            tracing::warn!("Cache still shared at exit; skipping prune");
            return None;
        };
        match cache.close().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to close response cache");
                None
            }
        }
    }
}
