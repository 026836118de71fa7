//! File-per-entry JSON store backing the response cache.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::error::{ExtractError, ExtractResult};

/// On-disk representation of one cache entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    stored_at: DateTime<Utc>,
    value: Value,
}

/// Counts reported by [`DiskStore::prune`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneStats {
    pub expired: usize,
    pub evicted: usize,
    pub remaining_bytes: u64,
}

/// Persistent store keeping each entry in `<dir>/<sha256(key)>.json`.
///
/// Entries are written once and never modified, so file modification time
/// doubles as the write time when pruning.
#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
    ttl: Duration,
    max_bytes: u64,
}

impl DiskStore {
    /// Open (and create if needed) the store directory, dropping expired entries.
    pub async fn open(dir: impl AsRef<Path>, ttl: Duration, max_bytes: u64) -> ExtractResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ExtractError::Cache {
                reason: format!("cannot create cache directory '{}': {e}", dir.display()),
            })?;

        let store = Self { dir, ttl, max_bytes };
        let stats = store.prune().await?;
        tracing::debug!(
            dir = %store.dir.display(),
            expired = stats.expired,
            evicted = stats.evicted,
            bytes = stats.remaining_bytes,
            "Opened cache store"
        );
        Ok(store)
    }

    /// Directory holding the entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    fn is_expired(&self, stored_at: DateTime<Utc>) -> bool {
        let age = Utc::now().signed_duration_since(stored_at);
        age.to_std().is_ok_and(|age| age > self.ttl)
    }

    /// Read a live entry. Expired or unreadable entries count as misses and are removed.
    pub async fn get(&self, key: &str) -> ExtractResult<Option<Value>> {
        let path = self.entry_path(key);
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ExtractError::FileRead {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let entry: StoredEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding corrupt cache entry");
                remove_quietly(&path).await;
                return Ok(None);
            }
        };

        if entry.key != key {
            return Ok(None);
        }

        if self.is_expired(entry.stored_at) {
            tracing::debug!(key, "Cache entry expired");
            remove_quietly(&path).await;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    /// Persist an entry. The file appears atomically via a temporary sibling.
    pub async fn put(&self, key: &str, value: &Value) -> ExtractResult<()> {
        let path = self.entry_path(key);
        let entry = StoredEntry {
            key: key.to_string(),
            stored_at: Utc::now(),
            value: value.clone(),
        };
        let content = serde_json::to_vec(&entry)?;

        let tmp = path.with_extension("json.tmp");
        let write_err = |e: std::io::Error| ExtractError::FileWrite {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        fs::write(&tmp, content).await.map_err(write_err)?;
        fs::rename(&tmp, &path).await.map_err(write_err)?;
        Ok(())
    }

    /// Remove expired entries, then the oldest ones until the store fits `max_bytes`.
    pub async fn prune(&self) -> ExtractResult<PruneStats> {
        let mut stats = PruneStats::default();
        let mut live: Vec<(SystemTime, u64, PathBuf)> = Vec::new();
        let now = SystemTime::now();

        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let metadata = entry.metadata().await?;
            let modified = metadata.modified().unwrap_or(now);
            let expired = now
                .duration_since(modified)
                .is_ok_and(|age| age > self.ttl);

            if expired {
                remove_quietly(&path).await;
                stats.expired += 1;
            } else {
                live.push((modified, metadata.len(), path));
            }
        }

        let mut total: u64 = live.iter().map(|(_, len, _)| len).sum();
        if total > self.max_bytes {
            live.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.2.cmp(&b.2)));
            for (_, len, path) in &live {
                if total <= self.max_bytes {
                    break;
                }
                remove_quietly(path).await;
                total -= len;
                stats.evicted += 1;
            }
        }

        stats.remaining_bytes = total;
        Ok(stats)
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache file");
        }
    }
}
