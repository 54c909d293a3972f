//! Per-query result cache.
//!
//! Entries live at `{root}/search/{fingerprint}.json`. Expiry is checked at
//! read time only; an expired entry is removed when it is read.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{CacheError, Fingerprint, unix_now, write_atomic};

const SUBDIR: &str = "search";

/// One stored payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: T,
    /// Unix seconds.
    pub stored_at: i64,
    pub ttl_secs: u64,
}

fn expiry(stored_at: i64, ttl_secs: u64) -> i64 {
    stored_at.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX))
}

impl<T> CacheEntry<T> {
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        expiry(self.stored_at, self.ttl_secs)
    }

    /// Fresh while `now - stored_at < ttl`.
    #[must_use]
    pub fn is_fresh(&self, now: i64) -> bool {
        now < self.expires_at()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_files: usize,
    pub total_bytes: u64,
    pub expired_files: usize,
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
struct EntryHeader {
    stored_at: i64,
    ttl_secs: u64,
}

pub struct ResultCache {
    dir: PathBuf,
    ttl: Duration,
    enabled: AtomicBool,
}

impl ResultCache {
    /// Opens (creating if needed) the cache under `root`.
    pub fn open(root: impl AsRef<Path>, ttl: Duration, enabled: bool) -> Result<Self, CacheError> {
        let dir = root.as_ref().join(SUBDIR);
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), ttl_secs = ttl.as_secs(), enabled, "Result cache opened");

        Ok(Self {
            dir,
            ttl,
            enabled: AtomicBool::new(enabled),
        })
    }

    pub fn close(self) {
        debug!(dir = %self.dir.display(), "Result cache closed");
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
        info!(enabled, "Result cache toggled");
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Fresh entry for `key`. Missing, malformed and expired entries are all
    /// misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &Fingerprint) -> Option<CacheEntry<T>> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key = %key, error = %e, "Ignoring malformed cache entry");
                return None;
            }
        };

        if entry.key != key.as_str() {
            return None;
        }

        if !entry.is_fresh(unix_now()) {
            debug!(key = %key, "Cache entry expired");
            tokio::fs::remove_file(&path).await.ok();
            return None;
        }

        Some(entry)
    }

    /// Stores `payload` under `key`, replacing any previous entry.
    pub async fn put<T: Serialize>(
        &self,
        key: &Fingerprint,
        payload: T,
    ) -> Result<CacheEntry<T>, CacheError> {
        let entry = CacheEntry {
            key: key.to_string(),
            payload,
            stored_at: unix_now(),
            ttl_secs: self.ttl.as_secs(),
        };

        let bytes = serde_json::to_vec(&entry)?;
        write_atomic(&self.path_for(key), &bytes).await?;
        Ok(entry)
    }

    /// Removes the entry for `key`; a missing entry is not an error.
    pub async fn delete(&self, key: &Fingerprint) -> Result<bool, CacheError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every entry; returns the number removed.
    pub async fn clear(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for path in self.entry_paths().await? {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!(removed, "Result cache cleared");
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = unix_now();
        let mut stats = CacheStats {
            enabled: self.is_enabled(),
            ..CacheStats::default()
        };

        for path in self.entry_paths().await? {
            let Ok(bytes) = tokio::fs::read(&path).await else {
                continue;
            };
            stats.total_files += 1;
            stats.total_bytes += bytes.len() as u64;

            let fresh = serde_json::from_slice::<EntryHeader>(&bytes)
                .is_ok_and(|h| now < expiry(h.stored_at, h.ttl_secs));
            if !fresh {
                stats.expired_files += 1;
            }
        }

        Ok(stats)
    }

    async fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut paths = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(paths),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::models::Lang;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("pocketnavi_rc_{}", uuid::Uuid::new_v4()))
    }

    fn key(slug: &str) -> Fingerprint {
        CacheKey::building(slug, Lang::Ja).fingerprint()
    }

    #[tokio::test]
    async fn put_then_get_returns_payload() {
        let root = temp_root();
        let cache = ResultCache::open(&root, Duration::from_secs(60), true).unwrap();

        let stored = cache.put(&key("a"), vec![1, 2, 3]).await.unwrap();
        let entry: CacheEntry<Vec<i32>> = cache.get(&key("a")).await.unwrap();
        assert_eq!(entry, stored);
        assert_eq!(entry.expires_at(), entry.stored_at + 60);

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn zero_ttl_entries_are_expired_and_removed() {
        let root = temp_root();
        let cache = ResultCache::open(&root, Duration::ZERO, true).unwrap();

        cache.put(&key("a"), "payload").await.unwrap();
        assert!(cache.get::<String>(&key("a")).await.is_none());
        assert!(!cache.dir().join(format!("{}.json", key("a"))).exists());

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn malformed_entry_is_a_miss() {
        let root = temp_root();
        let cache = ResultCache::open(&root, Duration::from_secs(60), true).unwrap();
        std::fs::write(cache.dir().join(format!("{}.json", key("a"))), b"{not json").unwrap();

        assert!(cache.get::<String>(&key("a")).await.is_none());
        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn delete_and_clear_tolerate_missing_entries() {
        let root = temp_root();
        let cache = ResultCache::open(&root, Duration::from_secs(60), true).unwrap();

        assert!(!cache.delete(&key("missing")).await.unwrap());
        cache.put(&key("a"), 1).await.unwrap();
        cache.put(&key("b"), 2).await.unwrap();
        assert!(cache.delete(&key("a")).await.unwrap());

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.total_files, 1);
        assert_eq!(stats.expired_files, 0);

        assert_eq!(cache.clear().await.unwrap(), 1);
        assert_eq!(cache.clear().await.unwrap(), 0);
        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn writes_recreate_a_removed_root() {
        let root = temp_root();
        let cache = ResultCache::open(&root, Duration::from_secs(60), true).unwrap();

        std::fs::remove_dir_all(&root).unwrap();
        assert_eq!(cache.stats().await.unwrap().total_files, 0);

        cache.put(&key("a"), 7).await.unwrap();
        let entry: CacheEntry<i32> = cache.get(&key("a")).await.unwrap();
        assert_eq!(entry.payload, 7);

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn toggling_is_reported_in_stats() {
        let root = temp_root();
        let cache = ResultCache::open(&root, Duration::from_secs(60), true).unwrap();

        cache.set_enabled(false);
        assert!(!cache.is_enabled());
        assert!(!cache.stats().await.unwrap().enabled);

        cache.set_enabled(true);
        assert!(cache.stats().await.unwrap().enabled);

        cache.close();
        std::fs::remove_dir_all(root).ok();
    }
}
