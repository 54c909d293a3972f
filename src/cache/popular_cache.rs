//! Aggregate cache for the popular-search view.
//!
//! Every `(page, limit, text, type)` combination lives in one file,
//! `popular_searches.json`, stamped with a single timestamp. Rebuilds are
//! serialized by an in-process mutex plus an advisory lock on
//! `popular_searches.json.lock`; a caller that cannot take the lock waits
//! briefly, re-reads the file and otherwise serves the static sample.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{CacheError, CacheKey, unix_now, write_atomic};
use crate::config::PopularConfig;
use crate::db::{PopularQuery, Store};
use crate::models::popular::derive_link;
use crate::models::{PopularSearch, PopularSearchPage, SearchType, search::total_pages};

const CACHE_FILE: &str = "popular_searches.json";
const LOCK_FILE: &str = "popular_searches.json.lock";
const BACKUP_FILE: &str = "popular_searches_backup.json";

/// Authoritative popular-search data.
#[async_trait::async_trait]
pub trait PopularSearchSource: Send + Sync {
    async fn fetch(
        &self,
        page: u64,
        limit: u64,
        text_filter: Option<&str>,
        type_filter: Option<SearchType>,
    ) -> anyhow::Result<PopularSearchPage>;
}

/// Reads popular searches from the search log.
pub struct StorePopularSource {
    store: Arc<Store>,
    config: PopularConfig,
}

impl StorePopularSource {
    #[must_use]
    pub const fn new(store: Arc<Store>, config: PopularConfig) -> Self {
        Self { store, config }
    }
}

#[async_trait::async_trait]
impl PopularSearchSource for StorePopularSource {
    async fn fetch(
        &self,
        page: u64,
        limit: u64,
        text_filter: Option<&str>,
        type_filter: Option<SearchType>,
    ) -> anyhow::Result<PopularSearchPage> {
        let limit = if limit == 0 {
            self.config.default_limit
        } else {
            limit
        };
        let page = page.max(1);

        let params = PopularQuery {
            page,
            limit,
            text_filter: text_filter.map(ToString::to_string),
            type_filter,
            since: Utc::now() - chrono::Duration::days(self.config.window_days),
            min_searches: self.config.min_searches,
        };
        let (rows, total) = self.store.popular_searches(&params).await?;

        let searches = rows
            .into_iter()
            .map(|row| {
                let search_type = SearchType::from_db(&row.search_type);
                let filters = row
                    .filters
                    .as_deref()
                    .and_then(|f| serde_json::from_str(f).ok())
                    .unwrap_or(serde_json::Value::Null);
                PopularSearch {
                    link: derive_link(&row.query, search_type, &filters),
                    query: row.query,
                    search_type,
                    total_searches: u64::try_from(row.total_searches).unwrap_or_default(),
                    unique_users: u64::try_from(row.unique_users).unwrap_or_default(),
                    last_searched: row.last_searched,
                }
            })
            .collect();

        Ok(PopularSearchPage {
            searches,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheFile {
    data: BTreeMap<String, PopularSearchPage>,
    timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopularCacheState {
    Missing,
    Valid,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PopularCacheStatus {
    pub state: PopularCacheState,
    pub age_secs: Option<i64>,
    pub max_age_secs: u64,
    pub entries: usize,
}

/// Exclusive rebuild lock; released on drop.
struct RebuildLock {
    file: File,
}

impl RebuildLock {
    fn try_acquire(path: &Path) -> Result<Self, CacheError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;
        file.try_lock_exclusive()
            .map_err(|_| CacheError::LockUnavailable)?;
        Ok(Self { file })
    }
}

impl Drop for RebuildLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "Failed to release popular cache lock");
        }
    }
}

pub struct PopularSearchCache<S> {
    source: S,
    dir: PathBuf,
    ttl: Duration,
    lock_retry: Duration,
    rebuilding: Mutex<()>,
}

impl<S: PopularSearchSource> PopularSearchCache<S> {
    pub fn open(
        root: impl AsRef<Path>,
        source: S,
        ttl: Duration,
        lock_retry: Duration,
    ) -> Result<Self, CacheError> {
        let dir = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        Ok(Self {
            source,
            dir,
            ttl,
            lock_retry,
            rebuilding: Mutex::new(()),
        })
    }

    fn cache_path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.dir.join(BACKUP_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    /// Popular searches for the given view. Never fails: when neither the
    /// cache nor the source can answer, the static sample is returned.
    pub async fn get_popular_searches(
        &self,
        page: u64,
        limit: u64,
        text_filter: Option<&str>,
        type_filter: Option<SearchType>,
    ) -> PopularSearchPage {
        let key = CacheKey::popular(page, limit, text_filter, type_filter)
            .fingerprint()
            .to_string();

        if let Some(file) = self.read_file().await
            && let Some(cached) = self.valid_entry(&file, &key)
        {
            metrics::counter!("pocketnavi_popular_cache_total", "outcome" => "hit").increment(1);
            return cached;
        }

        match self.rebuild(&key, page, limit, text_filter, type_filter).await {
            Ok(fresh) => {
                metrics::counter!("pocketnavi_popular_cache_total", "outcome" => "rebuilt")
                    .increment(1);
                fresh
            }
            Err(CacheError::LockUnavailable) => {
                debug!(key, "Popular cache rebuild in progress elsewhere");
                tokio::time::sleep(self.lock_retry).await;

                if let Some(existing) = self
                    .read_file()
                    .await
                    .and_then(|mut file| file.data.remove(&key))
                {
                    metrics::counter!("pocketnavi_popular_cache_total", "outcome" => "waited")
                        .increment(1);
                    return existing;
                }

                metrics::counter!("pocketnavi_popular_cache_total", "outcome" => "fallback")
                    .increment(1);
                PopularSearchPage::fallback(type_filter)
            }
            Err(e) => {
                warn!(error = %e, "Popular cache rebuild failed, serving fallback");
                metrics::counter!("pocketnavi_popular_cache_total", "outcome" => "fallback")
                    .increment(1);
                PopularSearchPage::fallback(type_filter)
            }
        }
    }

    async fn read_file(&self) -> Option<CacheFile> {
        let bytes = match tokio::fs::read(self.cache_path()).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read popular cache");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(file) => Some(file),
            Err(e) => {
                debug!(error = %e, "Ignoring malformed popular cache");
                None
            }
        }
    }

    fn is_fresh(&self, file: &CacheFile, now: i64) -> bool {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        now.saturating_sub(file.timestamp) < ttl
    }

    fn valid_entry(&self, file: &CacheFile, key: &str) -> Option<PopularSearchPage> {
        if !self.is_fresh(file, unix_now()) {
            return None;
        }
        file.data.get(key).cloned()
    }

    async fn rebuild(
        &self,
        key: &str,
        page: u64,
        limit: u64,
        text_filter: Option<&str>,
        type_filter: Option<SearchType>,
    ) -> Result<PopularSearchPage, CacheError> {
        let _local = self
            .rebuilding
            .try_lock()
            .map_err(|_| CacheError::LockUnavailable)?;
        let _lock = RebuildLock::try_acquire(&self.lock_path())?;

        let fresh = self
            .source
            .fetch(page, limit, text_filter, type_filter)
            .await
            .map_err(|e| CacheError::Source(format!("{e:#}")))?;

        if let Err(e) = self.store(key, &fresh).await {
            warn!(error = %e, "Failed to write popular cache");
        }
        Ok(fresh)
    }

    /// Merges `page` into the cache file and restamps it, keeping the previous
    /// file as the backup.
    async fn store(&self, key: &str, page: &PopularSearchPage) -> Result<(), CacheError> {
        let mut file = self.read_file().await.unwrap_or_default();
        file.data.insert(key.to_string(), page.clone());
        file.timestamp = unix_now();

        let path = self.cache_path();
        match tokio::fs::copy(&path, self.backup_path()).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        write_atomic(&path, &serde_json::to_vec(&file)?).await?;
        debug!(key, entries = file.data.len(), "Popular cache written");
        Ok(())
    }

    /// Removes the cache and backup files.
    pub async fn clear(&self) -> Result<(), CacheError> {
        for path in [self.cache_path(), self.backup_path()] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!("Popular search cache cleared");
        Ok(())
    }

    pub async fn status(&self) -> PopularCacheStatus {
        let max_age_secs = self.ttl.as_secs();
        let Some(file) = self.read_file().await else {
            return PopularCacheStatus {
                state: PopularCacheState::Missing,
                age_secs: None,
                max_age_secs,
                entries: 0,
            };
        };

        let now = unix_now();
        PopularCacheStatus {
            state: if self.is_fresh(&file, now) {
                PopularCacheState::Valid
            } else {
                PopularCacheState::Expired
            },
            age_secs: Some(now - file.timestamp),
            max_age_secs,
            entries: file.data.len(),
        }
    }
}
