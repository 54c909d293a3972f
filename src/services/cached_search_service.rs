//! Result-cache decorator over any [`BuildingSearch`].
//!
//! Identical requests inside the TTL are answered from disk. Results are
//! annotated with [`CacheInfo`]; degraded results are passed through and never
//! stored.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::{CacheError, CacheKey, CacheStats, Fingerprint, ResultCache, unix_now};
use crate::models::{ArchitectRef, Building, CacheInfo, Lang, SearchResult};
use crate::search::{LocationQuery, SearchFilters};
use crate::services::search_service::{BuildingSearch, PageRequest, SearchError};

pub struct CachedSearchService<S> {
    inner: S,
    cache: Arc<ResultCache>,
}

impl<S: BuildingSearch> CachedSearchService<S> {
    #[must_use]
    pub const fn new(inner: S, cache: Arc<ResultCache>) -> Self {
        Self { inner, cache }
    }

    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub async fn invalidate(&self, key: &CacheKey) -> Result<bool, CacheError> {
        self.cache.delete(&key.fingerprint()).await
    }

    pub async fn clear(&self) -> Result<usize, CacheError> {
        self.cache.clear().await
    }

    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        self.cache.stats().await
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &Fingerprint) -> Option<(T, CacheInfo)> {
        if !self.cache.is_enabled() {
            return None;
        }

        let now = unix_now();
        let Some(entry) = self.cache.get::<T>(key).await else {
            metrics::counter!("pocketnavi_result_cache_total", "outcome" => "miss").increment(1);
            return None;
        };

        metrics::counter!("pocketnavi_result_cache_total", "outcome" => "hit").increment(1);
        debug!(key = %key, "Result cache hit");
        let info = CacheInfo::hit(entry.stored_at, entry.expires_at(), now);
        Some((entry.payload, info))
    }

    /// Stores `payload` and returns the annotation for a freshly computed
    /// value. Write failures only cost the next caller a recomputation.
    async fn store<T: Serialize + Sync>(&self, key: &Fingerprint, payload: &T) -> CacheInfo {
        let now = unix_now();
        if !self.cache.is_enabled() {
            return CacheInfo::disabled(now);
        }

        if let Err(e) = self.cache.put(key, payload).await {
            let err = SearchError::CacheWrite(e.to_string());
            warn!(key = %key, error = %err, "Result was computed but not cached");
        }

        let ttl = i64::try_from(self.cache.ttl().as_secs()).unwrap_or(i64::MAX);
        CacheInfo::miss(now, ttl)
    }

    async fn cached_result<F>(&self, key: CacheKey, compute: F) -> SearchResult
    where
        F: Future<Output = SearchResult> + Send,
    {
        let fingerprint = key.fingerprint();
        if let Some((mut result, info)) = self.lookup::<SearchResult>(&fingerprint).await {
            result.cache = Some(info);
            return result;
        }

        let mut result = compute.await;
        if result.degraded {
            return result;
        }

        result.cache = None;
        let info = self.store(&fingerprint, &result).await;
        result.cache = Some(info);
        result
    }
}

#[async_trait::async_trait]
impl<S: BuildingSearch> BuildingSearch for CachedSearchService<S> {
    async fn search(&self, filters: &SearchFilters, page: PageRequest) -> SearchResult {
        let page = self.inner.normalize_page(page);
        self.cached_result(
            CacheKey::search(filters, page),
            self.inner.search(filters, page),
        )
        .await
    }

    async fn search_by_location(
        &self,
        query: &LocationQuery,
        page: PageRequest,
    ) -> SearchResult {
        let page = self.inner.normalize_page(page);
        self.cached_result(
            CacheKey::location(query, page),
            self.inner.search_by_location(query, page),
        )
        .await
    }

    async fn search_by_architect_slug(&self, slug: &str, page: PageRequest) -> SearchResult {
        let page = self.inner.normalize_page(page);
        self.cached_result(
            CacheKey::architect(slug, page),
            self.inner.search_by_architect_slug(slug, page),
        )
        .await
    }

    async fn get_by_slug(&self, slug: &str, lang: Lang) -> Option<Building> {
        let fingerprint = CacheKey::building(slug, lang).fingerprint();
        if let Some((building, _)) = self.lookup::<Building>(&fingerprint).await {
            return Some(building);
        }

        let building = self.inner.get_by_slug(slug, lang).await?;
        self.store(&fingerprint, &building).await;
        Some(building)
    }

    async fn architects_for(&self, building_ids: &[i32]) -> HashMap<i32, Vec<ArchitectRef>> {
        self.inner.architects_for(building_ids).await
    }

    fn normalize_page(&self, page: PageRequest) -> PageRequest {
        self.inner.normalize_page(page)
    }
}
