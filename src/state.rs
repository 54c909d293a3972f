use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::cache::{
    CacheStats, PopularCacheStatus, PopularSearchCache, ResultCache, StorePopularSource,
};
use crate::config::Config;
use crate::db::Store;
use crate::models::{Building, Lang, PopularSearchPage, SearchResult, SearchType};
use crate::search::{LocationQuery, SearchFilters};
use crate::services::{
    BuildingSearch, CachedSearchService, PageRequest, SeaOrmSearchService, hydrate_architects,
};

pub type SearchStack = CachedSearchService<SeaOrmSearchService>;

/// Everything an entry point needs, wired from one [`Config`].
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Arc<Store>,

    pub search: Arc<SearchStack>,

    pub popular: Arc<PopularSearchCache<StorePopularSource>>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
        .with_context(|| format!("Failed to open database {}", config.general.database_path))?;
        let store = Arc::new(store);

        let result_cache = ResultCache::open(
            &config.cache.root,
            config.cache.result_ttl(),
            config.cache.enabled,
        )
        .with_context(|| format!("Failed to open cache at {}", config.cache.root.display()))?;

        let executor = SeaOrmSearchService::new(store.clone(), config.search.clone());
        let search = Arc::new(CachedSearchService::new(executor, Arc::new(result_cache)));

        let popular = PopularSearchCache::open(
            &config.cache.root,
            StorePopularSource::new(store.clone(), config.popular.clone()),
            config.cache.popular_ttl(),
            config.cache.lock_retry(),
        )?;

        info!(
            cache_root = %config.cache.root.display(),
            cache_enabled = config.cache.enabled,
            "Search stack initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            search,
            popular: Arc::new(popular),
        })
    }

    fn page(&self, page: u64, limit: Option<u64>, lang: Lang) -> PageRequest {
        PageRequest::new(
            page,
            limit.unwrap_or(self.config.search.default_limit),
            lang,
        )
    }

    pub async fn search(
        &self,
        filters: &SearchFilters,
        page: u64,
        limit: Option<u64>,
        lang: Lang,
    ) -> SearchResult {
        self.search
            .search(filters, self.page(page, limit, lang))
            .await
    }

    /// Radius search with architect lists filled in.
    pub async fn search_by_location(
        &self,
        query: &LocationQuery,
        page: u64,
        limit: Option<u64>,
        lang: Lang,
    ) -> SearchResult {
        let mut result = self
            .search
            .search_by_location(query, self.page(page, limit, lang))
            .await;
        hydrate_architects(self.search.as_ref(), &mut result.items).await;
        result
    }

    pub async fn search_by_architect_slug(
        &self,
        slug: &str,
        page: u64,
        limit: Option<u64>,
        lang: Lang,
    ) -> SearchResult {
        self.search
            .search_by_architect_slug(slug, self.page(page, limit, lang))
            .await
    }

    pub async fn get_by_slug(&self, slug: &str, lang: Lang) -> Option<Building> {
        self.search.get_by_slug(slug, lang).await
    }

    pub async fn get_popular_searches(
        &self,
        page: u64,
        limit: Option<u64>,
        text_filter: Option<&str>,
        type_filter: Option<SearchType>,
    ) -> PopularSearchPage {
        let limit = limit.unwrap_or(self.config.popular.default_limit);
        self.popular
            .get_popular_searches(page, limit, text_filter, type_filter)
            .await
    }

    /// Empties both caches; returns the number of result entries removed.
    pub async fn clear_caches(&self) -> anyhow::Result<usize> {
        let removed = self.search.clear().await?;
        self.popular.clear().await?;
        Ok(removed)
    }

    pub async fn cache_status(&self) -> anyhow::Result<(CacheStats, PopularCacheStatus)> {
        let results = self.search.stats().await?;
        let popular = self.popular.status().await;
        Ok((results, popular))
    }

    /// Drops search-log rows older than `days`.
    pub async fn prune_search_log(&self, days: i64) -> anyhow::Result<u64> {
        let before = chrono::Utc::now() - chrono::Duration::days(days);
        let removed = self.store.prune_search_log(before).await?;
        if removed > 0 {
            info!(removed, days, "Pruned search log");
        }
        Ok(removed)
    }
}
