//! `SeaORM` implementation of the [`BuildingSearch`] trait.
//!
//! Runs the count and page queries for a predicate, performs the two-stage
//! radius search and localizes rows. Query failures are logged and turned
//! into degraded empty results; a misaligned row is dropped from its page.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::config::SearchConfig;
use crate::db::{NewSearchLog, Store};
use crate::models::{ArchitectProfile, ArchitectRef, Building, Lang, SearchResult, SearchType};
use crate::search::geo::{self, BoundingBox};
use crate::search::predicate::{self, Predicate};
use crate::search::{LocationQuery, RawBuildingRow, SearchFilters, prefecture, transform};
use crate::services::search_service::{BuildingSearch, PageRequest, SearchError};

pub struct SeaOrmSearchService {
    store: Arc<Store>,
    config: SearchConfig,
}

impl SeaOrmSearchService {
    #[must_use]
    pub const fn new(store: Arc<Store>, config: SearchConfig) -> Self {
        Self { store, config }
    }

    pub async fn count(&self, predicate: &Predicate) -> Result<u64, SearchError> {
        Ok(self.store.count_buildings(predicate).await?)
    }

    pub async fn fetch_page(
        &self,
        predicate: &Predicate,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<RawBuildingRow>, SearchError> {
        Ok(self
            .store
            .fetch_building_page(predicate, page, page_size)
            .await?)
    }

    /// Count, page and transform for an arbitrary predicate.
    pub async fn run_predicate(
        &self,
        predicate: &Predicate,
        page: PageRequest,
    ) -> Result<SearchResult, SearchError> {
        let (page_no, limit) = self.config.clamp_page(page.page, page.limit);

        let total = self.count(predicate).await?;
        if total == 0 {
            return Ok(SearchResult::empty(page_no, limit));
        }

        let rows = self.fetch_page(predicate, page_no, limit).await?;
        let items = self.transform_rows(rows, page.lang, &HashMap::new());

        debug!(
            total,
            page = page_no,
            limit,
            returned = items.len(),
            "Search executed"
        );
        Ok(SearchResult::new(items, total, page_no, limit))
    }

    /// Transforms rows, dropping (and loudly logging) rows whose architect
    /// projections are misaligned.
    fn transform_rows(
        &self,
        rows: Vec<RawBuildingRow>,
        lang: Lang,
        distances: &HashMap<i32, f64>,
    ) -> Vec<Building> {
        rows.into_iter()
            .filter_map(|row| {
                let distance = distances.get(&row.id).copied();
                match transform::transform_row(row, lang, &self.config.photo_base_url, distance) {
                    Ok(building) => Some(building),
                    Err(defect) => {
                        let err = SearchError::from(defect);
                        error!(error = %err, "Dropping building with misaligned architect data");
                        None
                    }
                }
            })
            .collect()
    }

    async fn try_search(
        &self,
        filters: &SearchFilters,
        page: PageRequest,
    ) -> Result<SearchResult, SearchError> {
        let result = self.run_predicate(&filters.to_predicate(), page).await?;

        if self.config.log_queries {
            self.record_search(filters, page.lang).await;
        }

        Ok(result)
    }

    async fn try_search_by_location(
        &self,
        query: &LocationQuery,
        page: PageRequest,
    ) -> Result<SearchResult, SearchError> {
        let (page_no, limit) = self.config.clamp_page(page.page, page.limit);
        if !query.is_valid() {
            warn!(?query, "Rejected location search with invalid coordinates");
            return Ok(SearchResult::empty(page_no, limit));
        }

        let center = query.center();
        let bbox = BoundingBox::around(center, query.radius_km);
        let media = predicate::media_clause(query.has_photos, query.has_videos);

        let candidates = self.store.fetch_location_candidates(&bbox, &media).await?;
        let candidate_count = candidates.len();
        let ranked = geo::rank_candidates(center, query.radius_km, candidates);
        let total = ranked.len() as u64;

        let skip = usize::try_from((page_no - 1).saturating_mul(limit)).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let page_slice: Vec<(i32, f64)> = ranked.into_iter().skip(skip).take(take).collect();

        let ids: Vec<i32> = page_slice.iter().map(|(id, _)| *id).collect();
        let distances: HashMap<i32, f64> = page_slice.into_iter().collect();

        let rows = self.store.fetch_buildings_by_ids(&ids).await?;
        let items = self.transform_rows(rows, page.lang, &distances);

        debug!(
            lat = query.lat,
            lng = query.lng,
            radius_km = query.radius_km,
            candidates = candidate_count,
            total,
            "Location search executed"
        );
        Ok(SearchResult::new(items, total, page_no, limit))
    }

    async fn try_search_by_architect_slug(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> Result<SearchResult, SearchError> {
        let profile = self
            .store
            .get_architect_by_slug(slug.trim())
            .await?
            .map(ArchitectProfile::from);

        if profile.is_none() {
            let (page_no, limit) = self.config.clamp_page(page.page, page.limit);
            debug!(slug, "Architect not found");
            return Ok(SearchResult::empty(page_no, limit));
        }

        let result = self
            .run_predicate(&predicate::architect_slug_clause(slug), page)
            .await?;
        Ok(result.with_architect_info(profile))
    }

    async fn try_get_by_slug(&self, slug: &str, lang: Lang) -> Result<Option<Building>, SearchError> {
        let Some(row) = self.store.get_building_by_slug(slug).await? else {
            return Ok(None);
        };
        Ok(Some(transform::transform_row(
            row,
            lang,
            &self.config.photo_base_url,
            None,
        )?))
    }

    /// Classifies a free-text query and gathers the data its popular-search
    /// link is derived from.
    pub async fn classify_query(
        &self,
        query: &str,
    ) -> Result<(SearchType, serde_json::Value), SearchError> {
        if let Some(building) = self.store.find_building_by_title_or_slug(query).await? {
            return Ok((
                SearchType::Building,
                json!({
                    "building_id": building.id,
                    "building_slug": building.slug,
                    "building_title_ja": building.title,
                    "building_title_en": building.title_en,
                }),
            ));
        }

        if let Some(architect) = self.store.find_architect_by_name_or_slug(query).await? {
            return Ok((
                SearchType::Architect,
                json!({
                    "architect_id": architect.id,
                    "architect_slug": architect.slug,
                    "architect_name_ja": architect.name_ja,
                    "architect_name_en": architect.name_en,
                }),
            ));
        }

        if prefecture::is_known(query) || self.store.building_exists_with_prefecture(query).await? {
            return Ok((
                SearchType::Prefecture,
                json!({
                    "prefecture_ja": prefecture::to_native(query),
                    "prefecture_en": prefecture::to_english(query),
                }),
            ));
        }

        Ok((SearchType::Text, json!({})))
    }

    /// Records a free-text search for the popular-search view. Failures are
    /// logged and otherwise ignored.
    async fn record_search(&self, filters: &SearchFilters, lang: Lang) {
        let query = predicate::tokenize(&filters.keywords).join(" ");
        if query.is_empty() {
            return;
        }

        if let Err(e) = self.try_record_search(&query, filters, lang).await {
            warn!(error = %e, query, "Failed to record search");
        }
    }

    async fn try_record_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        lang: Lang,
    ) -> Result<(), SearchError> {
        let (search_type, mut extra) = self.classify_query(query).await?;

        let now = Utc::now();
        let since = now - chrono::Duration::minutes(self.config.duplicate_window_minutes);
        if self
            .store
            .is_duplicate_search(query, search_type, filters.session_id.as_deref(), since)
            .await?
        {
            debug!(query, %search_type, "Skipping duplicate search log entry");
            return Ok(());
        }

        if let Some(map) = extra.as_object_mut() {
            map.insert("lang".into(), json!(lang));
            map.insert("prefectures".into(), json!(filters.prefectures));
            map.insert("completion_years".into(), json!(filters.completion_years));
            map.insert("building_types".into(), json!(filters.building_types));
            map.insert("has_photos".into(), json!(filters.has_photos));
            map.insert("has_videos".into(), json!(filters.has_videos));
        }

        self.store
            .log_search(&NewSearchLog {
                query: query.to_string(),
                search_type,
                session_id: filters.session_id.clone(),
                filters: extra,
                searched_at: now,
            })
            .await?;
        Ok(())
    }
}

fn degraded(operation: &str, err: &SearchError, page: PageRequest) -> SearchResult {
    error!(operation, error = %err, page = page.page, "Search failed, returning empty result");
    SearchResult::degraded(page.page.max(1), page.limit)
}

#[async_trait::async_trait]
impl BuildingSearch for SeaOrmSearchService {
    async fn search(&self, filters: &SearchFilters, page: PageRequest) -> SearchResult {
        match self.try_search(filters, page).await {
            Ok(result) => result,
            Err(e) => degraded("search", &e, page),
        }
    }

    async fn search_by_location(
        &self,
        query: &LocationQuery,
        page: PageRequest,
    ) -> SearchResult {
        match self.try_search_by_location(query, page).await {
            Ok(result) => result,
            Err(e) => degraded("search_by_location", &e, page),
        }
    }

    async fn search_by_architect_slug(&self, slug: &str, page: PageRequest) -> SearchResult {
        match self.try_search_by_architect_slug(slug, page).await {
            Ok(result) => result,
            Err(e) => degraded("search_by_architect_slug", &e, page),
        }
    }

    async fn get_by_slug(&self, slug: &str, lang: Lang) -> Option<Building> {
        match self.try_get_by_slug(slug, lang).await {
            Ok(building) => building,
            Err(e) => {
                error!(slug, error = %e, "Building lookup failed");
                None
            }
        }
    }

    async fn architects_for(&self, building_ids: &[i32]) -> HashMap<i32, Vec<ArchitectRef>> {
        match self.store.architects_for(building_ids).await {
            Ok(found) => found,
            Err(e) => {
                error!(error = %SearchError::from(e), "Architect lookup failed");
                HashMap::new()
            }
        }
    }

    fn normalize_page(&self, page: PageRequest) -> PageRequest {
        let (page_no, limit) = self.config.clamp_page(page.page, page.limit);
        PageRequest::new(page_no, limit, page.lang)
    }
}
