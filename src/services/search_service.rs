//! Domain service for catalogue searches.
//!
//! Every operation returns a well-shaped value: failures below this seam are
//! logged and replaced by an empty (degraded) result, never propagated.

use std::collections::HashMap;

use crate::models::{ArchitectRef, Building, Lang, SearchResult};
use crate::search::{LocationQuery, SearchFilters, TransformDefect};
use thiserror::Error;

/// Failures inside the search pipeline.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backing store is unreachable.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error(transparent)]
    TransformDefect(#[from] TransformDefect),

    #[error("Cache write failed: {0}")]
    CacheWrite(String),
}

impl From<sea_orm::DbErr> for SearchError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::ConnectionAcquire(_) | sea_orm::DbErr::Conn(_) => {
                Self::Connection(err.to_string())
            }
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for SearchError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<sea_orm::DbErr>() {
            Ok(db) => db.into(),
            Err(other) => Self::Query(format!("{other:#}")),
        }
    }
}

/// Paging and language of one search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
    pub lang: Lang,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u64, limit: u64, lang: Lang) -> Self {
        Self { page, limit, lang }
    }
}

/// The search operations exposed to entry points.
///
/// Implemented by the store-backed executor and by the caching decorator,
/// which share this signature so either can be handed to callers.
#[async_trait::async_trait]
pub trait BuildingSearch: Send + Sync {
    /// Keyword and facet search, ordered by photo presence then newest first.
    async fn search(&self, filters: &SearchFilters, page: PageRequest) -> SearchResult;

    /// Radius search ordered by ascending distance. Architect lists are left
    /// empty; see [`BuildingSearch::architects_for`].
    async fn search_by_location(&self, query: &LocationQuery, page: PageRequest)
    -> SearchResult;

    /// Buildings credited to the architect with `slug`, each listing all of
    /// its architects.
    async fn search_by_architect_slug(&self, slug: &str, page: PageRequest) -> SearchResult;

    async fn get_by_slug(&self, slug: &str, lang: Lang) -> Option<Building>;

    /// Lazy architect lookup for results that were returned without them.
    async fn architects_for(&self, building_ids: &[i32]) -> HashMap<i32, Vec<ArchitectRef>>;

    /// The paging this implementation actually applies to `page`. Requests
    /// that normalize to the same paging produce the same result.
    fn normalize_page(&self, page: PageRequest) -> PageRequest {
        page
    }
}

/// Fills empty architect lists of `items` through `search`.
pub async fn hydrate_architects(search: &dyn BuildingSearch, items: &mut [Building]) {
    let ids: Vec<i32> = items
        .iter()
        .filter(|b| b.architects.is_empty())
        .map(|b| b.building_id)
        .collect();
    if ids.is_empty() {
        return;
    }

    let mut found = search.architects_for(&ids).await;
    for item in items.iter_mut().filter(|b| b.architects.is_empty()) {
        if let Some(architects) = found.remove(&item.building_id) {
            item.architects = architects;
        }
    }
}
