use crate::entities::{architects, buildings};
use crate::models::ArchitectRef;
use crate::search::{BoundingBox, GeoPoint, Predicate, RawBuildingRow};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::architect::NewArchitect;
pub use repositories::building::NewBuilding;
pub use repositories::dataset::{Dataset, DatasetBuilding, ImportSummary};
pub use repositories::search_log::{NewSearchLog, PopularQuery, PopularSearchRow};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.starts_with(":memory:") && !db_url.starts_with("sqlite::memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn building_repo(&self) -> repositories::building::BuildingRepository {
        repositories::building::BuildingRepository::new(self.conn.clone())
    }

    fn architect_repo(&self) -> repositories::architect::ArchitectRepository {
        repositories::architect::ArchitectRepository::new(self.conn.clone())
    }

    fn search_log_repo(&self) -> repositories::search_log::SearchLogRepository {
        repositories::search_log::SearchLogRepository::new(self.conn.clone())
    }

    fn dataset_repo(&self) -> repositories::dataset::DatasetRepository {
        repositories::dataset::DatasetRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Buildings
    // ========================================================================

    pub async fn count_buildings(&self, predicate: &Predicate) -> Result<u64> {
        self.building_repo().count(predicate).await
    }

    pub async fn fetch_building_page(
        &self,
        predicate: &Predicate,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<RawBuildingRow>> {
        self.building_repo()
            .fetch_page(predicate, page, page_size)
            .await
    }

    pub async fn fetch_location_candidates(
        &self,
        bbox: &BoundingBox,
        filter: &Predicate,
    ) -> Result<Vec<(i32, GeoPoint)>> {
        self.building_repo()
            .fetch_location_candidates(bbox, filter)
            .await
    }

    pub async fn fetch_buildings_by_ids(&self, ids: &[i32]) -> Result<Vec<RawBuildingRow>> {
        self.building_repo().fetch_by_ids(ids).await
    }

    pub async fn architects_for(
        &self,
        building_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<ArchitectRef>>> {
        self.building_repo().architects_for(building_ids).await
    }

    pub async fn get_building_by_slug(&self, slug: &str) -> Result<Option<RawBuildingRow>> {
        self.building_repo().get_by_slug(slug).await
    }

    pub async fn add_building(&self, building: &NewBuilding) -> Result<i32> {
        self.building_repo().insert(building).await
    }

    pub async fn find_building_by_title_or_slug(
        &self,
        query: &str,
    ) -> Result<Option<buildings::Model>> {
        self.building_repo().find_by_title_or_slug(query).await
    }

    pub async fn building_exists_with_prefecture(&self, name: &str) -> Result<bool> {
        self.building_repo().exists_with_prefecture(name).await
    }

    pub async fn count_all_buildings(&self) -> Result<u64> {
        self.building_repo().count_all().await
    }

    // ========================================================================
    // Architects
    // ========================================================================

    pub async fn add_architect(&self, architect: &NewArchitect) -> Result<i32> {
        self.architect_repo().insert(architect).await
    }

    pub async fn link_architect(
        &self,
        building_id: i32,
        architect_id: i32,
        order: i32,
    ) -> Result<()> {
        self.architect_repo()
            .link(building_id, architect_id, order)
            .await
    }

    pub async fn get_architect_by_slug(&self, slug: &str) -> Result<Option<architects::Model>> {
        self.architect_repo().get_by_slug(slug).await
    }

    pub async fn find_architect_by_name_or_slug(
        &self,
        query: &str,
    ) -> Result<Option<architects::Model>> {
        self.architect_repo().find_by_name_or_slug(query).await
    }

    // ========================================================================
    // Search log
    // ========================================================================

    pub async fn log_search(&self, entry: &NewSearchLog) -> Result<()> {
        self.search_log_repo().log_search(entry).await
    }

    pub async fn is_duplicate_search(
        &self,
        query: &str,
        search_type: crate::models::SearchType,
        session_id: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        self.search_log_repo()
            .is_duplicate(query, search_type, session_id, since)
            .await
    }

    pub async fn popular_searches(
        &self,
        params: &PopularQuery,
    ) -> Result<(Vec<PopularSearchRow>, u64)> {
        self.search_log_repo().popular_searches(params).await
    }

    pub async fn prune_search_log(&self, before: DateTime<Utc>) -> Result<u64> {
        self.search_log_repo().prune(before).await
    }

    // ========================================================================
    // Import
    // ========================================================================

    pub async fn import_dataset(&self, dataset: &Dataset) -> Result<ImportSummary> {
        self.dataset_repo().import(dataset).await
    }
}
