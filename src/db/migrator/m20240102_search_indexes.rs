use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXES: [&str; 6] = [
    "CREATE INDEX IF NOT EXISTS idx_buildings_lat_lng ON buildings(lat, lng)",
    "CREATE INDEX IF NOT EXISTS idx_building_architects_building ON building_architects(building_id)",
    "CREATE INDEX IF NOT EXISTS idx_building_architects_architect ON building_architects(architect_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_building_architects_pair ON building_architects(building_id, architect_id)",
    "CREATE INDEX IF NOT EXISTS idx_search_history_searched_at ON search_history(searched_at)",
    "CREATE INDEX IF NOT EXISTS idx_search_history_query_type ON search_history(query, search_type)",
];

const INDEX_NAMES: [&str; 6] = [
    "idx_buildings_lat_lng",
    "idx_building_architects_building",
    "idx_building_architects_architect",
    "idx_building_architects_pair",
    "idx_search_history_searched_at",
    "idx_search_history_query_type",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for sql in INDEXES {
            conn.execute_unprepared(sql).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        for name in INDEX_NAMES {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {name}"))
                .await?;
        }
        Ok(())
    }
}
