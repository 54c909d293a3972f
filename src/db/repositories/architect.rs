use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{architects, building_architects, prelude::*};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewArchitect {
    pub slug: String,
    pub name_ja: String,
    pub name_en: Option<String>,
    pub website: Option<String>,
}

pub struct ArchitectRepository {
    conn: DatabaseConnection,
}

impl ArchitectRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, architect: &NewArchitect) -> Result<i32> {
        Self::insert_with(&self.conn, architect).await
    }

    pub(crate) async fn insert_with<C: ConnectionTrait>(
        conn: &C,
        architect: &NewArchitect,
    ) -> Result<i32> {
        let model = architects::ActiveModel {
            slug: Set(architect.slug.clone()),
            name_ja: Set(architect.name_ja.clone()),
            name_en: Set(architect.name_en.clone()),
            website: Set(architect.website.clone()),
            ..Default::default()
        };
        Ok(model.insert(conn).await?.id)
    }

    /// Associates an architect with a building at display position `order`.
    /// Re-linking an existing pair updates its position.
    pub async fn link(&self, building_id: i32, architect_id: i32, order: i32) -> Result<()> {
        Self::link_with(&self.conn, building_id, architect_id, order).await
    }

    pub(crate) async fn link_with<C: ConnectionTrait>(
        conn: &C,
        building_id: i32,
        architect_id: i32,
        order: i32,
    ) -> Result<()> {
        let model = building_architects::ActiveModel {
            building_id: Set(building_id),
            architect_id: Set(architect_id),
            architect_order: Set(order),
            ..Default::default()
        };

        BuildingArchitects::insert(model)
            .on_conflict(
                OnConflict::columns([
                    building_architects::Column::BuildingId,
                    building_architects::Column::ArchitectId,
                ])
                .update_column(building_architects::Column::ArchitectOrder)
                .to_owned(),
            )
            .exec(conn)
            .await?;
        Ok(())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<architects::Model>> {
        let row = Architects::find()
            .filter(architects::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?;
        Ok(row)
    }

    /// Architect whose native name, English name or slug equals `query`.
    pub async fn find_by_name_or_slug(&self, query: &str) -> Result<Option<architects::Model>> {
        let row = Architects::find()
            .filter(
                architects::Column::NameJa
                    .eq(query)
                    .or(architects::Column::NameEn.eq(query))
                    .or(architects::Column::Slug.eq(query)),
            )
            .one(&self.conn)
            .await?;
        Ok(row)
    }
}
