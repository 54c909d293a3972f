use std::collections::HashMap;

use anyhow::Result;
use sea_orm::sea_query::{Alias, Expr, JoinType, Order, Query, SelectStatement, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, Iterable, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{architects, building_architects, buildings, prelude::*};
use crate::models::ArchitectRef;
use crate::search::predicate::{self, Predicate};
use crate::search::{BoundingBox, GeoPoint, RawBuildingRow};

/// Building fields accepted by [`BuildingRepository::insert`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewBuilding {
    pub uid: String,
    pub slug: String,
    pub title: String,
    pub title_en: Option<String>,
    pub location: Option<String>,
    pub location_en: Option<String>,
    pub prefectures: Option<String>,
    pub prefectures_en: Option<String>,
    pub building_types: Option<String>,
    pub building_types_en: Option<String>,
    pub completion_years: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub has_photo: Option<String>,
    pub youtube_url: Option<String>,
}

const AGG: &str = "agg";
const PROJECTIONS: [(&str, &str); 4] = [
    ("architect_ja", r#""architects"."name_ja""#),
    ("architect_en", r#""architects"."name_en""#),
    ("architect_ids", r#""architects"."id""#),
    ("architect_slugs", r#""architects"."slug""#),
];

pub struct BuildingRepository {
    conn: DatabaseConnection,
}

impl BuildingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn count(&self, predicate: &Predicate) -> Result<u64> {
        let total = Buildings::find()
            .filter(predicate.to_condition())
            .count(&self.conn)
            .await?;
        Ok(total)
    }

    /// One page of aggregated rows, ordered by photo presence then newest id.
    pub async fn fetch_page(
        &self,
        predicate: &Predicate,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<RawBuildingRow>> {
        let mut stmt = aggregated_select(predicate);
        stmt.order_by_expr(has_photo_flag(), Order::Desc)
            .order_by((buildings::Entity, buildings::Column::Id), Order::Desc)
            .limit(page_size)
            .offset(page.saturating_sub(1).saturating_mul(page_size));

        let backend = self.conn.get_database_backend();
        let rows = RawBuildingRow::find_by_statement(backend.build(&stmt))
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<RawBuildingRow>> {
        let mut stmt = aggregated_select(&predicate::building_slug_clause(slug));
        stmt.limit(1);

        let backend = self.conn.get_database_backend();
        let row = RawBuildingRow::find_by_statement(backend.build(&stmt))
            .one(&self.conn)
            .await?;
        Ok(row)
    }

    /// Stage-one candidates inside `bbox` that also satisfy `filter`.
    pub async fn fetch_location_candidates(
        &self,
        bbox: &BoundingBox,
        filter: &Predicate,
    ) -> Result<Vec<(i32, GeoPoint)>> {
        let condition = predicate::bounding_box_clause(bbox).and(filter.clone());

        let rows: Vec<(i32, Option<f64>, Option<f64>)> = Buildings::find()
            .select_only()
            .column(buildings::Column::Id)
            .column(buildings::Column::Lat)
            .column(buildings::Column::Lng)
            .filter(condition.to_condition())
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, lat, lng)| Some((id, GeoPoint::new(lat?, lng?))))
            .collect())
    }

    /// Plain building rows for `ids`, in the order given.
    pub async fn fetch_by_ids(&self, ids: &[i32]) -> Result<Vec<RawBuildingRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<i32, buildings::Model> = Buildings::find()
            .filter(predicate::id_set_clause(ids).to_condition())
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .map(RawBuildingRow::from)
            .collect())
    }

    /// Ordered architect lists for each of `building_ids`.
    pub async fn architects_for(
        &self,
        building_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<ArchitectRef>>> {
        if building_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i32, String, Option<String>, String)> = BuildingArchitects::find()
            .select_only()
            .column(building_architects::Column::BuildingId)
            .column(building_architects::Column::ArchitectId)
            .column(architects::Column::NameJa)
            .column(architects::Column::NameEn)
            .column(architects::Column::Slug)
            .join(
                JoinType::InnerJoin,
                building_architects::Relation::Architects.def(),
            )
            .filter(building_architects::Column::BuildingId.is_in(building_ids.iter().copied()))
            .order_by_asc(building_architects::Column::BuildingId)
            .order_by_asc(building_architects::Column::ArchitectOrder)
            .order_by_asc(building_architects::Column::ArchitectId)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let mut grouped: HashMap<i32, Vec<ArchitectRef>> = HashMap::new();
        for (building_id, architect_id, name_ja, name_en, slug) in rows {
            grouped.entry(building_id).or_default().push(ArchitectRef {
                architect_id,
                name_ja,
                name_en: name_en.unwrap_or_default(),
                slug,
            });
        }
        Ok(grouped)
    }

    pub async fn insert(&self, building: &NewBuilding) -> Result<i32> {
        Self::insert_with(&self.conn, building).await
    }

    pub(crate) async fn insert_with<C: ConnectionTrait>(
        conn: &C,
        building: &NewBuilding,
    ) -> Result<i32> {
        let now = chrono::Utc::now().to_rfc3339();
        let model = buildings::ActiveModel {
            uid: Set(building.uid.clone()),
            slug: Set(building.slug.clone()),
            title: Set(building.title.clone()),
            title_en: Set(building.title_en.clone()),
            location: Set(building.location.clone()),
            location_en: Set(building.location_en.clone()),
            prefectures: Set(building.prefectures.clone()),
            prefectures_en: Set(building.prefectures_en.clone()),
            building_types: Set(building.building_types.clone()),
            building_types_en: Set(building.building_types_en.clone()),
            completion_years: Set(building.completion_years.clone()),
            lat: Set(building.lat),
            lng: Set(building.lng),
            has_photo: Set(building.has_photo.clone()),
            youtube_url: Set(building.youtube_url.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(conn).await?;
        Ok(inserted.id)
    }

    /// Building whose title, English title or slug equals `query` exactly.
    pub async fn find_by_title_or_slug(&self, query: &str) -> Result<Option<buildings::Model>> {
        let row = Buildings::find()
            .filter(
                buildings::Column::Title
                    .eq(query)
                    .or(buildings::Column::TitleEn.eq(query))
                    .or(buildings::Column::Slug.eq(query)),
            )
            .one(&self.conn)
            .await?;
        Ok(row)
    }

    pub async fn exists_with_prefecture(&self, name: &str) -> Result<bool> {
        let count = Buildings::find()
            .filter(
                buildings::Column::Prefectures
                    .eq(name)
                    .or(buildings::Column::PrefecturesEn.eq(name)),
            )
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(Buildings::find().count(&self.conn).await?)
    }
}

/// `buildings` rows matching `predicate`, each carrying its full architect
/// list as four aggregated projections. The projections come from an
/// unfiltered association join in a derived table, independent of any
/// architect condition inside `predicate`.
fn aggregated_select(predicate: &Predicate) -> SelectStatement {
    let mut aggregate = Query::select();
    aggregate
        .column((
            building_architects::Entity,
            building_architects::Column::BuildingId,
        ))
        .from(building_architects::Entity)
        .inner_join(
            architects::Entity,
            Expr::col((architects::Entity, architects::Column::Id)).equals((
                building_architects::Entity,
                building_architects::Column::ArchitectId,
            )),
        )
        .group_by_col((
            building_architects::Entity,
            building_architects::Column::BuildingId,
        ));
    for (alias, column) in PROJECTIONS {
        aggregate.expr_as(concat_projection(column), Alias::new(alias));
    }

    let mut stmt = Query::select();
    stmt.columns(buildings::Column::iter().map(|c| (buildings::Entity, c)))
        .from(buildings::Entity)
        .join_subquery(
            JoinType::LeftJoin,
            aggregate,
            Alias::new(AGG),
            Expr::col((Alias::new(AGG), building_architects::Column::BuildingId))
                .equals((buildings::Entity, buildings::Column::Id)),
        )
        .cond_where(predicate.to_condition());
    for (alias, _) in PROJECTIONS {
        stmt.expr_as(
            Expr::col((Alias::new(AGG), Alias::new(alias))),
            Alias::new(alias),
        );
    }
    stmt
}

fn concat_projection(column: &str) -> SimpleExpr {
    Expr::cust(format!(
        r#"group_concat(COALESCE({column}, ''), char(31) ORDER BY "building_architects"."architect_order", "building_architects"."architect_id")"#
    ))
}

fn has_photo_flag() -> SimpleExpr {
    Expr::cust(
        r#"CASE WHEN "buildings"."has_photo" IS NOT NULL AND "buildings"."has_photo" <> '' THEN 1 ELSE 0 END"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sea_query::SqliteQueryBuilder;

    #[test]
    fn architect_filter_does_not_touch_display_join() {
        let sql = aggregated_select(&predicate::architect_slug_clause("tadao-ando"))
            .to_string(SqliteQueryBuilder);

        let (select, filter) = sql.split_once("WHERE").unwrap();
        assert!(select.contains("LEFT JOIN (SELECT"));
        assert!(!select.contains("tadao-ando"));
        assert!(filter.contains(r#""buildings"."id" IN (SELECT"#));
    }

    #[test]
    fn projections_share_one_ordering() {
        let sql = aggregated_select(&Predicate::True).to_string(SqliteQueryBuilder);
        assert_eq!(
            sql.matches(r#"ORDER BY "building_architects"."architect_order""#)
                .count(),
            4
        );
    }
}
