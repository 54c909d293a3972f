use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "buildings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub uid: String,
    #[sea_orm(unique)]
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
    /// File name of the representative photo; empty or NULL when none.
    pub has_photo: Option<String>,
    pub youtube_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::building_architects::Entity")]
    BuildingArchitects,
}

impl Related<super::building_architects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BuildingArchitects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
