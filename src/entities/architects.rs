use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "architects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub slug: String,
    pub name_ja: String,
    pub name_en: Option<String>,
    pub website: Option<String>,
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
