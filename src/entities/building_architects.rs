use sea_orm::entity::prelude::*;

/// Association between a building and one of its architects.
///
/// `architect_order` fixes the display order of a building's architect list.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "building_architects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub building_id: i32,
    pub architect_id: i32,
    pub architect_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::buildings::Entity",
        from = "Column::BuildingId",
        to = "super::buildings::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Buildings,
    #[sea_orm(
        belongs_to = "super::architects::Entity",
        from = "Column::ArchitectId",
        to = "super::architects::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Architects,
}

impl Related<super::buildings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buildings.def()
    }
}

impl Related<super::architects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Architects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
