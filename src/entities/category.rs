use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Root categories sit at level 0, products only attach to level 1.
pub const ROOT_LEVEL: i32 = 0;
pub const SUBCATEGORY_LEVEL: i32 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(nullable)]
    pub parent_id: Option<i32>,
    #[sea_orm(default = 0)]
    pub level: i32,
    #[sea_orm(default = true)]
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Parent,
    #[sea_orm(has_many = "super::product::Entity")]
    Product,
    #[sea_orm(has_many = "super::category_feature::Entity")]
    CategoryFeature,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::category_feature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryFeature.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
