use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "feature")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub type_feature: FeatureType,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::category_feature::Entity")]
    CategoryFeature,
    #[sea_orm(has_many = "super::product_feature::Entity")]
    ProductFeature,
}

impl Related<super::category_feature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryFeature.def()
    }
}

impl Related<super::product_feature::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductFeature.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// How a feature is rendered and filtered in the catalog.
#[derive(
    Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(
    enum_name = "feature_type_enum",
    db_type = "String(StringLen::N(16))",
    rs_type = "String"
)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    #[sea_orm(string_value = "select")]
    Select,
    #[sea_orm(string_value = "checkbox")]
    Checkbox,
    #[sea_orm(string_value = "text")]
    Text,
}
