use sea_orm::entity::prelude::*;
use serde::Serialize;
use std::{fmt, str::FromStr};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(indexed)]
    pub product_id: i32,
    pub file_name: String,
    #[sea_orm(unique)]
    pub path_name: String,
    pub extension: FileExtension,
}

impl Model {
    /// Name of the stored file inside the upload directory.
    pub fn stored_name(&self) -> String {
        format!("{}.{}", self.path_name, self.extension)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(
    enum_name = "extension_enum",
    db_type = "String(StringLen::N(8))",
    rs_type = "String"
)]
#[serde(rename_all = "lowercase")]
pub enum FileExtension {
    #[sea_orm(string_value = "jpg")]
    Jpg,
    #[sea_orm(string_value = "png")]
    Png,
    #[sea_orm(string_value = "webp")]
    Webp,
}

impl FromStr for FileExtension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(FileExtension::Jpg),
            "png" => Ok(FileExtension::Png),
            "webp" => Ok(FileExtension::Webp),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FileExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileExtension::Jpg => write!(f, "jpg"),
            FileExtension::Png => write!(f, "png"),
            FileExtension::Webp => write!(f, "webp"),
        }
    }
}
