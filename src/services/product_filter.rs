use sea_orm::{
    sea_query::{Expr, Query},
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use serde::Serialize;

use super::url_params::CatalogParams;
use crate::entities::{
    category_feature, feature, feature::FeatureType, manufacturer, product, product_feature,
};

/// Narrows a product query with the catalog filter parameters.
pub fn apply(query: Select<product::Entity>, params: &CatalogParams) -> Select<product::Entity> {
    let mut condition = Condition::all();

    if let Some(min) = params.price_min {
        condition = condition.add(product::Column::Price.gte(min));
    }
    if let Some(max) = params.price_max {
        condition = condition.add(product::Column::Price.lte(max));
    }
    if !params.manufacturers.is_empty() {
        condition = condition.add(product::Column::ManufacturerId.is_in(params.manufacturers.clone()));
    }
    if let Some(limited) = params.is_limited {
        condition = condition.add(product::Column::IsLimited.eq(limited));
    }
    if params.in_stock {
        condition = condition.add(product::Column::Count.gt(0));
    }
    // every filtered feature must match one of its values
    for (feature_id, values) in &params.features {
        condition = condition.add(
            product::Column::Id.in_subquery(
                Query::select()
                    .column(product_feature::Column::ProductId)
                    .from(product_feature::Entity)
                    .and_where(product_feature::Column::FeatureId.eq(*feature_id))
                    .and_where(product_feature::Column::Value.is_in(values.clone()))
                    .to_owned(),
            ),
        );
    }

    query.filter(condition)
}

pub async fn category_features<C: ConnectionTrait>(
    db: &C,
    category_id: i32,
) -> Result<Vec<feature::Model>, DbErr> {
    feature::Entity::find()
        .filter(
            feature::Column::Id.in_subquery(
                Query::select()
                    .column(category_feature::Column::FeatureId)
                    .from(category_feature::Entity)
                    .and_where(category_feature::Column::CategoryId.eq(category_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(feature::Column::Id)
        .all(db)
        .await
}

#[derive(Serialize, Debug)]
pub struct FeatureChoice {
    pub id: i32,
    pub name: String,
    pub type_feature: FeatureType,
    /// Distinct values on the category's products, only for `select` features.
    pub values: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Serialize, Debug)]
pub struct FilterForm {
    pub price: PriceBounds,
    pub manufacturers: Vec<manufacturer::Model>,
    pub features: Vec<FeatureChoice>,
}

fn products_of_category(category_id: i32, column: product::Column) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(column)
        .from(product::Entity)
        .and_where(Expr::col(product::Column::CategoryId).eq(category_id))
        .to_owned()
}

/// Choices offered by the catalog filter form for one subcategory.
pub async fn filter_form<C: ConnectionTrait>(
    db: &C,
    category_id: i32,
    features: &[feature::Model],
    max_price: f64,
) -> Result<FilterForm, DbErr> {
    let manufacturers = manufacturer::Entity::find()
        .filter(
            manufacturer::Column::Id
                .in_subquery(products_of_category(category_id, product::Column::ManufacturerId)),
        )
        .order_by_asc(manufacturer::Column::Name)
        .all(db)
        .await?;

    let mut choices = Vec::with_capacity(features.len());
    for feature in features {
        let values = match feature.type_feature {
            FeatureType::Select => {
                product_feature::Entity::find()
                    .select_only()
                    .column(product_feature::Column::Value)
                    .distinct()
                    .filter(product_feature::Column::FeatureId.eq(feature.id))
                    .filter(product_feature::Column::Value.ne(""))
                    .filter(
                        product_feature::Column::ProductId
                            .in_subquery(products_of_category(category_id, product::Column::Id)),
                    )
                    .order_by_asc(product_feature::Column::Value)
                    .into_tuple::<String>()
                    .all(db)
                    .await?
            }
            FeatureType::Checkbox | FeatureType::Text => Vec::new(),
        };
        choices.push(FeatureChoice {
            id: feature.id,
            name: feature.name.clone(),
            type_feature: feature.type_feature,
            values,
        });
    }

    Ok(FilterForm {
        price: PriceBounds {
            min: 0.0,
            max: max_price,
        },
        manufacturers,
        features: choices,
    })
}
