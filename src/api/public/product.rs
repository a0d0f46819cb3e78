use axum::{
    extract::{Extension, Host, Path},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{
    category, feature::FeatureType, feedback, image, manufacturer, product, product_feature,
    user,
};
use crate::error::ApiError;
use crate::middleware::auth::MaybeClaims;
use crate::services::{
    cart_totals::{cart_summary, quantity_in_cart, CartSummary},
    navigation::{navigation, NavCategory},
};
use crate::state::AppState;

pub fn product_router() -> Router {
    Router::new().route("/product/:id", get(get_product))
}

async fn get_product(
    Path(id): Path<i32>,
    Host(host): Host,
    MaybeClaims(claims): MaybeClaims,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ProductDetail>, ApiError> {
    let txn = state.db.begin().await?;
    let detail = load_detail(&txn, id, claims.map(|c| c.user_id)).await?;
    drop(txn);

    if let Err(err) = state
        .cache
        .record_view(&host, &detail.product.product_id.to_string())
        .await
    {
        warn!(error = %err, product_id = id, "Failed to count product view");
    }

    Ok(Json(detail))
}

/// Everything the product page shows. Also rendered after a feedback post.
pub(crate) async fn load_detail<C: ConnectionTrait>(
    db: &C,
    id: i32,
    user_id: Option<i32>,
) -> Result<ProductDetail, ApiError> {
    let prod = product::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No product with {} id was found.", id)))?;

    let categ = category::Entity::find_by_id(prod.category_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product category is missing".into()))?;
    let parent = match categ.parent_id {
        Some(parent_id) => category::Entity::find_by_id(parent_id).one(db).await?,
        None => None,
    };
    let maker = manufacturer::Entity::find_by_id(prod.manufacturer_id)
        .one(db)
        .await?;

    let product_features = product_feature::Entity::find()
        .filter(product_feature::Column::ProductId.eq(prod.id))
        .find_also_related(crate::entities::feature::Entity)
        .order_by_asc(product_feature::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(row, feat)| {
            feat.map(|feat| ProductFeatureView {
                feature_id: feat.id,
                name: feat.name,
                type_feature: feat.type_feature,
                value: row.value,
            })
        })
        .collect();

    let feedbacks: Vec<FeedbackView> = feedback::Entity::find()
        .filter(feedback::Column::ProductId.eq(prod.id))
        .find_also_related(user::Entity)
        .order_by_asc(feedback::Column::Added)
        .order_by_asc(feedback::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|(row, author)| FeedbackView {
            id: row.id,
            text: row.text,
            added: row.added,
            username: author.map(|author| author.username).unwrap_or_default(),
        })
        .collect();

    let images = image::Entity::find()
        .filter(image::Column::ProductId.eq(prod.id))
        .order_by_asc(image::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|img| img.id)
        .collect();

    Ok(ProductDetail {
        quantity_in_cart: quantity_in_cart(db, user_id, prod.id).await?,
        cart: cart_summary(db, user_id).await?,
        navigation: navigation(db).await?,
        feedback_count: feedbacks.len(),
        feedbacks,
        product_features,
        images,
        category: CategoryRef::new(categ),
        parent_category: parent.map(CategoryRef::new),
        manufacturer: maker,
        product: prod,
    })
}

/// Image ids per product, for a page of products.
pub(crate) async fn image_ids_for<C: ConnectionTrait>(
    db: &C,
    product_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<i32>>, ApiError> {
    let mut by_product: HashMap<i32, Vec<i32>> = HashMap::new();
    if product_ids.is_empty() {
        return Ok(by_product);
    }
    let images = image::Entity::find()
        .filter(image::Column::ProductId.is_in(product_ids))
        .order_by_asc(image::Column::Id)
        .all(db)
        .await?;
    for img in images {
        by_product.entry(img.product_id).or_default().push(img.id);
    }
    Ok(by_product)
}

#[derive(Serialize, Debug)]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i32>,
}

impl CategoryRef {
    pub fn new(value: category::Model) -> CategoryRef {
        CategoryRef {
            id: value.id,
            name: value.name,
            slug: value.slug,
            parent_id: value.parent_id,
        }
    }
}

/// Product as listed in the catalog and popular pages.
#[derive(Serialize, Debug)]
pub struct ProductCard {
    pub id: i32,
    pub product_id: Uuid,
    pub name: String,
    pub price: f64,
    pub added: DateTime<Utc>,
    pub count: i32,
    pub is_limited: bool,
    pub manufacturer_id: i32,
    pub image_ids: Vec<i32>,
}

impl ProductCard {
    pub fn new(value: product::Model, image_ids: Vec<i32>) -> ProductCard {
        ProductCard {
            id: value.id,
            product_id: value.product_id,
            name: value.name,
            price: value.price,
            added: value.added,
            count: value.count,
            is_limited: value.is_limited,
            manufacturer_id: value.manufacturer_id,
            image_ids,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ProductFeatureView {
    pub feature_id: i32,
    pub name: String,
    pub type_feature: FeatureType,
    pub value: String,
}

#[derive(Serialize, Debug)]
pub struct FeedbackView {
    pub id: i32,
    pub text: String,
    pub added: DateTime<Utc>,
    pub username: String,
}

#[derive(Serialize, Debug)]
pub struct ProductDetail {
    pub product: product::Model,
    pub category: CategoryRef,
    pub parent_category: Option<CategoryRef>,
    pub manufacturer: Option<manufacturer::Model>,
    pub images: Vec<i32>,
    pub product_features: Vec<ProductFeatureView>,
    pub feedbacks: Vec<FeedbackView>,
    pub feedback_count: usize,
    pub quantity_in_cart: u32,
    pub cart: CartSummary,
    pub navigation: Vec<NavCategory>,
}
