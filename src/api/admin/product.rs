use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{
    category, feature::FeatureType, image, manufacturer,
    product::{self, Entity as ProductEntity},
    product_feature,
};
use crate::error::ApiError;
use crate::services::{
    pagination::{paginate, PageMeta},
    product_filter::category_features,
    sorting::newest_first,
};
use crate::state::AppState;
use crate::validation::name_text;

//ROUTERS
pub fn admin_product_router() -> Router {
    Router::new()
        .route("/product", get(list_products).post(create_product))
        .route("/product/category-choices", get(category_choices))
        .route(
            "/product/:id",
            get(admin_get_product)
                .patch(patch_product)
                .delete(delete_product),
        )
}

//ROUTES
async fn list_products(
    Query(params): Query<ProductListQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let txn = state.db.begin().await?;

    let mut query = ProductEntity::find();
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        query = query.filter(product::Column::Name.contains(q));
    }
    if let Some(category_id) = params.category {
        query = query.filter(product::Column::CategoryId.eq(category_id));
    }
    if let Some(manufacturer_id) = params.manufacturer {
        query = query.filter(product::Column::ManufacturerId.eq(manufacturer_id));
    }
    if let Some(is_limited) = params.is_limited {
        query = query.filter(product::Column::IsLimited.eq(is_limited));
    }
    let query = newest_first(query, product::Column::Added).order_by_desc(product::Column::Id);

    let (products, page) = paginate(
        query,
        &txn,
        params.page.as_deref(),
        state.config.admin_page_size,
    )
    .await?;

    let category_names = category::Entity::find()
        .filter(category::Column::Id.is_in(products.iter().map(|p| p.category_id).collect::<Vec<_>>()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|categ| (categ.id, categ.name))
        .collect::<HashMap<_, _>>();
    let manufacturer_names = manufacturer::Entity::find()
        .filter(
            manufacturer::Column::Id
                .is_in(products.iter().map(|p| p.manufacturer_id).collect::<Vec<_>>()),
        )
        .all(&txn)
        .await?
        .into_iter()
        .map(|maker| (maker.id, maker.name))
        .collect::<HashMap<_, _>>();
    let mut image_counts: HashMap<i32, usize> = HashMap::new();
    for img in image::Entity::find()
        .filter(image::Column::ProductId.is_in(products.iter().map(|p| p.id).collect::<Vec<_>>()))
        .all(&txn)
        .await?
    {
        *image_counts.entry(img.product_id).or_default() += 1;
    }

    let results = products
        .into_iter()
        .map(|prod| ProductRow {
            category: category_names.get(&prod.category_id).cloned().unwrap_or_default(),
            manufacturer: manufacturer_names
                .get(&prod.manufacturer_id)
                .cloned()
                .unwrap_or_default(),
            images: image_counts.get(&prod.id).copied().unwrap_or(0),
            id: prod.id,
            name: prod.name,
            price: prod.price,
            added: prod.added,
            count: prod.count,
            is_limited: prod.is_limited,
        })
        .collect();

    Ok(Json(ProductListResponse { results, page }))
}

/// Products attach only to subcategories, grouped by parent.
async fn category_choices(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<category::Model>>, ApiError> {
    let choices = category::Entity::find()
        .filter(category::Column::Level.eq(category::SUBCATEGORY_LEVEL))
        .order_by_asc(category::Column::ParentId)
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(choices))
}

async fn admin_get_product(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<AdminProductView>, ApiError> {
    let txn = state.db.begin().await?;
    let prod = find_product(&txn, id).await?;
    Ok(Json(product_view(&txn, prod).await?))
}

async fn create_product(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateProduct>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;

    ensure_subcategory(&txn, payload.category_id).await?;
    ensure_manufacturer(&txn, payload.manufacturer_id).await?;

    let new_product = product::ActiveModel {
        product_id: Set(payload.product_id.unwrap_or_else(Uuid::new_v4)),
        name: Set(payload.name.trim().to_owned()),
        description: Set(payload.description),
        price: Set(payload.price),
        added: Set(payload.added.unwrap_or_else(Utc::now)),
        count: Set(payload.count),
        is_limited: Set(payload.is_limited),
        category_id: Set(payload.category_id),
        manufacturer_id: Set(payload.manufacturer_id),
        ..Default::default()
    };
    let created = new_product.insert(&txn).await?;
    sync_features(&txn, created.id, created.category_id).await?;
    txn.commit().await?;

    info!(id = created.id, product_id = %created.product_id, "Product created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Product created successfully",
            "id": created.id,
            "product_id": created.product_id,
        })),
    ))
}

async fn patch_product(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;
    let current = find_product(&txn, id).await?;
    let category_changed = payload
        .category_id
        .is_some_and(|category_id| category_id != current.category_id);

    let mut prod: product::ActiveModel = current.into();

    if let Some(name) = payload.name {
        prod.name = Set(name.trim().to_owned());
    }
    if let Some(description) = payload.description {
        prod.description = Set(description);
    }
    if let Some(price) = payload.price {
        prod.price = Set(price);
    }
    if let Some(count) = payload.count {
        prod.count = Set(count);
    }
    if let Some(is_limited) = payload.is_limited {
        prod.is_limited = Set(is_limited);
    }
    if let Some(manufacturer_id) = payload.manufacturer_id {
        ensure_manufacturer(&txn, manufacturer_id).await?;
        prod.manufacturer_id = Set(manufacturer_id);
    }
    if let Some(category_id) = payload.category_id.filter(|_| category_changed) {
        ensure_subcategory(&txn, category_id).await?;
        prod.category_id = Set(category_id);
    }

    // only the fields that were sent are written
    if prod.is_changed() {
        prod.update(&txn).await?;
    }
    if let Some(category_id) = payload.category_id.filter(|_| category_changed) {
        sync_features(&txn, id, category_id).await?;
    }
    if let Some(values) = payload.features {
        set_feature_values(&txn, id, values).await?;
    }
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource patched successfully."
    })))
}

async fn delete_product(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state.db.begin().await?;
    let prod = find_product(&txn, id).await?;
    let images = image::Entity::find()
        .filter(image::Column::ProductId.eq(prod.id))
        .all(&txn)
        .await?;

    let prod: product::ActiveModel = prod.into();
    prod.delete(&txn).await?;
    txn.commit().await?;

    for img in images {
        let path = state.config.upload_dir.join(img.stored_name());
        if let Err(err) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %err, "Failed to remove image file");
        }
    }

    Ok(Json(json!({
        "message": "Resource deleted successfully."
    })))
}

//HELPERS
async fn find_product<C: ConnectionTrait>(db: &C, id: i32) -> Result<product::Model, ApiError> {
    ProductEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No product with {} id was found.", id)))
}

async fn ensure_subcategory<C: ConnectionTrait>(db: &C, category_id: i32) -> Result<(), ApiError> {
    match category::Entity::find_by_id(category_id).one(db).await? {
        Some(categ) if categ.level == category::SUBCATEGORY_LEVEL => Ok(()),
        Some(_) => Err(ApiError::BadRequest(
            "Products can only be added to subcategories".into(),
        )),
        None => Err(ApiError::BadRequest(format!(
            "No category with {category_id} id was found"
        ))),
    }
}

async fn ensure_manufacturer<C: ConnectionTrait>(
    db: &C,
    manufacturer_id: i32,
) -> Result<(), ApiError> {
    manufacturer::Entity::find_by_id(manufacturer_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| {
            ApiError::BadRequest(format!("No manufacturer with {manufacturer_id} id was found"))
        })
}

/// Makes the product's feature rows match the features of `category_id`:
/// missing rows are added with an empty value, foreign ones are dropped.
pub(crate) async fn sync_features<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    category_id: i32,
) -> Result<(), ApiError> {
    let wanted: Vec<i32> = category_features(db, category_id)
        .await?
        .into_iter()
        .map(|feat| feat.id)
        .collect();

    product_feature::Entity::delete_many()
        .filter(product_feature::Column::ProductId.eq(product_id))
        .filter(product_feature::Column::FeatureId.is_not_in(wanted.clone()))
        .exec(db)
        .await?;

    let present: HashSet<i32> = product_feature::Entity::find()
        .filter(product_feature::Column::ProductId.eq(product_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.feature_id)
        .collect();

    let missing: Vec<product_feature::ActiveModel> = wanted
        .into_iter()
        .filter(|feature_id| !present.contains(feature_id))
        .map(|feature_id| product_feature::ActiveModel {
            product_id: Set(product_id),
            feature_id: Set(feature_id),
            value: Set(String::new()),
            ..Default::default()
        })
        .collect();
    if !missing.is_empty() {
        product_feature::Entity::insert_many(missing)
            .exec_without_returning(db)
            .await?;
    }
    Ok(())
}

/// Inline feature editing: values change, rows are never added or removed.
async fn set_feature_values<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    values: Vec<FeatureValue>,
) -> Result<(), ApiError> {
    for item in values {
        let row = product_feature::Entity::find()
            .filter(product_feature::Column::ProductId.eq(product_id))
            .filter(product_feature::Column::FeatureId.eq(item.feature_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "Feature {} is not attached to this product",
                    item.feature_id
                ))
            })?;
        let mut row: product_feature::ActiveModel = row.into();
        row.value = Set(item.value.trim().to_owned());
        row.update(db).await?;
    }
    Ok(())
}

async fn product_view<C: ConnectionTrait>(
    db: &C,
    prod: product::Model,
) -> Result<AdminProductView, ApiError> {
    let features = product_feature::Entity::find()
        .filter(product_feature::Column::ProductId.eq(prod.id))
        .find_also_related(crate::entities::feature::Entity)
        .order_by_asc(product_feature::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(row, feat)| {
            feat.map(|feat| FeatureInline {
                id: row.id,
                feature_id: feat.id,
                feature: feat.name,
                type_feature: feat.type_feature,
                value: row.value,
            })
        })
        .collect();

    let images = image::Entity::find()
        .filter(image::Column::ProductId.eq(prod.id))
        .order_by_asc(image::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|img| ImageInline {
            url: format!("/image/{}", img.id),
            id: img.id,
            file_name: img.file_name,
        })
        .collect();

    let category = category::Entity::find_by_id(prod.category_id)
        .one(db)
        .await?
        .map(|categ| categ.name)
        .unwrap_or_default();
    let manufacturer = manufacturer::Entity::find_by_id(prod.manufacturer_id)
        .one(db)
        .await?
        .map(|maker| maker.name)
        .unwrap_or_default();

    Ok(AdminProductView {
        product: prod,
        category,
        manufacturer,
        features,
        images,
    })
}

//Structs
#[derive(Deserialize)]
struct ProductListQuery {
    q: Option<String>,
    category: Option<i32>,
    manufacturer: Option<i32>,
    is_limited: Option<bool>,
    page: Option<String>,
}

#[derive(Deserialize, Validate, Debug)]
struct CreateProduct {
    #[validate(custom(function = "name_text"))]
    name: String,
    #[serde(default)]
    description: String,
    #[validate(range(min = 0.0))]
    price: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    count: i32,
    #[serde(default)]
    is_limited: bool,
    category_id: i32,
    manufacturer_id: i32,
    product_id: Option<Uuid>,
    added: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Validate)]
struct PatchProductPayload {
    #[validate(custom(function = "name_text"))]
    name: Option<String>,
    description: Option<String>,
    #[validate(range(min = 0.0))]
    price: Option<f64>,
    #[validate(range(min = 0))]
    count: Option<i32>,
    is_limited: Option<bool>,
    category_id: Option<i32>,
    manufacturer_id: Option<i32>,
    features: Option<Vec<FeatureValue>>,
}

#[derive(Deserialize)]
struct FeatureValue {
    feature_id: i32,
    value: String,
}

#[derive(Serialize)]
struct ProductRow {
    id: i32,
    name: String,
    price: f64,
    added: DateTime<Utc>,
    count: i32,
    category: String,
    manufacturer: String,
    is_limited: bool,
    images: usize,
}

#[derive(Serialize)]
struct ProductListResponse {
    results: Vec<ProductRow>,
    page: PageMeta,
}

#[derive(Serialize)]
struct FeatureInline {
    id: i32,
    feature_id: i32,
    feature: String,
    type_feature: FeatureType,
    value: String,
}

#[derive(Serialize)]
struct ImageInline {
    id: i32,
    file_name: String,
    url: String,
}

#[derive(Serialize)]
struct AdminProductView {
    #[serde(flatten)]
    product: product::Model,
    category: String,
    manufacturer: String,
    features: Vec<FeatureInline>,
    images: Vec<ImageInline>,
}
