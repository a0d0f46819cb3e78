use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::product::sync_features;
use crate::entities::{
    category::{self, Entity as CategoryEntity},
    category_feature, feature, product,
};
use crate::error::ApiError;
use crate::services::product_filter::category_features;
use crate::state::AppState;
use crate::validation::name_text;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid"));

//ROUTERS
pub fn admin_category_router() -> Router {
    Router::new()
        .route("/category", get(list_categories).post(create_category))
        .route(
            "/category/:id",
            get(admin_get_category)
                .patch(patch_category)
                .delete(delete_category),
        )
}

//ROUTES
async fn list_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<category::Model>>, ApiError> {
    let categories = CategoryEntity::find()
        .order_by_asc(category::Column::Level)
        .order_by_asc(category::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(categories))
}

async fn create_category(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateCategory>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;

    let level = match payload.parent_id {
        Some(parent_id) => {
            ensure_root(&txn, parent_id).await?;
            category::SUBCATEGORY_LEVEL
        }
        None => category::ROOT_LEVEL,
    };

    let created = category::ActiveModel {
        name: Set(payload.name.trim().to_owned()),
        slug: Set(payload.slug),
        parent_id: Set(payload.parent_id),
        level: Set(level),
        is_active: Set(payload.is_active.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    link_features(&txn, created.id, &payload.feature_ids).await?;
    txn.commit().await?;

    info!(id = created.id, slug = %created.slug, "Category created");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Category created successfully",
            "id": created.id,
        })),
    ))
}

async fn admin_get_category(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<CategoryView>, ApiError> {
    let txn = state.db.begin().await?;
    let categ = find_category(&txn, id).await?;
    let features = category_features(&txn, id).await?;
    Ok(Json(CategoryView {
        category: categ,
        features,
    }))
}

async fn patch_category(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchCategory>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;
    let mut categ: category::ActiveModel = find_category(&txn, id).await?.into();

    if let Some(name) = payload.name {
        categ.name = Set(name.trim().to_owned());
    }
    if let Some(slug) = payload.slug {
        categ.slug = Set(slug);
    }
    if let Some(is_active) = payload.is_active {
        categ.is_active = Set(is_active);
    }
    if categ.is_changed() {
        categ.update(&txn).await?;
    }

    if let Some(feature_ids) = payload.feature_ids {
        category_feature::Entity::delete_many()
            .filter(category_feature::Column::CategoryId.eq(id))
            .exec(&txn)
            .await?;
        link_features(&txn, id, &feature_ids).await?;

        // keep the inline feature rows of every product in step
        let product_ids: Vec<i32> = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|prod| prod.id)
            .collect();
        for product_id in product_ids {
            sync_features(&txn, product_id, id).await?;
        }
    }
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource patched successfully."
    })))
}

async fn delete_category(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state.db.begin().await?;
    let categ = find_category(&txn, id).await?;

    let products = product::Entity::find()
        .filter(product::Column::CategoryId.eq(id))
        .count(&txn)
        .await?;
    let children = CategoryEntity::find()
        .filter(category::Column::ParentId.eq(id))
        .count(&txn)
        .await?;
    if products > 0 || children > 0 {
        return Err(ApiError::Conflict(
            "Category still has products or subcategories".into(),
        ));
    }

    let categ: category::ActiveModel = categ.into();
    categ.delete(&txn).await?;
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource deleted successfully."
    })))
}

//HELPERS
async fn find_category<C: ConnectionTrait>(db: &C, id: i32) -> Result<category::Model, ApiError> {
    CategoryEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No category with {} id was found.", id)))
}

async fn ensure_root<C: ConnectionTrait>(db: &C, parent_id: i32) -> Result<(), ApiError> {
    match CategoryEntity::find_by_id(parent_id).one(db).await? {
        Some(parent) if parent.level == category::ROOT_LEVEL => Ok(()),
        Some(_) => Err(ApiError::BadRequest(
            "Subcategories cannot have children".into(),
        )),
        None => Err(ApiError::BadRequest(format!(
            "No category with {parent_id} id was found"
        ))),
    }
}

async fn link_features<C: ConnectionTrait>(
    db: &C,
    category_id: i32,
    feature_ids: &[i32],
) -> Result<(), ApiError> {
    let mut feature_ids = feature_ids.to_vec();
    feature_ids.sort_unstable();
    feature_ids.dedup();
    if feature_ids.is_empty() {
        return Ok(());
    }

    let known = feature::Entity::find()
        .filter(feature::Column::Id.is_in(feature_ids.clone()))
        .count(db)
        .await?;
    if known != feature_ids.len() as u64 {
        return Err(ApiError::BadRequest("Unknown feature id".into()));
    }

    let links = feature_ids
        .into_iter()
        .map(|feature_id| category_feature::ActiveModel {
            category_id: Set(category_id),
            feature_id: Set(feature_id),
        });
    category_feature::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

//Struct
#[derive(Deserialize, Validate, Debug)]
struct CreateCategory {
    #[validate(custom(function = "name_text"))]
    name: String,
    #[validate(length(min = 1, max = 255), regex(path = *SLUG_RE))]
    slug: String,
    parent_id: Option<i32>,
    is_active: Option<bool>,
    #[serde(default)]
    feature_ids: Vec<i32>,
}

#[derive(Deserialize, Validate)]
struct PatchCategory {
    #[validate(custom(function = "name_text"))]
    name: Option<String>,
    #[validate(length(min = 1, max = 255), regex(path = *SLUG_RE))]
    slug: Option<String>,
    is_active: Option<bool>,
    feature_ids: Option<Vec<i32>>,
}

#[derive(Serialize)]
struct CategoryView {
    #[serde(flatten)]
    category: category::Model,
    features: Vec<feature::Model>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_words_joined_by_dashes() {
        assert!(SLUG_RE.is_match("electric-kettles"));
        assert!(SLUG_RE.is_match("tv2"));
        assert!(!SLUG_RE.is_match("Electric Kettles"));
        assert!(!SLUG_RE.is_match("-kettles"));
        assert!(!SLUG_RE.is_match("kettles--steel"));
    }
}
