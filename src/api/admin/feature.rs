use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::feature::{self, FeatureType};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::name_text;

pub fn admin_feature_router() -> Router {
    Router::new()
        .route("/feature", get(list_features).post(create_feature))
        .route("/feature/:id", patch(patch_feature).delete(delete_feature))
}

async fn list_features(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<feature::Model>>, ApiError> {
    let features = feature::Entity::find()
        .order_by_asc(feature::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(features))
}

async fn create_feature(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CreateFeature>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;
    let created = feature::ActiveModel {
        name: Set(payload.name.trim().to_owned()),
        type_feature: Set(payload.type_feature),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Feature created successfully",
            "id": created.id,
        })),
    ))
}

async fn patch_feature(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchFeature>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;
    let found = feature::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No feature with {} id was found.", id)))?;

    let mut found: feature::ActiveModel = found.into();
    if let Some(name) = payload.name {
        found.name = Set(name.trim().to_owned());
    }
    if let Some(type_feature) = payload.type_feature {
        found.type_feature = Set(type_feature);
    }
    if found.is_changed() {
        found.update(&txn).await?;
    }
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource patched successfully."
    })))
}

/// Removing a feature drops it from every category and product.
async fn delete_feature(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state.db.begin().await?;
    let result = feature::Entity::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(ApiError::NotFound(format!(
            "No feature with {} id was found.",
            id
        )));
    }
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource deleted successfully."
    })))
}

#[derive(Deserialize, Validate)]
struct CreateFeature {
    #[validate(custom(function = "name_text"))]
    name: String,
    type_feature: FeatureType,
}

#[derive(Deserialize, Validate)]
struct PatchFeature {
    #[validate(custom(function = "name_text"))]
    name: Option<String>,
    type_feature: Option<FeatureType>,
}
