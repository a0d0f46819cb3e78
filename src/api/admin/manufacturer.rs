use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::{manufacturer, product};
use crate::error::ApiError;
use crate::services::pagination::{paginate, PageMeta};
use crate::state::AppState;
use crate::validation::name_text;

pub fn admin_manufacturer_router() -> Router {
    Router::new()
        .route(
            "/manufacturer",
            get(list_manufacturers).post(create_manufacturer),
        )
        .route(
            "/manufacturer/:id",
            get(get_manufacturer)
                .patch(patch_manufacturer)
                .delete(delete_manufacturer),
        )
}

async fn list_manufacturers(
    Query(params): Query<SearchQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ManufacturerList>, ApiError> {
    let mut query = manufacturer::Entity::find().order_by_asc(manufacturer::Column::Name);
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        query = query.filter(manufacturer::Column::Name.contains(q));
    }
    let (results, page) = paginate(
        query,
        &state.db,
        params.page.as_deref(),
        state.config.admin_page_size,
    )
    .await?;
    Ok(Json(ManufacturerList { results, page }))
}

async fn create_manufacturer(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ManufacturerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;
    let created = manufacturer::ActiveModel {
        name: Set(payload.name.trim().to_owned()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Manufacturer created successfully",
            "id": created.id,
        })),
    ))
}

async fn get_manufacturer(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<manufacturer::Model>, ApiError> {
    Ok(Json(find_manufacturer(&state.db, id).await?))
}

async fn patch_manufacturer(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ManufacturerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;
    let mut maker: manufacturer::ActiveModel = find_manufacturer(&txn, id).await?.into();
    maker.name = Set(payload.name.trim().to_owned());
    maker.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource patched successfully."
    })))
}

async fn delete_manufacturer(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state.db.begin().await?;
    let maker = find_manufacturer(&txn, id).await?;
    let products = product::Entity::find()
        .filter(product::Column::ManufacturerId.eq(id))
        .count(&txn)
        .await?;
    if products > 0 {
        return Err(ApiError::Conflict(format!(
            "Manufacturer still has {products} products"
        )));
    }

    let maker: manufacturer::ActiveModel = maker.into();
    maker.delete(&txn).await?;
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource deleted successfully."
    })))
}

async fn find_manufacturer<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<manufacturer::Model, ApiError> {
    manufacturer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No manufacturer with {} id was found.", id)))
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
    page: Option<String>,
}

#[derive(Deserialize, Validate)]
struct ManufacturerPayload {
    #[validate(custom(function = "name_text"))]
    name: String,
}

#[derive(Serialize)]
struct ManufacturerList {
    results: Vec<manufacturer::Model>,
    page: PageMeta,
}
