use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::{cart, cart::Entity as CartEntity, product};
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::services::cart_totals::{cart_entries, CartSummary};
use crate::state::AppState;

/// Upper bound for the quantity of one cart entry.
pub const MAX_QUANTITY: u32 = 10_000;

//ROUTERS
pub fn cart_router() -> Router {
    Router::new()
        .route("/cart", get(get_cart).post(add_product))
        .route("/cart/:id", patch(patch_entry).delete(remove_product))
}

async fn get_cart(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartResponse>, ApiError> {
    let txn = state.db.begin().await?;
    let rows = cart_entries(&txn, claims.user_id).await?;
    let summary = CartSummary::from_entries(&rows);

    let entries = rows
        .into_iter()
        .filter_map(|(entry, prod)| {
            prod.map(|prod| CartEntryView {
                id: entry.id,
                product_id: prod.id,
                name: prod.name,
                price: prod.price,
                quantity: entry.quantity,
            })
        })
        .collect();

    Ok(Json(CartResponse { entries, summary }))
}

async fn add_product(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddProduct>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let user_id = claims.user_id;
    let txn = state.db.begin().await?;

    product::Entity::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No product with {} id was found", payload.product_id))
        })?;

    let existing = CartEntity::find()
        .filter(cart::Column::ProductId.eq(payload.product_id))
        .filter(cart::Column::UserId.eq(user_id))
        .one(&txn)
        .await?;

    if let Some(entry) = existing {
        let quantity = entry
            .quantity
            .checked_add(payload.quantity)
            .filter(|quantity| *quantity <= MAX_QUANTITY)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Quantity cannot exceed {MAX_QUANTITY}"))
            })?;
        let mut entry: cart::ActiveModel = entry.into();
        entry.quantity = Set(quantity);
        entry.update(&txn).await?;
        txn.commit().await?;
        return Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Resource patched successfully"
            })),
        ));
    }

    let new_entry = cart::ActiveModel {
        user_id: Set(user_id),
        product_id: Set(payload.product_id),
        quantity: Set(payload.quantity),
        ..Default::default()
    };
    CartEntity::insert(new_entry).exec(&txn).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Added successfully"
        })),
    ))
}

async fn remove_product(
    Path(id): Path<i32>,
    Extension(claims): Extension<Claims>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state.db.begin().await?;
    let entry = find_entry(&txn, id, claims.user_id).await?;
    let entry: cart::ActiveModel = entry.into();
    entry.delete(&txn).await?;
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource deleted successfully"
    })))
}

async fn patch_entry(
    Path(id): Path<i32>,
    Extension(claims): Extension<Claims>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<PatchCart>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let txn = state.db.begin().await?;
    let entry = find_entry(&txn, id, claims.user_id).await?;
    let mut entry: cart::ActiveModel = entry.into();

    // zero quantity empties the slot
    if payload.quantity == 0 {
        entry.delete(&txn).await?;
    } else {
        entry.quantity = Set(payload.quantity);
        entry.update(&txn).await?;
    }
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource patched successfully"
    })))
}

async fn find_entry<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
    user_id: i32,
) -> Result<cart::Model, ApiError> {
    CartEntity::find_by_id(id)
        .filter(cart::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No related entry with {} id was found.", id)))
}

//Structs
#[derive(Deserialize, Debug, Validate)]
struct AddProduct {
    product_id: i32,
    #[validate(range(min = 1, max = 10000, message = "Quantity should be between 1 and 10000"))]
    quantity: u32,
}

#[derive(Deserialize, Validate)]
struct PatchCart {
    #[validate(range(max = 10000))]
    quantity: u32,
}

#[derive(Serialize)]
struct CartEntryView {
    id: i32,
    product_id: i32,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize)]
struct CartResponse {
    entries: Vec<CartEntryView>,
    #[serde(flatten)]
    summary: CartSummary,
}
