use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::entities::{hash_password, user};
use crate::error::ApiError;
use crate::middleware::auth::generate_token;
use crate::state::AppState;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("username pattern is valid"));

pub fn auth_router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn health() -> &'static str {
    "Store catalog is running"
}

async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let txn = state.db.begin().await?;
    let new_user = user::ActiveModel {
        username: Set(payload.username.clone()),
        password: Set(hash_password(&payload.password)?),
        role: Set(user::Role::User),
        ..Default::default()
    };
    let result = user::Entity::insert(new_user).exec(&txn).await?;
    txn.commit().await?;

    info!(username = %payload.username, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "id": result.last_insert_id,
        })),
    ))
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let found = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .one(&state.db)
        .await?;

    let account = match found {
        Some(account) if account.check_hash(&payload.password) => account,
        _ => return Err(ApiError::Unauthorized),
    };

    let token = generate_token(
        account.id,
        account.role,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )
    .map_err(|_| ApiError::TokenGeneration)?;

    Ok(Json(json!({
        "token": token,
        "role": account.role,
    })))
}

#[derive(Deserialize, Validate)]
struct Credentials {
    #[validate(length(min = 3, max = 32), regex(path = *USERNAME_RE))]
    username: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
}
