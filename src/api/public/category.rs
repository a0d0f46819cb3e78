use axum::{extract::Extension, routing::get, Json, Router};
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::navigation::{navigation, NavCategory};
use crate::state::AppState;

pub fn category_router() -> Router {
    Router::new().route("/category", get(get_categories))
}

/// Navigation tree of active categories.
async fn get_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<NavCategory>>, ApiError> {
    Ok(Json(navigation(&state.db).await?))
}
