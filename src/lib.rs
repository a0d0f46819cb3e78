pub mod api;
pub mod cache;
pub mod config;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
pub mod validation;

use axum::{middleware::from_fn, Extension, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::create_api_router;
use crate::middleware::logging::logging_middleware;
use crate::state::AppState;

/// The whole HTTP surface with logging and shared state attached.
pub fn build_app(state: Arc<AppState>) -> Router {
    create_api_router(state.clone())
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
