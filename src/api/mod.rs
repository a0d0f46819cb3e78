pub mod admin;
pub mod public;
pub mod user;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;
use admin::admin_api_router;
use public::{public_api_router, root_router};
use user::user_api_router;

pub fn create_api_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(public_api_router())
        .merge(user_api_router(state.clone()));

    Router::new()
        .merge(root_router())
        .nest("/api", api)
        .nest("/api/admin", admin_api_router(state))
}
