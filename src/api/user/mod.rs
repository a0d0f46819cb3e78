pub mod cart;
pub mod feedback;

use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;
use cart::cart_router;
use feedback::feedback_router;

pub fn user_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(cart_router())
        .merge(feedback_router())
        .route_layer(from_fn_with_state(
            AuthState {
                app: state,
                role: Role::User,
            },
            auth_middleware,
        ))
}
