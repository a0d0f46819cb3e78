pub mod category;
pub mod feature;
pub mod feedback;
pub mod image;
pub mod manufacturer;
pub mod product;

use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

use category::admin_category_router;
use feature::admin_feature_router;
use feedback::admin_feedback_router;
use image::admin_image_router;
use manufacturer::admin_manufacturer_router;
use product::admin_product_router;

use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};
use crate::state::AppState;

pub fn admin_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(admin_category_router())
        .merge(admin_feature_router())
        .merge(admin_product_router())
        .merge(admin_image_router())
        .merge(admin_manufacturer_router())
        .merge(admin_feedback_router())
        .route_layer(from_fn_with_state(
            AuthState {
                app: state,
                role: Role::Admin,
            },
            auth_middleware,
        ))
}
