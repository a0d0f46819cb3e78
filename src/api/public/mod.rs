pub mod auth;
pub mod catalog;
pub mod category;
pub mod popular;
pub mod product;
pub mod uploads;

use axum::Router;

use auth::auth_router;
use catalog::catalog_router;
use category::category_router;
use popular::popular_router;
use product::product_router;
use uploads::uploads_router;

/// Routes served outside `/api`.
pub fn root_router() -> Router {
    Router::new().merge(auth_router()).merge(uploads_router())
}

pub fn public_api_router() -> Router {
    Router::new()
        .merge(category_router())
        .merge(catalog_router())
        .merge(product_router())
        .merge(popular_router())
}
