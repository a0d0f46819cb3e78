use axum::{
    extract::{Extension, Host},
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{error, warn};
use uuid::Uuid;

use super::product::{image_ids_for, CategoryRef, ProductCard};
use crate::entities::{category, product};
use crate::error::ApiError;
use crate::middleware::auth::MaybeClaims;
use crate::services::{
    cart_totals::{cart_summary, CartSummary},
    navigation::{navigation, NavCategory},
};
use crate::state::AppState;

pub fn popular_router() -> Router {
    Router::new().route("/popular", get(get_popular))
}

async fn get_popular(
    Host(host): Host,
    MaybeClaims(claims): MaybeClaims,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<PopularPage>, ApiError> {
    let popular_range = match state.cache.popular_ids(&host).await {
        Ok(ids) => ids,
        Err(err) => {
            error!("Error connection to Redis | {err}");
            warn!("not cache popular product");
            Vec::new()
        }
    };
    let ranked = rank_ids(&popular_range);

    let txn = state.db.begin().await?;
    let rows = if ranked.is_empty() {
        Vec::new()
    } else {
        product::Entity::find()
            .find_also_related(category::Entity)
            .filter(product::Column::ProductId.is_in(ranked.keys().copied().collect::<Vec<_>>()))
            .filter(category::Column::IsActive.eq(true))
            .all(&txn)
            .await?
    };

    let mut images = image_ids_for(&txn, rows.iter().map(|(p, _)| p.id).collect()).await?;
    let mut popular_products: Vec<PopularProduct> = rows
        .into_iter()
        .filter_map(|(prod, categ)| {
            let categ = categ?;
            let image_ids = images.remove(&prod.id).unwrap_or_default();
            Some(PopularProduct {
                rank: ranked.get(&prod.product_id).copied().unwrap_or(usize::MAX),
                category: CategoryRef::new(categ),
                product: ProductCard::new(prod, image_ids),
            })
        })
        .collect();
    popular_products.sort_by_key(|item| item.rank);

    Ok(Json(PopularPage {
        popular_products,
        navigation: navigation(&txn).await?,
        cart: cart_summary(&txn, claims.map(|c| c.user_id)).await?,
    }))
}

/// Position of each valid product id in the cached list, first occurrence wins.
fn rank_ids(raw: &[String]) -> HashMap<Uuid, usize> {
    let mut ranked = HashMap::new();
    for (position, id) in raw.iter().enumerate() {
        if let Ok(id) = Uuid::parse_str(id.trim()) {
            ranked.entry(id).or_insert(position);
        }
    }
    ranked
}

#[derive(Serialize)]
struct PopularProduct {
    #[serde(skip)]
    rank: usize,
    #[serde(flatten)]
    product: ProductCard,
    category: CategoryRef,
}

#[derive(Serialize)]
struct PopularPage {
    popular_products: Vec<PopularProduct>,
    navigation: Vec<NavCategory>,
    cart: CartSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_cache_order_and_skips_garbage() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let ranked = rank_ids(&[
            first.to_string(),
            "not-a-uuid".to_string(),
            second.to_string(),
            first.to_string(),
        ]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[&first], 0);
        assert_eq!(ranked[&second], 2);
    }
}
