use axum::{
    extract::{Extension, Path, Query},
    routing::get,
    Json, Router,
};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::product::{image_ids_for, CategoryRef, ProductCard};
use crate::entities::{category, feature, product};
use crate::error::ApiError;
use crate::middleware::auth::MaybeClaims;
use crate::services::{
    cart_totals::{cart_summary, CartSummary},
    navigation::{navigation, NavCategory},
    pagination::{paginate, PageMeta},
    product_filter::{self, category_features, filter_form, FilterForm},
    sorting::{sort_items, SortItem},
    url_params::CatalogParams,
};
use crate::state::AppState;

pub fn catalog_router() -> Router {
    Router::new().route("/catalog/:subcategory_slug", get(get_catalog))
}

async fn get_catalog(
    Path(subcategory_slug): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    MaybeClaims(claims): MaybeClaims,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<CatalogPage>, ApiError> {
    let params = CatalogParams::from_pairs(&pairs);
    let txn = state.db.begin().await?;

    let subcategory = find_subcategory(&txn, &subcategory_slug).await?;
    let features = category_features(&txn, subcategory.category.id).await?;

    let query = product::Entity::find()
        .filter(product::Column::CategoryId.eq(subcategory.category.id));
    let query = product_filter::apply(params.sort.apply(query), &params);
    let (products, page) = paginate(
        query,
        &txn,
        params.page.as_deref(),
        state.config.catalog_page_size,
    )
    .await?;

    let mut images = image_ids_for(&txn, products.iter().map(|p| p.id).collect()).await?;
    let products = products
        .into_iter()
        .map(|prod| {
            let image_ids = images.remove(&prod.id).unwrap_or_default();
            ProductCard::new(prod, image_ids)
        })
        .collect();

    let form = filter_form(
        &txn,
        subcategory.category.id,
        &features,
        subcategory.max_price.unwrap_or(0.0),
    )
    .await?;

    Ok(Json(CatalogPage {
        sort_options: sort_items(params.sort),
        initial: params.initial_dict(),
        navigation: navigation(&txn).await?,
        cart: cart_summary(&txn, claims.map(|c| c.user_id)).await?,
        subcategory: SubcategoryView {
            parent: subcategory.parent.map(CategoryRef::new),
            max_price: subcategory.max_price,
            category: CategoryRef::new(subcategory.category),
        },
        features,
        filter_form: form,
        products,
        page,
    }))
}

struct Subcategory {
    category: category::Model,
    parent: Option<category::Model>,
    max_price: Option<f64>,
}

/// Active subcategory by slug, with its parent and the highest product price.
async fn find_subcategory<C: ConnectionTrait>(db: &C, slug: &str) -> Result<Subcategory, ApiError> {
    let categ = category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .filter(category::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No category with slug {} was found.", slug)))?;

    let parent = match categ.parent_id {
        Some(parent_id) => category::Entity::find_by_id(parent_id).one(db).await?,
        None => None,
    };

    let max_price = product::Entity::find()
        .select_only()
        .column_as(Expr::col(product::Column::Price).max(), "max_price")
        .filter(product::Column::CategoryId.eq(categ.id))
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?
        .flatten();

    Ok(Subcategory {
        category: categ,
        parent,
        max_price,
    })
}

#[derive(Serialize)]
struct SubcategoryView {
    #[serde(flatten)]
    category: CategoryRef,
    parent: Option<CategoryRef>,
    max_price: Option<f64>,
}

#[derive(Serialize)]
struct CatalogPage {
    subcategory: SubcategoryView,
    features: Vec<feature::Model>,
    filter_form: FilterForm,
    sort_options: Vec<SortItem>,
    initial: Map<String, Value>,
    products: Vec<ProductCard>,
    page: PageMeta,
    navigation: Vec<NavCategory>,
    cart: CartSummary,
}
