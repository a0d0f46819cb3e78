use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Query as SqlQuery, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{collections::HashMap, sync::Arc};

use crate::entities::{feedback, product, user};
use crate::error::ApiError;
use crate::services::{
    pagination::{paginate, PageMeta},
    sorting::newest_first,
};
use crate::state::AppState;

pub fn admin_feedback_router() -> Router {
    Router::new()
        .route("/feedback", get(list_feedback))
        .route("/feedback/:id", get(get_feedback).delete(delete_feedback))
}

async fn list_feedback(
    Query(params): Query<FeedbackListQuery>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<FeedbackList>, ApiError> {
    let txn = state.db.begin().await?;

    let mut query = feedback::Entity::find();
    if let Some(q) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        query = query.filter(feedback::Column::Text.contains(q));
    }
    if let Some(username) = params.user.as_deref().filter(|u| !u.is_empty()) {
        query = query.filter(
            feedback::Column::UserId.in_subquery(
                SqlQuery::select()
                    .column(user::Column::Id)
                    .from(user::Entity)
                    .and_where(user::Column::Username.eq(username))
                    .to_owned(),
            ),
        );
    }
    if let Some(product_id) = params.product {
        query = query.filter(feedback::Column::ProductId.eq(product_id));
    }
    let query = newest_first(query, feedback::Column::Added).order_by_desc(feedback::Column::Id);

    let (rows, page) = paginate(
        query,
        &txn,
        params.page.as_deref(),
        state.config.admin_page_size,
    )
    .await?;

    let usernames = user::Entity::find()
        .filter(user::Column::Id.is_in(rows.iter().map(|f| f.user_id).collect::<Vec<_>>()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|account| (account.id, account.username))
        .collect::<HashMap<_, _>>();
    let product_names = product::Entity::find()
        .filter(product::Column::Id.is_in(rows.iter().map(|f| f.product_id).collect::<Vec<_>>()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|prod| (prod.id, prod.name))
        .collect::<HashMap<_, _>>();

    let results = rows
        .into_iter()
        .map(|row| FeedbackRow {
            short_text: row.short_text(),
            user: usernames.get(&row.user_id).cloned().unwrap_or_default(),
            product: product_names.get(&row.product_id).cloned().unwrap_or_default(),
            id: row.id,
            added: row.added,
        })
        .collect();

    Ok(Json(FeedbackList { results, page }))
}

async fn get_feedback(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<FeedbackDetail>, ApiError> {
    let txn = state.db.begin().await?;
    let row = find_feedback(&txn, id).await?;
    let author = user::Entity::find_by_id(row.user_id).one(&txn).await?;
    let prod = product::Entity::find_by_id(row.product_id).one(&txn).await?;

    Ok(Json(FeedbackDetail {
        id: row.id,
        text: row.text,
        added: row.added,
        user: author.map(|author| author.username).unwrap_or_default(),
        product_id: row.product_id,
        product: prod.map(|prod| prod.name).unwrap_or_default(),
    }))
}

async fn delete_feedback(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state.db.begin().await?;
    let row: feedback::ActiveModel = find_feedback(&txn, id).await?.into();
    row.delete(&txn).await?;
    txn.commit().await?;

    Ok(Json(json!({
        "message": "Resource deleted successfully."
    })))
}

async fn find_feedback<C: ConnectionTrait>(db: &C, id: i32) -> Result<feedback::Model, ApiError> {
    feedback::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No feedback with {} id was found.", id)))
}

#[derive(Deserialize)]
struct FeedbackListQuery {
    q: Option<String>,
    user: Option<String>,
    product: Option<i32>,
    page: Option<String>,
}

#[derive(Serialize)]
struct FeedbackRow {
    id: i32,
    short_text: String,
    user: String,
    product: String,
    added: DateTime<Utc>,
}

#[derive(Serialize)]
struct FeedbackList {
    results: Vec<FeedbackRow>,
    page: PageMeta,
}

#[derive(Serialize)]
struct FeedbackDetail {
    id: i32,
    text: String,
    added: DateTime<Utc>,
    user: String,
    product_id: i32,
    product: String,
}
