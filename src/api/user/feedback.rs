use axum::{
    extract::{Extension, Host, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{EntityTrait, Set, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::api::public::product::load_detail;
use crate::entities::{feedback, product};
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::state::AppState;
use crate::validation::feedback_text;

pub fn feedback_router() -> Router {
    Router::new().route("/product/:id/feedback", post(post_feedback))
}

/// Stores a feedback from the caller and answers with the refreshed product
/// page, which counts as a view of the product like any other page render.
async fn post_feedback(
    Path(id): Path<i32>,
    Host(host): Host,
    Extension(claims): Extension<Claims>,
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewFeedback>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;

    let txn = state.db.begin().await?;
    product::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No product with {} id was found.", id)))?;

    let new_feedback = feedback::ActiveModel {
        text: Set(payload.text.trim().to_owned()),
        added: Set(Utc::now()),
        user_id: Set(claims.user_id),
        product_id: Set(id),
        ..Default::default()
    };
    feedback::Entity::insert(new_feedback).exec(&txn).await?;
    txn.commit().await?;
    info!(user_id = claims.user_id, product_id = id, "Feedback added");

    let txn = state.db.begin().await?;
    let detail = load_detail(&txn, id, Some(claims.user_id)).await?;
    drop(txn);

    if let Err(err) = state
        .cache
        .record_view(&host, &detail.product.product_id.to_string())
        .await
    {
        warn!(error = %err, product_id = id, "Failed to count product view");
    }

    Ok((StatusCode::CREATED, Json(detail)))
}

#[derive(Deserialize, Validate)]
struct NewFeedback {
    #[validate(custom(function = "feedback_text"))]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_feedback_is_invalid() {
        let blank = NewFeedback {
            text: "   \n".into(),
        };
        assert!(blank.validate().is_err());
        let fine = NewFeedback {
            text: "Works as described".into(),
        };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn overlong_feedback_is_invalid() {
        let long = NewFeedback {
            text: "a".repeat(2001),
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn length_is_checked_after_trimming() {
        let padded = NewFeedback {
            text: format!("Great{}", " ".repeat(1996)),
        };
        assert!(padded.validate().is_ok());
    }
}
