use axum::{
    extract::{Extension, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{
    image::{self, FileExtension},
    product,
};
use crate::error::ApiError;
use crate::state::AppState;

const IMAGE_FIELD: &str = "image";

pub fn admin_image_router() -> Router {
    Router::new()
        .route("/product/:id/image", post(upload_image))
        .route("/image/:id", delete(delete_image))
}

/// Image inline of the product editor: stores one uploaded file per request.
async fn upload_image(
    Path(product_id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state.db.begin().await?;
    product::Entity::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No product with {} id was found.", product_id)))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Upload(err.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| ApiError::Upload("Missing file name".into()))?;
        let extension = extension_of(&file_name)
            .ok_or_else(|| ApiError::Upload("Unsupported file type".into()))?;
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::Upload(err.to_string()))?;
        if data.is_empty() {
            return Err(ApiError::Upload("Empty file".into()));
        }

        let new_image = image::ActiveModel {
            product_id: Set(product_id),
            file_name: Set(file_name),
            path_name: Set(Uuid::new_v4().simple().to_string()),
            extension: Set(extension),
            ..Default::default()
        };
        let created = new_image.insert(&txn).await?;

        tokio::fs::create_dir_all(&state.config.upload_dir).await?;
        tokio::fs::write(state.config.upload_dir.join(created.stored_name()), &data).await?;
        txn.commit().await?;

        info!(id = created.id, product_id, "Image uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "File uploaded successfully.",
                "id": created.id,
            })),
        ));
    }

    Err(ApiError::Upload(format!("Missing `{IMAGE_FIELD}` field")))
}

async fn delete_image(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let txn = state.db.begin().await?;
    let found = image::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No image with {} id was found.", id)))?;
    let path = state.config.upload_dir.join(found.stored_name());

    let found: image::ActiveModel = found.into();
    found.delete(&txn).await?;
    txn.commit().await?;

    if let Err(err) = tokio::fs::remove_file(&path).await {
        warn!(path = %path.display(), error = %err, "Failed to remove image file");
    }

    Ok(Json(json!({
        "message": "Resource deleted successfully."
    })))
}

fn extension_of(file_name: &str) -> Option<FileExtension> {
    let (_, extension) = file_name.rsplit_once('.')?;
    extension.parse().ok()
}
