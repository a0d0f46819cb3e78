use axum::{
    body::Body,
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Router,
};
use sea_orm::EntityTrait;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::entities::image::Entity as ImageEntity;
use crate::error::ApiError;
use crate::state::AppState;

pub fn uploads_router() -> Router {
    Router::new().route("/image/:id", get(print_image))
}

/// Streams a stored product image.
pub async fn print_image(
    Path(id): Path<i32>,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let model = ImageEntity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found".into()))?;

    let path = state.config.upload_dir.join(model.stored_name());
    let file = tokio::fs::File::open(&path).await.map_err(|err| {
        warn!(path = %path.display(), error = %err, "Image row without file");
        ApiError::NotFound("Not found".into())
    })?;

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let body = Body::from_stream(ReaderStream::new(file));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    Ok((headers, body))
}
