use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Failed to validate: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Database error: {0}")]
    Db(DbErr),
    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
    #[error("Failed to generate token")]
    TokenGeneration,
    #[error("Upload failed: {0}")]
    Upload(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ApiError::Conflict("Resource already exists".into())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                ApiError::BadRequest("Referenced resource does not exist".into())
            }
            _ => ApiError::Db(err),
        }
    }
}

/// Error text attached to a response for the logging middleware.
#[derive(Clone, Debug)]
pub struct ErrorReport(pub String);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) | ApiError::Upload(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Db(_)
            | ApiError::PasswordHash(_)
            | ApiError::TokenGeneration
            | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(errors) => json!({
                "error": "Failed to validate",
                "fields": errors,
            }),
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => json!({
                "error": "Internal server error"
            }),
            other => json!({ "error": other.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        response
            .extensions_mut()
            .insert(ErrorReport(self.to_string()));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_details() {
        let response = ApiError::Db(DbErr::Custom("disk on fire".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert!(report.0.contains("disk on fire"));
    }

    #[test]
    fn client_errors_keep_their_status() {
        assert_eq!(
            ApiError::NotFound("missing".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Conflict("dup".into()).status(),
            StatusCode::CONFLICT
        );
    }
}
