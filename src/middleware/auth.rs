use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, str::FromStr, sync::Arc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::state::AppState;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid user id or role")]
    InvalidUserOrRole,
    #[error("Token expired or malformed")]
    InvalidToken,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub role: String,
    pub exp: usize,
}

#[derive(Clone)]
pub struct AuthState {
    pub app: Arc<AppState>,
    pub role: Role,
}

/// Rejects requests without a bearer token for a user holding `state.role`.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = validate_token(&state.app, token, state.role)
        .await
        .map_err(|err| {
            warn!(error = %err, "Rejected token");
            match err {
                AuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            }
        })?;
    debug!(user_id = claims.user_id, "Authenticated request");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

pub fn generate_token(
    user_id: i32,
    role: Role,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, AuthError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or(AuthError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims {
        user_id,
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::GenerationFail)
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

pub async fn validate_token(
    app: &AppState,
    token: &str,
    required: Role,
) -> Result<Claims, AuthError> {
    let claims = decode_token(token, &app.config.jwt_secret)?;
    let role = Role::from_str(&claims.role).map_err(|_| AuthError::InvalidToken)?;

    let found = UserEntity::find_by_id(claims.user_id)
        .filter(user::Column::Role.eq(role))
        .one(&app.db)
        .await?;

    match found {
        Some(_) if role.permits(required) => Ok(claims),
        _ => Err(AuthError::InvalidUserOrRole),
    }
}

/// Claims of the caller when a valid token for an existing user is present.
/// Public views use it for cart context and never reject the request.
pub struct MaybeClaims(pub Option<Claims>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeClaims {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(Extension(app)) = Extension::<Arc<AppState>>::from_request_parts(parts, state).await
        else {
            return Ok(MaybeClaims(None));
        };
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(MaybeClaims(None));
        };
        match validate_token(&app, token, Role::User).await {
            Ok(claims) => Ok(MaybeClaims(Some(claims))),
            Err(err) => {
                debug!(error = %err, "Ignoring token on public request");
                Ok(MaybeClaims(None))
            }
        }
    }
}
