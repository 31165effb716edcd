use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::db::User;
use crate::services::AuthError;

/// The authenticated caller, inserted into request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::ValidationError(err.to_string()),
            AuthError::UserNotFound => Self::NotFound("User not found".to_string()),
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Unauthorized => Self::Unauthorized("Invalid token.".to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

/// Authentication middleware that accepts:
/// 1. `Authorization: Token <key>` header
/// 2. `Authorization: Bearer <key>` header
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let Some(key) = extract_token(&headers) else {
        return Err(ApiError::unauthorized(
            "Authentication credentials were not provided.",
        ));
    };

    let user = state.auth_service.authenticate_token(&key).await?;

    tracing::Span::current().record("user_id", user.id.value());
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Extract the token key from the `Authorization` header
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("Authorization")?.to_str().ok()?;

    let (scheme, key) = auth_str.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let key = key.trim();
    (!key.is_empty()).then(|| key.to_string())
}
