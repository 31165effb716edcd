use axum::{Extension, Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::validate_name;
use super::{
    ApiError, ApiResponse, AppJson, AppState, CreateUserRequest, PatchProfileRequest,
    PutProfileRequest, TokenRequest, TokenResponse,
};
use crate::services::{Profile, ProfileUpdate, Registration};

/// POST /user/create
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Profile>>), ApiError> {
    let registration = Registration {
        email: payload.email,
        name: validate_name(&payload.name)?,
        password: payload.password,
    };

    let profile = state.auth_service.register(registration).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(profile))))
}

/// POST /user/token
/// Exchange email and password for the account's token
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    let token = state
        .auth_service
        .issue_token(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(TokenResponse { token })))
}

/// GET /user/me
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state.auth_service.get_profile(user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PATCH /user/me
pub async fn patch_me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<PatchProfileRequest>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let update = ProfileUpdate {
        email: payload.email,
        name: payload.name,
        password: payload.password,
    };

    let profile = state.auth_service.update_profile(user.id, update).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /user/me
pub async fn put_me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<PutProfileRequest>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let update = ProfileUpdate {
        email: Some(payload.email),
        name: Some(validate_name(&payload.name)?),
        password: Some(payload.password),
    };

    let profile = state.auth_service.update_profile(user.id, update).await?;
    Ok(Json(ApiResponse::success(profile)))
}
