//! Tag and ingredient endpoints. Both resources share one implementation
//! keyed by [`LabelKind`].

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{parse_flag, validate_name};
use super::{
    ApiError, ApiResponse, AppJson, AppQuery, AppState, CreateLabelRequest, LabelDto,
    LabelListQuery,
};
use crate::domain::LabelKind;

type LabelList = Json<ApiResponse<Vec<LabelDto>>>;
type CreatedLabel = (StatusCode, Json<ApiResponse<LabelDto>>);

async fn list(
    state: &AppState,
    kind: LabelKind,
    user: &CurrentUser,
    query: &LabelListQuery,
) -> Result<LabelList, ApiError> {
    let assigned_only = parse_flag("assigned_only", query.assigned_only.as_deref())?;

    let labels = state
        .recipe_service
        .list_labels(kind, user.0.id, assigned_only)
        .await?;

    Ok(Json(ApiResponse::success(
        labels.into_iter().map(LabelDto::from).collect(),
    )))
}

async fn create(
    state: &AppState,
    kind: LabelKind,
    user: &CurrentUser,
    payload: CreateLabelRequest,
) -> Result<CreatedLabel, ApiError> {
    let name = validate_name(&payload.name)?;

    let label = state
        .recipe_service
        .create_label(kind, user.0.id, &name)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(label.into()))))
}

/// GET /recipe/tags
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<LabelListQuery>,
) -> Result<LabelList, ApiError> {
    list(&state, LabelKind::Tag, &user, &query).await
}

/// POST /recipe/tags
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    AppJson(payload): AppJson<CreateLabelRequest>,
) -> Result<CreatedLabel, ApiError> {
    create(&state, LabelKind::Tag, &user, payload).await
}

/// GET /recipe/ingredients
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    AppQuery(query): AppQuery<LabelListQuery>,
) -> Result<LabelList, ApiError> {
    list(&state, LabelKind::Ingredient, &user, &query).await
}

/// POST /recipe/ingredients
pub async fn create_ingredient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    AppJson(payload): AppJson<CreateLabelRequest>,
) -> Result<CreatedLabel, ApiError> {
    create(&state, LabelKind::Ingredient, &user, payload).await
}
