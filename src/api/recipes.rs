use axum::{
    Extension, Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{
    parse_id_list, validate_link, validate_price, validate_time_minutes, validate_title,
};
use super::{
    ApiError, ApiResponse, AppJson, AppPath, AppQuery, AppState, PatchRecipeRequest,
    RecipeDetailDto, RecipeDto, RecipeImageDto, RecipeListQuery, RecipeRequest,
};
use crate::db::{NewRecipe, RecipeChanges, RecipeFilter};
use crate::domain::RecipeId;
use crate::services::{ImageUpload, RecipeError};

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::NotFound => Self::not_found(),
            RecipeError::Validation(msg) => Self::ValidationError(msg),
            RecipeError::Database(msg) => Self::DatabaseError(msg),
            RecipeError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::ValidationError(err.body_text())
        }
    }
}

/// Multipart field carrying the uploaded image
const IMAGE_FIELD: &str = "image";

fn new_recipe(payload: RecipeRequest) -> Result<NewRecipe, ApiError> {
    Ok(NewRecipe {
        title: validate_title(&payload.title)?,
        time_minutes: validate_time_minutes(payload.time_minutes)?,
        price: validate_price(payload.price)?,
        link: validate_link(payload.link)?,
        tag_ids: payload.tags,
        ingredient_ids: payload.ingredients,
    })
}

/// GET /recipe/recipes
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppQuery(query): AppQuery<RecipeListQuery>,
) -> Result<Json<ApiResponse<Vec<RecipeDto>>>, ApiError> {
    let filter = RecipeFilter {
        tag_ids: parse_id_list("tags", query.tags.as_deref().unwrap_or_default())?,
        ingredient_ids: parse_id_list(
            "ingredients",
            query.ingredients.as_deref().unwrap_or_default(),
        )?,
    };

    let rows = state.recipe_service.list_recipes(user.id, filter).await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(RecipeDto::from).collect(),
    )))
}

/// POST /recipe/recipes
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeDto>>), ApiError> {
    let recipe = new_recipe(payload)?;
    let row = state.recipe_service.create_recipe(user.id, recipe).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(row.into()))))
}

/// GET /recipe/recipes/{id}
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<RecipeId>,
) -> Result<Json<ApiResponse<RecipeDetailDto>>, ApiError> {
    let row = state.recipe_service.get_recipe(user.id, id).await?;
    Ok(Json(ApiResponse::success(row.into())))
}

/// PATCH /recipe/recipes/{id}
/// Only supplied fields change; `tags`/`ingredients`, when present, replace the links.
pub async fn patch_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<RecipeId>,
    AppJson(payload): AppJson<PatchRecipeRequest>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let changes = RecipeChanges {
        title: payload.title.as_deref().map(validate_title).transpose()?,
        time_minutes: payload.time_minutes.map(validate_time_minutes).transpose()?,
        price: payload.price.map(validate_price).transpose()?,
        link: payload.link.map(validate_link).transpose()?,
        tag_ids: payload.tags,
        ingredient_ids: payload.ingredients,
    };

    let row = state.recipe_service.update_recipe(user.id, id, changes).await?;
    Ok(Json(ApiResponse::success(row.into())))
}

/// PUT /recipe/recipes/{id}
/// Replaces every field. Omitted `tags`, `ingredients` and `link` are cleared.
pub async fn put_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<RecipeId>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let recipe = new_recipe(payload)?;
    let changes = RecipeChanges {
        title: Some(recipe.title),
        time_minutes: Some(recipe.time_minutes),
        price: Some(recipe.price),
        link: Some(recipe.link),
        tag_ids: Some(recipe.tag_ids),
        ingredient_ids: Some(recipe.ingredient_ids),
    };

    let row = state.recipe_service.update_recipe(user.id, id, changes).await?;
    Ok(Json(ApiResponse::success(row.into())))
}

/// DELETE /recipe/recipes/{id}
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<RecipeId>,
) -> Result<StatusCode, ApiError> {
    state.recipe_service.delete_recipe(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipe/recipes/{id}/upload-image
/// Multipart body with the file in the `image` field
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppPath(id): AppPath<RecipeId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<RecipeImageDto>>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::validation(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field.bytes().await?;

        upload = Some(ImageUpload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| ApiError::validation("image: No file was submitted."))?;

    let image = state.recipe_service.upload_image(user.id, id, upload).await?;
    Ok(Json(ApiResponse::success(image.into())))
}
