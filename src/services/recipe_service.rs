//! Domain service for tags, ingredients and recipes.
//!
//! Every operation is scoped to the calling user. Records owned by someone
//! else behave exactly like records that do not exist.

use thiserror::Error;

use crate::db::{Label, NewRecipe, RecipeChanges, RecipeDetailRow, RecipeFilter, RecipeRow};
use crate::domain::{LabelKind, RecipeId, UserId};

/// Errors specific to recipe operations.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Result of an image upload.
#[derive(Debug, Clone)]
pub struct RecipeImage {
    pub id: RecipeId,
    pub image: Option<String>,
}

#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    async fn list_labels(
        &self,
        kind: LabelKind,
        user_id: UserId,
        assigned_only: bool,
    ) -> Result<Vec<Label>, RecipeError>;

    async fn create_label(
        &self,
        kind: LabelKind,
        user_id: UserId,
        name: &str,
    ) -> Result<Label, RecipeError>;

    /// Recipes owned by the user, newest first, matching any id in the filter.
    async fn list_recipes(
        &self,
        user_id: UserId,
        filter: RecipeFilter,
    ) -> Result<Vec<RecipeRow>, RecipeError>;

    async fn get_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<RecipeDetailRow, RecipeError>;

    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] if a tag or ingredient id is not
    /// owned by the user.
    async fn create_recipe(
        &self,
        user_id: UserId,
        recipe: NewRecipe,
    ) -> Result<RecipeRow, RecipeError>;

    /// Applies `changes`. Relation lists that are present replace the current links.
    async fn update_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
        changes: RecipeChanges,
    ) -> Result<RecipeRow, RecipeError>;

    async fn delete_recipe(&self, user_id: UserId, id: RecipeId) -> Result<(), RecipeError>;

    /// Stores an image for the recipe and returns its new path.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Validation`] if the upload is not an image.
    async fn upload_image(
        &self,
        user_id: UserId,
        id: RecipeId,
        upload: ImageUpload,
    ) -> Result<RecipeImage, RecipeError>;
}
