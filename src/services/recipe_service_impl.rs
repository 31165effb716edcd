//! `SeaORM` implementation of the `RecipeService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{Label, NewRecipe, RecipeChanges, RecipeDetailRow, RecipeFilter, RecipeRow, Store};
use crate::domain::{LabelKind, RecipeId, UserId};
use crate::services::image::{ImageService, is_image_content_type, recipe_image_file_path};
use crate::services::recipe_service::{
    ImageUpload, RecipeError, RecipeImage, RecipeService,
};

pub struct SeaOrmRecipeService {
    store: Store,
    images: ImageService,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store, images: ImageService) -> Self {
        Self { store, images }
    }

    /// Reject ids that do not name a label owned by `user_id`.
    async fn check_owned(
        &self,
        kind: LabelKind,
        user_id: UserId,
        ids: &[i32],
    ) -> Result<(), RecipeError> {
        let missing = self.store.missing_label_ids(kind, user_id, ids).await?;
        if let Some(id) = missing.first() {
            return Err(RecipeError::Validation(format!(
                "{}: Invalid pk \"{id}\" - object does not exist.",
                kind.field()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list_labels(
        &self,
        kind: LabelKind,
        user_id: UserId,
        assigned_only: bool,
    ) -> Result<Vec<Label>, RecipeError> {
        Ok(self.store.list_labels(kind, user_id, assigned_only).await?)
    }

    async fn create_label(
        &self,
        kind: LabelKind,
        user_id: UserId,
        name: &str,
    ) -> Result<Label, RecipeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RecipeError::Validation(
                "name: This field may not be blank.".to_string(),
            ));
        }

        let label = self.store.create_label(kind, user_id, name).await?;
        info!(user_id = %user_id, kind = %kind, id = label.id, "Created label");
        Ok(label)
    }

    async fn list_recipes(
        &self,
        user_id: UserId,
        filter: RecipeFilter,
    ) -> Result<Vec<RecipeRow>, RecipeError> {
        Ok(self.store.list_recipes(user_id, &filter).await?)
    }

    async fn get_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<RecipeDetailRow, RecipeError> {
        self.store
            .get_recipe_detail(user_id, id)
            .await?
            .ok_or(RecipeError::NotFound)
    }

    async fn create_recipe(
        &self,
        user_id: UserId,
        recipe: NewRecipe,
    ) -> Result<RecipeRow, RecipeError> {
        self.check_owned(LabelKind::Tag, user_id, &recipe.tag_ids).await?;
        self.check_owned(LabelKind::Ingredient, user_id, &recipe.ingredient_ids)
            .await?;

        let row = self.store.create_recipe(user_id, recipe).await?;
        info!(user_id = %user_id, recipe_id = row.recipe.id, "Created recipe");
        Ok(row)
    }

    async fn update_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
        changes: RecipeChanges,
    ) -> Result<RecipeRow, RecipeError> {
        // A foreign recipe is a 404 even when the payload is also invalid.
        if self.store.get_recipe(user_id, id).await?.is_none() {
            return Err(RecipeError::NotFound);
        }

        if let Some(tag_ids) = &changes.tag_ids {
            self.check_owned(LabelKind::Tag, user_id, tag_ids).await?;
        }
        if let Some(ingredient_ids) = &changes.ingredient_ids {
            self.check_owned(LabelKind::Ingredient, user_id, ingredient_ids)
                .await?;
        }

        let row = self
            .store
            .update_recipe(user_id, id, changes)
            .await?
            .ok_or(RecipeError::NotFound)?;

        info!(user_id = %user_id, recipe_id = %id, "Updated recipe");
        Ok(row)
    }

    async fn delete_recipe(&self, user_id: UserId, id: RecipeId) -> Result<(), RecipeError> {
        let deleted = self
            .store
            .delete_recipe(user_id, id)
            .await?
            .ok_or(RecipeError::NotFound)?;

        if let Some(image) = &deleted.image {
            self.images.remove(image).await;
        }

        info!(user_id = %user_id, recipe_id = %id, "Deleted recipe");
        Ok(())
    }

    async fn upload_image(
        &self,
        user_id: UserId,
        id: RecipeId,
        upload: ImageUpload,
    ) -> Result<RecipeImage, RecipeError> {
        if self.store.get_recipe(user_id, id).await?.is_none() {
            return Err(RecipeError::NotFound);
        }

        if !is_image_content_type(upload.content_type.as_deref()) {
            return Err(RecipeError::Validation(
                "image: Upload a valid image. The file you uploaded was either not an image or a corrupted image.".to_string(),
            ));
        }
        if upload.bytes.is_empty() {
            return Err(RecipeError::Validation(
                "image: The submitted file is empty.".to_string(),
            ));
        }

        let relative = recipe_image_file_path(&upload.filename);
        self.images.save(&relative, &upload.bytes).await?;

        let stored = match self.store.set_recipe_image(user_id, id, &relative).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                self.images.remove(&relative).await;
                return Err(RecipeError::NotFound);
            }
            Err(e) => {
                self.images.remove(&relative).await;
                return Err(e.into());
            }
        };

        let (recipe, previous) = stored;
        if let Some(previous) = previous.filter(|p| *p != relative) {
            self.images.remove(&previous).await;
        }

        info!(user_id = %user_id, recipe_id = %id, image = %relative, "Uploaded recipe image");
        Ok(RecipeImage {
            id: RecipeId::new(recipe.id),
            image: recipe.image,
        })
    }
}
