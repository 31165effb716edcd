use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

use super::label::Label;
use crate::domain::{RecipeId, UserId};
use crate::entities::{
    ingredients, prelude::*, recipe_ingredients, recipe_tags, recipes, tags,
};

/// A recipe with the ids of its linked tags and ingredients.
#[derive(Debug, Clone)]
pub struct RecipeRow {
    pub recipe: recipes::Model,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

/// A recipe with its linked tags and ingredients loaded in full.
#[derive(Debug, Clone)]
pub struct RecipeDetailRow {
    pub recipe: recipes::Model,
    pub tags: Vec<Label>,
    pub ingredients: Vec<Label>,
}

/// Restricts a listing to recipes linked to any of the given ids.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tag_ids: Vec<i32>,
    pub ingredient_ids: Vec<i32>,
}

/// Columns to overwrite. `None` keeps the stored value; relation lists replace
/// the existing links wholesale.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<Option<String>>,
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Recipes owned by `user_id`, newest first.
    pub async fn list(&self, user_id: UserId, filter: &RecipeFilter) -> Result<Vec<RecipeRow>> {
        let mut query = Recipes::find()
            .filter(recipes::Column::UserId.eq(user_id.value()))
            .order_by_desc(recipes::Column::Id);

        if !filter.tag_ids.is_empty() {
            query = query.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_tags::Column::RecipeId)
                        .from(RecipeTags)
                        .and_where(recipe_tags::Column::TagId.is_in(filter.tag_ids.iter().copied()))
                        .to_owned(),
                ),
            );
        }

        if !filter.ingredient_ids.is_empty() {
            query = query.filter(
                recipes::Column::Id.in_subquery(
                    Query::select()
                        .column(recipe_ingredients::Column::RecipeId)
                        .from(RecipeIngredients)
                        .and_where(
                            recipe_ingredients::Column::IngredientId
                                .is_in(filter.ingredient_ids.iter().copied()),
                        )
                        .to_owned(),
                ),
            );
        }

        let recipes = query
            .all(&self.conn)
            .await
            .context("Failed to list recipes")?;

        self.attach_link_ids(recipes).await
    }

    /// A single recipe, only if `user_id` owns it.
    pub async fn get(&self, user_id: UserId, id: RecipeId) -> Result<Option<RecipeRow>> {
        let Some(recipe) = find_owned(&self.conn, user_id, id).await? else {
            return Ok(None);
        };

        Ok(self.attach_link_ids(vec![recipe]).await?.pop())
    }

    /// A single owned recipe with full tag and ingredient records.
    pub async fn get_detail(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<RecipeDetailRow>> {
        let Some(recipe) = find_owned(&self.conn, user_id, id).await? else {
            return Ok(None);
        };

        let tags = recipe
            .find_related(Tags)
            .order_by_asc(tags::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to load recipe tags")?
            .into_iter()
            .map(Label::from)
            .collect();

        let ingredients = recipe
            .find_related(Ingredients)
            .order_by_asc(ingredients::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to load recipe ingredients")?
            .into_iter()
            .map(Label::from)
            .collect();

        Ok(Some(RecipeDetailRow {
            recipe,
            tags,
            ingredients,
        }))
    }

    pub async fn create(&self, user_id: UserId, new_recipe: NewRecipe) -> Result<RecipeRow> {
        let txn = self.conn.begin().await?;

        let recipe = recipes::ActiveModel {
            user_id: Set(user_id.value()),
            title: Set(new_recipe.title),
            time_minutes: Set(new_recipe.time_minutes),
            price: Set(new_recipe.price),
            link: Set(new_recipe.link),
            image: Set(None),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert recipe")?;

        replace_tags(&txn, recipe.id, &new_recipe.tag_ids).await?;
        replace_ingredients(&txn, recipe.id, &new_recipe.ingredient_ids).await?;

        txn.commit().await?;

        Ok(RecipeRow {
            recipe,
            tag_ids: dedup(&new_recipe.tag_ids),
            ingredient_ids: dedup(&new_recipe.ingredient_ids),
        })
    }

    /// Apply `changes` to an owned recipe. Returns `None` if it is missing or
    /// belongs to someone else.
    pub async fn update(
        &self,
        user_id: UserId,
        id: RecipeId,
        changes: RecipeChanges,
    ) -> Result<Option<RecipeRow>> {
        let txn = self.conn.begin().await?;

        let Some(recipe) = find_owned(&txn, user_id, id).await? else {
            return Ok(None);
        };

        let mut active: recipes::ActiveModel = recipe.clone().into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(time_minutes) = changes.time_minutes {
            active.time_minutes = Set(time_minutes);
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(link) = changes.link {
            active.link = Set(link);
        }

        let recipe = if active.is_changed() {
            active
                .update(&txn)
                .await
                .context("Failed to update recipe")?
        } else {
            recipe
        };

        if let Some(tag_ids) = &changes.tag_ids {
            replace_tags(&txn, recipe.id, tag_ids).await?;
        }
        if let Some(ingredient_ids) = &changes.ingredient_ids {
            replace_ingredients(&txn, recipe.id, ingredient_ids).await?;
        }

        txn.commit().await?;

        self.get(user_id, id).await
    }

    /// Record a new image path and return the path it replaced.
    pub async fn set_image(
        &self,
        user_id: UserId,
        id: RecipeId,
        image: &str,
    ) -> Result<Option<(recipes::Model, Option<String>)>> {
        let Some(recipe) = find_owned(&self.conn, user_id, id).await? else {
            return Ok(None);
        };

        let previous = recipe.image.clone();
        let mut active: recipes::ActiveModel = recipe.into();
        active.image = Set(Some(image.to_string()));
        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to store recipe image")?;

        Ok(Some((updated, previous)))
    }

    /// Delete an owned recipe together with its tag and ingredient links.
    pub async fn delete(&self, user_id: UserId, id: RecipeId) -> Result<Option<recipes::Model>> {
        let txn = self.conn.begin().await?;

        let Some(recipe) = find_owned(&txn, user_id, id).await? else {
            return Ok(None);
        };

        // SQLite cascades only with foreign key enforcement on.
        replace_tags(&txn, recipe.id, &[]).await?;
        replace_ingredients(&txn, recipe.id, &[]).await?;

        Recipes::delete_by_id(recipe.id)
            .exec(&txn)
            .await
            .context("Failed to delete recipe")?;

        txn.commit().await?;
        Ok(Some(recipe))
    }

    async fn attach_link_ids(&self, recipes: Vec<recipes::Model>) -> Result<Vec<RecipeRow>> {
        if recipes.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();

        let mut tag_map: HashMap<i32, Vec<i32>> = HashMap::new();
        for link in RecipeTags::find()
            .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(recipe_tags::Column::TagId)
            .all(&self.conn)
            .await
            .context("Failed to load recipe tag links")?
        {
            tag_map.entry(link.recipe_id).or_default().push(link.tag_id);
        }

        let mut ingredient_map: HashMap<i32, Vec<i32>> = HashMap::new();
        for link in RecipeIngredients::find()
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(recipe_ingredients::Column::IngredientId)
            .all(&self.conn)
            .await
            .context("Failed to load recipe ingredient links")?
        {
            ingredient_map
                .entry(link.recipe_id)
                .or_default()
                .push(link.ingredient_id);
        }

        Ok(recipes
            .into_iter()
            .map(|recipe| RecipeRow {
                tag_ids: tag_map.remove(&recipe.id).unwrap_or_default(),
                ingredient_ids: ingredient_map.remove(&recipe.id).unwrap_or_default(),
                recipe,
            })
            .collect())
    }
}

async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
    id: RecipeId,
) -> Result<Option<recipes::Model>> {
    Recipes::find_by_id(id.value())
        .filter(recipes::Column::UserId.eq(user_id.value()))
        .one(conn)
        .await
        .context("Failed to query recipe")
}

async fn replace_tags<C: ConnectionTrait>(conn: &C, recipe_id: i32, tag_ids: &[i32]) -> Result<()> {
    RecipeTags::delete_many()
        .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await
        .context("Failed to clear recipe tags")?;

    let links: Vec<recipe_tags::ActiveModel> = dedup(tag_ids)
        .into_iter()
        .map(|tag_id| recipe_tags::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(tag_id),
        })
        .collect();

    if !links.is_empty() {
        RecipeTags::insert_many(links)
            .exec_without_returning(conn)
            .await
            .context("Failed to link recipe tags")?;
    }

    Ok(())
}

async fn replace_ingredients<C: ConnectionTrait>(
    conn: &C,
    recipe_id: i32,
    ingredient_ids: &[i32],
) -> Result<()> {
    RecipeIngredients::delete_many()
        .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
        .exec(conn)
        .await
        .context("Failed to clear recipe ingredients")?;

    let links: Vec<recipe_ingredients::ActiveModel> = dedup(ingredient_ids)
        .into_iter()
        .map(|ingredient_id| recipe_ingredients::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(ingredient_id),
        })
        .collect();

    if !links.is_empty() {
        RecipeIngredients::insert_many(links)
            .exec_without_returning(conn)
            .await
            .context("Failed to link recipe ingredients")?;
    }

    Ok(())
}

/// Sorted, duplicate-free copy of `ids`; the join tables key on (recipe, label).
fn dedup(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_sorts_and_removes_repeats() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(dedup(&[]).is_empty());
    }
}
