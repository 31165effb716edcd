use anyhow::{Context, Result};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::HashSet;

use crate::domain::{LabelKind, UserId};
use crate::entities::{ingredients, prelude::*, recipe_ingredients, recipe_tags, tags};

/// A tag or an ingredient. Both are a name owned by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: i32,
    pub name: String,
}

impl From<tags::Model> for Label {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<ingredients::Model> for Label {
    fn from(model: ingredients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

pub struct LabelRepository {
    conn: DatabaseConnection,
    kind: LabelKind,
}

impl LabelRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, kind: LabelKind) -> Self {
        Self { conn, kind }
    }

    /// Labels owned by `user_id`, ordered by name descending.
    /// With `assigned_only`, only labels linked to at least one recipe.
    pub async fn list(&self, user_id: UserId, assigned_only: bool) -> Result<Vec<Label>> {
        let labels = match self.kind {
            LabelKind::Tag => {
                let mut query = Tags::find().filter(tags::Column::UserId.eq(user_id.value()));
                if assigned_only {
                    query = query.filter(
                        tags::Column::Id.in_subquery(
                            Query::select()
                                .column(recipe_tags::Column::TagId)
                                .from(RecipeTags)
                                .to_owned(),
                        ),
                    );
                }
                query
                    .order_by_desc(tags::Column::Name)
                    .all(&self.conn)
                    .await
                    .context("Failed to list tags")?
                    .into_iter()
                    .map(Label::from)
                    .collect()
            }
            LabelKind::Ingredient => {
                let mut query = Ingredients::find()
                    .filter(ingredients::Column::UserId.eq(user_id.value()));
                if assigned_only {
                    query = query.filter(
                        ingredients::Column::Id.in_subquery(
                            Query::select()
                                .column(recipe_ingredients::Column::IngredientId)
                                .from(RecipeIngredients)
                                .to_owned(),
                        ),
                    );
                }
                query
                    .order_by_desc(ingredients::Column::Name)
                    .all(&self.conn)
                    .await
                    .context("Failed to list ingredients")?
                    .into_iter()
                    .map(Label::from)
                    .collect()
            }
        };

        Ok(labels)
    }

    pub async fn create(&self, user_id: UserId, name: &str) -> Result<Label> {
        let label = match self.kind {
            LabelKind::Tag => tags::ActiveModel {
                name: Set(name.to_string()),
                user_id: Set(user_id.value()),
                ..Default::default()
            }
            .insert(&self.conn)
            .await
            .context("Failed to insert tag")?
            .into(),
            LabelKind::Ingredient => ingredients::ActiveModel {
                name: Set(name.to_string()),
                user_id: Set(user_id.value()),
                ..Default::default()
            }
            .insert(&self.conn)
            .await
            .context("Failed to insert ingredient")?
            .into(),
        };

        Ok(label)
    }

    /// Ids from `ids` that do not name a label owned by `user_id`, in input order.
    pub async fn missing_ids(&self, user_id: UserId, ids: &[i32]) -> Result<Vec<i32>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let owned: HashSet<i32> = match self.kind {
            LabelKind::Tag => Tags::find()
                .select_only()
                .column(tags::Column::Id)
                .filter(tags::Column::UserId.eq(user_id.value()))
                .filter(tags::Column::Id.is_in(ids.iter().copied()))
                .into_tuple::<i32>()
                .all(&self.conn)
                .await
                .context("Failed to check tag ownership")?,
            LabelKind::Ingredient => Ingredients::find()
                .select_only()
                .column(ingredients::Column::Id)
                .filter(ingredients::Column::UserId.eq(user_id.value()))
                .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
                .into_tuple::<i32>()
                .all(&self.conn)
                .await
                .context("Failed to check ingredient ownership")?,
        }
        .into_iter()
        .collect();

        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !owned.contains(id) && seen.insert(*id))
            .collect())
    }
}
