use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::{Label, RecipeDetailRow, RecipeRow};
use crate::entities::recipes;
use crate::services::RecipeImage;

/// URL prefix stored media is served under.
pub const MEDIA_URL: &str = "/media";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// PATCH body: every field optional.
#[derive(Debug, Default, Deserialize)]
pub struct PatchProfileRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// PUT body: every field required.
#[derive(Debug, Deserialize)]
pub struct PutProfileRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

// ============================================================================
// Tags & ingredients
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateLabelRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LabelListQuery {
    pub assigned_only: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelDto {
    pub id: i32,
    pub name: String,
}

impl From<Label> for LabelDto {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            name: label.name,
        }
    }
}

// ============================================================================
// Recipes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

/// Body for create and full update.
#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<i32>,
    #[serde(default)]
    pub ingredients: Vec<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchRecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub link: Option<Option<String>>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<i32>>,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub title: String,
    pub tags: Vec<i32>,
    pub ingredients: Vec<i32>,
    pub time_minutes: i32,
    pub price: String,
    pub link: Option<String>,
    pub image: Option<String>,
}

impl From<RecipeRow> for RecipeDto {
    fn from(row: RecipeRow) -> Self {
        let recipe = row.recipe;
        Self {
            id: recipe.id,
            price: format_price(recipe.price),
            image: media_url(recipe.image.as_deref()),
            title: recipe.title,
            tags: row.tag_ids,
            ingredients: row.ingredient_ids,
            time_minutes: recipe.time_minutes,
            link: recipe.link,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDetailDto {
    pub id: i32,
    pub title: String,
    pub tags: Vec<LabelDto>,
    pub ingredients: Vec<LabelDto>,
    pub time_minutes: i32,
    pub price: String,
    pub link: Option<String>,
    pub image: Option<String>,
}

impl From<RecipeDetailRow> for RecipeDetailDto {
    fn from(row: RecipeDetailRow) -> Self {
        let recipes::Model {
            id,
            title,
            time_minutes,
            price,
            link,
            image,
            ..
        } = row.recipe;

        Self {
            id,
            title,
            tags: row.tags.into_iter().map(LabelDto::from).collect(),
            ingredients: row.ingredients.into_iter().map(LabelDto::from).collect(),
            time_minutes,
            price: format_price(price),
            link,
            image: media_url(image.as_deref()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImageDto {
    pub id: i32,
    pub image: Option<String>,
}

impl From<RecipeImage> for RecipeImageDto {
    fn from(image: RecipeImage) -> Self {
        Self {
            id: image.id.value(),
            image: media_url(image.image.as_deref()),
        }
    }
}

/// Render a price with exactly two decimal places.
#[must_use]
pub fn format_price(price: Decimal) -> String {
    let mut price = price.round_dp(2);
    price.rescale(2);
    price.to_string()
}

fn media_url(path: Option<&str>) -> Option<String> {
    path.map(|p| format!("{MEDIA_URL}/{p}"))
}

// ============================================================================
// System
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn price_always_has_two_decimals() {
        assert_eq!(format_price(Decimal::from(5)), "5.00");
        assert_eq!(format_price(Decimal::from_str("10.25").unwrap()), "10.25");
        assert_eq!(format_price(Decimal::from_str("3.456").unwrap()), "3.46");
    }

    #[test]
    fn patch_link_distinguishes_missing_from_null() {
        let missing: PatchRecipeRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(missing.link, None);

        let null: PatchRecipeRequest = serde_json::from_str(r#"{"link":null}"#).unwrap();
        assert_eq!(null.link, Some(None));

        let set: PatchRecipeRequest =
            serde_json::from_str(r#"{"link":"https://example.com"}"#).unwrap();
        assert_eq!(set.link, Some(Some("https://example.com".to_string())));
    }

    #[test]
    fn recipe_request_accepts_numeric_price_and_defaults_relations() {
        let req: RecipeRequest =
            serde_json::from_str(r#"{"title":"Cake","time_minutes":30,"price":5.00}"#).unwrap();
        assert_eq!(format_price(req.price), "5.00");
        assert!(req.tags.is_empty());
        assert!(req.ingredients.is_empty());
        assert_eq!(req.link, None);
    }
}
