pub mod prelude;

pub mod auth_tokens;
pub mod ingredients;
pub mod recipe_ingredients;
pub mod recipe_tags;
pub mod recipes;
pub mod tags;
pub mod users;
