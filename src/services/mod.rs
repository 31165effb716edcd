pub mod auth_service;
pub use auth_service::{AuthError, AuthService, Profile, ProfileUpdate, Registration};

pub mod auth_service_impl;
pub use auth_service_impl::SeaOrmAuthService;

pub mod image;
pub use image::ImageService;

pub mod recipe_service;
pub use recipe_service::{ImageUpload, RecipeError, RecipeImage, RecipeService};

pub mod recipe_service_impl;
pub use recipe_service_impl::SeaOrmRecipeService;
