use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{LabelKind, RecipeId, UserId};

pub mod migrator;
pub mod repositories;

pub use repositories::label::Label;
pub use repositories::recipe::{
    NewRecipe, RecipeChanges, RecipeDetailRow, RecipeFilter, RecipeRow,
};
pub use repositories::user::{NewUser, ProfileChanges, User, is_valid_email};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    // ========== User Repository Methods ==========

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    pub async fn create_user(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn email_taken(&self, email: &str, except: Option<UserId>) -> Result<bool> {
        self.user_repo().email_taken(email, except).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn check_user_password(&self, id: UserId, password: &str) -> Result<bool> {
        self.user_repo().check_password(id, password).await
    }

    pub async fn update_user_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
        config: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().update_profile(id, changes, config).await
    }

    pub async fn get_or_create_token(&self, user_id: UserId) -> Result<String> {
        self.token_repo().get_or_create(user_id).await
    }

    pub async fn get_user_by_token(&self, key: &str) -> Result<Option<User>> {
        self.token_repo().resolve(key).await
    }

    // ========== Tag / Ingredient Repository Methods ==========

    fn label_repo(&self, kind: LabelKind) -> repositories::label::LabelRepository {
        repositories::label::LabelRepository::new(self.conn.clone(), kind)
    }

    pub async fn list_labels(
        &self,
        kind: LabelKind,
        user_id: UserId,
        assigned_only: bool,
    ) -> Result<Vec<Label>> {
        self.label_repo(kind).list(user_id, assigned_only).await
    }

    pub async fn create_label(&self, kind: LabelKind, user_id: UserId, name: &str) -> Result<Label> {
        self.label_repo(kind).create(user_id, name).await
    }

    pub async fn missing_label_ids(
        &self,
        kind: LabelKind,
        user_id: UserId,
        ids: &[i32],
    ) -> Result<Vec<i32>> {
        self.label_repo(kind).missing_ids(user_id, ids).await
    }

    // ========== Recipe Repository Methods ==========

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    pub async fn list_recipes(&self, user_id: UserId, filter: &RecipeFilter) -> Result<Vec<RecipeRow>> {
        self.recipe_repo().list(user_id, filter).await
    }

    pub async fn get_recipe(&self, user_id: UserId, id: RecipeId) -> Result<Option<RecipeRow>> {
        self.recipe_repo().get(user_id, id).await
    }

    pub async fn get_recipe_detail(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<RecipeDetailRow>> {
        self.recipe_repo().get_detail(user_id, id).await
    }

    pub async fn create_recipe(&self, user_id: UserId, recipe: NewRecipe) -> Result<RecipeRow> {
        self.recipe_repo().create(user_id, recipe).await
    }

    pub async fn update_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
        changes: RecipeChanges,
    ) -> Result<Option<RecipeRow>> {
        self.recipe_repo().update(user_id, id, changes).await
    }

    pub async fn set_recipe_image(
        &self,
        user_id: UserId,
        id: RecipeId,
        image: &str,
    ) -> Result<Option<(crate::entities::recipes::Model, Option<String>)>> {
        self.recipe_repo().set_image(user_id, id, image).await
    }

    pub async fn delete_recipe(
        &self,
        user_id: UserId,
        id: RecipeId,
    ) -> Result<Option<crate::entities::recipes::Model>> {
        self.recipe_repo().delete(user_id, id).await
    }
}
