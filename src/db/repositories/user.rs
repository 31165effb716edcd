use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::domain::UserId;
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            email: model.email,
            name: model.name,
            is_active: model.is_active,
            is_staff: model.is_staff,
            is_superuser: model.is_superuser,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Fields for a new account. The password is hashed before it is stored.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Profile fields to overwrite; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user, hashing the password off the async runtime.
    pub async fn create(&self, new_user: NewUser, config: &SecurityConfig) -> Result<User> {
        let email = normalize_email(&new_user.email);
        let password = new_user.password;
        let config = config.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            email: Set(email),
            name: Set(new_user.name),
            password_hash: Set(password_hash),
            is_active: Set(true),
            is_staff: Set(new_user.is_staff),
            is_superuser: Set(new_user.is_superuser),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(User::from(model))
    }

    /// Get user by email, ignoring case
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .find_model_by_email(email)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Whether another account already uses this email (case-insensitive).
    pub async fn email_taken(&self, email: &str, except: Option<UserId>) -> Result<bool> {
        let mut query = users::Entity::find().filter(email_matches(email));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id.value()));
        }

        let count = query
            .count(&self.conn)
            .await
            .context("Failed to check email uniqueness")?;

        Ok(count > 0)
    }

    /// Verify credentials and return the user they belong to.
    /// Note: This uses `spawn_blocking` because Argon2 hashing is CPU-intensive
    /// and would block the async runtime if run directly.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = self
            .find_model_by_email(email)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || verify_hash(&password, &password_hash))
            .await
            .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    /// Apply profile changes, re-hashing the password when one is supplied.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
        config: &SecurityConfig,
    ) -> Result<Option<User>> {
        let Some(user) = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();

        if let Some(email) = changes.email {
            active.email = Set(normalize_email(&email));
        }
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(password) = changes.password {
            let config = config.clone();
            let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
                .await
                .context("Password hashing task panicked")??;
            active.password_hash = Set(new_hash);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update user profile")?;

        Ok(Some(User::from(updated)))
    }

    /// Check a plaintext password against the stored hash for a user id.
    pub async fn check_password(&self, id: UserId, password: &str) -> Result<bool> {
        let Some(user) = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password check")?
        else {
            return Ok(false);
        };

        let password = password.to_string();
        task::spawn_blocking(move || verify_hash(&password, &user.password_hash))
            .await
            .context("Password verification task panicked")?
    }

    async fn find_model_by_email(&self, email: &str) -> Result<Option<users::Model>, sea_orm::DbErr> {
        users::Entity::find()
            .filter(email_matches(email))
            .one(&self.conn)
            .await
    }
}

fn email_matches(email: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(users::Column::Email))).eq(email.trim().to_lowercase())
}

/// Lowercase the domain part of an email address, keeping the local part as typed.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Loose shape check: a local part, an `@`, and a dotted domain without whitespace.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.chars().any(char::is_whitespace)
        && email.rsplit_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
}

/// Hash a password using Argon2id with optional custom params.
/// If config is None, uses the crate's default params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against a PHC-formatted hash.
/// The params encoded in the hash are used, so older hashes keep verifying.
pub fn verify_hash(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
