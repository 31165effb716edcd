//! Domain service for accounts and token authentication.
//!
//! Handles sign-up, token issue, token resolution and profile edits.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::UserId;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unable to authenticate with provided credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Public view of an account. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub email: String,
    pub name: String,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

/// Sign-up payload.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Profile fields to change; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a regular account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for an empty email, blank name, short
    /// password or an email already in use.
    async fn register(&self, registration: Registration) -> Result<Profile, AuthError>;

    /// Creates an account with the staff and superuser flags set.
    async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError>;

    /// Exchanges credentials for the user's token, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email, wrong or
    /// empty password, or an inactive account.
    async fn issue_token(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Resolves a token key to an active user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] if the key is unknown or the user is inactive.
    async fn authenticate_token(&self, key: &str) -> Result<User, AuthError>;

    async fn get_profile(&self, user_id: UserId) -> Result<Profile, AuthError>;

    /// Applies profile changes, re-hashing the password when one is given.
    async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<Profile, AuthError>;
}
