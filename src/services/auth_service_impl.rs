//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{NewUser, ProfileChanges, Store, User, is_valid_email};
use crate::domain::UserId;
use crate::services::auth_service::{
    AuthError, AuthService, Profile, ProfileUpdate, Registration,
};

const MAX_EMAIL_LENGTH: usize = 255;
const MAX_NAME_LENGTH: usize = 255;
const EMAIL_TAKEN: &str = "email: user with this email already exists.";

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn check_password_length(&self, password: &str) -> Result<(), AuthError> {
        let min = self.security.min_password_length;
        if password.chars().count() < min {
            return Err(AuthError::Validation(format!(
                "password: Ensure this field has at least {min} characters."
            )));
        }
        Ok(())
    }

    async fn check_email_free(&self, email: &str, except: Option<UserId>) -> Result<(), AuthError> {
        if self.store.email_taken(email, except).await? {
            return Err(AuthError::Validation(EMAIL_TAKEN.to_string()));
        }
        Ok(())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        if new_user.email.trim().is_empty() {
            return Err(AuthError::Validation(
                "Users must have an email address".to_string(),
            ));
        }
        check_email(&new_user.email)?;
        check_max_length("name", &new_user.name, MAX_NAME_LENGTH)?;
        self.check_password_length(&new_user.password)?;
        self.check_email_free(&new_user.email, None).await?;

        let user = self
            .store
            .create_user(new_user, &self.security)
            .await
            .map_err(email_conflict)?;
        info!(user_id = %user.id, staff = user.is_staff, "Created user");
        Ok(user)
    }
}

fn require_non_blank(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!(
            "{field}: This field may not be blank."
        )));
    }
    Ok(())
}

fn check_max_length(field: &str, value: &str, max: usize) -> Result<(), AuthError> {
    if value.trim().chars().count() > max {
        return Err(AuthError::Validation(format!(
            "{field}: Ensure this field has no more than {max} characters."
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), AuthError> {
    if !is_valid_email(email) {
        return Err(AuthError::Validation(
            "email: Enter a valid email address.".to_string(),
        ));
    }
    check_max_length("email", email, MAX_EMAIL_LENGTH)
}

/// A unique violation that slipped past `check_email_free` is a duplicate sign-up.
fn email_conflict(err: anyhow::Error) -> AuthError {
    let duplicate = err
        .downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)));

    if duplicate {
        AuthError::Validation(EMAIL_TAKEN.to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<Profile, AuthError> {
        require_non_blank("email", &registration.email)?;
        require_non_blank("name", &registration.name)?;

        let user = self
            .create_user(NewUser {
                email: registration.email,
                password: registration.password,
                name: registration.name.trim().to_string(),
                is_staff: false,
                is_superuser: false,
            })
            .await?;

        Ok(Profile::from(user))
    }

    async fn create_superuser(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        self.create_user(NewUser {
            email: email.to_string(),
            password: password.to_string(),
            name: name.trim().to_string(),
            is_staff: true,
            is_superuser: true,
        })
        .await
    }

    async fn issue_token(&self, email: &str, password: &str) -> Result<String, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .store
            .verify_user_password(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.store.get_or_create_token(user.id).await?)
    }

    async fn authenticate_token(&self, key: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .get_user_by_token(key)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !user.is_active {
            return Err(AuthError::Unauthorized);
        }

        Ok(user)
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Profile, AuthError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(Profile::from(user))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<Profile, AuthError> {
        if let Some(email) = &update.email {
            require_non_blank("email", email)?;
            check_email(email)?;
            self.check_email_free(email, Some(user_id)).await?;
        }
        if let Some(name) = &update.name {
            require_non_blank("name", name)?;
            check_max_length("name", name, MAX_NAME_LENGTH)?;
        }
        if let Some(password) = &update.password {
            self.check_password_length(password)?;
        }

        let changes = ProfileChanges {
            email: update.email,
            name: update.name.map(|n| n.trim().to_string()),
            password: update.password,
        };

        let user = self
            .store
            .update_user_profile(user_id, changes, &self.security)
            .await
            .map_err(email_conflict)?
            .ok_or(AuthError::UserNotFound)?;

        info!(user_id = %user.id, "Updated profile");
        Ok(Profile::from(user))
    }
}
