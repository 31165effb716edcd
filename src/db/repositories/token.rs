use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::user::User;
use crate::domain::UserId;
use crate::entities::{auth_tokens, users};

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Return the user's token, creating one on first use.
    /// Concurrent first logins converge on whichever row was inserted first.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<String> {
        if let Some(key) = self.find_key(user_id).await? {
            return Ok(key);
        }

        let token = auth_tokens::ActiveModel {
            key: Set(generate_token_key()),
            user_id: Set(user_id.value()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        auth_tokens::Entity::insert(token)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(auth_tokens::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert auth token")?;

        self.find_key(user_id)
            .await?
            .context("Auth token missing after insert")
    }

    async fn find_key(&self, user_id: UserId) -> Result<Option<String>> {
        let token = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::UserId.eq(user_id.value()))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?;

        Ok(token.map(|t| t.key))
    }

    /// Resolve a token key to the user that owns it
    pub async fn resolve(&self, key: &str) -> Result<Option<User>> {
        let row = auth_tokens::Entity::find_by_id(key.to_string())
            .find_also_related(users::Entity)
            .one(&self.conn)
            .await
            .context("Failed to query user by token")?;

        Ok(row.and_then(|(_, user)| user).map(User::from))
    }
}

/// Generate a random token key (40 character hex string)
#[must_use]
pub fn generate_token_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 20] = rng.random();

    bytes.iter().fold(String::with_capacity(40), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
