//! User Directory
//!
//! Reads users by email and flips their premium flag. The billing flows
//! never create or delete users.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;

use crate::error::{BillingError, Result};
use crate::model::User;

/// User storage trait
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get user by email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Set the premium flag on a user; `UserNotFound` if the id is unknown
    async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<()>;
}

/// In-memory user store (for development)
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id.clone(), u)).collect()),
        }
    }

    /// Save or replace a user
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    /// Get user by id
    pub async fn get(&self, user_id: &str) -> Option<User> {
        self.users.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| BillingError::UserNotFound(user_id.to_string()))?;
        user.is_premium = is_premium;
        Ok(())
    }
}

/// PostgreSQL user store
///
/// Expects a `users` table with `id TEXT`, `email TEXT UNIQUE` and
/// `is_premium BOOLEAN` columns.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url`
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, is_premium FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(?e, "DB error while fetching user by email");
                BillingError::Database(e)
            })?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            is_premium: row.try_get("is_premium")?,
        }))
    }

    async fn set_premium(&self, user_id: &str, is_premium: bool) -> Result<()> {
        let result = sqlx::query("UPDATE users SET is_premium = $2 WHERE id = $1")
            .bind(user_id)
            .bind(is_premium)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(?e, user_id, "DB error while updating premium flag");
                BillingError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(BillingError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_by_email() {
        let store = MemoryUserStore::with_users([User::new("u_1", "ada@example.com")]);

        let user = store.find_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(user.id, "u_1");
        assert!(!user.is_premium);
        assert!(store.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_premium() {
        let store = MemoryUserStore::new();
        store.insert(User::new("u_1", "ada@example.com")).await;

        store.set_premium("u_1", true).await.unwrap();
        assert!(store.get("u_1").await.unwrap().is_premium);

        store.set_premium("u_1", false).await.unwrap();
        assert!(!store.get("u_1").await.unwrap().is_premium);
    }

    #[tokio::test]
    async fn test_set_premium_unknown_user() {
        let store = MemoryUserStore::new();
        let result = store.set_premium("missing", true).await;
        assert!(matches!(result, Err(BillingError::UserNotFound(_))));
    }

    /// Runs against a scratch database: `DATABASE_URL=... cargo test -- --ignored`
    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn test_pg_user_store() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let store = PgUserStore::connect(&url).await.unwrap();

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                is_premium BOOLEAN NOT NULL DEFAULT FALSE
            )",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let email = format!("{id}@example.com");
        sqlx::query("INSERT INTO users (id, email) VALUES ($1, $2)")
            .bind(&id)
            .bind(&email)
            .execute(&store.pool)
            .await
            .unwrap();

        let user = store.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(user.id, id);
        assert!(!user.is_premium);

        store.set_premium(&id, true).await.unwrap();
        assert!(store.find_by_email(&email).await.unwrap().unwrap().is_premium);

        let missing = store.set_premium("no-such-user", true).await;
        assert!(matches!(missing, Err(BillingError::UserNotFound(_))));
        assert!(store.find_by_email("nobody@example.com").await.unwrap().is_none());

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(&id)
            .execute(&store.pool)
            .await
            .unwrap();
    }
}
