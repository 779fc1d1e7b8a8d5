//! User record storage.
//!
//! Handlers talk to a `UserStore`. `PgUserStore` is the production
//! backend; `MemoryUserStore` backs tests and database-less local runs.

use anaya_candles_access::{Role, User};
use anaya_candles_core::UserId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Lookup and creation of user records.
///
/// Emails are stored and compared exactly as given; callers normalize.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by login email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Creates a new user, failing with `DuplicateEmail` if the email is taken.
    async fn create(&self, user: &User) -> Result<(), StoreError>;
}

/// Row type for user queries.
#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    password_hash: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, StoreError> {
        let id = UserId::from_str(&self.id).map_err(|e| StoreError::Corrupt {
            details: format!("invalid user id '{}': {}", self.id, e),
        })?;
        let role = Role::from_str(&self.role).map_err(|e| StoreError::Corrupt {
            details: format!("user '{}': {}", self.id, e),
        })?;

        Ok(User::with_all_fields(
            id,
            self.name,
            self.email,
            self.password_hash,
            role,
            self.created_at,
            self.updated_at,
        ))
    }
}

/// PostgreSQL-backed user store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Creates a new user store over a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::try_into_user).transpose()
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id().to_string())
        .bind(user.name())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.role().as_str())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateEmail {
                    email: user.email().to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory user store keyed by email.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn create(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(user.email()) {
            return Err(StoreError::DuplicateEmail {
                email: user.email().to_string(),
            });
        }
        users.insert(user.email().to_string(), user.clone());
        Ok(())
    }
}
