//! Repository for account-level operations
//!
//! Owns the connection pool, hands out per-user scopes and transactions,
//! and handles user registration and credential checks.

use crate::auth::{hash_password, verify_dummy_password, verify_password};
use crate::db::models::*;
use crate::db::scope::{NewCoffee, UserScope};
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::stats::{self, Stats, StatsScope};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Shown when registering an email that is already taken
pub const EMAIL_TAKEN_MESSAGE: &str = "A user with that email already exists";

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.connection()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Scopes & Transactions
    // ========================================================================

    /// Query scope for everything owned by `user_id`
    pub fn scope(&self, user_id: Uuid) -> UserScope<'_, DatabaseConnection> {
        UserScope::new(self.conn(), user_id)
    }

    /// Start a transaction; wrap it in a `UserScope` to work on user data
    pub async fn begin(&self) -> Result<DatabaseTransaction> {
        self.conn().begin().await.map_err(Into::into)
    }

    /// Create a coffee and its related rows atomically
    pub async fn create_coffee(&self, user_id: Uuid, new: &NewCoffee) -> Result<Coffee> {
        let txn = self.begin().await?;
        let coffee = UserScope::new(&txn, user_id).create_coffee(new).await?;
        txn.commit().await?;

        Ok(coffee)
    }

    /// Counts and top-N breakdowns for a user or the whole site
    pub async fn stats(&self, scope: StatsScope, limit: u64) -> Result<Stats> {
        stats::aggregate(self.conn(), scope, limit).await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Register a new user. The email is stored lower-cased.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Result<User> {
        let email = normalize_email(email);

        if self.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Duplicate {
                message: EMAIL_TAKEN_MESSAGE.to_string(),
            });
        }

        let now = chrono::Utc::now();
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            name: Set(name.filter(|n| !n.trim().is_empty())),
            password_hash: Set(hash_password(password)?),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let user = user.insert(self.conn()).await.map_err(|e| match AppError::from(e) {
            AppError::Duplicate { .. } => AppError::Duplicate {
                message: EMAIL_TAKEN_MESSAGE.to_string(),
            },
            other => other,
        })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Find user by email, case-insensitively
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(normalize_email(email)))
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    /// Check credentials. Unknown email, inactive account and wrong password
    /// all yield the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User> {
        let user = self.find_user_by_email(email).await?;

        match user {
            Some(user) if user.is_active && verify_password(password, &user.password_hash) => {
                Ok(user)
            }
            Some(user) => {
                warn!(user_id = %user.id, "Rejected login attempt");
                Err(AppError::InvalidCredentials)
            }
            None => {
                verify_dummy_password(password);
                Err(AppError::InvalidCredentials)
            }
        }
    }
}

/// Emails are compared and stored trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
