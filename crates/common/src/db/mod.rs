//! Database layer for Beans
//!
//! Provides:
//! - SeaORM entity models
//! - Schema creation from the entities
//! - Repository for account-level operations
//! - `UserScope` for everything owned by a user
//! - Connection pool management

pub mod models;
mod repository;
pub mod schema;
mod scope;
mod views;

pub use repository::{normalize_email, Repository, EMAIL_TAKEN_MESSAGE};
pub use scope::{
    NewCoffee, NewRoaster, UserScope, COFFEE_EXISTS_MESSAGE, ROASTER_EXISTS_MESSAGE,
};
pub use views::{coffee_flag, CoffeeDetails, ProcessingUsage, RoasterSummary};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!(host = %config.host, database = %config.name, "Connecting to database...");

        let mut opts = ConnectOptions::new(config.connection_url());
        opts.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect: {}", e),
            })?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    /// Wrap an already established connection
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Create missing tables and indexes
    pub async fn migrate(&self) -> Result<()> {
        schema::create_schema(&self.conn).await
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })
    }
}
