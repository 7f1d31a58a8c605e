//! Test fixtures: in-memory SQLite database with the production schema

use crate::db::models::User;
use crate::db::{DbPool, NewCoffee, Repository};
use chrono::NaiveDate;
use sea_orm::{ConnectOptions, Database};

/// Fresh in-memory database with all tables created.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn test_pool() -> DbPool {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let conn = Database::connect(opts)
        .await
        .expect("in-memory sqlite should open");

    let pool = DbPool::from_connection(conn);
    pool.migrate().await.expect("schema should be created");
    pool
}

pub async fn test_repository() -> Repository {
    Repository::new(test_pool().await)
}

/// Register a user with the password "password123"
pub async fn create_user(repo: &Repository, email: &str) -> User {
    repo.create_user(email, TEST_PASSWORD, None)
        .await
        .expect("test user should be created")
}

pub const TEST_PASSWORD: &str = "password123";

/// Washed coffee roasted by "Friedhats" on 2022-03-03, no rating or notes
pub fn new_coffee(name: &str, country: &str) -> NewCoffee {
    NewCoffee {
        name: name.to_string(),
        country: country.to_string(),
        processing: "Washed".to_string(),
        roaster: "Friedhats".to_string(),
        roasting_date: NaiveDate::from_ymd_opt(2022, 3, 3).expect("valid date"),
        rating: None,
        variety: None,
        tasting_notes: Vec::new(),
    }
}
