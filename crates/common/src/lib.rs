//! Beans Common Library
//!
//! Shared code for the Beans gateway and import pipeline including:
//! - Database models, schema and the per-user query scope
//! - Aggregation queries
//! - Country directory
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod countries;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod stats;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository, UserScope};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
