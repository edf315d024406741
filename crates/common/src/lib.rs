//! ScholarHub Common Library
//!
//! Shared code for the ScholarHub gateway and batch jobs including:
//! - Database models and repository patterns
//! - Error types and handling
//! - Configuration management
//! - Authentication utilities
//! - Metrics and observability
//! - Statistics aggregation and the dataset similarity builder

pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod pagination;
pub mod similarity;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
