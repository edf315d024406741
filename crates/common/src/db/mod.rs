//! Database layer for ScholarHub
//!
//! Provides:
//! - SeaORM entity models
//! - Repository pattern for data access
//! - Connection pool management with startup retry
//! - Schema migrations

pub mod models;
mod repository;

pub use repository::{
    BookmarkKind, DatasetFilter, DatasetLinkRow, JournalFilter, NewConference, NewJournal,
    NewPaper, NewPublication, PaperFilter, PaperStatRow, ProfileUpdate, Repository, VenueTarget,
};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use backoff::{future::retry, ExponentialBackoff};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::{info, warn};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: DatabaseConnection,

    /// Read replica connection (optional)
    pub replica: Option<DatabaseConnection>,
}

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");
        let primary = connect_with_retry(&config.url, config, "primary").await?;

        let replica = match config.read_url {
            Some(ref read_url) => {
                info!("Connecting to read replica...");
                Some(connect_with_retry(read_url, config, "replica").await?)
            }
            None => None,
        };

        info!("Database connections established");

        Ok(Self { primary, replica })
    }

    /// Get the connection for reads (replica if available, otherwise primary)
    pub fn read(&self) -> &DatabaseConnection {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    /// Get the connection for writes (always primary)
    pub fn write(&self) -> &DatabaseConnection {
        &self.primary
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.primary
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Primary ping failed: {}", e),
            })?;

        if let Some(ref replica) = self.replica {
            replica
                .execute_unprepared("SELECT 1")
                .await
                .map_err(|e| AppError::DatabaseConnection {
                    message: format!("Replica ping failed: {}", e),
                })?;
        }

        Ok(())
    }

    /// Apply the SQL migrations in `migrations/` to the primary
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.primary.get_postgres_connection_pool();
        sqlx::migrate!("../../migrations")
            .run(pool)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Migration failed: {}", e),
            })?;
        info!("Migrations applied");
        Ok(())
    }
}

fn connect_options(url: &str, config: &DatabaseConfig) -> ConnectOptions {
    let mut opts = ConnectOptions::new(url);
    opts.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .sqlx_logging(false);
    opts
}

/// Connect, retrying with exponential backoff for up to `connect_retry_secs`
async fn connect_with_retry(
    url: &str,
    config: &DatabaseConfig,
    role: &'static str,
) -> Result<DatabaseConnection> {
    let opts = connect_options(url, config);
    let policy = ExponentialBackoff {
        max_elapsed_time: Some(Duration::from_secs(config.connect_retry_secs)),
        ..Default::default()
    };

    retry(policy, || async {
        Database::connect(opts.clone()).await.map_err(|e| {
            warn!(role, error = %e, "Database not reachable yet, retrying");
            backoff::Error::transient(e)
        })
    })
    .await
    .map_err(|e| AppError::DatabaseConnection {
        message: format!("Failed to connect to {}: {}", role, e),
    })
}
