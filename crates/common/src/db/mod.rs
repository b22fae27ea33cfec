//! Database layer for Paperboard
//!
//! Provides:
//! - SeaORM entity models
//! - The `PaperStore` seam and its Postgres `Repository`
//! - Connection pool management

pub mod models;
mod repository;
mod store;

pub use repository::Repository;
pub use store::{url_key, NewPaper, PaperSearch, PaperStore, SearchSuggestions, TagCount};

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    /// Primary connection (for writes)
    pub primary: DatabaseConnection,

    /// Read replica connection (optional)
    pub replica: Option<DatabaseConnection>,
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

impl DbPool {
    /// Create a new database pool from configuration
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to primary database...");

        let primary = Database::connect(connect_options(&config.url, config))
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to connect to primary: {}", e),
            })?;

        let replica = match config.read_url {
            Some(ref read_url) => {
                info!("Connecting to read replica...");
                let conn = Database::connect(connect_options(read_url, config))
                    .await
                    .map_err(|e| AppError::DatabaseConnection {
                        message: format!("Failed to connect to replica: {}", e),
                    })?;
                Some(conn)
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
}
