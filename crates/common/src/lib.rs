//! Paperboard Common Library
//!
//! Shared code for the Paperboard services:
//! - Database entities, repository and the `PaperStore` seam
//! - Error types and handling
//! - Configuration management
//! - Bearer-token authentication
//! - Logging setup and metrics

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use db::{PaperStore, Repository};
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
