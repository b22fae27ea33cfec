//! Configuration management for Paperboard services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use paperboard_ranking::{
    ScoringWeights, DEFAULT_RELATED_LIMIT, MAX_NETWORK_CANDIDATES, MAX_PERSONALIZATION_CANDIDATES,
    MAX_RELATED_CANDIDATES,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Ranking pools, limits and weights
    #[serde(default)]
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Secret used to verify bearer tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Lifetime of tokens issued with this secret
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info", "paperboard_gateway=debug,info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name attached to every log line
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankingConfig {
    /// Rows returned by the paper listing
    #[serde(default = "default_listing_limit")]
    pub listing_limit: usize,

    /// Most recent papers considered for related-paper scoring
    #[serde(default = "default_related_pool")]
    pub related_pool_size: usize,

    /// Related papers returned when no limit is given
    #[serde(default = "default_related_limit")]
    pub default_related_limit: usize,

    /// Most recent unvoted papers considered for personalization
    #[serde(default = "default_personalization_pool")]
    pub personalization_pool_size: usize,

    /// Recommendations returned when no limit is given
    #[serde(default = "default_personalized_limit")]
    pub default_personalized_limit: usize,

    /// Tag-sharing papers drawn around a network target
    #[serde(default = "default_network_pool")]
    pub network_pool_size: usize,

    /// Search hits per page when no limit is given
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,

    /// Scoring weights
    #[serde(default)]
    pub weights: ScoringWeights,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3001 }
fn default_request_timeout() -> u64 { 30 }
fn default_database_url() -> String { "postgres://localhost/paperboard".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_jwt_secret() -> String { "change-me".to_string() }
fn default_jwt_expiration() -> u64 { 7 * 24 * 3600 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "paperboard".to_string() }
fn default_rate_limit() -> u32 { 50 }
fn default_burst() -> u32 { 100 }
fn default_enabled() -> bool { true }
fn default_listing_limit() -> usize { 50 }
fn default_related_pool() -> usize { MAX_RELATED_CANDIDATES }
fn default_related_limit() -> usize { DEFAULT_RELATED_LIMIT }
fn default_personalization_pool() -> usize { MAX_PERSONALIZATION_CANDIDATES }
fn default_personalized_limit() -> usize { 10 }
fn default_network_pool() -> usize { MAX_NETWORK_CANDIDATES }
fn default_search_limit() -> usize { 30 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            read_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_expiration_secs: default_jwt_expiration(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            listing_limit: default_listing_limit(),
            related_pool_size: default_related_pool(),
            default_related_limit: default_related_limit(),
            personalization_pool_size: default_personalization_pool(),
            default_personalized_limit: default_personalized_limit(),
            network_pool_size: default_network_pool(),
            default_search_limit: default_search_limit(),
            weights: ScoringWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.ranking.related_pool_size, 100);
        assert_eq!(config.ranking.network_pool_size, 20);
        assert_eq!(config.ranking.weights, ScoringWeights::DEFAULT);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 8088

                [ranking]
                listing_limit = 25

                [ranking.weights]
                hot_gravity = 1.5
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(|c| c.try_deserialize())
            .unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.ranking.listing_limit, 25);
        assert_eq!(config.ranking.related_pool_size, 100);
        assert_eq!(config.ranking.weights.hot_gravity, 1.5);
        assert_eq!(config.ranking.weights.related_tag_weight, 10.0);
        assert!(config.rate_limit.enabled);
    }
}
