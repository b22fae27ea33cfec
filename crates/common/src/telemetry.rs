//! Logging setup shared by Paperboard binaries

use crate::config::ObservabilityConfig;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `observability.log_level` when set. Calling this twice
/// is harmless; the second install is ignored.
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_ok() {
        tracing::info!(service = %config.service_name, "Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let config = ObservabilityConfig {
            log_level: "not a valid directive ===".to_string(),
            json_logging: false,
            ..Default::default()
        };
        init_tracing(&config);
        init_tracing(&config);
    }
}
