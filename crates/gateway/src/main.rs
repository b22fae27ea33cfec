//! Paperboard API Gateway
//!
//! The HTTP surface of the paper board.
//! Handles:
//! - Ranked listings, submissions and votes
//! - Search and search suggestions
//! - Related, network and personalized recommendations
//! - Rate limiting
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;

#[cfg(test)]
mod testing;

use anyhow::Context;
use axum::{
    error_handling::HandleErrorLayer,
    extract::FromRef,
    http::StatusCode,
    routing::{get, post},
    BoxError, Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use paperboard_common::{
    auth::JwtManager,
    config::AppConfig,
    db::{DbPool, PaperStore, Repository},
    metrics, telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::middleware::rate_limit::{rate_limit_middleware, RateLimit};

/// Application state shared across handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn PaperStore>,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn PaperStore>) -> Self {
        let jwt = JwtManager::new(&config.auth.jwt_secret, config.auth.jwt_expiration_secs);
        Self {
            config: Arc::new(config),
            store,
            jwt: Arc::new(jwt),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    telemetry::init_tracing(&config.observability);
    info!("Starting Paperboard API Gateway v{}", paperboard_common::VERSION);

    // Initialize metrics
    install_metrics_exporter(config.observability.metrics_port)?;
    metrics::register_metrics();

    // Initialize database connection
    let pool = DbPool::new(&config.database).await?;
    let store: Arc<dyn PaperStore> = Arc::new(Repository::new(pool));

    let host = config.server.host.clone();
    let port = config.server.port;

    let app = create_router(AppState::new(config, store))?;

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Serve Prometheus metrics on a dedicated port; 0 disables the exporter
fn install_metrics_exporter(port: u16) -> anyhow::Result<()> {
    if port == 0 {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], port)))
        .set_buckets_for_metric(
            Matcher::Suffix("request_duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("ranking_duration_seconds".to_string()),
            metrics::RANKING_BUCKETS,
        )?
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!(port, "Metrics exporter listening");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> anyhow::Result<Router> {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|_: BoxError| async {
            StatusCode::REQUEST_TIMEOUT
        }))
        .timeout(state.config.request_timeout());

    // API routes
    let mut api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Paper endpoints
        .route(
            "/papers",
            get(handlers::papers::list_papers).post(handlers::papers::submit_paper),
        )
        .route("/papers/{id}", get(handlers::papers::get_paper))
        .route("/papers/{id}/vote", post(handlers::papers::vote))
        .route("/tags", get(handlers::papers::list_tags))

        // Search endpoints
        .route("/search", get(handlers::search::search))
        .route("/search/suggestions", get(handlers::search::suggestions))

        // Recommendation endpoints
        .route("/recommendations/related/{id}", get(handlers::recommendations::related))
        .route("/recommendations/network/{id}", get(handlers::recommendations::network))
        .route("/recommendations/personalized", get(handlers::recommendations::personalized));

    if state.config.rate_limit.enabled {
        let limit = RateLimit::from_config(&state.config.rate_limit)?;
        api_routes = api_routes.layer(axum::middleware::from_fn_with_state(
            limit,
            rate_limit_middleware,
        ));
    }

    // Compose the app
    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(middleware::metrics::track_requests))
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
