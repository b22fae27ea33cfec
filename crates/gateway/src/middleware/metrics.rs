//! Per-request counter and latency histogram

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use paperboard_common::metrics::RequestMetrics;

/// Record every request under its route template, not the raw path
pub async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let metrics = RequestMetrics::start(request.method().as_str(), &endpoint);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}
