//! Metrics and observability utilities
//!
//! Prometheus metrics with SLO-aligned histograms and standardized naming
//! conventions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use paperboard_ranking::VoteValue;
use std::time::{Duration, Instant};

/// Metrics prefix for all Paperboard metrics
pub const METRICS_PREFIX: &str = "paperboard";

/// SLO-aligned histogram buckets for request latency (in seconds)
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
];

/// Buckets for in-process scoring, which never touches the network
pub const RANKING_BUCKETS: &[f64] = &[
    0.000_05,
    0.000_1,
    0.000_25,
    0.000_5,
    0.001,
    0.002_5,
    0.005,
    0.010,
    0.025,
];

fn metric_name(suffix: &str) -> String {
    format!("{}_{}", METRICS_PREFIX, suffix)
}

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        metric_name("requests_total"),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        metric_name("request_duration_seconds"),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Ranking metrics
    describe_histogram!(
        metric_name("ranking_duration_seconds"),
        Unit::Seconds,
        "Time spent scoring and ordering candidates"
    );

    describe_gauge!(
        metric_name("ranking_candidates"),
        Unit::Count,
        "Candidate pool size handed to the ranking core"
    );

    // Vote metrics
    describe_counter!(
        metric_name("votes_total"),
        Unit::Count,
        "Votes cast, changed or retracted"
    );

    describe_counter!(
        metric_name("papers_submitted_total"),
        Unit::Count,
        "Papers accepted by the submission endpoint"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            metric_name("requests_total"),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            metric_name("request_duration_seconds"),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record one pass of the ranking core
///
/// `operation` is one of `listing`, `search`, `related`, `personalized` or
/// `network`.
pub fn record_ranking(operation: &'static str, elapsed: Duration, candidates: usize) {
    histogram!(metric_name("ranking_duration_seconds"), "operation" => operation)
        .record(elapsed.as_secs_f64());

    gauge!(metric_name("ranking_candidates"), "operation" => operation).set(candidates as f64);
}

/// Label for a vote write; `None` is a retraction
pub fn vote_direction(vote: Option<VoteValue>) -> &'static str {
    match vote {
        Some(VoteValue::Up) => "up",
        Some(VoteValue::Down) => "down",
        None => "retract",
    }
}

/// Record a vote write
pub fn record_vote(vote: Option<VoteValue>) {
    counter!(metric_name("votes_total"), "direction" => vote_direction(vote)).increment(1);
}

/// Record an accepted paper submission
pub fn record_submission() {
    counter!(metric_name("papers_submitted_total")).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        for buckets in [LATENCY_BUCKETS, RANKING_BUCKETS] {
            assert!(buckets.windows(2).all(|w| w[0] < w[1]));
        }

        // P50 and P99 targets
        assert!(LATENCY_BUCKETS.contains(&0.050));
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_vote_direction_labels() {
        assert_eq!(vote_direction(Some(VoteValue::Up)), "up");
        assert_eq!(vote_direction(Some(VoteValue::Down)), "down");
        assert_eq!(vote_direction(None), "retract");
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: every call is a no-op
        let metrics = RequestMetrics::start("GET", "/api/papers");
        metrics.finish(200);
        record_ranking("related", Duration::from_micros(120), 42);
        record_vote(None);
        record_submission();
    }
}
