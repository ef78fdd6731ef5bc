/// Metrics and telemetry for the Wisper server
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts
/// - Vote engine activity
/// - Notification emission and fan-out outcomes
/// - Live WebSocket connections

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    // ========== Vote Engine Metrics ==========

    /// Votes recorded by type (no-op repeat casts excluded)
    pub static ref VOTES_CAST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "votes_cast_total",
        "Total number of votes recorded",
        &["vote_type"]
    )
    .unwrap();

    /// Votes retracted
    pub static ref VOTES_RETRACTED_TOTAL: IntCounter = register_int_counter!(
        "votes_retracted_total",
        "Total number of votes retracted"
    )
    .unwrap();

    // ========== Notification Metrics ==========

    /// Notifications appended to the durable log, by kind
    pub static ref NOTIFICATIONS_EMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "notifications_emitted_total",
        "Total number of notifications emitted",
        &["kind"]
    )
    .unwrap();

    /// Notifications delivered to a live channel
    pub static ref PUSH_DELIVERED_TOTAL: IntCounter = register_int_counter!(
        "push_delivered_total",
        "Total number of notifications pushed to a live channel"
    )
    .unwrap();

    /// Notifications that missed the live channel (kept for pull)
    pub static ref PUSH_MISSED_TOTAL: IntCounter = register_int_counter!(
        "push_missed_total",
        "Total number of notifications with no reachable live channel"
    )
    .unwrap();

    // ========== Connection Metrics ==========

    /// Currently registered WebSocket connections
    pub static ref WS_CONNECTIONS_ACTIVE: IntGauge = register_int_gauge!(
        "ws_connections_active",
        "Number of currently registered WebSocket connections"
    )
    .unwrap();
}

/// Axum middleware recording per-request counters
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();

    response
}

/// Render all registered metrics in Prometheus text exposition format
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Handler for GET /metrics
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [("content-type", "text/plain; version=0.0.4")],
        render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_registered_metrics() {
        PUSH_MISSED_TOTAL.inc();
        let output = render();
        assert!(output.contains("push_missed_total"));
    }
}
