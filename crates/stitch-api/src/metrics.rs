//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "stitch_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "stitch_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "stitch_http_requests_in_flight";

    // Estimation metrics
    pub const DETECTION_DURATION_SECONDS: &str = "stitch_detection_duration_seconds";
    pub const ESTIMATES_TOTAL: &str = "stitch_estimates_total";
    pub const STITCHES_DETECTED_TOTAL: &str = "stitch_stitches_detected_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record how long one detection call took.
pub fn record_detection_duration(success: bool, duration_secs: f64) {
    let labels = [("success", success.to_string())];
    histogram!(names::DETECTION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the outcome of one estimate: `ok` or an error category.
pub fn record_estimate(outcome: &'static str) {
    let labels = [("outcome", outcome)];
    counter!(names::ESTIMATES_TOTAL, &labels).increment(1);
}

pub fn record_stitches_detected(count: u32) {
    counter!(names::STITCHES_DETECTED_TOTAL).increment(u64::from(count));
}

/// Metrics middleware for HTTP requests.
///
/// Labels by the matched route template so unknown paths collapse into one
/// series.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
