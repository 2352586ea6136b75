//! Prometheus metrics recording and endpoint.

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus metrics recorder and return the handle for
/// rendering. Only one recorder can exist per process; later calls get the
/// same handle.
pub fn install_prometheus_recorder() -> PrometheusHandle {
    RECORDER
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("Failed to install Prometheus recorder")
        })
        .clone()
}

/// Record one analysis request with its duration and outcome.
pub fn record_request(route: &str, duration_secs: f64, ok: bool) {
    let labels = [("route", route.to_string()), ("ok", ok.to_string())];
    metrics::counter!("analysis_requests_total", &labels).increment(1);
    metrics::histogram!("analysis_request_duration_seconds", &labels).record(duration_secs);
}

/// Record a failed analysis by error kind.
pub fn record_error(kind: &str) {
    let labels = [("kind", kind.to_string())];
    metrics::counter!("analysis_errors_total", &labels).increment(1);
}
