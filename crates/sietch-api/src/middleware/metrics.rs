//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Admission outcomes are counted by the breeding handler. The
//! worm population gauge is refreshed on each `/metrics` scrape (pull model),
//! see the metrics handler in `lib.rs`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Outcome label for `sietch_admissions_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Accepted,
    RejectedStructural,
    RejectedTemporal,
}

impl AdmissionOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::RejectedStructural => "rejected_structural",
            Self::RejectedTemporal => "rejected_temporal",
        }
    }
}

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- HTTP middleware metrics (push model) --
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    // -- Domain metrics --
    admissions_total: IntCounterVec,
    worms_total: Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("sietch_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "sietch_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new("sietch_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let admissions_total = IntCounterVec::new(
            Opts::new("sietch_admissions_total", "Worm admission attempts by outcome"),
            &["outcome"],
        )
        .expect("metric can be created");

        let worms_total = Gauge::new("sietch_worms_total", "Worms currently in the store")
            .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_errors_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(admissions_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(worms_total.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                admissions_total,
                worms_total,
            }),
        }
    }

    /// Return current total request count (sum across all labels).
    pub fn requests(&self) -> u64 {
        sum_counters(&self.inner.http_requests_total)
    }

    /// Return current total error count (sum across all labels).
    pub fn errors(&self) -> u64 {
        sum_counters(&self.inner.http_errors_total)
    }

    /// Count of admission attempts with the given outcome.
    pub fn admissions(&self, outcome: AdmissionOutcome) -> u64 {
        self.inner
            .admissions_total
            .with_label_values(&[outcome.as_str()])
            .get()
    }

    /// Record the outcome of one admission attempt.
    pub fn record_admission(&self, outcome: AdmissionOutcome) {
        self.inner
            .admissions_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Set the worm population gauge.
    pub fn set_worms_total(&self, count: usize) {
        self.inner.worms_total.set(count as f64);
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_counters(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Middleware that records HTTP request metrics via Prometheus.
///
/// Paths are labelled with the matched route template (`/sietch/swarm/:id`),
/// never the raw URI, so identifiers cannot blow up label cardinality.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        let status = response.status().as_u16();
        m.record_request(&method, &path, status, duration);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_metrics_new_starts_at_zero() {
        let m = ApiMetrics::new();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.errors(), 0);
        assert_eq!(m.admissions(AdmissionOutcome::Accepted), 0);
    }

    #[test]
    fn request_and_error_counts_independent() {
        let m = ApiMetrics::new();
        for _ in 0..5 {
            m.record_request("GET", "/sietch/swarm", 200, 0.01);
        }
        m.record_request("POST", "/sietch/breed", 400, 0.05);
        m.record_request("DELETE", "/sietch/recycle/:id", 404, 0.01);
        assert_eq!(m.requests(), 7);
        assert_eq!(m.errors(), 2);
    }

    #[test]
    fn clone_shares_underlying_counters() {
        let m = ApiMetrics::new();
        let clone = m.clone();

        m.record_request("GET", "/", 200, 0.01);
        assert_eq!(clone.requests(), 1);

        clone.record_admission(AdmissionOutcome::RejectedTemporal);
        assert_eq!(m.admissions(AdmissionOutcome::RejectedTemporal), 1);
    }

    #[test]
    fn admissions_are_labelled_by_outcome() {
        let m = ApiMetrics::new();
        m.record_admission(AdmissionOutcome::Accepted);
        m.record_admission(AdmissionOutcome::Accepted);
        m.record_admission(AdmissionOutcome::RejectedStructural);
        assert_eq!(m.admissions(AdmissionOutcome::Accepted), 2);
        assert_eq!(m.admissions(AdmissionOutcome::RejectedStructural), 1);
        assert_eq!(m.admissions(AdmissionOutcome::RejectedTemporal), 0);
    }

    #[test]
    fn gather_and_encode_produces_text() {
        let m = ApiMetrics::new();
        m.record_request("GET", "/sietch/swarm", 200, 0.01);
        m.record_admission(AdmissionOutcome::Accepted);
        m.set_worms_total(3);
        let output = m.gather_and_encode().unwrap();
        assert!(output.contains("sietch_http_requests_total"));
        assert!(output.contains("sietch_http_request_duration_seconds"));
        assert!(output.contains("sietch_admissions_total{outcome=\"accepted\"} 1"));
        assert!(output.contains("sietch_worms_total 3"));
    }
}
