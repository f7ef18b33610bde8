use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder once per process. Later calls reuse it, so tests
/// can build as many routers as they like.
fn recorder_handle() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            // Use default buckets to avoid API differences across crate versions.
            match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => {
                    describe_all();
                    handle
                }
                Err(e) => {
                    // Someone else owns the global recorder; expose an empty local one.
                    tracing::warn!(error = %e, "prometheus recorder already installed");
                    PrometheusBuilder::new().build_recorder().handle()
                }
            }
        })
        .clone()
}

fn describe_all() {
    describe_counter!("aggregator_requests_total", "Aggregation requests served.");
    describe_counter!(
        "aggregator_request_failures_total",
        "Aggregation requests aborted by an orchestration error."
    );
    describe_histogram!(
        "aggregator_request_duration_ms",
        "End-to-end aggregation time in milliseconds."
    );
    describe_histogram!("aggregator_fanout_ms", "Fan-out wall time in milliseconds.");
    describe_counter!("aggregator_cache_hits_total", "Fresh cache hits.");
    describe_counter!("aggregator_cache_misses_total", "Cache misses (live fetch attempted).");
    describe_counter!(
        "aggregator_cache_fallbacks_total",
        "Failed live fetches answered from a stale cache entry."
    );
    describe_counter!(
        "aggregator_fetch_errors_total",
        "Failed live fetches with no cache entry to fall back to."
    );
    describe_counter!(
        "aggregator_parse_errors_total",
        "Source bodies that were empty or not valid JSON."
    );
    describe_gauge!("aggregator_cache_ttl_secs", "Configured cache freshness window.");
}

impl Metrics {
    /// Initialize Prometheus recorder and expose a static gauge for the cache TTL.
    pub fn init(ttl_secs: u64) -> Self {
        let handle = recorder_handle();
        gauge!("aggregator_cache_ttl_secs").set(ttl_secs as f64);
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
