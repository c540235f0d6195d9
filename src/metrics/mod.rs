//! Prometheus metrics for the search core.
//!
//! Collectors are process-wide and always safe to record into; they only
//! appear in [`gather_text`] output once [`init_metrics`] has registered them.
//!
//! # Example
//! ```no_run
//! use pinboard_search::metrics::{self, SEARCH_REQUESTS_TOTAL};
//!
//! metrics::init_metrics().ok();
//! SEARCH_REQUESTS_TOTAL.with_label_values(&["hit"]).inc();
//! println!("{}", metrics::gather_text());
//! ```

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Gauge, Histogram, HistogramOpts, Opts, Registry};

const NAMESPACE: &str = "pinboard_search";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Search calls by outcome
    ///
    /// Labels: outcome (hit, miss, error)
    pub static ref SEARCH_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_requests_total", "Total number of search calls")
            .namespace(NAMESPACE),
        &["outcome"]
    ).expect("Failed to create SEARCH_REQUESTS_TOTAL metric");

    /// Duration of the cache-miss pipeline in seconds
    pub static ref SEARCH_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "search_duration_seconds",
            "Search pipeline duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
    ).expect("Failed to create SEARCH_DURATION_SECONDS metric");

    /// Result cache entries after the last write or sweep
    pub static ref SEARCH_CACHE_ENTRIES: Gauge = Gauge::with_opts(
        Opts::new("search_cache_entries", "Number of cached search results")
            .namespace(NAMESPACE)
    ).expect("Failed to create SEARCH_CACHE_ENTRIES metric");

    /// Searches that returned without facets or suggestions because of a store fault
    ///
    /// Labels: component (facets, suggestions)
    pub static ref SEARCH_DEGRADED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_degraded_total", "Total number of degraded search components")
            .namespace(NAMESPACE),
        &["component"]
    ).expect("Failed to create SEARCH_DEGRADED_TOTAL metric");

    /// Analytics events handed to the sink
    pub static ref ANALYTICS_EVENTS_FLUSHED_TOTAL: Counter = Counter::with_opts(
        Opts::new("analytics_events_flushed_total", "Total number of analytics events flushed")
            .namespace(NAMESPACE)
    ).expect("Failed to create ANALYTICS_EVENTS_FLUSHED_TOTAL metric");
}

/// Register all collectors with [`PROMETHEUS_REGISTRY`].
///
/// Fails with `AlreadyReg` when called twice in one process.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_CACHE_ENTRIES.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_DEGRADED_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(ANALYTICS_EVENTS_FLUSHED_TOTAL.clone()))?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Render the registry in the Prometheus text exposition format
pub fn gather_text() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
