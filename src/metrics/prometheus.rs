use anyhow::{Context, Result};
use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus HTTP exporter on the given port.
/// After this call, any metrics recorded via the `metrics` crate
/// macros (counter!, histogram!) are automatically exported at /metrics.
pub fn init_metrics_server(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("failed to start Prometheus metrics server")
}

// ── Market data ─────────────────────────────────────────────────

pub fn record_listings_fetch(outcome: &str) {
    counter!("listings_fetch_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_listings_latency(latency_ms: f64) {
    histogram!("listings_fetch_latency_ms").record(latency_ms);
}

pub fn record_cache(endpoint: &str, hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("query_cache_total", "endpoint" => endpoint.to_string(), "outcome" => outcome)
        .increment(1);
}

// ── Session ──────────────────────────────────────────────────────

pub fn record_url_rewrite() {
    counter!("url_rewrites_total").increment(1);
}

/// A response arrived for a query that had already been superseded.
pub fn record_stale_response() {
    counter!("stale_responses_total").increment(1);
}

pub fn record_export(rows: usize) {
    counter!("csv_exports_total").increment(1);
    histogram!("csv_export_rows").record(rows as f64);
}
