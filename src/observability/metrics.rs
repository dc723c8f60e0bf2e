//! Metrics collection and exposition.
//!
//! # Metrics
//! - `doppler_requests_total` (counter): requests seen by the classifier, by `matched`
//! - `doppler_classifications_total` (counter): matches by `source`, `intent`
//! - `doppler_events_total` (counter): event lifecycle by `outcome`
//!   (queued, dropped, sent, failed)
//! - `doppler_event_dispatch_duration_seconds` (histogram): collector round trip
//! - `doppler_filter_reloads_total` (counter): reloads by `outcome`
//! - `doppler_active_filters` (gauge): size of the active filter set
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so tests need no setup

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(matched: bool) {
    counter!("doppler_requests_total", "matched" => matched.to_string()).increment(1);
}

pub fn record_classification(source: &str, intent: &'static str) {
    counter!(
        "doppler_classifications_total",
        "source" => source.to_string(),
        "intent" => intent
    )
    .increment(1);
}

pub fn record_event(outcome: &'static str) {
    counter!("doppler_events_total", "outcome" => outcome).increment(1);
}

pub fn record_dispatch_duration(start: Instant) {
    histogram!("doppler_event_dispatch_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_filter_reload(outcome: &'static str) {
    counter!("doppler_filter_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_active_filters(count: usize) {
    gauge!("doppler_active_filters").set(count as f64);
}
