//! Prometheus metrics for the poll loop
//!
//! This module tracks:
//! - Polls by outcome and their latency
//! - Announcements and status events published
//! - Publish failures and the current watermark
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails or never happens, recording becomes a no-op.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

struct PollMetrics {
    polls: CounterVec,
    poll_latency: Histogram,
    announcements: Counter,
    status_events: Counter,
    publish_failures: Counter,
    watermark: Gauge,
}

static POLL_METRICS: OnceLock<PollMetrics> = OnceLock::new();

static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Register all metrics in the default registry
///
/// Safe to call more than once; only the first call registers anything.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = PollMetrics {
        polls: register_counter_vec!(
            "sentinel_polls_total",
            "Total polls of the announcements endpoint by outcome",
            &["outcome"]
        )?,
        poll_latency: register_histogram!(
            "sentinel_poll_latency_seconds",
            "Announcements request latency in seconds",
            vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0, 5.0]
        )?,
        announcements: register_counter!(
            "sentinel_announcements_total",
            "Total new announcements detected"
        )?,
        status_events: register_counter!(
            "sentinel_status_events_total",
            "Total status events published for failed polls"
        )?,
        publish_failures: register_counter!(
            "sentinel_publish_failures_total",
            "Total events that could not be broadcast"
        )?,
        watermark: register_gauge!(
            "sentinel_watermark",
            "Current dedup watermark of this instance"
        )?,
    };

    POLL_METRICS
        .set(metrics)
        .map_err(|_| "Poll metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record one poll attempt
pub fn record_poll(outcome: &str, latency_ms: f64) {
    if let Some(m) = POLL_METRICS.get() {
        m.polls.with_label_values(&[outcome]).inc();
        m.poll_latency.observe(latency_ms / 1000.0);
    }
}

/// Record a detected announcement, whether or not it reached subscribers
pub fn record_announcement() {
    if let Some(m) = POLL_METRICS.get() {
        m.announcements.inc();
    }
}

/// Record a published status event
pub fn record_status_event() {
    if let Some(m) = POLL_METRICS.get() {
        m.status_events.inc();
    }
}

/// Record a failed broadcast
pub fn record_publish_failure() {
    if let Some(m) = POLL_METRICS.get() {
        m.publish_failures.inc();
    }
}

/// Set the watermark gauge
pub fn set_watermark(watermark: i64) {
    if let Some(m) = POLL_METRICS.get() {
        m.watermark.set(watermark as f64);
    }
}
