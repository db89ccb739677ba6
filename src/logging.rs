//! Structured logging utilities for the overlay pipeline.
//!
//! This module provides helper functions for consistent, structured
//! logging across the crate using the `tracing` crate.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr tracing subscriber for the overlay session.
///
/// `RUST_LOG` overrides `fallback_filter` when set. Safe to call more than
/// once; later calls are no-ops.
pub fn init_tracing(fallback_filter: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback_filter.into()),
        )
        .with(fmt_layer)
        .try_init();
}

/// Log a source file fetch starting.
pub fn log_fetching_source(uri: &str) {
    tracing::debug!(uri, "Fetching source file");
}

/// Log a source file that could not be retrieved.
pub fn log_source_unavailable(uri: &str, reason: &str) {
    tracing::warn!(uri, reason, "Source file unavailable");
}

/// Log a source map that could not be loaded or parsed.
pub fn log_source_map_failed(uri: &str, reason: &str) {
    tracing::warn!(uri, reason, "Source map unavailable");
}

/// Log a data: source map payload that claims to be a map but is not.
pub fn log_source_map_invalid(uri: &str, reason: &str) {
    tracing::error!(uri, reason, "Invalid source map payload");
}

/// Log a diagnostic that matched no known location family.
pub fn log_unparseable_diagnostic(module: &str) {
    tracing::debug!(module, "Diagnostic location not recognized");
}

/// Log stack resolution start.
pub fn log_resolving_frames(count: usize) {
    tracing::debug!(frames = count, "Resolving stack frames");
}

/// Log the event stream connecting.
pub fn log_stream_connecting(url: &str) {
    tracing::info!(url, "Connecting to event stream");
}

/// Log an event stream failure before a reconnect attempt.
pub fn log_stream_error(reason: &str, retry_ms: u64) {
    tracing::warn!(reason, retry_ms, "Event stream error, reconnecting");
}

/// Log a confirmed reconnection.
pub fn log_stream_reconnected() {
    tracing::info!("Event stream reconnected");
}

/// Log an inbound message that was not valid JSON.
pub fn log_message_parse_failed(reason: &str) {
    tracing::warn!(reason, "Ignoring unparseable event message");
}

/// Log a bridge event queued before the surface was ready.
pub fn log_event_queued(kind: &str, pending: usize) {
    tracing::debug!(kind, pending, "Overlay surface not ready, event queued");
}

/// Log the pending queue flushing after the readiness signal.
pub fn log_queue_flushed(count: usize) {
    tracing::debug!(count, "Flushed pending overlay events");
}

/// Log the overlay surface closing.
pub fn log_surface_closed() {
    tracing::info!("Overlay surface closed");
}
