//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging
//! - Connection and slot table events
//! - Sanitizer and cache decisions
//! - Access logging with multiple formats
//!
//! Everything goes through `tracing`; call sites use the named functions
//! below so message shapes live in one place.

mod format;

pub use format::AccessLogEntry;

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use crate::config::{Config, LoggingConfig, SchedulingMode};
use crate::error::StartupError;

/// Initialize the global subscriber with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> Result<(), StartupError> {
    let level = tracing::Level::from_str(&config.level)
        .map_err(|e| StartupError::Logger(format!("invalid level '{}': {e}", config.level)))?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .try_init()
        .map_err(|e| StartupError::Logger(e.to_string()))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Static file server started");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!("Document root: {}", config.files.document_root);
    tracing::info!("Cache capacity: {} files", config.files.cache_capacity);
    match config.server.mode {
        SchedulingMode::Multiplexed => {
            tracing::info!(
                "Mode: single-threaded multiplexing, {} connection slots",
                config.server.max_clients
            );
        }
        SchedulingMode::WorkerPerConnection => {
            tracing::info!("Mode: one worker per connection");
            tracing::warn!("Worker mode has no connection cap; bounded only by OS limits");
        }
    }
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr, slot: usize) {
    tracing::info!("[Connection] Accepted from {peer_addr} into slot {slot}");
}

pub fn log_worker_spawned(peer_addr: &SocketAddr) {
    tracing::info!("[Connection] Accepted from {peer_addr}, worker spawned");
}

pub fn log_connection_closed(slot: usize, reason: &str) {
    tracing::debug!("[Connection] Slot {slot} closed: {reason}");
}

pub fn log_slot_table_full(capacity: usize) {
    tracing::warn!("[Connection] All {capacity} slots busy, deferring accept");
}

pub fn log_request_line(method: &str, target: &str, keep_alive: bool) {
    tracing::debug!("[Request] {method} {target} keep-alive={keep_alive}");
}

pub fn log_request_rejected(reason: &impl std::fmt::Display) {
    tracing::warn!("[Request] Rejected: {reason}");
}

pub fn log_route_dispatch(path: &str) {
    tracing::debug!("[Route] Dispatching {path}");
}

pub fn log_file_error(path: &Path, err: &impl std::fmt::Display) {
    tracing::warn!("[File] {}: {err}", path.display());
}

pub fn log_cache_event(event: &str, path: &Path) {
    tracing::debug!("[Cache] {event}: {}", path.display());
}

pub fn log_transport_error(context: &str, err: &std::io::Error) {
    tracing::warn!("[Transport] {context}: {err}");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_signal(name: &str) {
    tracing::info!("[Signal] {name} received, shutting down");
}

pub fn log_shutdown(closed_connections: usize, released_cache_entries: usize) {
    tracing::info!(
        "[Shutdown] Closed {closed_connections} connections, released {released_cache_entries} cached files"
    );
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}
