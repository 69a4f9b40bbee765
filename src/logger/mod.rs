//! Logger module
//!
//! Installs the `tracing` subscriber and provides named helpers for:
//! - Route registration and rejection
//! - Proxy trust entries that could not be compiled
//! - Conditional response outcomes
//! - Query limit handling
//! - Deprecation notices

use crate::config::LoggingConfig;
use crate::decode::PathDecodeError;
use crate::proxy::RangeError;
use crate::query::QueryError;
use crate::routing::{Classification, PatternError};
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Should be called
/// once at application startup; a second call returns an error.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(config.show_target))
        .try_init()
}

pub fn log_route_registered(pattern: &str, classification: Classification, is_prefix: bool) {
    debug!(pattern, ?classification, is_prefix, "[Route] registered");
}

pub fn log_route_rejected(pattern: &str, err: &PatternError) {
    error!(pattern, %err, "[Route] rejected");
}

pub fn log_route_normalized(pattern: &str, normalized: &str) {
    warn!(pattern, normalized, "[Route] collapsed duplicate separators");
}

pub fn log_bad_path(path: &str, err: &PathDecodeError) {
    debug!(path, %err, "[Route] undecodable path parameter");
}

pub fn log_trust_entry_ignored(entry: &str, err: &RangeError) {
    warn!(entry, %err, "[Proxy] ignoring trust entry");
}

pub fn log_precondition_failed(etag: Option<&str>) {
    debug!(etag = etag.unwrap_or("-"), "[Cache] precondition failed");
}

pub fn log_response_build_error(status: &str, err: &hyper::http::Error) {
    error!(status, %err, "[Response] failed to build response");
}

pub fn log_query_truncated(limit: usize) {
    debug!(limit, "[Query] parameter limit reached, dropping the rest");
}

pub fn log_query_rejected(err: &QueryError) {
    if err.is_limit() {
        warn!(%err, "[Query] limit exceeded");
    } else {
        debug!(%err, "[Query] malformed");
    }
}

pub fn log_deprecation(key: &str, message: &str) {
    warn!(key, "[Deprecated] {message}");
}

pub fn log_state_compiled(trust: &str, query_parser: &str, etag: &str) {
    info!(trust, query_parser, etag, "[Config] application state compiled");
}
