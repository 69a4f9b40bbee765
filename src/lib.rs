//! Routing and request-semantics core
//!
//! Provides the pieces an HTTP request-handling layer calls into:
//! - Route template compilation and first-match-wins lookup
//! - Proxy trust compilation and forwarded-address resolution
//! - Entity tags, precondition and range freshness evaluation
//! - Query string parsing with a flat fast path
//!
//! Everything here is synchronous and free of I/O. Compiled artifacts
//! (routes, trust predicate, query parser) are built once and shared read-only.

pub mod config;
pub mod decode;
pub mod deprecation;
pub mod http;
pub mod logger;
pub mod proxy;
pub mod query;
pub mod request;
pub mod routing;

pub use config::{AppState, Settings};
pub use decode::PathDecodeError;
pub use deprecation::DeprecationRegistry;
pub use http::cache::{ConditionalVerdict, EntityTag};
pub use proxy::{TrustConfig, TrustPredicate};
pub use query::{LimitPolicy, ParsedQuery, QueryError, QueryOptions, QueryParser, QueryValue};
pub use request::RequestContext;
pub use routing::{PatternError, RouteOutcome, RoutePattern, Router};

/// Crate-level error covering configuration-time failures
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Settings(#[from] config::SettingsError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    PathDecode(#[from] PathDecodeError),
}
