//! Routing module
//!
//! Turns developer-authored route templates into matchers and resolves
//! request paths against them:
//! - Template compilation with named captures and wildcards
//! - Static/dynamic classification with an exact-match fast path
//! - Path normalization and parameter decoding

pub mod path;
pub mod pattern;
pub mod router;

pub use path::{normalize_path, Params};
pub use pattern::{Classification, PatternError, PatternSource, RoutePattern};
pub use router::{Route, RouteMatch, RouteOutcome, Router};
