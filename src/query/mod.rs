//! Query string parsing
//!
//! Short queries without nesting syntax take the flat parser; everything
//! else goes through the nested parser. Both produce the same result for
//! input the flat parser accepts.

mod extended;
mod parser;
mod simple;
mod value;

pub use extended::parse_nested;
pub use parser::QueryParser;
pub use simple::parse_flat;
pub use value::{ParsedQuery, QueryValue};

use crate::logger;
use serde::Deserialize;
use thiserror::Error;

/// Longest query (in characters) eligible for the flat parser
pub const FAST_PATH_MAX_LEN: usize = 128;

/// What to do when a parsing limit is exceeded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// Keep parsing with the excess folded or dropped
    #[default]
    Truncate,
    /// Fail with a limit error
    Reject,
}

/// Nested parser limits and syntax switches
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Bracket segments turned into nesting levels
    pub depth: usize,
    /// Highest bracket index treated as an array position
    pub array_limit: usize,
    /// Pairs read before the rest is dropped
    pub parameter_limit: usize,
    pub delimiter: char,
    /// Treat `a.b` as `a[b]`
    pub allow_dots: bool,
    /// Reject keys with an unterminated `[`
    pub strict: bool,
    pub on_limit: LimitPolicy,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            depth: 5,
            array_limit: 20,
            parameter_limit: 1000,
            delimiter: '&',
            allow_dots: true,
            strict: false,
            on_limit: LimitPolicy::Truncate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query nesting deeper than {depth} levels")]
    DepthExceeded { depth: usize },
    #[error("array index above limit {limit}")]
    ArrayLimitExceeded { limit: usize },
    #[error("more than {limit} query parameters")]
    ParameterLimitExceeded { limit: usize },
    #[error("unterminated '[' in query key '{key}'")]
    Malformed { key: String },
}

impl QueryError {
    /// Limit violation as opposed to a syntax error
    pub const fn is_limit(&self) -> bool {
        !matches!(self, Self::Malformed { .. })
    }
}

/// Parse a query string, choosing the flat parser when it suffices
pub fn parse(raw: &str, options: &QueryOptions) -> Result<ParsedQuery, QueryError> {
    let parsed = if is_fast_path_eligible(raw) {
        parse_flat(raw, options)
    } else {
        parse_nested(raw, options)
    };
    if let Err(err) = &parsed {
        logger::log_query_rejected(err);
    }
    parsed
}

/// True if the flat parser yields the full result for `raw`
pub fn is_fast_path_eligible(raw: &str) -> bool {
    (raw.len() <= FAST_PATH_MAX_LEN || raw.chars().count() <= FAST_PATH_MAX_LEN)
        && !raw.contains(|c: char| c == '[' || c == '.')
        && !contains_ignore_case(raw, b"%5b")
        && !contains_ignore_case(raw, b"%2e")
}

fn contains_ignore_case(haystack: &str, needle: &[u8]) -> bool {
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle))
}

/// Split into raw `(key, value)` pairs, dropping empty parts
///
/// A pair splits at `]=` when a `[` precedes it, otherwise at the first `=`.
pub(crate) fn split_pairs<'a>(
    raw: &'a str,
    options: &QueryOptions,
) -> Result<Vec<(&'a str, &'a str)>, QueryError> {
    let limit = options.parameter_limit;
    let mut parts = raw.split(options.delimiter);
    let kept: Vec<&str> = parts.by_ref().take(limit).collect();

    if parts.next().is_some() {
        if options.on_limit == LimitPolicy::Reject {
            return Err(QueryError::ParameterLimitExceeded { limit });
        }
        logger::log_query_truncated(limit);
    }

    Ok(kept
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(split_pair)
        .collect())
}

fn split_pair(part: &str) -> (&str, &str) {
    let split_at = part
        .find("]=")
        .filter(|&at| part[..at].contains('['))
        .map(|at| at + 1)
        .or_else(|| part.find('='));
    match split_at {
        Some(at) => (&part[..at], &part[at + 1..]),
        None => (part, ""),
    }
}
