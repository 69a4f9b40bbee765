//! Process-wide query parser selection

use super::{parse, parse_flat, ParsedQuery, QueryError, QueryOptions};
use std::fmt;
use std::sync::Arc;

type ParseFn = dyn Fn(&str) -> Result<ParsedQuery, QueryError> + Send + Sync;

/// Query parser chosen once from configuration and shared by every request
#[derive(Clone)]
pub enum QueryParser {
    /// Flat parser for every query
    Simple(QueryOptions),
    /// Flat fast path with nested fallback
    Extended(QueryOptions),
    /// Queries are never parsed
    Disabled,
    /// Caller-supplied parser used in place of the built-in ones
    Custom(Arc<ParseFn>),
}

impl QueryParser {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<ParsedQuery, QueryError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn parse(&self, raw: &str) -> Result<ParsedQuery, QueryError> {
        match self {
            Self::Simple(options) => parse_flat(raw, options),
            Self::Extended(options) => parse(raw, options),
            Self::Disabled => Ok(ParsedQuery::new()),
            Self::Custom(f) => f(raw),
        }
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::Extended(QueryOptions::default())
    }
}

impl fmt::Debug for QueryParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(options) => f.debug_tuple("Simple").field(options).finish(),
            Self::Extended(options) => f.debug_tuple("Extended").field(options).finish(),
            Self::Disabled => f.write_str("Disabled"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
