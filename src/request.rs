//! Per-request context
//!
//! Carries the matched path parameters and the raw query. The query is
//! parsed on first access with the configured parser and cached for the
//! rest of the request.

use crate::config::AppState;
use crate::query::{ParsedQuery, QueryError};
use crate::routing::Params;
use once_cell::unsync::OnceCell;
use std::panic::Location;

const PARAM_DEPRECATION: &str =
    "RequestContext::param is deprecated, use params().get() or query() instead";

pub struct RequestContext<'a> {
    state: &'a AppState,
    path: String,
    params: Params,
    raw_query: Option<String>,
    query: OnceCell<ParsedQuery>,
}

impl<'a> RequestContext<'a> {
    pub fn new(state: &'a AppState, path: &str, params: Params, raw_query: Option<&str>) -> Self {
        Self {
            state,
            path: path.to_string(),
            params,
            raw_query: raw_query.map(String::from),
            query: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn params(&self) -> &Params {
        &self.params
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    pub const fn state(&self) -> &'a AppState {
        self.state
    }

    /// Parsed query, computed on first call
    ///
    /// A failed parse is not cached; the next call parses again.
    pub fn query(&self) -> Result<&ParsedQuery, QueryError> {
        self.query.get_or_try_init(|| {
            self.state
                .query_parser
                .parse(self.raw_query.as_deref().unwrap_or(""))
        })
    }

    /// Look `name` up in the path parameters, then the query
    ///
    /// Warns once per call site.
    #[deprecated(note = "use `params().get()` or `query()` instead")]
    #[track_caller]
    pub fn param(&self, name: &str) -> Option<&str> {
        let caller = Location::caller();
        let key = format!(
            "param@{}:{}:{}",
            caller.file(),
            caller.line(),
            caller.column()
        );
        self.state.deprecations.warn_once(&key, PARAM_DEPRECATION);

        if let Some(value) = self.params.get(name) {
            return Some(value);
        }
        self.query().ok()?.get_str(name)
    }
}
