//! Ordered route table
//!
//! Routes are compiled at registration and matched first-match-wins in
//! registration order. Static routes are also indexed by their literal text so
//! an exact hit skips scanning every literal route before it.

use super::path::{normalize_path, Params};
use super::pattern::{Classification, PatternError, PatternMatch, PatternSource, RoutePattern};
use crate::decode::PathDecodeError;
use crate::logger;
use std::collections::HashMap;

/// Registered route
#[derive(Debug)]
pub struct Route<H> {
    pattern: RoutePattern,
    handler: H,
    /// Only reachable through the exact-match index
    index_only: bool,
}

impl<H> Route<H> {
    pub const fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub const fn handler(&self) -> &H {
        &self.handler
    }
}

/// Matched route with decoded parameters
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub handler: &'a H,
    pub pattern: &'a RoutePattern,
    pub params: Params,
    /// Normalized path portion consumed by the route
    pub matched_path: String,
    /// Rest of the normalized path, empty unless the route is a prefix mount
    pub remaining_path: String,
}

/// Result of a route lookup
#[derive(Debug)]
pub enum RouteOutcome<'a, H> {
    Matched(RouteMatch<'a, H>),
    NotFound,
    /// A captured value had malformed percent-encoding (respond 400)
    BadRequest(PathDecodeError),
}

impl<'a, H> RouteOutcome<'a, H> {
    pub fn matched(self) -> Option<RouteMatch<'a, H>> {
        match self {
            Self::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Route table mapping paths to handlers
#[derive(Debug)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
    exact: HashMap<String, usize>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            exact: HashMap::new(),
        }
    }

    /// Register a full-path route
    ///
    /// Duplicate separators in a template are collapsed, as they are on lookup.
    pub fn route(
        &mut self,
        pattern: impl Into<PatternSource>,
        handler: H,
    ) -> Result<&mut Self, PatternError> {
        self.add(pattern.into(), false, handler)
    }

    /// Register a prefix mount; `/` (or empty) mounts at the root
    pub fn mount(&mut self, prefix: &str, handler: H) -> Result<&mut Self, PatternError> {
        let prefix = prefix.trim_end_matches('/');
        self.add(PatternSource::from(prefix), true, handler)
    }

    fn add(
        &mut self,
        source: PatternSource,
        is_prefix: bool,
        handler: H,
    ) -> Result<&mut Self, PatternError> {
        let source = match source {
            PatternSource::Template(text) => {
                let normalized = normalize_path(&text).into_owned();
                if normalized != text {
                    logger::log_route_normalized(&text, &normalized);
                }
                PatternSource::Template(normalized)
            }
            other => other,
        };
        let label = source.to_string();
        let pattern = RoutePattern::compile(source, is_prefix)
            .inspect_err(|e| logger::log_route_rejected(&label, e))?;

        let index = self.routes.len();
        let indexed = pattern.classification() == Classification::Static && !is_prefix;
        if indexed {
            if let PatternSource::Template(text) = pattern.source() {
                self.exact.entry(text.clone()).or_insert(index);
            }
        }
        let index_only = indexed && pattern.literal().is_some();

        logger::log_route_registered(&label, pattern.classification(), is_prefix);
        self.routes.push(Route {
            pattern,
            handler,
            index_only,
        });
        Ok(self)
    }

    /// Find the first route matching `path`
    ///
    /// Duplicate separators are collapsed before matching.
    pub fn lookup(&self, path: &str) -> RouteOutcome<'_, H> {
        let path = normalize_path(path);
        let hit = self.exact.get(path.as_ref()).copied();

        for (index, route) in self.routes.iter().enumerate() {
            if route.index_only && hit != Some(index) {
                continue;
            }
            if let Some(m) = route.pattern.captures(&path) {
                return accept(route, &path, m);
            }
        }

        RouteOutcome::NotFound
    }

    /// Returns true if `path` is a key of the exact-match index
    pub fn is_indexed(&self, path: &str) -> bool {
        self.exact.contains_key(path)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn accept<'a, H>(route: &'a Route<H>, path: &str, m: PatternMatch<'_>) -> RouteOutcome<'a, H> {
    let matched_path = m.matched.to_string();
    let remaining_path = path
        .strip_prefix(m.matched)
        .unwrap_or_default()
        .to_string();

    match Params::decode(m.captures) {
        Ok(params) => RouteOutcome::Matched(RouteMatch {
            handler: &route.handler,
            pattern: &route.pattern,
            params,
            matched_path,
            remaining_path,
        }),
        Err(err) => {
            logger::log_bad_path(path, &err);
            RouteOutcome::BadRequest(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn handler_for<'a>(router: &'a Router<&'static str>, path: &str) -> Option<&'a str> {
        router.lookup(path).matched().map(|m| *m.handler)
    }

    #[test]
    fn test_first_match_wins() {
        let mut router = Router::new();
        router
            .route("/users/:id", "by-id")
            .unwrap()
            .route("/users/me", "me")
            .unwrap()
            .route("/*", "fallback")
            .unwrap();

        assert_eq!(handler_for(&router, "/users/me"), Some("by-id"));
        assert_eq!(handler_for(&router, "/users/7"), Some("by-id"));
        assert_eq!(handler_for(&router, "/other"), Some("fallback"));
    }

    #[test]
    fn test_exact_hit_respects_earlier_dynamic_route() {
        let mut router = Router::new();
        router.route("/*", "wild").unwrap();
        router.route("/about", "about").unwrap();

        assert!(router.is_indexed("/about"));
        assert_eq!(handler_for(&router, "/about"), Some("wild"));
    }

    #[test]
    fn test_exact_hit_beats_later_routes() {
        let mut router = Router::new();
        router.route("/about", "about").unwrap();
        router.route("/about", "shadowed").unwrap();
        router.route("/:page", "page").unwrap();

        assert_eq!(handler_for(&router, "/about"), Some("about"));
        assert_eq!(handler_for(&router, "/contact"), Some("page"));
    }

    #[test]
    fn test_param_route_is_indexed_but_still_scanned() {
        // `/user/:id` is classified static and indexed under its own text
        let mut router = Router::new();
        router.route("/user/:id", "user").unwrap();

        assert!(router.is_indexed("/user/:id"));
        let m = router.lookup("/user/42").matched().unwrap();
        assert_eq!(m.params.get("id"), Some("42"));
        let m = router.lookup("/user/:id").matched().unwrap();
        assert_eq!(m.params.get("id"), Some(":id"));
    }

    #[test]
    fn test_duplicate_separators_collapsed() {
        let mut router = Router::new();
        router.route("/a/b/c", "abc").unwrap();
        assert_eq!(handler_for(&router, "/a//b///c"), Some("abc"));
    }

    #[test]
    fn test_template_separators_collapsed_at_registration() {
        let mut router = Router::new();
        router
            .route("/a//b", "ab")
            .unwrap()
            .mount("/files//img/", "img")
            .unwrap();

        assert!(router.is_indexed("/a/b"));
        assert!(!router.is_indexed("/a//b"));
        assert_eq!(handler_for(&router, "/a//b"), Some("ab"));
        assert_eq!(handler_for(&router, "/a/b"), Some("ab"));

        let m = router.lookup("/files/img/logo.png").matched().unwrap();
        assert_eq!(*m.handler, "img");
        assert_eq!(m.matched_path, "/files/img");
        assert_eq!(m.remaining_path, "/logo.png");
    }

    #[test]
    fn test_malformed_param_is_bad_request() {
        let mut router = Router::new();
        router.route("/files/:name", "file").unwrap();

        match router.lookup("/files/%zz") {
            RouteOutcome::BadRequest(PathDecodeError::MalformedEscape(raw)) => {
                assert_eq!(raw, "%zz");
            }
            other => panic!("Expected BadRequest, got {other:?}"),
        }

        let m = router.lookup("/files/a%20b").matched().unwrap();
        assert_eq!(m.params.get("name"), Some("a b"));
    }

    #[test]
    fn test_mount_remaining_path() {
        let mut router = Router::new();
        router.mount("/static/", "assets").unwrap();
        router.mount("/", "root").unwrap();

        let m = router.lookup("/static/css/site.css").matched().unwrap();
        assert_eq!(*m.handler, "assets");
        assert_eq!(m.matched_path, "/static");
        assert_eq!(m.remaining_path, "/css/site.css");

        assert_eq!(handler_for(&router, "/staticky"), Some("root"));
        assert_eq!(handler_for(&router, "/"), Some("root"));
    }

    #[test]
    fn test_regex_route() {
        let mut router = Router::new();
        router
            .route(Regex::new(r"^/v(\d+)$").unwrap(), "versioned")
            .unwrap();
        let m = router.lookup("/v3").matched().unwrap();
        assert_eq!(m.params.get("0"), Some("3"));
    }

    #[test]
    fn test_registration_error_surfaces() {
        let mut router: Router<&str> = Router::new();
        assert!(router.route("/:a/:a", "dup").is_err());
        assert!(router.is_empty());
    }

    #[test]
    fn test_not_found() {
        let mut router = Router::new();
        router.route("/only", "only").unwrap();
        assert!(matches!(router.lookup("/nope"), RouteOutcome::NotFound));
    }
}
