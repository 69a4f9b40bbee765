// Application state module
// Holds the compiled settings shared read-only by every request

use std::sync::Arc;

use super::types::{EtagSetting, Settings};
use super::SettingsError;
use crate::deprecation::DeprecationRegistry;
use crate::logger;
use crate::proxy::{self, TrustPredicate};
use crate::query::QueryParser;
use crate::request::RequestContext;
use crate::routing::Params;

/// Application state
pub struct AppState {
    pub settings: Settings,
    pub trust: TrustPredicate,
    pub query_parser: QueryParser,
    pub etag: EtagSetting,
    pub deprecations: Arc<DeprecationRegistry>,
}

impl AppState {
    /// Compile trust predicate, query parser and `ETag` mode once
    pub fn new(settings: &Settings) -> Result<Self, SettingsError> {
        let query_parser = settings.query.compile()?;
        let trust = proxy::compile(settings.proxy.trust.to_trust_config());
        logger::log_state_compiled(
            &format!("{trust:?}"),
            settings.query.parser.label(),
            settings.http.etag.label(),
        );

        Ok(Self {
            settings: settings.clone(),
            trust,
            query_parser,
            etag: settings.http.etag,
            deprecations: Arc::new(DeprecationRegistry::new()),
        })
    }

    /// Share a registry, e.g. the process-wide one
    #[must_use]
    pub fn with_deprecations(mut self, registry: Arc<DeprecationRegistry>) -> Self {
        self.deprecations = registry;
        self
    }

    /// Replace the configured trust with a custom predicate
    #[must_use]
    pub fn with_trust(mut self, trust: TrustPredicate) -> Self {
        self.trust = trust;
        self
    }

    /// Replace the configured parser, e.g. with [`QueryParser::Custom`]
    #[must_use]
    pub fn with_query_parser(mut self, parser: QueryParser) -> Self {
        self.query_parser = parser;
        self
    }

    /// Client address behind the trusted proxies
    pub fn client_addr(&self, socket_addr: &str, x_forwarded_for: Option<&str>) -> String {
        proxy::client_addr(socket_addr, x_forwarded_for, &self.trust)
    }

    /// `ETag` header value for a response body, if generation is on
    pub fn etag_for(&self, body: &[u8]) -> Option<String> {
        self.etag.generate(body)
    }

    /// Per-request view over this state
    pub fn request<'a>(
        &'a self,
        path: &str,
        params: Params,
        raw_query: Option<&str>,
    ) -> RequestContext<'a> {
        RequestContext::new(self, path, params, raw_query)
    }
}
