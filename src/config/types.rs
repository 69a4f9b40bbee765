// Configuration types module
// Defines the settings tree and the shapes each setting accepts

use crate::http::cache::generate_etag;
use crate::proxy::TrustConfig;
use crate::query::{LimitPolicy, QueryOptions, QueryParser};
use serde::Deserialize;

use super::SettingsError;

/// Process-wide settings, loaded once at startup
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub proxy: ProxyConfig,
    pub query: QueryConfig,
    pub http: HttpConfig,
}

/// Same values as loading with no file and no environment
impl Default for Settings {
    fn default() -> Self {
        let options = QueryOptions::default();
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                show_target: false,
            },
            proxy: ProxyConfig {
                trust: TrustSetting::Flag(false),
            },
            query: QueryConfig {
                parser: QueryParserSetting::Name("extended".to_string()),
                depth: options.depth,
                array_limit: options.array_limit,
                parameter_limit: options.parameter_limit,
                delimiter: options.delimiter,
                allow_dots: options.allow_dots,
                strict: options.strict,
                on_limit: options.on_limit,
            },
            http: HttpConfig {
                etag: EtagSetting::Weak,
            },
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    #[serde(default)]
    pub show_target: bool,
}

/// Proxy configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
    pub trust: TrustSetting,
}

/// Accepted shapes of `proxy.trust`
///
/// Environment variables arrive as strings, so `"true"`, `"false"` and
/// numeric strings are read as a flag or a hop count.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TrustSetting {
    Flag(bool),
    Hops(usize),
    Addresses(String),
    List(Vec<String>),
}

impl TrustSetting {
    pub fn to_trust_config(&self) -> TrustConfig {
        match self {
            Self::Flag(flag) => TrustConfig::Flag(*flag),
            Self::Hops(n) => TrustConfig::Hops(*n),
            Self::List(list) => TrustConfig::List(list.clone()),
            Self::Addresses(text) => match text.trim() {
                "true" => TrustConfig::Flag(true),
                "false" => TrustConfig::Flag(false),
                trimmed => trimmed
                    .parse()
                    .map_or_else(|_| TrustConfig::Addresses(text.clone()), TrustConfig::Hops),
            },
        }
    }
}

/// Query parsing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    pub parser: QueryParserSetting,
    pub depth: usize,
    pub array_limit: usize,
    pub parameter_limit: usize,
    pub delimiter: char,
    pub allow_dots: bool,
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub on_limit: LimitPolicy,
}

impl QueryConfig {
    pub fn options(&self) -> QueryOptions {
        QueryOptions {
            depth: self.depth,
            array_limit: self.array_limit,
            parameter_limit: self.parameter_limit,
            delimiter: self.delimiter,
            allow_dots: self.allow_dots,
            strict: self.strict,
            on_limit: self.on_limit,
        }
    }

    /// Compile the parser setting together with the limits
    pub fn compile(&self) -> Result<QueryParser, SettingsError> {
        let options = self.options();
        match &self.parser {
            QueryParserSetting::Flag(true) => Ok(QueryParser::Simple(options)),
            QueryParserSetting::Flag(false) => Ok(QueryParser::Disabled),
            QueryParserSetting::Name(name) => match name.trim().to_ascii_lowercase().as_str() {
                "simple" | "true" => Ok(QueryParser::Simple(options)),
                "extended" => Ok(QueryParser::Extended(options)),
                "none" | "false" => Ok(QueryParser::Disabled),
                _ => Err(SettingsError::UnknownQueryParser(name.clone())),
            },
        }
    }
}

/// Accepted shapes of `query.parser`
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum QueryParserSetting {
    Flag(bool),
    Name(String),
}

impl QueryParserSetting {
    pub fn label(&self) -> &str {
        match self {
            Self::Flag(true) => "simple",
            Self::Flag(false) => "none",
            Self::Name(name) => name,
        }
    }
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub etag: EtagSetting,
}

/// How response entity tags are generated
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EtagSetting {
    Weak,
    Strong,
    Off,
}

impl EtagSetting {
    /// Entity tag for `body`, or `None` when generation is off
    pub fn generate(self, body: &[u8]) -> Option<String> {
        match self {
            Self::Weak => Some(generate_etag(body, true)),
            Self::Strong => Some(generate_etag(body, false)),
            Self::Off => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Strong => "strong",
            Self::Off => "off",
        }
    }
}
