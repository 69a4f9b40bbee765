// Configuration module entry point
// Loads settings once and compiles them into shared application state

mod state;
mod types;

pub use state::AppState;
pub use types::{
    EtagSetting, HttpConfig, LoggingConfig, ProxyConfig, QueryConfig, QueryParserSetting,
    Settings, TrustSetting,
};

use thiserror::Error;

/// Environment variable prefix, e.g. `WAYMARK__PROXY__TRUST=loopback`
pub const ENV_PREFIX: &str = "WAYMARK";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("unknown query parser '{0}' (expected simple, extended or none)")]
    UnknownQueryParser(String),
}

impl Settings {
    /// Load settings from the given file path (without extension)
    /// The file is optional; environment variables override it
    pub fn load_from(config_path: &str) -> Result<Self, SettingsError> {
        Self::load(config_path, ENV_PREFIX)
    }

    fn load(config_path: &str, env_prefix: &str) -> Result<Self, SettingsError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("logging.level", "info")?
            .set_default("logging.show_target", false)?
            .set_default("proxy.trust", false)?
            .set_default("query.parser", "extended")?
            .set_default("query.depth", 5)?
            .set_default("query.array_limit", 20)?
            .set_default("query.parameter_limit", 1000)?
            .set_default("query.delimiter", "&")?
            .set_default("query.allow_dots", true)?
            .set_default("http.etag", "weak")?
            .build()?;

        let settings: Self = settings.try_deserialize()?;
        // reject unknown parser names at load time, not on first request
        settings.query.compile()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::LimitPolicy;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn load_toml(contents: &str, env_prefix: &str) -> Result<Settings, SettingsError> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("waymark.toml"), contents).unwrap();
        let path = dir.path().join("waymark");
        Settings::load(path.to_str().unwrap(), env_prefix)
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        let settings = Settings::load(path.to_str().unwrap(), "WAYMARK_TEST_DEFAULTS").unwrap();

        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.proxy.trust, TrustSetting::Flag(false));
        assert_eq!(settings.query.parser, QueryParserSetting::Name("extended".to_string()));
        assert_eq!(settings.query.options(), crate::query::QueryOptions::default());
        assert_eq!(settings.http.etag, EtagSetting::Weak);
    }

    #[test]
    fn test_file_values() {
        let settings = load_toml(
            r#"
[proxy]
trust = ["loopback", "10.0.0.0/8"]

[query]
parser = "simple"
depth = 2
on_limit = "reject"

[http]
etag = "strong"
"#,
            "WAYMARK_TEST_FILE",
        )
        .unwrap();

        assert_eq!(
            settings.proxy.trust,
            TrustSetting::List(vec!["loopback".to_string(), "10.0.0.0/8".to_string()])
        );
        assert_eq!(settings.query.depth, 2);
        assert_eq!(settings.query.on_limit, LimitPolicy::Reject);
        assert_eq!(settings.query.array_limit, 20);
        assert_eq!(settings.http.etag, EtagSetting::Strong);
    }

    #[test]
    fn test_hop_count_and_boolean_parser() {
        let settings = load_toml(
            "[proxy]\ntrust = 2\n[query]\nparser = false\n",
            "WAYMARK_TEST_HOPS",
        )
        .unwrap();
        assert_eq!(settings.proxy.trust, TrustSetting::Hops(2));
        assert_eq!(settings.query.parser, QueryParserSetting::Flag(false));
    }

    #[test]
    fn test_environment_overrides_file() {
        std::env::set_var("WAYMARK_TEST_ENV__HTTP__ETAG", "off");
        std::env::set_var("WAYMARK_TEST_ENV__PROXY__TRUST", "loopback");
        let settings = load_toml("[http]\netag = \"strong\"\n", "WAYMARK_TEST_ENV").unwrap();

        assert_eq!(settings.http.etag, EtagSetting::Off);
        assert_eq!(settings.proxy.trust, TrustSetting::Addresses("loopback".to_string()));
    }

    #[test]
    fn test_unknown_query_parser_fails_load() {
        let err = load_toml("[query]\nparser = \"fancy\"\n", "WAYMARK_TEST_BAD_PARSER").unwrap_err();
        assert!(matches!(err, SettingsError::UnknownQueryParser(ref name) if name == "fancy"));
    }

    #[test]
    fn test_bad_etag_value_fails_load() {
        let err = load_toml("[http]\netag = \"sometimes\"\n", "WAYMARK_TEST_BAD_ETAG").unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }
}
