//! Runner configuration.
//!
//! Loaded via the `config` crate from `SEATABLE_*` environment variables.
//! Nested keys use `__`, e.g. `SEATABLE_HTTP__API_TIMEOUT_SECS`.

use seatable_client::HttpConfig;
use serde::Deserialize;

/// Connection settings plus HTTP tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// SeaTable server URL.
    pub server_url: String,

    /// UUID of the base to work on.
    pub base_uuid: String,

    /// API token of the base.
    pub base_token: String,

    #[serde(default)]
    pub http: HttpConfig,
}

impl RunnerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(environment())
    }

    fn load(source: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("SEATABLE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
