use std::time::Duration;

use serde::Deserialize;

const ENV_PREFIX: &str = "BOOKS";

/// Where the books resource lives and how long to wait for it.
///
/// Loaded from `BOOKS_*` environment variables (after an optional `.env`),
/// falling back to the local development server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientSettings {
    #[serde(default = "ClientSettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "ClientSettings::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClientSettings {
    /// Layer `.env` and `BOOKS_BASE_URL` / `BOOKS_TIMEOUT_MS` over the defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        // A missing `.env` is fine.
        let _ = dotenvy::dotenv();
        Self::from_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
    }

    fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn default_base_url() -> String {
        "http://localhost:3000".to_string()
    }

    fn default_timeout_ms() -> u64 {
        10_000
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}
