// Runtime configuration.
// Reads endpoint, store location, timeouts and logging settings from the environment.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::error::ConfigError;
use crate::logging::LoggingConfig;

/// Default latest-rates endpoint; the app id is appended as a query parameter.
pub const DEFAULT_ENDPOINT: &str = "https://openexchangerates.org/api/latest.json";

/// File name of the cached snapshot inside the cache directory.
pub const STORE_FILE_NAME: &str = "rates.json";

/// Which loader the repository consults first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadOrder {
    /// Local cache first, network on miss. Remote successes are written back.
    #[default]
    CacheFirst,
    /// Network first, local cache when the network fails.
    RemoteFirst,
}

impl LoadOrder {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "cache-first" => Some(LoadOrder::CacheFirst),
            "remote-first" => Some(LoadOrder::RemoteFirst),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Rates endpoint, `None` when neither an endpoint nor an app id is set.
    pub endpoint: Option<String>,
    pub store_path: PathBuf,
    pub http_timeout: Option<Duration>,
    pub load_order: LoadOrder,
    pub logging: LoggingConfig,
}

/// Get the base cache directory (~/.cache/ratekeeper on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ratekeeper").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Default location of the cached snapshot.
pub fn default_store_path() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join(STORE_FILE_NAME))
}

impl Config {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = lookup("RATEKEEPER_ENDPOINT").or_else(|| {
            lookup("RATEKEEPER_APP_ID")
                .map(|app_id| format!("{}?app_id={}", DEFAULT_ENDPOINT, app_id))
        });

        let store_path = match lookup("RATEKEEPER_STORE_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_store_path().ok_or(ConfigError::NoCacheDir)?,
        };

        let http_timeout = lookup("RATEKEEPER_HTTP_TIMEOUT_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| ConfigError::InvalidValue {
                        name: "RATEKEEPER_HTTP_TIMEOUT_SECS",
                        value,
                    })
            })
            .transpose()?;

        let load_order = match lookup("RATEKEEPER_LOAD_ORDER") {
            Some(value) => LoadOrder::parse(&value).ok_or(ConfigError::InvalidValue {
                name: "RATEKEEPER_LOAD_ORDER",
                value,
            })?,
            None => LoadOrder::default(),
        };

        let mut logging = LoggingConfig::default();
        if let Some(level) = lookup("RATEKEEPER_LOG") {
            logging.level = level;
        }
        if let Some(format) = lookup("RATEKEEPER_LOG_FORMAT") {
            logging.format = format;
        }

        Ok(Self {
            endpoint,
            store_path,
            http_timeout,
            load_order,
            logging,
        })
    }

    /// Endpoint for commands that reach the rate service.
    pub fn endpoint(&self) -> Result<&str, ConfigError> {
        self.endpoint.as_deref().ok_or(ConfigError::MissingAppId)
    }
}
