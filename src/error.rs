// Error types for ratekeeper.
// Separates durable-store failures, loader failures, transport failures and configuration errors.

use thiserror::Error;

/// Failure reported by the durable single-slot store.
///
/// An empty store is not an error: `retrieve` reports it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cache store is unavailable: worker has stopped")]
    Unavailable,
}

/// Failure reported by any `RateLoader`.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("could not reach the exchange rate service")]
    Connectivity,

    #[error("exchange rate service returned unusable data")]
    InvalidData,

    #[error("no fresh exchange rates in the local cache")]
    EmptyOrExpiredCache,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure reported by an `HttpClient` before any response was received.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing RATEKEEPER_APP_ID (or RATEKEEPER_ENDPOINT) environment variable")]
    MissingAppId,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Could not determine a cache directory; set RATEKEEPER_STORE_PATH")]
    NoCacheDir,
}

/// Top-level error for the binary and the composition helpers.
#[derive(Error, Debug)]
pub enum RatekeeperError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RatekeeperError>;
