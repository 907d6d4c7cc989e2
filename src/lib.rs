// Exchange rate loading with a freshness-checked local cache.
// Remote rates are fetched over HTTP, cached in a serialized single-slot store and served cache-first.

pub mod cache;
pub mod compose;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod rates;
pub mod remote;

#[cfg(test)]
mod testing;

pub use cache::{CachePolicy, CachedRates, LocalRateLoader, RateStore, SerialRateStore};
pub use compose::{ComposedLoader, RateService, build_repository};
pub use config::{Config, LoadOrder};
pub use error::{ConfigError, HttpError, LoadError, RatekeeperError, Result, StoreError};
pub use loader::{CacheWriteDecorator, FallbackRepository, PendingWrites, RateCache, RateLoader};
pub use rates::{Conversion, ExchangeRates};
pub use remote::{HttpClient, HttpResponse, RemoteRateLoader, ReqwestHttpClient};
