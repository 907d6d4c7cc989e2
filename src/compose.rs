// Composition root.
// Wires the store, local loader, remote loader, cache decorator and fallback repository.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{Clock, LocalRateLoader, RateStore, SerialRateStore, system_clock};
use crate::config::{Config, LoadOrder};
use crate::error::Result;
use crate::loader::{CacheWriteDecorator, FallbackRepository, PendingWrites, RateLoader};
use crate::remote::{HttpClient, RemoteRateLoader, ReqwestHttpClient};

/// Top-level loader plus the handle on its detached cache writes.
pub struct ComposedLoader {
    pub loader: Arc<dyn RateLoader>,
    pub pending_writes: PendingWrites,
}

/// Build the top-level loader.
///
/// The network path is `RemoteRateLoader` wrapped in a `CacheWriteDecorator`
/// whose sink is the same `LocalRateLoader` the repository reads from, so
/// every remote success refreshes the cache.
pub fn build_repository<S, C>(
    store: S,
    client: C,
    endpoint: impl Into<String>,
    clock: Clock,
    order: LoadOrder,
) -> ComposedLoader
where
    S: RateStore + 'static,
    C: HttpClient + 'static,
{
    let local = Arc::new(LocalRateLoader::new(store, clock));
    let remote = CacheWriteDecorator::new(RemoteRateLoader::new(endpoint, client), local.clone());

    let pending_writes = remote.pending_writes();

    debug!(?order, "composing rate repository");
    let loader: Arc<dyn RateLoader> = match order {
        LoadOrder::CacheFirst => Arc::new(FallbackRepository::new(local, remote)),
        LoadOrder::RemoteFirst => Arc::new(FallbackRepository::new(remote, local)),
    };

    ComposedLoader {
        loader,
        pending_writes,
    }
}

/// Loader and store assembled from configuration.
pub struct RateService {
    pub loader: Arc<dyn RateLoader>,
    pub pending_writes: PendingWrites,
    pub store: SerialRateStore,
}

impl RateService {
    /// Fails with `ConfigError::MissingAppId` when no endpoint is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let endpoint = config.endpoint()?.to_string();
        let store = SerialRateStore::open(&config.store_path)?;
        let client = ReqwestHttpClient::new(config.http_timeout)?;
        let composed = build_repository(
            store.clone(),
            client,
            endpoint,
            system_clock(),
            config.load_order,
        );

        Ok(Self {
            loader: composed.loader,
            pending_writes: composed.pending_writes,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, RatekeeperError};
    use crate::logging::LoggingConfig;
    use tempfile::TempDir;

    fn config_without_endpoint(temp_dir: &TempDir) -> Config {
        Config {
            endpoint: None,
            store_path: temp_dir.path().join("rates.json"),
            http_timeout: None,
            load_order: LoadOrder::CacheFirst,
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_service_requires_endpoint() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_without_endpoint(&temp_dir);

        assert!(matches!(
            RateService::from_config(&config),
            Err(RatekeeperError::Config(ConfigError::MissingAppId))
        ));
    }

    #[tokio::test]
    async fn test_store_is_usable_without_endpoint() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_without_endpoint(&temp_dir);

        let store = SerialRateStore::open(&config.store_path).unwrap();

        store.delete_cached_rates().await.unwrap();
        assert_eq!(store.retrieve().await.unwrap(), None);
    }
}
