// Local exchange rate loader.
// Saves snapshots into the rate store and loads them back when still fresh.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{LoadError, StoreError};
use crate::loader::{RateCache, RateLoader};
use crate::rates::ExchangeRates;

use super::policy::CachePolicy;
use super::store::RateStore;

/// Supplier of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Clock reading the system wall clock.
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Cache-backed loader built on a `RateStore` and a freshness policy.
///
/// `save` replaces the cached snapshot (delete, then insert stamped with the
/// injected clock). `load` delivers the cached snapshot only while it is
/// fresh. Both futures borrow the loader, so a loader can only be released
/// by dropping its pending futures first; store replies arriving after that
/// are discarded and no further store operation is issued.
///
/// Saves and loads on one loader run one at a time, in the order their
/// futures were first polled. A load started after a save has begun sees
/// that save's snapshot.
pub struct LocalRateLoader<S> {
    store: S,
    current_time: Clock,
    policy: CachePolicy,
    gate: Mutex<()>,
}

impl<S: RateStore> LocalRateLoader<S> {
    pub fn new(store: S, current_time: Clock) -> Self {
        Self {
            store,
            current_time,
            policy: CachePolicy::default(),
            gate: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn now(&self) -> DateTime<Utc> {
        (self.current_time)()
    }
}

#[async_trait]
impl<S: RateStore> RateCache for LocalRateLoader<S> {
    async fn save(&self, rates: ExchangeRates) -> Result<(), StoreError> {
        let _turn = self.gate.lock().await;
        self.store.delete_cached_rates().await?;
        self.store.insert(rates, self.now()).await
    }
}

#[async_trait]
impl<S: RateStore> RateLoader for LocalRateLoader<S> {
    async fn load(&self) -> Result<ExchangeRates, LoadError> {
        let _turn = self.gate.lock().await;
        match self.store.retrieve().await? {
            Some(cached) if self.policy.is_fresh(cached.timestamp, self.now()) => {
                debug!(currencies = cached.rates.len(), "cache hit");
                Ok(cached.rates)
            }
            Some(cached) => {
                debug!(cached_at = %cached.timestamp, "cached rates expired");
                Err(LoadError::EmptyOrExpiredCache)
            }
            None => {
                debug!("cache empty");
                Err(LoadError::EmptyOrExpiredCache)
            }
        }
    }
}
