// Loader contracts and composition.
// Any source of exchange rates implements `RateLoader`; any cache sink implements `RateCache`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{LoadError, StoreError};
use crate::rates::ExchangeRates;

pub mod decorator;
pub mod repository;

pub use decorator::{CacheWriteDecorator, PendingWrites};
pub use repository::FallbackRepository;

/// Asynchronous source of an exchange rate snapshot.
///
/// Each call is an independent operation that resolves exactly once.
#[async_trait]
pub trait RateLoader: Send + Sync {
    async fn load(&self) -> Result<ExchangeRates, LoadError>;
}

/// Sink that persists a snapshot for later loads.
#[async_trait]
pub trait RateCache: Send + Sync {
    async fn save(&self, rates: ExchangeRates) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: RateLoader + ?Sized> RateLoader for Arc<T> {
    async fn load(&self) -> Result<ExchangeRates, LoadError> {
        (**self).load().await
    }
}

#[async_trait]
impl<T: RateCache + ?Sized> RateCache for Arc<T> {
    async fn save(&self, rates: ExchangeRates) -> Result<(), StoreError> {
        (**self).save(rates).await
    }
}
