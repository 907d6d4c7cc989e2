// Fallback repository.
// Tries a primary loader and falls back to a secondary one on any failure.

use async_trait::async_trait;
use tracing::debug;

use crate::error::LoadError;
use crate::rates::ExchangeRates;

use super::RateLoader;

/// Loader composed of a `primary` and a `fallback` loader.
///
/// The primary's success is delivered verbatim and the fallback is never
/// touched. On any primary failure the fallback is loaded once and its
/// result, success or failure, becomes the outcome.
pub struct FallbackRepository<P, F> {
    primary: P,
    fallback: F,
}

impl<P: RateLoader, F: RateLoader> FallbackRepository<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P: RateLoader, F: RateLoader> RateLoader for FallbackRepository<P, F> {
    async fn load(&self) -> Result<ExchangeRates, LoadError> {
        match self.primary.load().await {
            Ok(rates) => Ok(rates),
            Err(e) => {
                debug!(error = %e, "primary loader failed, using fallback");
                self.fallback.load().await
            }
        }
    }
}
