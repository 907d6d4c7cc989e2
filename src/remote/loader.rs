// Remote exchange rate loader.
// Issues one GET per load and maps the transport outcome into rates or a loader error.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::LoadError;
use crate::loader::RateLoader;
use crate::rates::ExchangeRates;

use super::client::{HttpClient, HttpResponse};

/// Wire schema: `{ "rates": { "<code>": <number>, ... } }`. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct RemoteRates {
    rates: HashMap<String, f64>,
}

/// Map a received response into rates.
///
/// Anything but status 200 with a body matching the wire schema is
/// `InvalidData`.
pub fn map_response(response: &HttpResponse) -> Result<ExchangeRates, LoadError> {
    if !response.is_ok() {
        warn!(status = response.status, "unexpected status from rate service");
        return Err(LoadError::InvalidData);
    }

    let remote: RemoteRates = serde_json::from_slice(&response.body).map_err(|e| {
        warn!(error = %e, "could not parse rate service response");
        LoadError::InvalidData
    })?;

    Ok(remote.rates.into_iter().collect())
}

/// Loads rates from a fixed URL through an injected `HttpClient`.
///
/// No retries and no request coalescing: every load is one request.
pub struct RemoteRateLoader<C> {
    url: String,
    client: C,
}

impl<C: HttpClient> RemoteRateLoader<C> {
    pub fn new(url: impl Into<String>, client: C) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<C: HttpClient + 'static> RemoteRateLoader<C> {
    /// Start a load on the current runtime and return a cancellable handle.
    pub fn spawn_load(self: &Arc<Self>) -> LoadTask {
        let loader = Arc::clone(self);
        LoadTask {
            handle: tokio::spawn(async move { loader.load().await }),
        }
    }
}

#[async_trait]
impl<C: HttpClient> RateLoader for RemoteRateLoader<C> {
    async fn load(&self) -> Result<ExchangeRates, LoadError> {
        debug!(url = %self.url, "requesting exchange rates");

        let response = self.client.get(&self.url).await.map_err(|e| {
            warn!(error = %e, "rate service unreachable");
            LoadError::Connectivity
        })?;

        map_response(&response)
    }
}

/// Handle to an in-flight remote load.
///
/// Awaiting the handle yields the load's result. A cancelled load resolves
/// to `LoadError::Connectivity`.
#[derive(Debug)]
pub struct LoadTask {
    handle: JoinHandle<Result<ExchangeRates, LoadError>>,
}

impl LoadTask {
    /// Abort the request. No-op once the load has completed.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for LoadTask {
    type Output = Result<ExchangeRates, LoadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => {
                debug!("remote load cancelled");
                Err(LoadError::Connectivity)
            }
        })
    }
}
