// Cache-writing loader decorator.
// Forwards the wrapped loader's result and writes successful snapshots to a cache sink.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use async_trait::async_trait;
use futures::poll;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, warn};

use crate::error::{LoadError, StoreError};
use crate::rates::ExchangeRates;

use super::{RateCache, RateLoader};

/// Wraps a loader and saves every successful snapshot to `cache`.
///
/// The save is issued before the result is delivered, then left to finish
/// on its own: its outcome is logged and discarded, and the caller never
/// waits for it. Failures are forwarded unchanged and never touch the cache.
pub struct CacheWriteDecorator<L, C> {
    decoratee: L,
    cache: C,
    pending: PendingWrites,
}

/// Detached cache writes that have not been awaited yet.
#[derive(Debug, Clone, Default)]
pub struct PendingWrites {
    completions: Arc<Mutex<Vec<oneshot::Receiver<()>>>>,
}

impl PendingWrites {
    fn track(&self) -> oneshot::Sender<()> {
        let (done, finished) = oneshot::channel();
        let mut completions = self
            .completions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        completions.retain_mut(|finished| {
            matches!(finished.try_recv(), Err(TryRecvError::Empty))
        });
        completions.push(finished);
        done
    }

    /// Wait until every write issued so far has finished.
    pub async fn settle(&self) {
        let completions = std::mem::take(
            &mut *self
                .completions
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for finished in completions {
            // A dropped sender means the write was torn down; nothing left to wait for.
            let _ = finished.await;
        }
    }
}

impl<L, C> CacheWriteDecorator<L, C>
where
    L: RateLoader,
    C: RateCache + Clone + 'static,
{
    pub fn new(decoratee: L, cache: C) -> Self {
        Self {
            decoratee,
            cache,
            pending: PendingWrites::default(),
        }
    }

    /// Handle for waiting on detached cache writes, e.g. before shutdown.
    pub fn pending_writes(&self) -> PendingWrites {
        self.pending.clone()
    }

    async fn save_ignoring_result(&self, rates: ExchangeRates) {
        let cache = self.cache.clone();
        let done = self.pending.track();
        let mut write = Box::pin(async move {
            log_save_outcome(cache.save(rates).await);
            let _ = done.send(());
        });

        // The first poll issues the save, so loads started after delivery
        // queue behind it.
        if poll!(write.as_mut()).is_ready() {
            return;
        }
        detach(write);
    }
}

/// Finish `write` off the caller's path: on the current runtime when there
/// is one, otherwise on a short-lived thread.
fn detach<F>(write: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(write);
        }
        Err(_) => {
            let spawned = thread::Builder::new()
                .name("rate-cache-write".to_string())
                .spawn(move || futures::executor::block_on(write));
            if let Err(e) = spawned {
                warn!(error = %e, "could not detach cache write, dropping it");
            }
        }
    }
}

fn log_save_outcome(result: Result<(), StoreError>) {
    match result {
        Ok(()) => debug!("cached freshly loaded rates"),
        Err(e) => warn!(error = %e, "failed to cache loaded rates, ignoring"),
    }
}

#[async_trait]
impl<L, C> RateLoader for CacheWriteDecorator<L, C>
where
    L: RateLoader,
    C: RateCache + Clone + 'static,
{
    async fn load(&self) -> Result<ExchangeRates, LoadError> {
        let rates = self.decoratee.load().await?;
        self.save_ignoring_result(rates.clone()).await;
        Ok(rates)
    }
}
