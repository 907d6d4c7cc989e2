// Serialized single-slot rate store.
// Every operation is enqueued on one dedicated worker at call time and completes in issuance order.

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::rates::ExchangeRates;

use super::backend::{CachedRates, JsonFileBackend, MemoryBackend, SlotBackend};

/// Future returned by every store operation.
///
/// The work is already issued when the future is created, so dropping it
/// does not cancel the operation. It only discards the reply.
pub type StoreFuture<T> = BoxFuture<'static, Result<T, StoreError>>;

/// Durable holder of at most one cached snapshot.
///
/// Completions may resolve on any thread. Callers dispatch to their own
/// context if they need to.
pub trait RateStore: Send + Sync {
    /// Remove the cached snapshot, succeeding when there is none.
    fn delete_cached_rates(&self) -> StoreFuture<()>;

    /// Replace the cached snapshot with `rates` captured at `timestamp`.
    fn insert(&self, rates: ExchangeRates, timestamp: DateTime<Utc>) -> StoreFuture<()>;

    /// Current snapshot, or `None` when the store is empty.
    fn retrieve(&self) -> StoreFuture<Option<CachedRates>>;
}

impl<S: RateStore + ?Sized> RateStore for Arc<S> {
    fn delete_cached_rates(&self) -> StoreFuture<()> {
        (**self).delete_cached_rates()
    }

    fn insert(&self, rates: ExchangeRates, timestamp: DateTime<Utc>) -> StoreFuture<()> {
        (**self).insert(rates, timestamp)
    }

    fn retrieve(&self) -> StoreFuture<Option<CachedRates>> {
        (**self).retrieve()
    }
}

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

enum Command {
    Delete(Reply<()>),
    Insert(CachedRates, Reply<()>),
    Retrieve(Reply<Option<CachedRates>>),
}

/// `RateStore` backed by a single worker thread that owns the backend.
///
/// Commands are queued on an unbounded channel in call order and the
/// worker runs them one at a time, so delete, insert and retrieve are
/// totally ordered by issuance regardless of which future is awaited
/// first.
#[derive(Debug, Clone)]
pub struct SerialRateStore {
    commands: mpsc::UnboundedSender<Command>,
}

impl SerialRateStore {
    /// Start a worker that owns `backend`.
    pub fn new<B: SlotBackend>(backend: B) -> Result<Self, StoreError> {
        let (commands, receiver) = mpsc::unbounded_channel();

        thread::Builder::new()
            .name("rate-store".to_string())
            .spawn(move || run_worker(backend, receiver))?;

        Ok(Self { commands })
    }

    /// Store persisted as a JSON file at `path`.
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        let backend = JsonFileBackend::new(path);
        debug!(path = %backend.path().display(), "opening rate store");
        Self::new(backend)
    }

    /// Store that keeps its snapshot in memory.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(MemoryBackend::new())
    }

    fn dispatch<T: Send + 'static>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> StoreFuture<T> {
        let (reply, response) = oneshot::channel();
        let issued = self.commands.send(command(reply)).is_ok();

        async move {
            if !issued {
                return Err(StoreError::Unavailable);
            }
            response.await.unwrap_or_else(|_| Err(StoreError::Unavailable))
        }
        .boxed()
    }
}

impl RateStore for SerialRateStore {
    fn delete_cached_rates(&self) -> StoreFuture<()> {
        self.dispatch(Command::Delete)
    }

    fn insert(&self, rates: ExchangeRates, timestamp: DateTime<Utc>) -> StoreFuture<()> {
        let cached = CachedRates::new(rates, timestamp);
        self.dispatch(move |reply| Command::Insert(cached, reply))
    }

    fn retrieve(&self) -> StoreFuture<Option<CachedRates>> {
        self.dispatch(Command::Retrieve)
    }
}

fn run_worker<B: SlotBackend>(mut backend: B, mut commands: mpsc::UnboundedReceiver<Command>) {
    while let Some(command) = commands.blocking_recv() {
        match command {
            Command::Delete(reply) => {
                let result = backend.clear();
                if let Err(e) = &result {
                    warn!(error = %e, "failed to delete cached rates");
                }
                // A dropped receiver means nobody waits for this reply anymore.
                let _ = reply.send(result);
            }
            Command::Insert(cached, reply) => {
                // Clear first so a failed write leaves the slot empty, never doubled.
                let result = backend.clear().and_then(|()| backend.write(&cached));
                match &result {
                    Ok(()) => debug!(
                        currencies = cached.rates.len(),
                        timestamp = %cached.timestamp,
                        "inserted cached rates"
                    ),
                    Err(e) => warn!(error = %e, "failed to insert cached rates"),
                }
                let _ = reply.send(result);
            }
            Command::Retrieve(reply) => {
                let result = backend.read();
                if let Err(e) = &result {
                    warn!(error = %e, "failed to retrieve cached rates");
                }
                let _ = reply.send(result);
            }
        }
    }

    debug!("rate store worker stopped");
}
