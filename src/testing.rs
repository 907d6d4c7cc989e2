// Test doubles shared by unit tests.
// Store spy with manual completions, loader stubs and a recording cache sink.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::cache::{CachedRates, RateStore, StoreFuture};
use crate::error::{LoadError, StoreError};
use crate::loader::{RateCache, RateLoader};
use crate::rates::ExchangeRates;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 15, 12, 0, 0).unwrap()
}

pub fn any_store_error() -> StoreError {
    StoreError::Io(std::io::Error::other("any error"))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReceivedMessage {
    DeleteCachedRates,
    Insert(ExchangeRates, DateTime<Utc>),
    Retrieve,
}

type Pending<T> = Vec<Option<oneshot::Sender<Result<T, StoreError>>>>;

#[derive(Default)]
struct SpyState {
    messages: Vec<ReceivedMessage>,
    deletions: Pending<()>,
    insertions: Pending<()>,
    retrievals: Pending<Option<CachedRates>>,
}

/// Records store messages and holds each reply until the test completes it.
#[derive(Default)]
pub struct StoreSpy {
    state: Mutex<SpyState>,
}

fn complete<T>(pending: &mut Pending<T>, index: usize, result: Result<T, StoreError>) {
    let reply = pending[index].take().expect("operation already completed");
    // The caller may have dropped its future; that reply is simply discarded.
    let _ = reply.send(result);
}

fn await_reply<T: Send + 'static>(
    receiver: oneshot::Receiver<Result<T, StoreError>>,
) -> StoreFuture<T> {
    async move {
        receiver
            .await
            .unwrap_or_else(|_| Err(StoreError::Unavailable))
    }
    .boxed()
}

impl StoreSpy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<ReceivedMessage> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn complete_deletion(&self, error: StoreError, index: usize) {
        complete(&mut self.state.lock().unwrap().deletions, index, Err(error));
    }

    pub fn complete_deletion_successfully(&self, index: usize) {
        complete(&mut self.state.lock().unwrap().deletions, index, Ok(()));
    }

    pub fn complete_insertion(&self, error: StoreError, index: usize) {
        complete(&mut self.state.lock().unwrap().insertions, index, Err(error));
    }

    pub fn complete_insertion_successfully(&self, index: usize) {
        complete(&mut self.state.lock().unwrap().insertions, index, Ok(()));
    }

    pub fn complete_retrieval(&self, error: StoreError, index: usize) {
        complete(&mut self.state.lock().unwrap().retrievals, index, Err(error));
    }

    pub fn complete_retrieval_with_empty_cache(&self, index: usize) {
        complete(&mut self.state.lock().unwrap().retrievals, index, Ok(None));
    }

    pub fn complete_retrieval_with(
        &self,
        rates: ExchangeRates,
        timestamp: DateTime<Utc>,
        index: usize,
    ) {
        let cached = CachedRates::new(rates, timestamp);
        complete(
            &mut self.state.lock().unwrap().retrievals,
            index,
            Ok(Some(cached)),
        );
    }
}

impl RateStore for StoreSpy {
    fn delete_cached_rates(&self) -> StoreFuture<()> {
        let (reply, receiver) = oneshot::channel();
        let mut state = self.state.lock().unwrap();
        state.messages.push(ReceivedMessage::DeleteCachedRates);
        state.deletions.push(Some(reply));
        await_reply(receiver)
    }

    fn insert(&self, rates: ExchangeRates, timestamp: DateTime<Utc>) -> StoreFuture<()> {
        let (reply, receiver) = oneshot::channel();
        let mut state = self.state.lock().unwrap();
        state
            .messages
            .push(ReceivedMessage::Insert(rates, timestamp));
        state.insertions.push(Some(reply));
        await_reply(receiver)
    }

    fn retrieve(&self) -> StoreFuture<Option<CachedRates>> {
        let (reply, receiver) = oneshot::channel();
        let mut state = self.state.lock().unwrap();
        state.messages.push(ReceivedMessage::Retrieve);
        state.retrievals.push(Some(reply));
        await_reply(receiver)
    }
}

/// Outcome a `LoaderStub` replays on every call.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    Success(ExchangeRates),
    Connectivity,
    InvalidData,
    EmptyOrExpiredCache,
}

/// Loader that always delivers the same outcome and counts its calls.
pub struct LoaderStub {
    outcome: StubOutcome,
    calls: AtomicUsize,
}

impl LoaderStub {
    pub fn succeeding(rates: ExchangeRates) -> Self {
        Self::with(StubOutcome::Success(rates))
    }

    pub fn failing() -> Self {
        Self::with(StubOutcome::Connectivity)
    }

    pub fn with(outcome: StubOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLoader for LoaderStub {
    async fn load(&self) -> Result<ExchangeRates, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            StubOutcome::Success(rates) => Ok(rates.clone()),
            StubOutcome::Connectivity => Err(LoadError::Connectivity),
            StubOutcome::InvalidData => Err(LoadError::InvalidData),
            StubOutcome::EmptyOrExpiredCache => Err(LoadError::EmptyOrExpiredCache),
        }
    }
}

/// Cache sink that records every saved snapshot.
#[derive(Default)]
pub struct CacheSpy {
    saved: Mutex<Vec<ExchangeRates>>,
    fail: bool,
}

impl CacheSpy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn saved(&self) -> Vec<ExchangeRates> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateCache for CacheSpy {
    async fn save(&self, rates: ExchangeRates) -> Result<(), StoreError> {
        self.saved.lock().unwrap().push(rates);
        if self.fail {
            return Err(any_store_error());
        }
        Ok(())
    }
}

/// Yield to the runtime until `condition` holds or the attempts run out.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    condition()
}
