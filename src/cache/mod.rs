// Local rate cache.
// Freshness policy, the serialized single-slot store and the cache-backed loader.

pub mod backend;
pub mod local;
pub mod policy;
pub mod store;

pub use backend::{CachedRates, JsonFileBackend, MemoryBackend, SlotBackend};
pub use local::{Clock, LocalRateLoader, system_clock};
pub use policy::{CachePolicy, MAX_CACHE_AGE_MINUTES, is_fresh};
pub use store::{RateStore, SerialRateStore, StoreFuture};
