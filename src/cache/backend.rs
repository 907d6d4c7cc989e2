// Durable slot backends for the rate store.
// Handles JSON serialization and atomic filesystem writes for the single cached snapshot.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::rates::ExchangeRates;

/// A snapshot paired with the instant it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRates {
    pub rates: ExchangeRates,
    pub timestamp: DateTime<Utc>,
}

impl CachedRates {
    pub fn new(rates: ExchangeRates, timestamp: DateTime<Utc>) -> Self {
        Self { rates, timestamp }
    }
}

/// Synchronous storage for at most one `CachedRates`.
///
/// Backends are owned by a single store worker, so they never see
/// concurrent calls.
pub trait SlotBackend: Send + 'static {
    /// Remove the stored snapshot. Succeeds when the slot is already empty.
    fn clear(&mut self) -> Result<(), StoreError>;

    /// Replace the slot's content with `cached`.
    fn write(&mut self, cached: &CachedRates) -> Result<(), StoreError>;

    /// Read the stored snapshot, `None` when empty.
    fn read(&mut self) -> Result<Option<CachedRates>, StoreError>;
}

/// On-disk record: one snapshot linked to N code/rate rows.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSnapshot {
    cached_at: DateTime<Utc>,
    rates: Vec<StoredRate>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRate {
    currency_code: String,
    exchange_rate: f64,
}

impl From<&CachedRates> for StoredSnapshot {
    fn from(cached: &CachedRates) -> Self {
        Self {
            cached_at: cached.timestamp,
            rates: cached
                .rates
                .iter()
                .map(|(code, rate)| StoredRate {
                    currency_code: code.to_string(),
                    exchange_rate: rate,
                })
                .collect(),
        }
    }
}

impl From<StoredSnapshot> for CachedRates {
    fn from(stored: StoredSnapshot) -> Self {
        let rates = stored
            .rates
            .into_iter()
            .map(|row| (row.currency_code, row.exchange_rate))
            .collect();
        Self::new(rates, stored.cached_at)
    }
}

/// Stores the snapshot as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl SlotBackend for JsonFileBackend {
    fn clear(&mut self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn write(&mut self, cached: &CachedRates) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&StoredSnapshot::from(cached))?;

        // Write atomically via temp file
        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    fn read(&mut self) -> Result<Option<CachedRates>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let stored: StoredSnapshot = serde_json::from_str(&contents)?;
        Ok(Some(stored.into()))
    }
}

/// In-process slot. Contents are lost when the owning store is dropped.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Option<CachedRates>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotBackend for MemoryBackend {
    fn clear(&mut self) -> Result<(), StoreError> {
        self.slot = None;
        Ok(())
    }

    fn write(&mut self, cached: &CachedRates) -> Result<(), StoreError> {
        self.slot = Some(cached.clone());
        Ok(())
    }

    fn read(&mut self) -> Result<Option<CachedRates>, StoreError> {
        Ok(self.slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample() -> CachedRates {
        CachedRates::new(
            ExchangeRates::from([("USD", 1.0), ("EUR", 0.92)]),
            Utc.with_ymd_and_hms(2024, 10, 15, 9, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_write_and_read_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = JsonFileBackend::new(temp_dir.path().join("nested/rates.json"));

        backend.write(&sample()).unwrap();

        assert_eq!(backend.read().unwrap(), Some(sample()));
        assert!(!backend.temp_path().exists());
    }

    #[test]
    fn test_read_nonexistent_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = JsonFileBackend::new(temp_dir.path().join("rates.json"));

        assert_eq!(backend.read().unwrap(), None);
    }

    #[test]
    fn test_clear_empty_file_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let mut backend = JsonFileBackend::new(temp_dir.path().join("rates.json"));

        backend.clear().unwrap();
        backend.write(&sample()).unwrap();
        backend.clear().unwrap();

        assert_eq!(backend.read().unwrap(), None);
    }

    #[test]
    fn test_file_layout_has_one_row_per_currency() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rates.json");
        let mut backend = JsonFileBackend::new(&path);

        backend.write(&sample()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["rates"].as_array().unwrap().len(), 2);
        assert!(raw["cached_at"].is_string());
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rates.json");
        fs::write(&path, "not json").unwrap();

        let mut backend = JsonFileBackend::new(&path);

        assert!(matches!(
            backend.read(),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_backend_replaces_slot() {
        let mut backend = MemoryBackend::new();
        let newer = CachedRates::new(ExchangeRates::from([("GBP", 0.79)]), Utc::now());

        backend.write(&sample()).unwrap();
        backend.write(&newer).unwrap();

        assert_eq!(backend.read().unwrap(), Some(newer));
    }
}
