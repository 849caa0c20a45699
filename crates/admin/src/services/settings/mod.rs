//! Site settings store.
//!
//! Reads go through a process-wide snapshot held in a `moka` cache: the
//! first read loads every row in one query, later reads are served from
//! memory. Snapshots are keyed by a generation number that every write
//! through this store advances once it has finished, so a load that read
//! the old rows while the write ran lands under a key nobody asks for
//! again. Writes made by another process become visible once the
//! snapshot's TTL expires.

mod options;
mod values;

pub use options::{
    FIELD_PREFIX, FieldError, SETTING_OPTIONS, SettingKind, SettingOption,
    SettingsValidationError, StructuredValues, find_option, parse_submission,
};
pub use values::{DinnerHours, LunchHours, OpeningHours, SocialLinks};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::db::{RepositoryError, SettingsRepository};
use crate::models::Setting;

/// Errors from the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Loading or writing rows failed.
    #[error("settings unavailable: {0}")]
    Repository(Arc<RepositoryError>),

    /// A structured value could not be encoded.
    #[error("failed to encode setting: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<RepositoryError> for SettingsError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(Arc::new(err))
    }
}

/// A value to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// Stored as-is.
    Text(String),
    /// Stored as compact JSON with object keys sorted.
    Json(serde_json::Value),
}

impl SettingValue {
    /// Encode a serializable structure.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if `value` cannot be represented as JSON.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::Json)
    }

    /// Text stored in the settings table.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if JSON encoding fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Json(json) => serde_json::to_string(json),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Loaded rows plus a key index.
struct Snapshot {
    rows: Vec<Setting>,
    values: HashMap<String, String>,
}

impl Snapshot {
    fn new(rows: Vec<Setting>) -> Self {
        let values = rows
            .iter()
            .map(|s| (s.key.clone(), s.value.clone()))
            .collect();
        Self { rows, values }
    }
}

/// Cached access to the settings table.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<SettingsStoreInner>,
}

struct SettingsStoreInner {
    repo: Arc<dyn SettingsRepository>,
    cache: Cache<u64, Arc<Snapshot>>,
    generation: AtomicU64,
}

impl SettingsStore {
    /// Create a store whose snapshot is reloaded at least every `ttl`.
    #[must_use]
    pub fn new(repo: Arc<dyn SettingsRepository>, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self {
            inner: Arc::new(SettingsStoreInner {
                repo,
                cache,
                generation: AtomicU64::new(0),
            }),
        }
    }

    async fn snapshot(&self) -> Result<Arc<Snapshot>, SettingsError> {
        let generation = self.inner.generation.load(Ordering::Acquire);
        let repo = Arc::clone(&self.inner.repo);
        self.inner
            .cache
            .try_get_with(generation, async move {
                debug!(generation, "Loading settings snapshot");
                repo.list_all().await.map(|rows| Arc::new(Snapshot::new(rows)))
            })
            .await
            .map_err(SettingsError::Repository)
    }

    /// Value for `key`, or an empty string when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Repository` if the snapshot cannot be loaded.
    pub async fn get(&self, key: &str) -> Result<String, SettingsError> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.values.get(key).cloned().unwrap_or_default())
    }

    /// Decode a JSON-encoded value. Absent keys and undecodable text both
    /// yield `None`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Repository` if the snapshot cannot be loaded.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        let raw = self.get(key).await?;
        if raw.is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str(&raw).ok())
    }

    /// Opening hours, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Repository` if the snapshot cannot be loaded.
    pub async fn opening_hours(&self) -> Result<OpeningHours, SettingsError> {
        Ok(self.get_json("opening_hours").await?.unwrap_or_default())
    }

    /// Social links, falling back to empty links.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Repository` if the snapshot cannot be loaded.
    pub async fn social_links(&self) -> Result<SocialLinks, SettingsError> {
        Ok(self.get_json("social_media").await?.unwrap_or_default())
    }

    /// Settings grouped by category; categories and keys in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::Repository` if the snapshot cannot be loaded.
    pub async fn grouped(&self) -> Result<BTreeMap<String, Vec<Setting>>, SettingsError> {
        let snapshot = self.snapshot().await?;
        let mut grouped: BTreeMap<String, Vec<Setting>> = BTreeMap::new();
        for setting in &snapshot.rows {
            grouped
                .entry(setting.category.clone())
                .or_default()
                .push(setting.clone());
        }
        for settings in grouped.values_mut() {
            settings.sort_by(|a, b| a.key.cmp(&b.key));
        }
        Ok(grouped)
    }

    /// Update an existing key. Returns `false` (and writes nothing) if the
    /// key was never seeded.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if encoding or the update fails.
    #[instrument(skip(self, value))]
    pub async fn set(&self, key: &str, value: SettingValue) -> Result<bool, SettingsError> {
        let encoded = value.encode()?;
        let result = self.inner.repo.update_value(key, &encoded).await;
        self.invalidate();
        Ok(result?)
    }

    /// Update several keys atomically: either all rows change or none do.
    ///
    /// Returns the number of rows changed; keys that were never seeded are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any value fails to encode (before anything
    /// is written) or the transaction fails.
    #[instrument(skip_all, fields(count = values.len()))]
    pub async fn set_many(&self, values: Vec<(String, SettingValue)>) -> Result<usize, SettingsError> {
        let encoded = values
            .into_iter()
            .map(|(key, value)| value.encode().map(|text| (key, text)))
            .collect::<Result<Vec<_>, _>>()?;
        let result = self.inner.repo.update_many(&encoded).await;
        self.invalidate();
        Ok(result?)
    }

    /// Start a new generation so the next read reloads every row.
    ///
    /// Snapshots from earlier generations, including ones still loading,
    /// are never served again.
    pub fn invalidate(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.cache.invalidate_all();
    }
}
