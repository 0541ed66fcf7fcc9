use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::key::ResourceKey;

/// Type-erased cached value. Readers downcast to the type they stored.
pub type Slot = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    /// Last successfully fetched value.
    pub data: Option<Slot>,
    /// Time of the last successful fetch. `None` means never fresh.
    pub timestamp: Option<DateTime<Utc>>,
    /// Set only while a foreground fetch for an empty slot is running.
    pub loading: bool,
}

impl CacheEntry {
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Clone the cached value out if it holds a `T`.
    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.data.as_ref()?.downcast_ref::<T>().cloned()
    }

    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.timestamp.map(|ts| now - ts)
    }
}

/// Per-key entries. Pure state, no policy.
#[derive(Debug)]
pub struct CacheStore {
    entries: HashMap<ResourceKey, CacheEntry>,
}

impl CacheStore {
    /// Store with an empty entry for every known key.
    pub fn new() -> Self {
        let entries = ResourceKey::KNOWN
            .iter()
            .map(|key| (key.clone(), CacheEntry::default()))
            .collect();
        Self { entries }
    }

    /// Snapshot of an entry. Keys never written read as empty.
    pub fn get(&self, key: &ResourceKey) -> CacheEntry {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Write an entry.
    ///
    /// With `Some(data)` the value and timestamp are replaced. With `None`
    /// only `loading` changes; cached data and timestamp are preserved.
    pub fn set(&mut self, key: &ResourceKey, data: Option<Slot>, loading: bool, now: DateTime<Utc>) {
        let entry = self.entries.entry(key.clone()).or_default();
        if let Some(data) = data {
            entry.data = Some(data);
            entry.timestamp = Some(now);
        }
        entry.loading = loading;
    }

    pub fn set_loading(&mut self, key: &ResourceKey, loading: bool) {
        self.entries.entry(key.clone()).or_default().loading = loading;
    }

    /// Drop the timestamp, keep data and loading.
    pub fn invalidate(&mut self, key: &ResourceKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.timestamp = None;
        }
    }

    /// Every entry back to empty. Custom keys are forgotten.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Known keys first, then custom keys sorted by name.
    pub fn keys(&self) -> Vec<ResourceKey> {
        let mut custom: Vec<ResourceKey> = self
            .entries
            .keys()
            .filter(|k| !k.is_known())
            .cloned()
            .collect();
        custom.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        ResourceKey::KNOWN.iter().cloned().chain(custom).collect()
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
