use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

use super::clock::{Clock, SystemClock};
use super::key::ResourceKey;
use super::policy::FreshnessPolicy;
use super::result::CacheStatus;
use super::store::{CacheEntry, CacheStore, Slot};

/// Mutable cache state. The lock is never held across an await.
#[derive(Debug, Default)]
pub(super) struct State {
    pub(super) store: CacheStore,
    /// Keys with a background refresh in flight. Kept beside the store so the
    /// flag survives the entry being replaced.
    pub(super) in_flight: HashSet<ResourceKey>,
}

#[derive(Debug)]
pub(super) struct Inner {
    pub(super) state: Mutex<State>,
    pub(super) policy: FreshnessPolicy,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) background: Mutex<Vec<JoinHandle<()>>>,
}

/// Session-wide cache of portal data.
///
/// Cloning is cheap and every clone shares the same entries, so one instance
/// is created at startup and handed to each consumer. Call [`DataCache::clear`]
/// on logout.
#[derive(Debug, Clone)]
pub struct DataCache {
    pub(super) inner: Arc<Inner>,
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new(FreshnessPolicy::default())
    }
}

impl DataCache {
    pub fn new(policy: FreshnessPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: FreshnessPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                policy,
                clock,
                background: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn policy(&self) -> &FreshnessPolicy {
        &self.inner.policy
    }

    /// Current time as seen by this cache's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    pub(super) fn lock_state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Store access =====

    pub fn get(&self, key: &ResourceKey) -> CacheEntry {
        self.lock_state().store.get(key)
    }

    /// Typed read of the cached value without any freshness check.
    pub fn peek<T: Clone + 'static>(&self, key: &ResourceKey) -> Option<T> {
        self.get(key).value()
    }

    /// Raw store write: `Some(data)` replaces value and timestamp, `None` only sets `loading`.
    pub fn set_entry(&self, key: &ResourceKey, data: Option<Slot>, loading: bool) {
        let now = self.inner.clock.now();
        self.lock_state().store.set(key, data, loading, now);
    }

    /// Store a freshly fetched value.
    pub fn set<T: Send + Sync + 'static>(&self, key: &ResourceKey, value: T) {
        self.set_entry(key, Some(Arc::new(value)), false);
    }

    pub fn is_fresh(&self, key: &ResourceKey, ttl_override: Option<Duration>) -> bool {
        let now = self.inner.clock.now();
        let entry = self.get(key);
        self.inner.policy.is_fresh(key, &entry, ttl_override, now)
    }

    pub fn status(&self, key: &ResourceKey) -> CacheStatus {
        let now = self.inner.clock.now();
        let state = self.lock_state();
        let entry = state.store.get(key);
        CacheStatus {
            key: key.clone(),
            has_data: entry.has_data(),
            is_loading: entry.loading,
            is_fresh: self.inner.policy.is_fresh(key, &entry, None, now),
            is_refreshing: state.in_flight.contains(key),
            timestamp: entry.timestamp,
            age: entry.age(now),
        }
    }

    /// Status of every slot the store knows about.
    pub fn statuses(&self) -> Vec<CacheStatus> {
        let keys = self.lock_state().store.keys();
        keys.iter().map(|key| self.status(key)).collect()
    }

    // ===== Invalidation =====

    /// Mark a slot stale while keeping its data visible.
    /// The next read refreshes it before returning.
    pub fn invalidate(&self, key: &ResourceKey) {
        debug!(key = %key, "Invalidating cache entry");
        self.lock_state().store.invalidate(key);
    }

    pub fn invalidate_many(&self, keys: &[ResourceKey]) {
        let mut state = self.lock_state();
        for key in keys {
            debug!(key = %key, "Invalidating cache entry");
            state.store.invalidate(key);
        }
    }

    /// Reset every slot to empty. Background refreshes already running are not
    /// cancelled and still write their results.
    pub fn clear(&self) {
        debug!("Clearing all cache entries");
        self.lock_state().store.reset();
    }
}
