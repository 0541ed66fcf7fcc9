//! Stale-while-revalidate reads and background refresh coordination.

use std::future::Future;
use std::mem;
use std::sync::{Arc, PoisonError};

use tracing::{debug, error, warn};

use super::key::ResourceKey;
use super::manager::DataCache;
use super::result::CacheResult;
use super::store::Slot;

/// How a read will be served, decided under a single lock acquisition.
enum Plan<T> {
    /// Fresh hit. `refresh` is set when this read claimed the in-flight flag.
    Cached { data: T, refresh: bool },
    /// Await the fetcher. `stale` is what to hand back if it fails.
    Fetch { stale: Option<T> },
}

/// Clears the in-flight flag when dropped, on success, failure or panic alike.
struct RefreshGuard {
    cache: DataCache,
    key: ResourceKey,
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.cache.lock_state().in_flight.remove(&self.key);
    }
}

impl DataCache {
    /// Read `key`, fetching through `fetcher` when needed.
    ///
    /// - fresh: cached data, plus a background refresh once the entry passes
    ///   the soft threshold and no refresh for the key is running
    /// - nothing cached: `loading` is raised while the fetch runs
    /// - forced or stale with data: the fetch is awaited without raising
    ///   `loading`; on failure the stale data is returned with the error
    ///
    /// # Panics
    ///
    /// Background refreshes are started with `tokio::spawn`, so this panics
    /// when polled outside a Tokio runtime.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &ResourceKey,
        force_refresh: bool,
        fetcher: F,
    ) -> CacheResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.fetch_with_write_through(key, force_refresh, fetcher, |_: &DataCache, _: &T| {})
            .await
    }

    /// Like [`DataCache::fetch`], with `write_through` run after every
    /// successful fetch (foreground or background) so a composite value can
    /// freshen the narrower slots it contains.
    ///
    /// # Panics
    ///
    /// Same as [`DataCache::fetch`]: requires a Tokio runtime.
    pub async fn fetch_with_write_through<T, F, Fut, W>(
        &self,
        key: &ResourceKey,
        force_refresh: bool,
        fetcher: F,
        write_through: W,
    ) -> CacheResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        W: Fn(&DataCache, &T) + Send + 'static,
    {
        match self.plan::<T>(key, force_refresh) {
            Plan::Cached { data, refresh } => {
                debug!(key = %key, refresh, "Serving from cache");
                if refresh {
                    self.spawn_refresh(key.clone(), fetcher, write_through);
                }
                CacheResult::from_cache(data)
            }
            Plan::Fetch { stale } => match fetcher().await {
                Ok(value) => {
                    debug!(key = %key, "Fetched from network");
                    let value = Arc::new(value);
                    self.store_fetched(key, &value, &write_through);
                    CacheResult::from_network((*value).clone())
                }
                Err(e) => {
                    error!(key = %key, error = %e, has_stale = stale.is_some(), "Fetch failed");
                    self.set_entry(key, None, false);
                    CacheResult::failed(stale, e.to_string())
                }
            },
        }
    }

    /// True while a background refresh for `key` is in flight.
    pub fn is_refreshing(&self, key: &ResourceKey) -> bool {
        self.lock_state().in_flight.contains(key)
    }

    /// Wait for every background refresh started so far, including ones
    /// started while waiting.
    pub async fn join_background(&self) {
        loop {
            let handles = {
                let mut background = self
                    .inner
                    .background
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                mem::take(&mut *background)
            };
            if handles.is_empty() {
                return;
            }
            for result in futures::future::join_all(handles).await {
                if let Err(e) = result {
                    warn!(error = %e, "Background refresh task did not complete");
                }
            }
        }
    }

    fn plan<T: Clone + 'static>(&self, key: &ResourceKey, force_refresh: bool) -> Plan<T> {
        let now = self.inner.clock.now();
        let policy = &self.inner.policy;
        let mut state = self.lock_state();
        let entry = state.store.get(key);

        let cached = entry.value::<T>();
        if entry.has_data() && cached.is_none() {
            warn!(key = %key, "Cached value has an unexpected type, refetching");
        }

        match cached {
            Some(data) if !force_refresh && policy.is_fresh(key, &entry, None, now) => {
                let refresh = policy.wants_background_refresh(key, &entry, now)
                    && state.in_flight.insert(key.clone());
                Plan::Cached { data, refresh }
            }
            Some(data) => Plan::Fetch { stale: Some(data) },
            None => {
                state.store.set_loading(key, true);
                Plan::Fetch { stale: None }
            }
        }
    }

    fn store_fetched<T, W>(&self, key: &ResourceKey, value: &Arc<T>, write_through: &W)
    where
        T: Send + Sync + 'static,
        W: Fn(&DataCache, &T),
    {
        let slot: Slot = Arc::clone(value) as Slot;
        self.set_entry(key, Some(slot), false);
        write_through(self, value.as_ref());
    }

    /// The in-flight flag for `key` must already be claimed.
    fn spawn_refresh<T, F, Fut, W>(&self, key: ResourceKey, fetcher: F, write_through: W)
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        W: Fn(&DataCache, &T) + Send + 'static,
    {
        let guard = RefreshGuard {
            cache: self.clone(),
            key,
        };

        let handle = tokio::spawn(async move {
            debug!(key = %guard.key, "Background refresh started");
            match fetcher().await {
                Ok(value) => {
                    guard
                        .cache
                        .store_fetched(&guard.key, &Arc::new(value), &write_through);
                    debug!(key = %guard.key, "Background refresh complete");
                }
                Err(e) => {
                    warn!(key = %guard.key, error = %e, "Background refresh failed");
                }
            }
        });

        let mut background = self
            .inner
            .background
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        background.retain(|h| !h.is_finished());
        background.push(handle);
    }
}
