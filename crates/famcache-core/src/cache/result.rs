use chrono::{DateTime, Duration, Utc};

use super::key::ResourceKey;

/// Outcome of a cache read. Reads never fail; a failed fetch is reported in
/// `error` next to whatever data the cache still holds.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheResult<T> {
    pub data: Option<T>,
    pub loading: bool,
    /// True when `data` was served from the cache without awaiting a fetch.
    pub from_cache: bool,
    pub error: Option<String>,
}

impl<T> CacheResult<T> {
    pub fn from_cache(data: T) -> Self {
        Self {
            data: Some(data),
            loading: false,
            from_cache: true,
            error: None,
        }
    }

    pub fn from_network(data: T) -> Self {
        Self {
            data: Some(data),
            loading: false,
            from_cache: false,
            error: None,
        }
    }

    /// A failed fetch, carrying the previously cached value if there was one.
    pub fn failed(stale: Option<T>, error: impl Into<String>) -> Self {
        Self {
            data: stale,
            loading: false,
            from_cache: false,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Fill in `data` when the read produced nothing.
    pub fn or_else_data(mut self, fallback: impl FnOnce() -> T) -> Self {
        if self.data.is_none() {
            self.data = Some(fallback());
        }
        self
    }

}

/// Inspectable state of one cache slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStatus {
    pub key: ResourceKey,
    pub has_data: bool,
    pub is_loading: bool,
    pub is_fresh: bool,
    /// A background refresh for this key is in flight.
    pub is_refreshing: bool,
    pub timestamp: Option<DateTime<Utc>>,
    pub age: Option<Duration>,
}

impl CacheStatus {
    pub fn age_display(&self) -> String {
        self.age
            .map(format_age)
            .unwrap_or_else(|| "never".to_string())
    }
}

/// Entry age for the status table. Cache entries rarely outlive a session,
/// so anything past an hour is shown in whole hours.
pub fn format_age(age: Duration) -> String {
    match age.num_seconds() {
        // Negative ages come from clock skew
        s if s < 1 => "just now".to_string(),
        s if s < 60 => format!("{}s ago", s),
        s if s < 3600 => format!("{}m {}s ago", s / 60, s % 60),
        s => format!("{}h ago", s / 3600),
    }
}
