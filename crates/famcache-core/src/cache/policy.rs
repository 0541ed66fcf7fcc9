use chrono::{DateTime, Duration, Utc};

use super::key::{ResourceKey, TtlClass};
use super::store::CacheEntry;

/// When a still-fresh entry is old enough to refresh in the background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoftRefresh {
    /// Same threshold for every key.
    Fixed(Duration),
    /// Fraction of each key's own TTL, clamped to `0.0..=1.0`.
    Proportional(f64),
}

impl Default for SoftRefresh {
    fn default() -> Self {
        SoftRefresh::Fixed(TtlClass::Short.default_duration())
    }
}

/// Decides freshness from the static key table and the class durations.
#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    short: Duration,
    medium: Duration,
    long: Duration,
    soft: SoftRefresh,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            short: TtlClass::Short.default_duration(),
            medium: TtlClass::Medium.default_duration(),
            long: TtlClass::Long.default_duration(),
            soft: SoftRefresh::default(),
        }
    }
}

impl FreshnessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class_duration(mut self, class: TtlClass, ttl: Duration) -> Self {
        match class {
            TtlClass::Short => self.short = ttl,
            TtlClass::Medium => self.medium = ttl,
            TtlClass::Long => self.long = ttl,
        }
        self
    }

    pub fn with_soft_refresh(mut self, soft: SoftRefresh) -> Self {
        self.soft = soft;
        self
    }

    pub fn class_duration(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Short => self.short,
            TtlClass::Medium => self.medium,
            TtlClass::Long => self.long,
        }
    }

    pub fn ttl_for(&self, key: &ResourceKey) -> Duration {
        self.class_duration(key.ttl_class())
    }

    /// Fresh iff the entry holds data, has a timestamp, and is younger than its TTL.
    pub fn is_fresh(
        &self,
        key: &ResourceKey,
        entry: &CacheEntry,
        ttl_override: Option<Duration>,
        now: DateTime<Utc>,
    ) -> bool {
        if !entry.has_data() {
            return false;
        }
        let Some(age) = entry.age(now) else {
            return false;
        };
        age < ttl_override.unwrap_or_else(|| self.ttl_for(key))
    }

    pub fn soft_threshold(&self, key: &ResourceKey) -> Duration {
        match self.soft {
            SoftRefresh::Fixed(threshold) => threshold,
            SoftRefresh::Proportional(fraction) => {
                let fraction = fraction.clamp(0.0, 1.0);
                let ttl_ms = self.ttl_for(key).num_milliseconds() as f64;
                Duration::milliseconds((ttl_ms * fraction) as i64)
            }
        }
    }

    /// True when a fresh entry has aged past the soft threshold.
    pub fn wants_background_refresh(
        &self,
        key: &ResourceKey,
        entry: &CacheEntry,
        now: DateTime<Utc>,
    ) -> bool {
        entry
            .age(now)
            .map(|age| age > self.soft_threshold(key))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn entry_at(timestamp: DateTime<Utc>) -> CacheEntry {
        CacheEntry {
            data: Some(Arc::new(1u32)),
            timestamp: Some(timestamp),
            loading: false,
        }
    }

    #[test]
    fn test_fresh_until_ttl_boundary() {
        let policy = FreshnessPolicy::new();
        let t = Utc::now();
        let entry = entry_at(t);
        let key = ResourceKey::Profile;

        assert!(policy.is_fresh(&key, &entry, None, t));
        assert!(policy.is_fresh(&key, &entry, None, t + Duration::minutes(5) - Duration::milliseconds(1)));
        assert!(!policy.is_fresh(&key, &entry, None, t + Duration::minutes(5)));
        assert!(!policy.is_fresh(&key, &entry, None, t + Duration::hours(1)));
    }

    #[test]
    fn test_each_class_boundary() {
        let policy = FreshnessPolicy::new();
        let t = Utc::now();
        let entry = entry_at(t);

        for key in ResourceKey::KNOWN.iter() {
            let ttl = policy.ttl_for(key);
            assert!(policy.is_fresh(key, &entry, None, t + ttl - Duration::seconds(1)), "{key}");
            assert!(!policy.is_fresh(key, &entry, None, t + ttl), "{key}");
        }
    }

    #[test]
    fn test_no_data_or_no_timestamp_is_never_fresh() {
        let policy = FreshnessPolicy::new();
        let now = Utc::now();

        let empty = CacheEntry::default();
        assert!(!policy.is_fresh(&ResourceKey::News, &empty, None, now));

        let invalidated = CacheEntry {
            timestamp: None,
            ..entry_at(now)
        };
        assert!(!policy.is_fresh(&ResourceKey::News, &invalidated, None, now));
    }

    #[test]
    fn test_ttl_override_wins() {
        let policy = FreshnessPolicy::new();
        let t = Utc::now();
        let entry = entry_at(t);
        let later = t + Duration::minutes(3);

        assert!(policy.is_fresh(&ResourceKey::Profile, &entry, None, later));
        assert!(!policy.is_fresh(&ResourceKey::Profile, &entry, Some(Duration::minutes(2)), later));
    }

    #[test]
    fn test_unmapped_key_defaults_to_medium() {
        let policy = FreshnessPolicy::new();
        assert_eq!(policy.ttl_for(&ResourceKey::from("documents")), Duration::minutes(5));
    }

    #[test]
    fn test_fixed_soft_threshold_ignores_class() {
        let policy = FreshnessPolicy::new();
        assert_eq!(policy.soft_threshold(&ResourceKey::FamilyTree), Duration::minutes(2));
        assert_eq!(policy.soft_threshold(&ResourceKey::Profile), Duration::minutes(2));
    }

    #[test]
    fn test_proportional_soft_threshold() {
        let policy = FreshnessPolicy::new().with_soft_refresh(SoftRefresh::Proportional(0.4));
        assert_eq!(policy.soft_threshold(&ResourceKey::FamilyTree), Duration::minutes(6));
        assert_eq!(policy.soft_threshold(&ResourceKey::Profile), Duration::minutes(2));
    }

    #[test]
    fn test_background_refresh_only_past_threshold() {
        let policy = FreshnessPolicy::new();
        let t = Utc::now();
        let entry = entry_at(t);
        let key = ResourceKey::NotificationCount;

        assert!(!policy.wants_background_refresh(&key, &entry, t + Duration::seconds(90)));
        assert!(!policy.wants_background_refresh(&key, &entry, t + Duration::seconds(120)));
        assert!(policy.wants_background_refresh(&key, &entry, t + Duration::seconds(130)));
    }

    #[test]
    fn test_class_duration_override() {
        let policy = FreshnessPolicy::new().with_class_duration(TtlClass::Long, Duration::hours(1));
        assert_eq!(policy.ttl_for(&ResourceKey::Branches), Duration::hours(1));
        assert_eq!(policy.ttl_for(&ResourceKey::Profile), Duration::minutes(5));
    }
}
