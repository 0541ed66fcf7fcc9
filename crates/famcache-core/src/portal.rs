//! Typed portal reads on top of [`DataCache`].
//!
//! `PortalCache` owns one fetch method per recognized resource key and knows
//! which keys each user action makes stale. The network side is abstracted
//! by [`PortalApi`] so screens and tests can run against any backend.

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::cache::{CacheResult, DataCache, ResourceKey};
use crate::models::{
    Branch, Dashboard, FamilyTree, Initiative, NewsItem, Notification, Payment, Profile,
    Subscription,
};

/// Backend operations the portal reads from.
pub trait PortalApi: Send + Sync + 'static {
    fn profile(&self) -> impl Future<Output = Result<Profile>> + Send;
    fn subscriptions(&self) -> impl Future<Output = Result<Vec<Subscription>>> + Send;
    fn payments(&self) -> impl Future<Output = Result<Vec<Payment>>> + Send;
    fn notifications(&self) -> impl Future<Output = Result<Vec<Notification>>> + Send;
    fn unread_count(&self) -> impl Future<Output = Result<u64>> + Send;
    fn family_tree(&self) -> impl Future<Output = Result<FamilyTree>> + Send;
    fn branches(&self) -> impl Future<Output = Result<Vec<Branch>>> + Send;
    fn initiatives(&self) -> impl Future<Output = Result<Vec<Initiative>>> + Send;
    fn news(&self) -> impl Future<Output = Result<Vec<NewsItem>>> + Send;
    fn recent_news(&self, limit: usize) -> impl Future<Output = Result<Vec<NewsItem>>> + Send;
}

impl PortalApi for ApiClient {
    fn profile(&self) -> impl Future<Output = Result<Profile>> + Send {
        self.fetch_profile()
    }

    fn subscriptions(&self) -> impl Future<Output = Result<Vec<Subscription>>> + Send {
        self.fetch_subscriptions()
    }

    fn payments(&self) -> impl Future<Output = Result<Vec<Payment>>> + Send {
        self.fetch_payments()
    }

    fn notifications(&self) -> impl Future<Output = Result<Vec<Notification>>> + Send {
        self.fetch_notifications()
    }

    fn unread_count(&self) -> impl Future<Output = Result<u64>> + Send {
        self.fetch_unread_count()
    }

    fn family_tree(&self) -> impl Future<Output = Result<FamilyTree>> + Send {
        self.fetch_family_tree()
    }

    fn branches(&self) -> impl Future<Output = Result<Vec<Branch>>> + Send {
        self.fetch_branches()
    }

    fn initiatives(&self) -> impl Future<Output = Result<Vec<Initiative>>> + Send {
        self.fetch_initiatives()
    }

    fn news(&self) -> impl Future<Output = Result<Vec<NewsItem>>> + Send {
        self.fetch_news()
    }

    fn recent_news(&self, limit: usize) -> impl Future<Output = Result<Vec<NewsItem>>> + Send {
        self.fetch_recent_news(limit)
    }
}

/// User actions that change server-side data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// A subscription or initiative payment.
    Payment,
    BankTransfer,
    ProfileEdit,
    NotificationsRead,
}

impl Mutation {
    /// Keys whose cached data no longer matches the server after this action.
    pub fn affected_keys(&self) -> &'static [ResourceKey] {
        match self {
            Mutation::Payment => &[
                ResourceKey::Payments,
                ResourceKey::Profile,
                ResourceKey::Dashboard,
            ],
            Mutation::BankTransfer => &[ResourceKey::Payments],
            Mutation::ProfileEdit => &[ResourceKey::Profile, ResourceKey::Dashboard],
            Mutation::NotificationsRead => &[
                ResourceKey::Notifications,
                ResourceKey::NotificationCount,
                ResourceKey::Dashboard,
            ],
        }
    }
}

/// Cache-backed portal reads.
/// Clone is cheap; clones share the cache and the API handle.
pub struct PortalCache<A> {
    cache: DataCache,
    api: Arc<A>,
}

impl<A> Clone for PortalCache<A> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            api: Arc::clone(&self.api),
        }
    }
}

impl<A: PortalApi> PortalCache<A> {
    pub fn new(cache: DataCache, api: A) -> Self {
        Self {
            cache,
            api: Arc::new(api),
        }
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Home-screen composite. The four parts are requested concurrently and
    /// each falls back to its own default, so this read only fails when the
    /// task itself does. A successful fetch also refreshes `profile` and
    /// `notificationCount`.
    pub async fn fetch_dashboard(&self, force_refresh: bool) -> CacheResult<Dashboard> {
        let api = Arc::clone(&self.api);
        let cache = self.cache.clone();
        self.cache
            .fetch_with_write_through(
                &ResourceKey::Dashboard,
                force_refresh,
                move || async move { Ok(assemble_dashboard(api.as_ref(), &cache).await) },
                |cache: &DataCache, dashboard: &Dashboard| {
                    if let Some(ref profile) = dashboard.profile {
                        cache.set(&ResourceKey::Profile, profile.clone());
                    }
                    cache.set(&ResourceKey::NotificationCount, dashboard.notification_count);
                },
            )
            .await
    }

    pub async fn fetch_profile(&self, force_refresh: bool) -> CacheResult<Profile> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::Profile, force_refresh, move || async move {
                api.profile().await
            })
            .await
    }

    pub async fn fetch_subscriptions(&self, force_refresh: bool) -> CacheResult<Vec<Subscription>> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::Subscriptions, force_refresh, move || async move {
                api.subscriptions().await
            })
            .await
            .or_else_data(Vec::new)
    }

    pub async fn fetch_payments(&self, force_refresh: bool) -> CacheResult<Vec<Payment>> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::Payments, force_refresh, move || async move {
                api.payments().await
            })
            .await
            .or_else_data(Vec::new)
    }

    pub async fn fetch_notifications(&self, force_refresh: bool) -> CacheResult<Vec<Notification>> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::Notifications, force_refresh, move || async move {
                api.notifications().await
            })
            .await
            .or_else_data(Vec::new)
    }

    /// Unread badge counter; reads as 0 when nothing could be fetched.
    pub async fn fetch_notification_count(&self, force_refresh: bool) -> CacheResult<u64> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::NotificationCount, force_refresh, move || async move {
                api.unread_count().await
            })
            .await
            .or_else_data(|| 0)
    }

    pub async fn fetch_family_tree(&self, force_refresh: bool) -> CacheResult<FamilyTree> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::FamilyTree, force_refresh, move || async move {
                api.family_tree().await
            })
            .await
    }

    pub async fn fetch_branches(&self, force_refresh: bool) -> CacheResult<Vec<Branch>> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::Branches, force_refresh, move || async move {
                api.branches().await
            })
            .await
            .or_else_data(Vec::new)
    }

    pub async fn fetch_initiatives(&self, force_refresh: bool) -> CacheResult<Vec<Initiative>> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::Initiatives, force_refresh, move || async move {
                api.initiatives().await
            })
            .await
            .or_else_data(Vec::new)
    }

    pub async fn fetch_news(&self, force_refresh: bool) -> CacheResult<Vec<NewsItem>> {
        let api = Arc::clone(&self.api);
        self.cache
            .fetch(&ResourceKey::News, force_refresh, move || async move {
                api.news().await
            })
            .await
            .or_else_data(Vec::new)
    }

    /// Mark everything `mutation` touched as stale.
    pub fn record_mutation(&self, mutation: Mutation) {
        info!(mutation = ?mutation, "Invalidating after mutation");
        self.cache.invalidate_many(mutation.affected_keys());
    }

    pub fn invalidate(&self, key: &ResourceKey) {
        self.cache.invalidate(key);
    }

    /// Drop all cached data, e.g. on logout.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

async fn assemble_dashboard<A: PortalApi>(api: &A, cache: &DataCache) -> Dashboard {
    let (profile, subscriptions, count, news) = tokio::join!(
        api.profile(),
        api.subscriptions(),
        api.unread_count(),
        api.recent_news(1),
    );

    Dashboard {
        profile: profile
            .map_err(|e| debug!(error = %e, "Dashboard profile unavailable"))
            .ok(),
        subscriptions: subscriptions.unwrap_or_else(|e| {
            debug!(error = %e, "Dashboard subscriptions unavailable");
            Vec::new()
        }),
        notification_count: count.unwrap_or_else(|e| {
            debug!(error = %e, "Dashboard notification count unavailable");
            0
        }),
        recent_news: match news {
            Ok(items) => items.into_iter().next(),
            Err(e) => {
                debug!(error = %e, "Dashboard news unavailable");
                None
            }
        },
        fetched_at: cache.now(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use anyhow::anyhow;
    use chrono::Duration;

    use super::*;
    use crate::cache::{Clock, FreshnessPolicy, ManualClock};

    #[derive(Default)]
    struct MockApi {
        calls: AtomicUsize,
        profile_name: Mutex<Option<String>>,
        unread: AtomicUsize,
        fail_news: bool,
        fail_subscriptions: bool,
    }

    impl MockApi {
        fn with_profile(name: &str) -> Self {
            let api = Self::default();
            *api.profile_name.lock().unwrap() = Some(name.to_string());
            api
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample_news(title: &str) -> NewsItem {
        NewsItem {
            id: Some("1".to_string()),
            title: Some(title.to_string()),
            title_ar: None,
            content: None,
            content_ar: None,
            publish_date: None,
        }
    }

    impl PortalApi for MockApi {
        async fn profile(&self) -> Result<Profile> {
            self.hit();
            match self.profile_name.lock().unwrap().clone() {
                Some(name) => Ok(Profile {
                    id: Some("1".to_string()),
                    full_name: Some(name),
                    full_name_ar: None,
                    name: None,
                    membership_number: None,
                    phone: None,
                    membership_status: Some("active".to_string()),
                    balance: Some(100.0),
                    current_balance: None,
                }),
                None => Err(anyhow!("Network error")),
            }
        }

        async fn subscriptions(&self) -> Result<Vec<Subscription>> {
            self.hit();
            if self.fail_subscriptions {
                return Err(anyhow!("subscriptions down"));
            }
            Ok(Vec::new())
        }

        async fn payments(&self) -> Result<Vec<Payment>> {
            self.hit();
            Err(anyhow!("payments down"))
        }

        async fn notifications(&self) -> Result<Vec<Notification>> {
            self.hit();
            Ok(Vec::new())
        }

        async fn unread_count(&self) -> Result<u64> {
            self.hit();
            Ok(self.unread.load(Ordering::SeqCst) as u64)
        }

        async fn family_tree(&self) -> Result<FamilyTree> {
            self.hit();
            Err(anyhow!("tree down"))
        }

        async fn branches(&self) -> Result<Vec<Branch>> {
            self.hit();
            Ok(Vec::new())
        }

        async fn initiatives(&self) -> Result<Vec<Initiative>> {
            self.hit();
            Ok(Vec::new())
        }

        async fn news(&self) -> Result<Vec<NewsItem>> {
            self.hit();
            Ok(vec![sample_news("a"), sample_news("b")])
        }

        async fn recent_news(&self, limit: usize) -> Result<Vec<NewsItem>> {
            self.hit();
            if self.fail_news {
                return Err(anyhow!("news down"));
            }
            Ok(vec![sample_news("latest"), sample_news("older")]
                .into_iter()
                .take(limit)
                .collect())
        }
    }

    fn portal(api: MockApi) -> (PortalCache<MockApi>, ManualClock) {
        let clock = ManualClock::default();
        let cache = DataCache::with_clock(FreshnessPolicy::default(), Arc::new(clock.clone()));
        (PortalCache::new(cache, api), clock)
    }

    #[tokio::test]
    async fn test_dashboard_survives_failed_news_branch() {
        let api = MockApi {
            fail_news: true,
            ..MockApi::with_profile("Member")
        };
        let (portal, _clock) = portal(api);

        let result = portal.fetch_dashboard(false).await;
        assert!(result.error.is_none());
        let dashboard = result.data.expect("dashboard assembled");
        assert_eq!(dashboard.recent_news, None);
        assert_eq!(
            dashboard.profile.as_ref().map(Profile::display_name),
            Some("Member")
        );
    }

    #[tokio::test]
    async fn test_dashboard_defaults_every_failed_branch() {
        let api = MockApi {
            fail_news: true,
            fail_subscriptions: true,
            ..MockApi::default()
        };
        let (portal, _clock) = portal(api);

        let dashboard = portal.fetch_dashboard(false).await.data.expect("dashboard assembled");
        assert_eq!(dashboard.profile, None);
        assert!(dashboard.subscriptions.is_empty());
        assert_eq!(dashboard.notification_count, 0);
        assert_eq!(dashboard.recent_news, None);
        assert_eq!(dashboard.last_payment_date(), "-");
    }

    #[tokio::test]
    async fn test_dashboard_writes_through_to_profile_and_count() {
        let api = MockApi::with_profile("Member");
        api.unread.store(4, Ordering::SeqCst);
        let (portal, _clock) = portal(api);

        let dashboard = portal.fetch_dashboard(false).await.data.expect("dashboard");
        assert_eq!(dashboard.recent_news.map(|n| n.display_title().to_string()), Some("latest".to_string()));
        let calls = portal.api().calls();

        let profile = portal.fetch_profile(false).await;
        assert!(profile.from_cache);
        assert_eq!(profile.data.map(|p| p.display_name().to_string()), Some("Member".to_string()));

        let count = portal.fetch_notification_count(false).await;
        assert!(count.from_cache);
        assert_eq!(count.data, Some(4));
        assert_eq!(portal.api().calls(), calls);
    }

    #[tokio::test]
    async fn test_background_dashboard_refresh_writes_through() {
        let api = MockApi::with_profile("Before");
        api.unread.store(1, Ordering::SeqCst);
        let (portal, clock) = portal(api);
        portal.fetch_dashboard(false).await;

        *portal.api().profile_name.lock().unwrap() = Some("After".to_string());
        portal.api().unread.store(9, Ordering::SeqCst);
        clock.advance(Duration::minutes(3));

        let stale = portal.fetch_dashboard(false).await;
        assert!(stale.from_cache);
        assert_eq!(stale.data.map(|d| d.notification_count), Some(1));

        portal.cache().join_background().await;
        let cache = portal.cache();
        assert_eq!(
            cache.peek::<Profile>(&ResourceKey::Profile).map(|p| p.display_name().to_string()),
            Some("After".to_string())
        );
        assert_eq!(cache.peek::<u64>(&ResourceKey::NotificationCount), Some(9));
        assert!(cache.is_fresh(&ResourceKey::Profile, None));
        assert!(cache.is_fresh(&ResourceKey::NotificationCount, None));
        assert_eq!(cache.get(&ResourceKey::Profile).timestamp, Some(clock.now()));

        let dashboard = cache.peek::<Dashboard>(&ResourceKey::Dashboard).expect("dashboard");
        assert_eq!(dashboard.notification_count, 9);
    }

    #[tokio::test]
    async fn test_dashboard_stamped_with_cache_clock() {
        let (portal, clock) = portal(MockApi::with_profile("Member"));
        clock.advance(Duration::days(400));

        let dashboard = portal.fetch_dashboard(false).await.data.expect("dashboard");
        assert_eq!(dashboard.fetched_at, clock.now());
        assert_eq!(portal.cache().get(&ResourceKey::Dashboard).timestamp, Some(clock.now()));
    }

    #[tokio::test]
    async fn test_write_through_skips_missing_profile() {
        let (portal, _clock) = portal(MockApi::default());

        portal.fetch_dashboard(false).await;
        assert!(!portal.cache().get(&ResourceKey::Profile).has_data());
        assert!(portal.cache().get(&ResourceKey::NotificationCount).has_data());
    }

    #[tokio::test]
    async fn test_profile_failure_with_nothing_cached() {
        let (portal, _clock) = portal(MockApi::default());

        let result = portal.fetch_profile(false).await;
        assert_eq!(result.data, None);
        assert_eq!(result.error.as_deref(), Some("Network error"));
        assert!(!result.loading);
    }

    #[tokio::test]
    async fn test_list_reads_fall_back_to_empty() {
        let (portal, _clock) = portal(MockApi::default());

        let payments = portal.fetch_payments(false).await;
        assert_eq!(payments.data, Some(Vec::new()));
        assert_eq!(payments.error.as_deref(), Some("payments down"));
        assert!(!portal.cache().get(&ResourceKey::Payments).has_data());

        let tree = portal.fetch_family_tree(false).await;
        assert_eq!(tree.data, None);
        assert!(tree.is_error());
    }

    #[tokio::test]
    async fn test_mutation_invalidates_affected_keys() {
        let (portal, _clock) = portal(MockApi::with_profile("Member"));

        portal.fetch_dashboard(false).await;
        portal.fetch_news(false).await;
        let calls = portal.api().calls();

        portal.record_mutation(Mutation::ProfileEdit);
        assert!(!portal.cache().is_fresh(&ResourceKey::Profile, None));
        assert!(!portal.cache().is_fresh(&ResourceKey::Dashboard, None));
        assert!(portal.cache().is_fresh(&ResourceKey::News, None));

        let profile = portal.fetch_profile(false).await;
        assert!(!profile.from_cache);
        assert_eq!(portal.api().calls(), calls + 1);
    }

    #[tokio::test]
    async fn test_cached_lists_expire_by_class() {
        let (portal, clock) = portal(MockApi::default());

        portal.fetch_branches(false).await;
        portal.fetch_notifications(false).await;
        let calls = portal.api().calls();

        clock.advance(Duration::minutes(3));
        assert!(portal.fetch_branches(false).await.from_cache);
        assert!(!portal.fetch_notifications(false).await.from_cache);
        // Branches passed the soft threshold, so one background refresh ran too.
        portal.cache().join_background().await;
        assert_eq!(portal.api().calls(), calls + 2);
    }

    #[test]
    fn test_affected_keys() {
        assert_eq!(Mutation::BankTransfer.affected_keys(), &[ResourceKey::Payments]);
        assert!(Mutation::Payment.affected_keys().contains(&ResourceKey::Profile));
        assert!(Mutation::NotificationsRead
            .affected_keys()
            .contains(&ResourceKey::NotificationCount));
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let (portal, _clock) = portal(MockApi::with_profile("Member"));
        portal.fetch_dashboard(false).await;
        portal.fetch_initiatives(false).await;
        portal.fetch_subscriptions(false).await;

        portal.clear();
        assert!(portal
            .cache()
            .statuses()
            .iter()
            .all(|status| !status.has_data && !status.is_loading));
    }
}
