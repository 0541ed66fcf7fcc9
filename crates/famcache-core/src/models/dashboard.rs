use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NewsItem, Profile, Subscription};

/// Home-screen aggregate built from four independent requests.
/// Every part has a fallback, so a dashboard always exists once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub profile: Option<Profile>,
    pub subscriptions: Vec<Subscription>,
    pub notification_count: u64,
    pub recent_news: Option<NewsItem>,
    pub fetched_at: DateTime<Utc>,
}

impl Dashboard {
    pub fn last_payment_date(&self) -> &str {
        self.subscriptions
            .first()
            .map(Subscription::display_date)
            .unwrap_or("-")
    }
}
