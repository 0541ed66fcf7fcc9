//! API client for the family-fund REST backend.
//!
//! Every read the cache performs goes through one of the `fetch_*` methods
//! here. Responses arrive either bare or wrapped in an envelope such as
//! `{"data": ...}` or `{"news": [...]}`; the client unwraps them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    Branch, FamilyTree, Initiative, NewsItem, Notification, Payment, Profile, Subscription,
    UnreadCount,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Production API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.alshailfund.com/api";

/// HTTP request timeout in seconds.
/// The cache imposes no timeout of its own, so a hung request ends here.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the portal backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: impl Into<Arc<str>>) {
        self.token = Some(token.into());
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<Arc<str>>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            token: Some(token.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Bearer token contains invalid header characters")?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await
                .map_err(ApiError::from)?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    debug!(url = %url, "GET succeeded");
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    // ===== Data Fetching Methods =====

    /// Fetch the signed-in member's profile
    pub async fn fetch_profile(&self) -> Result<Profile> {
        let body = self.get_json("members/mobile/profile").await?;
        parse_object(body, &["data"]).context("Failed to parse profile")
    }

    pub async fn fetch_subscriptions(&self) -> Result<Vec<Subscription>> {
        let body = self.get_json("members/mobile/subscriptions").await?;
        parse_list(body, &["data", "subscriptions"]).context("Failed to parse subscriptions")
    }

    /// Fetch the member's payment history
    pub async fn fetch_payments(&self) -> Result<Vec<Payment>> {
        let body = self.get_json("members/mobile/payments").await?;
        parse_list(body, &["data", "payments"]).context("Failed to parse payments")
    }

    pub async fn fetch_notifications(&self) -> Result<Vec<Notification>> {
        let body = self.get_json("notifications").await?;
        parse_list(body, &["notifications", "data"]).context("Failed to parse notifications")
    }

    /// Fetch the unread notification counter
    pub async fn fetch_unread_count(&self) -> Result<u64> {
        let body = self.get_json("notifications/unread-count").await?;
        let count: UnreadCount =
            parse_object(body, &["data"]).context("Failed to parse unread count")?;
        Ok(count.value())
    }

    pub async fn fetch_family_tree(&self) -> Result<FamilyTree> {
        let body = self.get_json("tree").await?;
        parse_object(body, &["data", "tree"]).context("Failed to parse family tree")
    }

    pub async fn fetch_branches(&self) -> Result<Vec<Branch>> {
        let body = self.get_json("tree/branches").await?;
        parse_list(body, &["data", "branches"]).context("Failed to parse branches")
    }

    /// Fetch initiatives that are still collecting contributions
    pub async fn fetch_initiatives(&self) -> Result<Vec<Initiative>> {
        let body = self.get_json("initiatives/active").await?;
        parse_list(body, &["initiatives", "data"]).context("Failed to parse initiatives")
    }

    pub async fn fetch_news(&self) -> Result<Vec<NewsItem>> {
        let body = self.get_json("news").await?;
        parse_list(body, &["news", "data"]).context("Failed to parse news")
    }

    /// Fetch the newest `limit` news items
    pub async fn fetch_recent_news(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let body = self.get_json(&format!("news?limit={}", limit)).await?;
        parse_list(body, &["news", "data"]).context("Failed to parse recent news")
    }
}

// ============================================================================
// Envelope handling
// ============================================================================

/// Take the first non-null field named in `keys`, or the body itself.
fn unwrap_envelope(body: Value, keys: &[&str]) -> Value {
    if let Value::Object(ref map) = body {
        for key in keys {
            match map.get(*key) {
                Some(Value::Null) | None => continue,
                Some(inner) => return inner.clone(),
            }
        }
    }
    body
}

fn parse_object<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Result<T> {
    Ok(serde_json::from_value(unwrap_envelope(body, keys))?)
}

/// Lists that come back as anything other than an array read as empty.
fn parse_list<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Result<Vec<T>> {
    match unwrap_envelope(body, keys) {
        list @ Value::Array(_) => Ok(serde_json::from_value(list)?),
        other => {
            debug!(kind = json_kind(&other), "Expected a list, treating as empty");
            Ok(Vec::new())
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
