//! HTTP client for the guest-token gated Twitter web API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use super::types::GuestTokenResponse;
use crate::error::{ExtractError, ExtractResult};

const GUEST_TOKEN_URL: &str = "https://api.twitter.com/1.1/guest/activate.json";
const CONVERSATION_BASE: &str = "https://twitter.com/i/api/2/timeline/conversation";

/// Query string the web client sends with conversation lookups.
const CONVERSATION_QUERY: &[(&str, &str)] = &[
    ("include_profile_interstitial_type", "1"),
    ("include_blocking", "1"),
    ("include_blocked_by", "1"),
    ("include_followed_by", "1"),
    ("include_want_retweets", "1"),
    ("include_mute_edge", "1"),
    ("include_can_dm", "1"),
    ("include_can_media_tag", "1"),
    ("skip_status", "1"),
    ("cards_platform", "Web-12"),
    ("include_cards", "1"),
    ("include_ext_alt_text", "true"),
    ("include_quote_count", "true"),
    ("include_reply_count", "1"),
    ("tweet_mode", "extended"),
    ("include_entities", "true"),
    ("include_user_entities", "true"),
    ("include_ext_media_color", "true"),
    ("include_ext_media_availability", "true"),
    ("send_error_codes", "true"),
    ("simple_quoted_tweet", "true"),
    ("count", "20"),
    ("include_ext_has_birdwatch_notes", "false"),
    ("ext", "mediaStats,highlightedLabel"),
];

/// Upstream endpoints. Overridable so tests can target a local server.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    /// POST endpoint returning `{ "guest_token": "..." }`.
    pub guest_token_url: String,
    /// Base of the conversation endpoint; `/{id}.json` is appended.
    pub conversation_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            guest_token_url: GUEST_TOKEN_URL.to_string(),
            conversation_base: CONVERSATION_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Operations the pipeline needs from the upstream API.
#[async_trait]
pub trait TwitterApi: Send + Sync {
    /// Exchange the bearer credential for a fresh guest token.
    async fn guest_token(&self) -> ExtractResult<String>;

    /// Fetch the raw conversation response for a post.
    ///
    /// The JSON body is returned whatever the HTTP status; API-level failures
    /// are reported inside the body and detected by the classifier.
    async fn conversation(&self, post_id: &str, guest_token: &str) -> ExtractResult<Value>;
}

/// reqwest-backed [`TwitterApi`].
pub struct TwitterClient {
    bearer_token: String,
    endpoints: ApiEndpoints,
    client: Client,
}

impl TwitterClient {
    /// Create a client against the public endpoints.
    pub fn new(bearer_token: String) -> ExtractResult<Self> {
        Self::with_endpoints(bearer_token, ApiEndpoints::default())
    }

    /// Create a client against custom endpoints.
    pub fn with_endpoints(bearer_token: String, endpoints: ApiEndpoints) -> ExtractResult<Self> {
        if bearer_token.trim().is_empty() {
            return Err(ExtractError::InvalidConfig {
                key: "bearer_token".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let client = Client::builder().timeout(endpoints.timeout).build()?;

        Ok(Self {
            bearer_token,
            endpoints,
            client,
        })
    }

    /// Headers shared by every request, mimicking the web client.
    fn base_headers(&self) -> ExtractResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9,fr;q=0.8"),
        );
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.bearer_token)).map_err(|e| {
            ExtractError::InvalidConfig {
                key: "bearer_token".to_string(),
                reason: e.to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
        headers.insert("x-twitter-active-user", HeaderValue::from_static("yes"));
        headers.insert("x-twitter-client-language", HeaderValue::from_static("en"));
        Ok(headers)
    }
}

#[async_trait]
impl TwitterApi for TwitterClient {
    async fn guest_token(&self) -> ExtractResult<String> {
        let mut headers = self.base_headers()?;
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));

        let response = self
            .client
            .post(&self.endpoints.guest_token_url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ExtractError::GuestToken {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body: GuestTokenResponse =
            response
                .json()
                .await
                .map_err(|e| ExtractError::GuestToken {
                    reason: format!("unreadable response ({status}): {e}"),
                })?;

        let token = body.guest_token.ok_or_else(|| ExtractError::GuestToken {
            reason: format!("guest_token missing from response ({status})"),
        })?;

        tracing::debug!("Acquired guest token");
        Ok(token)
    }

    async fn conversation(&self, post_id: &str, guest_token: &str) -> ExtractResult<Value> {
        let mut headers = self.base_headers()?;
        headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
        let guest = HeaderValue::from_str(guest_token).map_err(|e| ExtractError::GuestToken {
            reason: format!("guest token is not a valid header value: {e}"),
        })?;
        headers.insert("x-guest-token", guest);

        let url = format!("{}/{post_id}.json", self.endpoints.conversation_base);
        let response = self
            .client
            .get(url)
            .query(CONVERSATION_QUERY)
            .headers(headers)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(id = post_id, status = %status, "Conversation lookup returned non-success status");
        }

        Ok(response.json::<Value>().await?)
    }
}
