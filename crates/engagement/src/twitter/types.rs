//! Twitter data types.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Matches post URLs on twitter.com / x.com and captures the numeric post ID.
static POST_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://(?:www\.|mobile\.)?(?:twitter|x)\.com/.+/status/(\d+)")
        .expect("post URL regex is valid")
});

/// A post URL together with the ID extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    /// URL exactly as it was supplied.
    pub url: String,
    /// Numeric post ID.
    pub post_id: String,
}

impl PostReference {
    /// Parse a post URL. Returns `None` when the URL does not point at a post.
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let captures = POST_URL_REGEX.captures(url.trim())?;
        Some(Self {
            url: url.to_string(),
            post_id: captures[1].to_string(),
        })
    }

    /// Cache key under which the raw API response is stored.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("tweet-{}", self.post_id)
    }
}

/// Relationship of a post to other posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostKind {
    Original,
    Reply,
    Quote,
    Retweet,
    /// Metrics could not be extracted.
    Error,
}

impl PostKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "ORIGINAL",
            Self::Reply => "REPLY",
            Self::Quote => "QUOTE",
            Self::Retweet => "RETWEET",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engagement metrics extracted for one input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    /// ID of the replied-to, quoted or retweeted post; empty otherwise.
    pub related_to: String,
    pub retweet_count: i64,
    pub favorite_count: i64,
    pub reply_count: i64,
    pub quote_count: i64,
}

impl ExtractionResult {
    /// Sentinel value used for every count of an `ERROR` record.
    pub const ERROR_COUNT: i64 = -1;

    /// Build the `ERROR` record for a URL.
    #[must_use]
    pub fn error(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: PostKind::Error,
            related_to: String::new(),
            retweet_count: Self::ERROR_COUNT,
            favorite_count: Self::ERROR_COUNT,
            reply_count: Self::ERROR_COUNT,
            quote_count: Self::ERROR_COUNT,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.kind == PostKind::Error
    }
}

/// Body of the guest activation endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct GuestTokenResponse {
    pub guest_token: Option<String>,
}

/// Body of the conversation endpoint, as far as metrics are concerned.
#[derive(Debug, Deserialize)]
pub(crate) struct ConversationResponse {
    #[serde(rename = "globalObjects")]
    pub global_objects: Option<GlobalObjects>,
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GlobalObjects {
    #[serde(default)]
    pub tweets: HashMap<String, Value>,
}

/// One tweet object keyed by its ID inside `globalObjects.tweets`.
#[derive(Debug, Clone, Deserialize)]
pub struct TweetObject {
    pub retweet_count: i64,
    pub favorite_count: i64,
    pub reply_count: i64,
    pub quote_count: i64,
    #[serde(default)]
    pub in_reply_to_status_id_str: Option<String>,
    #[serde(default)]
    pub quoted_status_id_str: Option<String>,
    #[serde(default)]
    pub retweeted_status_id_str: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_post_reference() {
        let post = PostReference::parse("https://twitter.com/jack/status/20").unwrap();
        assert_eq!(post.post_id, "20");
        assert_eq!(post.cache_key(), "tweet-20");

        let post = PostReference::parse("https://x.com/user/status/123456?s=20").unwrap();
        assert_eq!(post.post_id, "123456");
        assert_eq!(post.url, "https://x.com/user/status/123456?s=20");

        assert!(PostReference::parse("https://mobile.twitter.com/u/status/9").is_some());
    }

    #[test]
    fn test_parse_rejects_non_post_urls() {
        assert_eq!(PostReference::parse("https://google.com"), None);
        assert_eq!(PostReference::parse("https://twitter.com/jack"), None);
        assert_eq!(PostReference::parse("http://twitter.com/jack/status/20"), None);
        assert_eq!(PostReference::parse("not a url"), None);
    }

    #[test]
    fn test_error_record_uses_sentinels() {
        let result = ExtractionResult::error("bad");
        assert!(result.is_error());
        assert_eq!(result.related_to, "");
        assert_eq!(
            [
                result.retweet_count,
                result.favorite_count,
                result.reply_count,
                result.quote_count
            ],
            [-1; 4]
        );
    }

    #[test]
    fn test_kind_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&PostKind::Retweet).unwrap(),
            "\"RETWEET\""
        );
        assert_eq!(PostKind::Quote.to_string(), "QUOTE");
    }
}
