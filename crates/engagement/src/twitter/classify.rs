//! Classification of raw conversation responses.

use serde_json::Value;

use super::types::{ConversationResponse, ExtractionResult, PostKind, PostReference, TweetObject};

/// Outcome of parsing a raw conversation response for one post.
#[derive(Debug, Clone)]
pub enum ParsedResponse {
    /// The post's own tweet object was found and decoded.
    Success(TweetObject),
    /// The API answered with a non-empty `errors` array.
    ApiError(Vec<Value>),
    /// The body did not have the expected shape.
    MalformedShape(String),
}

impl ParsedResponse {
    /// Parse the response body for the given post ID.
    pub fn parse(raw: &Value, post_id: &str) -> Self {
        let response: ConversationResponse = match serde_json::from_value(raw.clone()) {
            Ok(r) => r,
            Err(e) => return Self::MalformedShape(format!("unexpected response body: {e}")),
        };

        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            return Self::ApiError(errors);
        }

        let Some(global_objects) = response.global_objects else {
            return Self::MalformedShape("missing globalObjects".to_string());
        };

        let Some(tweet) = global_objects.tweets.get(post_id) else {
            return Self::MalformedShape(format!("tweet {post_id} missing from globalObjects"));
        };

        match serde_json::from_value::<TweetObject>(tweet.clone()) {
            Ok(tweet) => Self::Success(tweet),
            Err(e) => Self::MalformedShape(format!("tweet {post_id}: {e}")),
        }
    }
}

/// Turn a raw API response into the extraction result for a post.
///
/// Never fails: API errors and unexpected shapes become `ERROR` records.
pub fn classify(raw: &Value, post: &PostReference) -> ExtractionResult {
    match ParsedResponse::parse(raw, &post.post_id) {
        ParsedResponse::Success(tweet) => from_tweet(&post.url, tweet),
        ParsedResponse::ApiError(errors) => {
            tracing::warn!(
                url = %post.url,
                id = %post.post_id,
                errors = %serde_json::Value::Array(errors),
                "API returned errors"
            );
            ExtractionResult::error(&post.url)
        }
        ParsedResponse::MalformedShape(reason) => {
            tracing::warn!(url = %post.url, id = %post.post_id, reason = %reason, "Unexpected response shape");
            ExtractionResult::error(&post.url)
        }
    }
}

fn from_tweet(url: &str, tweet: TweetObject) -> ExtractionResult {
    let (kind, related_to) = if let Some(id) = tweet.in_reply_to_status_id_str {
        (PostKind::Reply, id)
    } else if let Some(id) = tweet.quoted_status_id_str {
        (PostKind::Quote, id)
    } else if let Some(id) = tweet.retweeted_status_id_str {
        (PostKind::Retweet, id)
    } else {
        (PostKind::Original, String::new())
    };

    ExtractionResult {
        url: url.to_string(),
        kind,
        related_to,
        retweet_count: tweet.retweet_count,
        favorite_count: tweet.favorite_count,
        reply_count: tweet.reply_count,
        quote_count: tweet.quote_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post() -> PostReference {
        PostReference::parse("https://twitter.com/user/status/42").unwrap()
    }

    fn response(tweet: &Value) -> Value {
        json!({ "globalObjects": { "tweets": { "42": tweet } } })
    }

    fn counts() -> Value {
        json!({
            "retweet_count": 1,
            "favorite_count": 2,
            "reply_count": 3,
            "quote_count": 4
        })
    }

    fn with(extra: &[(&str, &str)]) -> Value {
        let mut tweet = counts();
        for (key, value) in extra {
            tweet[*key] = json!(value);
        }
        response(&tweet)
    }

    #[test]
    fn test_original() {
        let result = classify(&with(&[]), &post());
        assert_eq!(result.kind, PostKind::Original);
        assert_eq!(result.related_to, "");
        assert_eq!(result.retweet_count, 1);
        assert_eq!(result.favorite_count, 2);
        assert_eq!(result.reply_count, 3);
        assert_eq!(result.quote_count, 4);
    }

    #[test]
    fn test_reply_wins_over_everything() {
        let raw = with(&[
            ("in_reply_to_status_id_str", "7"),
            ("quoted_status_id_str", "8"),
            ("retweeted_status_id_str", "9"),
        ]);
        let result = classify(&raw, &post());
        assert_eq!(result.kind, PostKind::Reply);
        assert_eq!(result.related_to, "7");
    }

    #[test]
    fn test_quote_checked_before_retweet() {
        let raw = with(&[("quoted_status_id_str", "8"), ("retweeted_status_id_str", "9")]);
        let result = classify(&raw, &post());
        assert_eq!(result.kind, PostKind::Quote);
        assert_eq!(result.related_to, "8");
    }

    #[test]
    fn test_retweet() {
        let result = classify(&with(&[("retweeted_status_id_str", "9")]), &post());
        assert_eq!(result.kind, PostKind::Retweet);
        assert_eq!(result.related_to, "9");
    }

    #[test]
    fn test_only_own_tweet_is_counted() {
        let raw = json!({ "globalObjects": { "tweets": {
            "41": { "retweet_count": 100, "favorite_count": 100, "reply_count": 100, "quote_count": 100 },
            "42": counts()
        } } });
        let result = classify(&raw, &post());
        assert_eq!(result.retweet_count, 1);
        assert_eq!(result.quote_count, 4);
    }

    #[test]
    fn test_api_errors_become_error_record() {
        let raw = json!({ "errors": [{ "code": 144, "message": "No status found" }] });
        assert!(matches!(
            ParsedResponse::parse(&raw, "42"),
            ParsedResponse::ApiError(_)
        ));
        assert_eq!(classify(&raw, &post()), ExtractionResult::error(&post().url));
    }

    #[test]
    fn test_empty_errors_array_is_ignored() {
        let mut raw = with(&[]);
        raw["errors"] = json!([]);
        assert_eq!(classify(&raw, &post()).kind, PostKind::Original);
    }

    #[test]
    fn test_malformed_shapes() {
        for raw in [
            json!({}),
            json!("rate limited"),
            json!({ "globalObjects": { "tweets": {} } }),
            json!({ "globalObjects": { "tweets": { "42": { "retweet_count": "many" } } } }),
        ] {
            assert!(matches!(
                ParsedResponse::parse(&raw, "42"),
                ParsedResponse::MalformedShape(_)
            ));
            assert!(classify(&raw, &post()).is_error());
        }
    }
}
