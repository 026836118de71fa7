//! Twitter/X API access and response classification.
//!
//! Provides the guest-token client, post URL parsing and the classifier that
//! turns raw conversation responses into engagement metrics.

mod classify;
mod client;
mod types;

pub use classify::{classify, ParsedResponse};
pub use client::{ApiEndpoints, TwitterApi, TwitterClient};
pub use types::{ExtractionResult, PostKind, PostReference, TweetObject};
