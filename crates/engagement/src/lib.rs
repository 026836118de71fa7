//! Engagement crate for batched Twitter/X metrics extraction.
//!
//! This crate provides:
//! - Guest-token gated lookups against the Twitter web API
//! - A persistent response cache with a compute-once-per-key contract
//! - Post classification (original, reply, quote, retweet)
//! - Bucketed, rate-limited extraction preserving input order
//! - CSV export, optionally joined back onto a source CSV

pub mod cache;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod pipeline;
pub mod twitter;

// Re-export main types
pub use cache::{CacheConfig, ResponseCache};
pub use error::{ExtractError, ExtractResult};
pub use export::SourceTable;
pub use fetcher::TweetFetcher;
pub use pipeline::{Pipeline, PipelineConfig};
pub use twitter::{ExtractionResult, PostKind, PostReference, TwitterApi, TwitterClient};
