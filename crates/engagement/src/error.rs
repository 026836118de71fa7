//! Error types for the engagement crate.

use std::sync::Arc;

use thiserror::Error;

/// Errors raised while extracting engagement metrics.
///
/// Variants marked fatal abort the whole run; the rest are caught per item
/// and turned into `ERROR` records by the pipeline.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Guest token could not be obtained (fatal).
    #[error("Failed to acquire guest token: {reason}")]
    GuestToken { reason: String },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body or cache entry is not valid JSON.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Source CSV could not be parsed (fatal).
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to read file '{path}': {reason}")]
    FileRead { path: String, reason: String },

    #[error("Failed to write file '{path}': {reason}")]
    FileWrite { path: String, reason: String },

    /// Join column missing from the source CSV header (fatal).
    #[error("Column '{column}' not found in '{path}'")]
    MissingColumn { column: String, path: String },

    /// Cache store failure.
    #[error("Cache error: {reason}")]
    Cache { reason: String },

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    /// Failure shared by every caller that waited on the same cache key.
    #[error(transparent)]
    Shared(#[from] Arc<ExtractError>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type ExtractResult<T> = Result<T, ExtractError>;
