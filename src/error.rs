//! Error taxonomy for the fetch, decode and publish stages.

use reqwest::StatusCode;
use thiserror::Error;

/// Failures while retrieving or decoding the upstream realtime feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Feed returned HTTP {0}")]
    Status(StatusCode),
    #[error("Invalid feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Feed payload too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: usize, max: usize },
    #[error("Malformed feed payload: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Failures while pushing items to the remote catalog.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The catalog answered with a non-2xx status.
    #[error("Catalog rejected update with HTTP {status}: {message}")]
    RemoteRejection { status: StatusCode, message: String },
    /// No response arrived (timeout, DNS, connection reset).
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid catalog URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Could not encode catalog payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Anything that aborts a single update cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}
