//! Error types for the fetch and publish adapters
//!
//! Neither of these ever escapes the polling loop: fetch failures are folded
//! into a [`crate::models::PollResult`] and publish failures are logged.

use thiserror::Error;

/// Errors that can occur while polling the announcements endpoint
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error not covered by a more specific variant
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connect or read timeout elapsed
    #[error("Request timeout")]
    Timeout,

    /// Connection refused, reset, or name resolution failed
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Response headers arrived but the body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Classify a reqwest error into the most specific variant
    pub fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Http(err)
        }
    }

    /// Transport errors are always worth another attempt on the next tick
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_))
    }
}

/// Errors that can occur while broadcasting an event
#[derive(Error, Debug)]
pub enum PublishError {
    /// Could not obtain a connection from the pool
    #[error("Redis pool error: {0}")]
    Pool(String),

    /// Redis rejected the command or the connection dropped
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Event could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PublishError {
    /// Connection-level problems may clear up before the next tick
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Serialize(_))
    }
}
