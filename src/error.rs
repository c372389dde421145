//! Unified error handling for the notice-sentinel crate
//!
//! Domain errors ([`FetchError`], [`PublishError`], [`SchedulerError`]) stay
//! close to the code that raises them; [`Error`] wraps them for startup paths
//! that cross module boundaries.
//!
//! Nothing inside the poll loop returns an [`Error`]: fetch failures become
//! status events and publish failures are logged. Only startup (bad
//! configuration, unreachable broadcast service) is fatal.

use thiserror::Error;

pub use crate::scheduler::error::SchedulerError;
pub use crate::utils::error::{FetchError, PublishError};

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Announcements endpoint unreachable or misbehaving
    Network,
    /// Broadcast service errors
    Publish,
    /// Payload encoding problems
    Parsing,
    /// Configuration and validation errors
    Config,
    /// Slot and period errors
    Scheduler,
}

/// Unified error type for the notice-sentinel crate
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Publish-specific errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Scheduler and timing errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Publish(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Config(_) => false,
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) => ErrorCategory::Network,
            Self::Publish(PublishError::Serialize(_)) => ErrorCategory::Parsing,
            Self::Publish(_) => ErrorCategory::Publish,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
