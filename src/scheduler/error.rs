//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Period must be at least one second
    InvalidPeriod { period: u32 },

    /// Slot must fall inside `[0, period)`
    InvalidSlot { slot: u32, period: u32 },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPeriod { period } => {
                write!(f, "Invalid period '{}'. Must be greater than 0", period)
            }
            Self::InvalidSlot { slot, period } => {
                write!(
                    f,
                    "Invalid slot '{}'. Must be in 0..{} for a {}s period",
                    slot, period, period
                )
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid period error
    pub fn invalid_period(period: u32) -> Self {
        Self::InvalidPeriod { period }
    }

    /// Create an invalid slot error
    pub fn invalid_slot(slot: u32, period: u32) -> Self {
        Self::InvalidSlot { slot, period }
    }

    /// Scheduler errors come from configuration and never clear up on their own
    pub fn is_recoverable(&self) -> bool {
        false
    }
}
