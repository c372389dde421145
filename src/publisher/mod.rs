//! Event broadcasting
//!
//! Events are encoded as compact JSON (non-ASCII kept verbatim) and sent to
//! one named channel. Delivery is fire-and-forget: the returned count is the
//! number of subscribers at send time and is informational only. Nothing is
//! retained for subscribers that connect later.

pub mod broadcast;
pub mod redis;

use async_trait::async_trait;

use crate::models::Event;
use crate::utils::error::PublishError;

pub use self::broadcast::BroadcastPublisher;
pub use self::redis::{RedisConfig, RedisPublisher};

/// Default channel name
pub const DEFAULT_CHANNEL: &str = "announces";

/// Broadcasts events on a single channel
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Channel the events go to
    fn channel(&self) -> &str;

    /// Send one event; returns the subscriber count at send time
    async fn publish(&self, event: &Event) -> Result<u64, PublishError>;
}

/// Encode an event for the wire
pub fn encode_event(event: &Event) -> Result<String, PublishError> {
    Ok(event.to_json()?)
}
