//! notice-sentinel - slot-aligned announcement poller
//!
//! Polls an exchange announcements endpoint on a fixed period, at a fixed
//! offset (the *slot*) inside each period, and broadcasts every newly
//! observed notice, plus a diagnostic event for every non-200 response or
//! transport failure, over Redis pub/sub. Several instances with different
//! slots interleave their requests on the shared period grid.
//!
//! # Architecture
//!
//! - [`config`] - Environment and TOML configuration
//! - [`scheduler`] - Slot alignment, tick advance, injectable clocks
//! - [`fetcher`] - One bounded HTTP request per tick, normalized to a [`models::PollResult`]
//! - [`detector`] - Watermark comparison and event construction
//! - [`ticker`] - Ticker symbol extraction from listing titles
//! - [`publisher`] - Redis and in-process broadcast sinks
//! - [`watcher`] - The poll-evaluate-publish loop
//! - [`metrics`] - Prometheus counters for polls and events
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use notice_sentinel::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let publisher = Arc::new(RedisPublisher::connect(&config.redis).await?);
//!     let watcher = NoticeWatcher::from_config(&config, publisher, Arc::new(SystemClock))?;
//!     watcher
//!         .run(config.instance.period_secs, DedupWatermark::new(config.instance.start_id))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod models;
pub mod publisher;
pub mod scheduler;
pub mod ticker;
pub mod utils;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::detector::ChangeDetector;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::fetcher::{Fetch, NoticeFetcher};
    pub use crate::models::{DedupWatermark, Event, NoticeSummary, PollResult};
    pub use crate::publisher::{BroadcastPublisher, Publisher, RedisPublisher};
    pub use crate::scheduler::{Clock, SystemClock, TickScheduler};
    pub use crate::watcher::NoticeWatcher;
}

// Direct re-exports for convenience
pub use models::{AnnouncementEvent, DedupWatermark, Event, PollResult, StatusEvent};
pub use ticker::extract_ticker;
