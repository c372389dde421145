//! In-process publisher on a tokio broadcast channel
//!
//! Same delivery contract as Redis pub/sub: the count is the number of live
//! receivers, and a send with nobody listening is dropped, not an error.
//! Used by `run --dry-run` and by tests.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{encode_event, Publisher};
use crate::models::Event;
use crate::utils::error::PublishError;

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 256;

pub struct BroadcastPublisher {
    channel: String,
    sender: broadcast::Sender<String>,
}

impl BroadcastPublisher {
    pub fn new(channel: impl Into<String>) -> Self {
        Self::with_capacity(channel, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(channel: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            channel: channel.into(),
            sender,
        }
    }

    /// New subscriber; sees only events published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl Publisher for BroadcastPublisher {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn publish(&self, event: &Event) -> Result<u64, PublishError> {
        let payload = encode_event(event)?;
        Ok(self.sender.send(payload).map(|n| n as u64).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnnouncementEvent;
    use chrono::Utc;

    fn announcement() -> Event {
        Event::Announcement(AnnouncementEvent {
            found_at: Utc::now(),
            server: "local".to_string(),
            notice_id: "7".to_string(),
            title: "(XRP) 신규 거래지원 안내".to_string(),
            url: "https://upbit.com/service_center/notice?id=7".to_string(),
            ticker: "XRP".to_string(),
        })
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let publisher = BroadcastPublisher::new("announces");
        assert_eq!(publisher.publish(&announcement()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let publisher = BroadcastPublisher::new("announces");
        let mut a = publisher.subscribe();
        let mut b = publisher.subscribe();

        assert_eq!(publisher.publish(&announcement()).await.unwrap(), 2);

        let msg = a.recv().await.unwrap();
        assert!(msg.contains(r#""type":"announcement""#));
        assert!(msg.contains("신규 거래지원"));
        assert_eq!(b.recv().await.unwrap(), msg);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let publisher = BroadcastPublisher::new("announces");
        publisher.publish(&announcement()).await.unwrap();

        let mut late = publisher.subscribe();
        assert!(late.try_recv().is_err());
        assert_eq!(publisher.channel(), "announces");
    }
}
