//! Poll-evaluate-publish loop
//!
//! ```text
//! INIT -> align first tick -> [ POLL -> EVALUATE -> PUBLISH? -> WAIT ] -> ...
//! ```
//!
//! Everything inside one tick runs sequentially: a new request is never
//! issued while the previous tick's work is still in flight. All mutable
//! state lives in [`WatcherState`], owned by the watcher instance, so several
//! independent watchers can coexist in one process.

use std::sync::Arc;

use crate::config::Config;
use crate::detector::ChangeDetector;
use crate::error::{Error, Result};
use crate::fetcher::headers::RandomHeaderProvider;
use crate::fetcher::{Fetch, NoticeFetcher};
use crate::metrics;
use crate::models::{DedupWatermark, Event};
use crate::publisher::Publisher;
use crate::scheduler::{initialize_slot, Clock, SchedulerResult, SchedulerState, TickScheduler};

/// Mutable per-process state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatcherState {
    pub watermark: DedupWatermark,
    pub scheduler: SchedulerState,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    /// Epoch seconds the tick was scheduled for
    pub fired_at: f64,

    /// Event produced by the detector, if any
    pub event: Option<Event>,

    /// Subscriber count reported by the publisher; `None` if nothing was
    /// published or the publish failed
    pub delivered: Option<u64>,
}

/// One polling instance
pub struct NoticeWatcher {
    fetcher: Arc<dyn Fetch>,
    publisher: Arc<dyn Publisher>,
    detector: ChangeDetector,
    scheduler: TickScheduler,
}

impl NoticeWatcher {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        publisher: Arc<dyn Publisher>,
        detector: ChangeDetector,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            publisher,
            detector,
            scheduler: TickScheduler::new(clock),
        }
    }

    /// Wire a production watcher from configuration: reqwest fetcher with
    /// randomized headers, slot from config or drawn at random.
    pub fn from_config(
        config: &Config,
        publisher: Arc<dyn Publisher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::config(format!("{e:#}")))?;

        let slot = initialize_slot(config.instance.slot, config.instance.period_secs)?;
        let fetcher = NoticeFetcher::new(
            &config.fetcher_config(),
            Arc::new(RandomHeaderProvider),
            clock.clone(),
        )?;
        let detector = ChangeDetector::new(config.instance.server_name.clone(), slot)
            .with_notice_page_url(config.fetch.notice_page_url.clone());

        Ok(Self::new(Arc::new(fetcher), publisher, detector, clock))
    }

    pub fn slot(&self) -> u32 {
        self.detector.slot()
    }

    fn clock(&self) -> &Arc<dyn Clock> {
        self.scheduler.clock()
    }

    /// Block until the first slot boundary and build the initial state
    pub async fn start(
        &self,
        period_secs: u32,
        watermark: DedupWatermark,
    ) -> SchedulerResult<WatcherState> {
        let slot = self.detector.slot();
        tracing::info!(
            server = %self.detector.server(),
            slot,
            period = period_secs,
            watermark = watermark.last_seen_id,
            channel = %self.publisher.channel(),
            "Watcher starting"
        );
        metrics::set_watermark(watermark.last_seen_id);

        let scheduler = self.scheduler.align_first_tick(slot, period_secs).await?;
        Ok(WatcherState {
            watermark,
            scheduler,
        })
    }

    /// Run the work of one tick at the current fire time. Does not wait.
    ///
    /// The watermark advances with detection, not delivery: an announcement
    /// that fails to publish is logged here and not retried.
    pub async fn tick(&self, state: WatcherState) -> (WatcherState, TickOutcome) {
        let fired_at = state.scheduler.next_fire;

        let result = self.fetcher.fetch().await;
        let evaluation = self
            .detector
            .evaluate(&result, state.watermark, self.clock().now_utc());

        if let Some(Event::Announcement(a)) = &evaluation.event {
            tracing::info!(id = %a.notice_id, ticker = %a.ticker, title = %a.title, "NEW");
            metrics::record_announcement();
        }

        let delivered = match &evaluation.event {
            Some(event) => self.publish(event).await,
            None => None,
        };

        if evaluation.watermark != state.watermark {
            metrics::set_watermark(evaluation.watermark.last_seen_id);
        }

        let next = WatcherState {
            watermark: evaluation.watermark,
            ..state
        };
        let outcome = TickOutcome {
            fired_at,
            event: evaluation.event,
            delivered,
        };
        (next, outcome)
    }

    /// Wait for the next fire time
    pub async fn wait_next(&self, state: WatcherState) -> WatcherState {
        let scheduler = self.scheduler.advance(state.scheduler).await;
        WatcherState { scheduler, ..state }
    }

    /// Align, then tick forever. Only a startup error returns.
    pub async fn run(&self, period_secs: u32, watermark: DedupWatermark) -> SchedulerResult<()> {
        let mut state = self.start(period_secs, watermark).await?;
        loop {
            let (next, _) = self.tick(state).await;
            state = self.wait_next(next).await;
        }
    }

    async fn publish(&self, event: &Event) -> Option<u64> {
        match self.publisher.publish(event).await {
            Ok(subscribers) => {
                match event {
                    Event::Announcement(a) => {
                        tracing::info!(id = %a.notice_id, subscribers, "Announcement published");
                    }
                    Event::Status(s) => {
                        tracing::debug!(http_code = ?s.http_code, subscribers, "Status event published");
                        metrics::record_status_event();
                    }
                }
                Some(subscribers)
            }
            Err(e) => {
                let id = event.as_announcement().map(|a| a.notice_id.as_str());
                tracing::warn!(
                    error = %e,
                    kind = event.kind(),
                    id = ?id,
                    channel = %self.publisher.channel(),
                    "Failed to publish event"
                );
                metrics::record_publish_failure();
                None
            }
        }
    }
}
