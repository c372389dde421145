//! New-notice detection and event construction
//!
//! Decides, for one [`PollResult`], whether to publish nothing, a status
//! event (failed poll) or an announcement (strictly newer notice id). The
//! watermark is passed in and handed back, so the event and the watermark
//! advance come out of the same call.

use chrono::{DateTime, Utc};

use crate::fetcher::url::{notice_page_url, DEFAULT_NOTICE_PAGE_URL};
use crate::models::{AnnouncementEvent, DedupWatermark, Event, PollResult, StatusEvent};
use crate::ticker::extract_ticker;

/// Titles containing this are the exchange's own housekeeping notices
pub const BRAND_MARKER: &str = "업비트(Upbit)";

/// Result of evaluating one poll
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub event: Option<Event>,
    pub watermark: DedupWatermark,
}

/// Why a successful poll produced no announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Response had no notice record
    NoCandidate,
    /// Title carries the brand marker
    BrandNotice,
    /// Id is not above the watermark
    AlreadySeen,
}

/// Stateless evaluator; the watermark lives with the caller
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    server: String,
    slot: u32,
    notice_page_url: String,
}

impl ChangeDetector {
    pub fn new(server: impl Into<String>, slot: u32) -> Self {
        Self {
            server: server.into(),
            slot,
            notice_page_url: DEFAULT_NOTICE_PAGE_URL.to_string(),
        }
    }

    pub fn with_notice_page_url(mut self, url: impl Into<String>) -> Self {
        self.notice_page_url = url.into();
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Evaluate one poll against the current watermark.
    ///
    /// 1. Non-200 or transport error: status event, watermark unchanged.
    /// 2. No notice: nothing.
    /// 3. Brand housekeeping title: nothing.
    /// 4. Id strictly above the watermark: announcement, watermark = id.
    /// 5. Otherwise nothing.
    pub fn evaluate(
        &self,
        result: &PollResult,
        watermark: DedupWatermark,
        found_at: DateTime<Utc>,
    ) -> Evaluation {
        if !result.is_success() {
            return Evaluation {
                event: Some(Event::Status(self.status_event(result, found_at))),
                watermark,
            };
        }

        match self.classify(result, watermark) {
            Ok((id, title)) => {
                let event = AnnouncementEvent {
                    found_at,
                    server: self.server.clone(),
                    notice_id: id.to_string(),
                    ticker: extract_ticker(title),
                    url: notice_page_url(&self.notice_page_url, id),
                    title: title.to_string(),
                };
                Evaluation {
                    event: Some(Event::Announcement(event)),
                    watermark: watermark.advanced_to(id),
                }
            }
            Err(_) => Evaluation {
                event: None,
                watermark,
            },
        }
    }

    /// Candidate id and trimmed title for a successful poll, or why there is none
    pub fn classify<'a>(
        &self,
        result: &'a PollResult,
        watermark: DedupWatermark,
    ) -> Result<(i64, &'a str), Skip> {
        let notice = result.top_notice.as_ref().ok_or(Skip::NoCandidate)?;
        let title = notice.title.trim();

        if title.contains(BRAND_MARKER) {
            return Err(Skip::BrandNotice);
        }

        if !watermark.admits(notice.id) {
            return Err(Skip::AlreadySeen);
        }

        Ok((notice.id, title))
    }

    fn status_event(&self, result: &PollResult, found_at: DateTime<Utc>) -> StatusEvent {
        StatusEvent {
            found_at,
            server: self.server.clone(),
            slot: self.slot,
            http_code: result.http_status,
            rt_ms: result.latency_ms,
            etag: result.etag.clone(),
            x_runtime: result.server_runtime.clone(),
            resp_size: result.body_size,
            request_url: result.request_url.clone(),
            error: result.error.clone(),
        }
    }
}
