//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use notice_sentinel::fetcher::Fetch;
use notice_sentinel::models::{NoticeSummary, PollResult};

/// Announcements body with a single record, shaped like the live endpoint
pub fn notices_body(id: i64, title: &str) -> String {
    serde_json::json!({
        "success": true,
        "data": {
            "total_pages": 1,
            "notices": [{
                "id": id,
                "title": title,
                "category": "거래",
                "listed_at": "2024-05-01T18:00:00+09:00",
                "need_new_badge": true
            }]
        }
    })
    .to_string()
}

/// 200 response carrying one notice
pub fn ok_poll(id: i64, title: &str) -> PollResult {
    PollResult::response(200, Some(NoticeSummary::new(id, title)), 12.5, "http://test/feed")
        .with_etag("W/\"abc\"")
        .with_server_runtime("0.004")
        .with_body_size(256)
}

/// Fetcher that replays a fixed sequence, then repeats the last entry
pub struct ScriptedFetch {
    script: Mutex<VecDeque<PollResult>>,
    last: Mutex<Option<PollResult>>,
}

impl ScriptedFetch {
    pub fn new(results: impl IntoIterator<Item = PollResult>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Fetch for ScriptedFetch {
    async fn fetch(&self) -> PollResult {
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(result) = next {
            *last = Some(result);
        }
        last.clone()
            .unwrap_or_else(|| PollResult::transport_error("script empty", 0.0, "http://test/feed"))
    }
}
