// Core data structures for notice-sentinel

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Most recent item of the announcements feed as returned by one poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NoticeSummary {
    pub id: i64,
    pub title: String,
}

impl NoticeSummary {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    /// Build from one raw notice record.
    ///
    /// `id` may arrive as a JSON number or an integer string. A fractional
    /// number is truncated toward zero. Anything else (missing, null,
    /// non-numeric) becomes 0, which can never exceed a positive watermark.
    pub fn from_value(record: &Value) -> Self {
        let id = match record.get("id") {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0),
            _ => 0,
        };
        let title = record
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self { id, title }
    }
}

/// Normalized outcome of one poll
///
/// On a transport failure `error` is set and `http_status` is `None`.
/// Whenever a response arrived, `http_status` carries its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResult {
    pub top_notice: Option<NoticeSummary>,
    pub http_status: Option<u16>,
    pub latency_ms: f64,
    pub etag: String,
    pub server_runtime: String,
    pub body_size: usize,
    pub request_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Placeholder used when a diagnostic header is missing
pub const MISSING_HEADER: &str = "-";

impl PollResult {
    /// A response was received with the given status code
    pub fn response(
        http_status: u16,
        top_notice: Option<NoticeSummary>,
        latency_ms: f64,
        request_url: impl Into<String>,
    ) -> Self {
        Self {
            top_notice,
            http_status: Some(http_status),
            latency_ms,
            etag: MISSING_HEADER.to_string(),
            server_runtime: MISSING_HEADER.to_string(),
            body_size: 0,
            request_url: request_url.into(),
            error: None,
        }
    }

    /// No response was received
    pub fn transport_error(
        error: impl Into<String>,
        latency_ms: f64,
        request_url: impl Into<String>,
    ) -> Self {
        Self {
            top_notice: None,
            http_status: None,
            latency_ms,
            etag: MISSING_HEADER.to_string(),
            server_runtime: MISSING_HEADER.to_string(),
            body_size: 0,
            request_url: request_url.into(),
            error: Some(error.into()),
        }
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = etag.into();
        self
    }

    pub fn with_server_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.server_runtime = runtime.into();
        self
    }

    pub fn with_body_size(mut self, size: usize) -> Self {
        self.body_size = size;
        self
    }

    /// `200` with no transport error
    pub fn is_success(&self) -> bool {
        self.http_status == Some(200) && self.error.is_none()
    }

    /// Label used for logging and metrics
    pub fn outcome(&self) -> &'static str {
        if self.error.is_some() {
            "transport_error"
        } else if self.http_status == Some(200) {
            "ok"
        } else {
            "http_error"
        }
    }
}

/// Highest notice id already announced by this process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct DedupWatermark {
    pub last_seen_id: i64,
}

impl DedupWatermark {
    pub fn new(last_seen_id: i64) -> Self {
        Self { last_seen_id }
    }

    /// Whether `id` is strictly newer than everything seen so far
    pub fn admits(&self, id: i64) -> bool {
        id > self.last_seen_id
    }

    /// Move the watermark forward; never moves it back
    #[must_use]
    pub fn advanced_to(self, id: i64) -> Self {
        Self {
            last_seen_id: self.last_seen_id.max(id),
        }
    }
}

/// A newly observed notice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementEvent {
    #[serde(serialize_with = "serialize_millis")]
    pub found_at: DateTime<Utc>,
    pub server: String,
    pub notice_id: String,
    pub title: String,
    pub url: String,
    pub ticker: String,
}

/// A failed poll (non-200 or transport error)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEvent {
    #[serde(serialize_with = "serialize_millis")]
    pub found_at: DateTime<Utc>,
    pub server: String,
    pub slot: u32,
    pub http_code: Option<u16>,
    #[serde(serialize_with = "serialize_one_decimal")]
    pub rt_ms: f64,
    pub etag: String,
    pub x_runtime: String,
    pub resp_size: usize,
    pub request_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Message broadcast on the channel, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Status(StatusEvent),
    Announcement(AnnouncementEvent),
}

impl Event {
    /// Value of the `type` field on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Announcement(_) => "announcement",
        }
    }

    pub fn as_announcement(&self) -> Option<&AnnouncementEvent> {
        match self {
            Self::Announcement(a) => Some(a),
            Self::Status(_) => None,
        }
    }

    pub fn as_status(&self) -> Option<&StatusEvent> {
        match self {
            Self::Status(s) => Some(s),
            Self::Announcement(_) => None,
        }
    }

    /// Compact JSON with non-ASCII text kept verbatim
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// RFC 3339, UTC, millisecond precision, `Z` suffix
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

fn serialize_one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
            + chrono::Duration::milliseconds(589)
    }

    #[test]
    fn test_notice_from_numeric_id() {
        let notice = NoticeSummary::from_value(&json!({"id": 4821, "title": "공지"}));
        assert_eq!(notice, NoticeSummary::new(4821, "공지"));
    }

    #[test]
    fn test_notice_from_string_id() {
        let notice = NoticeSummary::from_value(&json!({"id": " 4821 ", "title": "t"}));
        assert_eq!(notice.id, 4821);
    }

    #[test]
    fn test_notice_malformed_id_coerced_to_zero() {
        for record in [
            json!({"title": "no id"}),
            json!({"id": null, "title": "null"}),
            json!({"id": "abc", "title": "text"}),
            json!({"id": "12.5", "title": "fractional text"}),
            json!({"id": [1], "title": "array"}),
        ] {
            assert_eq!(NoticeSummary::from_value(&record).id, 0, "{record}");
        }
    }

    #[test]
    fn test_notice_fractional_id_truncated() {
        assert_eq!(NoticeSummary::from_value(&json!({"id": 12.5})).id, 12);
        assert_eq!(NoticeSummary::from_value(&json!({"id": 4821.0})).id, 4821);
    }

    #[test]
    fn test_notice_missing_title() {
        let notice = NoticeSummary::from_value(&json!({"id": 1}));
        assert_eq!(notice.title, "");
    }

    #[test]
    fn test_poll_result_outcome() {
        let ok = PollResult::response(200, None, 12.0, "u");
        assert!(ok.is_success());
        assert_eq!(ok.outcome(), "ok");

        let limited = PollResult::response(429, None, 12.0, "u");
        assert!(!limited.is_success());
        assert_eq!(limited.outcome(), "http_error");

        let failed = PollResult::transport_error("timeout", 3000.0, "u");
        assert!(!failed.is_success());
        assert_eq!(failed.outcome(), "transport_error");
        assert_eq!(failed.etag, MISSING_HEADER);
    }

    #[test]
    fn test_watermark_never_decreases() {
        let mark = DedupWatermark::new(100);
        assert_eq!(mark.advanced_to(50).last_seen_id, 100);
        assert_eq!(mark.advanced_to(101).last_seen_id, 101);
        assert!(mark.admits(101));
        assert!(!mark.admits(100));
    }

    #[test]
    fn test_announcement_wire_format() {
        let event = Event::Announcement(AnnouncementEvent {
            found_at: fixed_time(),
            server: "tokyo-1".to_string(),
            notice_id: "101".to_string(),
            title: "(ETH) 디지털 자산 추가 안내".to_string(),
            url: "https://upbit.com/service_center/notice?id=101".to_string(),
            ticker: "ETH".to_string(),
        });

        let json = event.to_json().unwrap();
        assert!(json.starts_with(r#"{"type":"announcement","found_at":"2025-03-14T09:26:53.589Z""#));
        assert!(json.contains("디지털 자산 추가"), "non-ASCII must stay verbatim");
        assert!(!json.contains("\\u"));

        let value: Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 7);
        assert_eq!(value["notice_id"], "101");
    }

    #[test]
    fn test_status_wire_format() {
        let event = Event::Status(StatusEvent {
            found_at: fixed_time(),
            server: "tokyo-1".to_string(),
            slot: 2,
            http_code: None,
            rt_ms: 3001.4567,
            etag: "-".to_string(),
            x_runtime: "-".to_string(),
            resp_size: 0,
            request_url: "https://example.test/a".to_string(),
            error: Some("Request timeout".to_string()),
        });

        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "status");
        assert_eq!(value["http_code"], Value::Null);
        assert_eq!(value["rt_ms"], json!(3001.5));
        assert_eq!(value["error"], "Request timeout");
        assert_eq!(value["slot"], 2);
    }

    #[test]
    fn test_status_without_error_omits_field() {
        let event = Event::Status(StatusEvent {
            found_at: fixed_time(),
            server: "s".to_string(),
            slot: 0,
            http_code: Some(429),
            rt_ms: 10.0,
            etag: "W/\"abc\"".to_string(),
            x_runtime: "0.004".to_string(),
            resp_size: 17,
            request_url: "u".to_string(),
            error: None,
        });

        let value: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["http_code"], 429);
        assert_eq!(value.as_object().unwrap().len(), 10);
    }
}
