//! Wall-clock abstraction
//!
//! Time is expressed as fractional seconds since the Unix epoch so slot
//! arithmetic (`floor(now) mod period`) works directly on the value.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// Source of current time and the ability to block until a given instant
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current epoch time in seconds
    fn now(&self) -> f64;

    /// Block until `epoch_secs` has been reached. Returns immediately if it
    /// already has.
    async fn sleep_until(&self, epoch_secs: f64);

    /// Current time as a UTC timestamp
    fn now_utc(&self) -> DateTime<Utc> {
        epoch_to_utc(self.now())
    }
}

/// Convert fractional epoch seconds to a UTC timestamp (millisecond precision)
pub fn epoch_to_utc(epoch_secs: f64) -> DateTime<Utc> {
    let millis = (epoch_secs * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Real clock backed by the system time and tokio timers
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }

    async fn sleep_until(&self, epoch_secs: f64) {
        let wait = epoch_secs - self.now();
        if wait > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(wait)).await;
        }
    }
}

/// Simulated clock: sleeping jumps time forward instead of waiting
///
/// Every `sleep_until` call records how long it would have blocked, so tests
/// can assert on the schedule without real waiting.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
    waits: Mutex<Vec<f64>>,
}

impl ManualClock {
    pub fn new(start_epoch_secs: f64) -> Self {
        Self {
            now: Mutex::new(start_epoch_secs),
            waits: Mutex::new(Vec::new()),
        }
    }

    /// Move time forward, e.g. to simulate work inside a tick
    pub fn advance(&self, secs: f64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += secs.max(0.0);
    }

    /// Wait durations recorded by every `sleep_until` call, in order
    pub fn waits(&self) -> Vec<f64> {
        self.waits.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep_until(&self, epoch_secs: f64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        let wait = (epoch_secs - *now).max(0.0);
        if wait > 0.0 {
            *now = epoch_secs;
        }
        self.waits
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(wait);
    }
}
