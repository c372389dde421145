//! Slot-aligned tick scheduling
//!
//! Every instance fires once per `period` seconds at the absolute second
//! where `epoch_secs mod period == slot`. Instances with different slots
//! therefore interleave their requests evenly across the period without
//! talking to each other.

use rand::Rng;
use std::sync::Arc;

use super::clock::Clock;
use super::error::{SchedulerError, SchedulerResult};

/// Per-process scheduling state, threaded through every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerState {
    /// Seconds between ticks (> 0)
    pub period_secs: u32,

    /// Fixed offset inside the period, `0 <= slot < period_secs`
    pub slot: u32,

    /// Epoch seconds of the most recent (or upcoming) fire
    pub next_fire: f64,
}

impl SchedulerState {
    pub fn new(period_secs: u32, slot: u32, next_fire: f64) -> SchedulerResult<Self> {
        validate(slot, period_secs)?;
        Ok(Self {
            period_secs,
            slot,
            next_fire,
        })
    }
}

fn validate(slot: u32, period: u32) -> SchedulerResult<()> {
    if period == 0 {
        return Err(SchedulerError::invalid_period(period));
    }
    if slot >= period {
        return Err(SchedulerError::invalid_slot(slot, period));
    }
    Ok(())
}

/// Pick the slot for this process.
///
/// A configured slot inside `[0, period)` is used as-is; anything else
/// (absent or out of range) falls back to a uniform random draw.
pub fn initialize_slot(configured: Option<u32>, period: u32) -> SchedulerResult<u32> {
    if period == 0 {
        return Err(SchedulerError::invalid_period(period));
    }

    match configured {
        Some(slot) if slot < period => Ok(slot),
        Some(slot) => {
            tracing::warn!(slot, period, "Configured slot out of range, drawing a random slot");
            Ok(rand::thread_rng().gen_range(0..period))
        }
        None => Ok(rand::thread_rng().gen_range(0..period)),
    }
}

/// First absolute fire time strictly after `now` with `t mod period == slot`
pub fn first_fire_after(now: f64, slot: u32, period: u32) -> f64 {
    let now_floor = now.floor();
    let period = f64::from(period);
    let base = now_floor - now_floor.rem_euclid(period);
    let target = base + f64::from(slot);

    if target <= now {
        target + period
    } else {
        target
    }
}

/// Drives the wait between ticks against an injected [`Clock`]
pub struct TickScheduler {
    clock: Arc<dyn Clock>,
}

impl TickScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Block until the first slot boundary after now and return the state
    /// describing that fire.
    pub async fn align_first_tick(&self, slot: u32, period: u32) -> SchedulerResult<SchedulerState> {
        validate(slot, period)?;

        let now = self.clock.now();
        let target = first_fire_after(now, slot, period);

        tracing::debug!(slot, period, target, wait_secs = target - now, "Aligning first tick");
        self.clock.sleep_until(target).await;

        SchedulerState::new(period, slot, target)
    }

    /// Move to the next fire, exactly one period after the previous one.
    ///
    /// If the previous tick overran, the target is already in the past and
    /// this returns without waiting. Missed fires are never batched: each
    /// call yields exactly one fire.
    pub async fn advance(&self, state: SchedulerState) -> SchedulerState {
        let next_fire = state.next_fire + f64::from(state.period_secs);
        let now = self.clock.now();

        if next_fire < now {
            tracing::debug!(
                next_fire,
                behind_secs = now - next_fire,
                "Tick overran its period, firing immediately"
            );
        }

        self.clock.sleep_until(next_fire).await;

        SchedulerState { next_fire, ..state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::clock::ManualClock;

    #[test]
    fn test_configured_slot_is_used() {
        assert_eq!(initialize_slot(Some(3), 4).unwrap(), 3);
        assert_eq!(initialize_slot(Some(0), 5).unwrap(), 0);
    }

    #[test]
    fn test_random_slot_in_range() {
        for _ in 0..200 {
            let slot = initialize_slot(None, 5).unwrap();
            assert!(slot < 5);
        }
    }

    #[test]
    fn test_out_of_range_slot_falls_back_to_random() {
        for _ in 0..50 {
            let slot = initialize_slot(Some(9), 4).unwrap();
            assert!(slot < 4);
        }
    }

    #[test]
    fn test_zero_period_rejected() {
        assert_eq!(
            initialize_slot(None, 0),
            Err(SchedulerError::invalid_period(0))
        );
    }

    #[test]
    fn test_first_fire_later_in_same_period() {
        // base = 1000, slot 3 -> 1003 > 1001.4
        assert_eq!(first_fire_after(1001.4, 3, 4), 1003.0);
    }

    #[test]
    fn test_first_fire_rolls_into_next_period() {
        // base = 1000, slot 1 -> 1001 <= 1001.4 -> 1005
        assert_eq!(first_fire_after(1001.4, 1, 4), 1005.0);
    }

    #[test]
    fn test_first_fire_exact_boundary_is_not_now() {
        assert_eq!(first_fire_after(1000.0, 0, 4), 1004.0);
    }

    #[test]
    fn test_state_rejects_bad_slot() {
        assert!(SchedulerState::new(4, 4, 0.0).is_err());
        assert!(SchedulerState::new(0, 0, 0.0).is_err());
        assert!(SchedulerState::new(4, 3, 0.0).is_ok());
    }

    #[tokio::test]
    async fn test_align_first_tick_blocks_until_target() {
        let clock = Arc::new(ManualClock::new(1001.4));
        let scheduler = TickScheduler::new(clock.clone());

        let state = scheduler.align_first_tick(3, 4).await.unwrap();

        assert_eq!(state.next_fire, 1003.0);
        assert_eq!(clock.now(), 1003.0);
    }

    #[tokio::test]
    async fn test_advance_keeps_absolute_alignment() {
        let clock = Arc::new(ManualClock::new(1003.0));
        let scheduler = TickScheduler::new(clock.clone());
        let mut state = SchedulerState::new(4, 3, 1003.0).unwrap();

        for expected in [1007.0, 1011.0, 1015.0] {
            clock.advance(0.37);
            state = scheduler.advance(state).await;
            assert_eq!(state.next_fire, expected);
            assert_eq!(clock.now(), expected);
        }
    }

    #[tokio::test]
    async fn test_advance_after_overrun_fires_immediately() {
        let clock = Arc::new(ManualClock::new(1003.0));
        let scheduler = TickScheduler::new(clock.clone());
        let state = SchedulerState::new(4, 3, 1003.0).unwrap();

        clock.advance(6.0);
        let state = scheduler.advance(state).await;

        assert_eq!(state.next_fire, 1007.0);
        assert_eq!(clock.now(), 1009.0);
        assert_eq!(clock.waits(), vec![0.0]);
    }
}
