//! Per-question countdown driven by periodic ticks.
//!
//! Ticks may arrive late or in bursts. Every tick measures the wall time since
//! the previous one and carries sub-second leftovers forward, so the clock
//! loses no time when the process was throttled.

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Source of monotonic time for the engine.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }
}

impl ManualClock {
    /// Clock frozen at the current instant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Result of feeding a tick to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing observable changed.
    Unchanged,
    /// Whole seconds were consumed; the new value is attached.
    Decremented(u32),
    /// The countdown reached zero. Reported once per run.
    Expired,
}

/// Countdown of whole seconds with pause support.
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    duration_seconds: u32,
    remaining_seconds: u32,
    // `Some` while the countdown is running and not paused.
    last_tick: Option<Instant>,
    carry: Duration,
    armed: bool,
}

impl Countdown {
    /// Idle countdown at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh run of `seconds`.
    pub fn start(&mut self, seconds: u32, now: Instant) {
        self.duration_seconds = seconds;
        self.remaining_seconds = seconds;
        self.last_tick = Some(now);
        self.carry = Duration::ZERO;
        self.armed = true;
    }

    /// Stop without reporting expiry. The remaining value is kept for display.
    pub fn stop(&mut self) {
        self.last_tick = None;
        self.armed = false;
        self.carry = Duration::ZERO;
    }

    /// Freeze the countdown. Time elapsed since the last tick is banked and
    /// consumed by the first tick after resume.
    pub fn pause(&mut self, now: Instant) {
        if let Some(last) = self.last_tick.take() {
            self.carry += now.saturating_duration_since(last);
        }
    }

    /// Continue a paused countdown, measuring from `now`.
    pub fn resume(&mut self, now: Instant) {
        if self.armed && self.last_tick.is_none() {
            self.last_tick = Some(now);
        }
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining_seconds
    }

    /// Length of the current run.
    pub fn duration(&self) -> u32 {
        self.duration_seconds
    }

    /// Whether the countdown is counting down right now.
    pub fn is_running(&self) -> bool {
        self.armed && self.last_tick.is_some()
    }

    /// Consume the wall time elapsed since the last tick.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let Some(last) = self.last_tick else {
            return TickOutcome::Unchanged;
        };
        if !self.armed {
            return TickOutcome::Unchanged;
        }

        let elapsed = now.saturating_duration_since(last) + self.carry;
        let whole = elapsed.as_secs();
        self.carry = elapsed - Duration::from_secs(whole);
        self.last_tick = Some(now);

        let consumed = u32::try_from(whole)
            .unwrap_or(u32::MAX)
            .min(self.remaining_seconds);
        self.remaining_seconds -= consumed;

        if self.remaining_seconds == 0 {
            self.stop();
            return TickOutcome::Expired;
        }
        if consumed == 0 {
            TickOutcome::Unchanged
        } else {
            TickOutcome::Decremented(self.remaining_seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn steady_ticks_count_down_one_second_each() {
        let clock = ManualClock::new();
        let mut countdown = Countdown::new();
        countdown.start(3, clock.now());

        clock.advance(SECOND);
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Decremented(2));
        clock.advance(SECOND);
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Decremented(1));
        clock.advance(SECOND);
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Expired);
        clock.advance(SECOND);
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Unchanged);
        assert_eq!(countdown.remaining(), 0);
    }

    #[test]
    fn late_tick_compensates_for_elapsed_time() {
        let clock = ManualClock::new();
        let mut countdown = Countdown::new();
        countdown.start(20, clock.now());

        clock.advance(Duration::from_millis(3_500));
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Decremented(17));
        clock.advance(Duration::from_millis(500));
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Decremented(16));
    }

    #[test]
    fn long_gap_expires_once_and_never_goes_negative() {
        let clock = ManualClock::new();
        let mut countdown = Countdown::new();
        countdown.start(5, clock.now());

        clock.advance(Duration::from_secs(60));
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Expired);
        assert_eq!(countdown.remaining(), 0);
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Unchanged);
    }

    #[test]
    fn zero_length_run_expires_on_first_tick() {
        let clock = ManualClock::new();
        let mut countdown = Countdown::new();
        countdown.start(0, clock.now());
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Expired);
    }

    #[test]
    fn paused_time_is_not_consumed() {
        let clock = ManualClock::new();
        let mut countdown = Countdown::new();
        countdown.start(10, clock.now());

        clock.advance(SECOND);
        countdown.tick(clock.now());
        countdown.pause(clock.now());
        assert!(!countdown.is_running());

        clock.advance(Duration::from_secs(30));
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Unchanged);
        assert_eq!(countdown.remaining(), 9);

        countdown.resume(clock.now());
        clock.advance(SECOND);
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Decremented(8));
    }

    #[test]
    fn stopped_countdown_does_not_expire() {
        let clock = ManualClock::new();
        let mut countdown = Countdown::new();
        countdown.start(2, clock.now());
        countdown.stop();

        clock.advance(Duration::from_secs(5));
        assert_eq!(countdown.tick(clock.now()), TickOutcome::Unchanged);
        countdown.resume(clock.now());
        assert!(!countdown.is_running());
    }
}
