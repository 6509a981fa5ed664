//! Per-pass elapsed-time tracker
//!
//! A [`PassTimer`] recomputes elapsed time once per second and fires two
//! one-shot callbacks: a warning when the student's reminder threshold is
//! reached and an overtime signal at the fixed ten-minute ceiling. Dropping
//! the timer (or calling [`PassTimer::cancel`]) stops the periodic tick.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use super::OVERTIME_SECONDS;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerThresholds {
    pub reminder_seconds: i64,
    pub overtime_seconds: i64,
}

impl TimerThresholds {
    pub fn with_reminder_minutes(minutes: i32) -> Self {
        Self {
            reminder_seconds: i64::from(minutes) * 60,
            overtime_seconds: OVERTIME_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    TimeWarning,
    Overtime,
}

/// Which one-shot signals have already fired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerState {
    pub warned: bool,
    pub overtime: bool,
}

impl TimerState {
    /// Signals due at `elapsed_seconds`, each reported at most once
    pub fn observe(&mut self, elapsed_seconds: i64, thresholds: &TimerThresholds) -> Vec<TimerSignal> {
        let mut signals = Vec::new();
        if !self.warned && elapsed_seconds >= thresholds.reminder_seconds {
            self.warned = true;
            signals.push(TimerSignal::TimeWarning);
        }
        if !self.overtime && elapsed_seconds >= thresholds.overtime_seconds {
            self.overtime = true;
            signals.push(TimerSignal::Overtime);
        }
        signals
    }

    pub fn is_exhausted(&self) -> bool {
        self.warned && self.overtime
    }
}

/// Handle to a running pass timer task
#[derive(Debug)]
pub struct PassTimer {
    handle: JoinHandle<()>,
}

impl PassTimer {
    /// Spawn a timer for a pass that started at `start_time`.
    ///
    /// `now` anchors wall-clock elapsed time; subsequent ticks are measured
    /// with the runtime's monotonic clock.
    pub fn start<W, O>(
        start_time: DateTime<Utc>,
        now: DateTime<Utc>,
        thresholds: TimerThresholds,
        on_time_warning: W,
        on_overtime: O,
    ) -> Self
    where
        W: FnOnce(i64) + Send + 'static,
        O: FnOnce(i64) + Send + 'static,
    {
        let offset = now.signed_duration_since(start_time).num_seconds().max(0);
        let handle = tokio::spawn(async move {
            let anchor = Instant::now();
            let mut on_time_warning = Some(on_time_warning);
            let mut on_overtime = Some(on_overtime);
            let mut state = TimerState::default();
            let mut ticker = tokio::time::interval_at(anchor + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let elapsed = offset + anchor.elapsed().as_secs() as i64;
                for signal in state.observe(elapsed, &thresholds) {
                    match signal {
                        TimerSignal::TimeWarning => {
                            if let Some(callback) = on_time_warning.take() {
                                callback(elapsed);
                            }
                        }
                        TimerSignal::Overtime => {
                            if let Some(callback) = on_overtime.take() {
                                callback(elapsed);
                            }
                        }
                    }
                }
                if state.is_exhausted() {
                    debug!(elapsed, "Pass timer finished");
                    break;
                }
            }
        });

        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for PassTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Arc;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_state_fires_each_signal_once() {
        let thresholds = TimerThresholds::with_reminder_minutes(8);
        let mut state = TimerState::default();

        assert!(state.observe(479, &thresholds).is_empty());
        assert_eq!(state.observe(480, &thresholds), vec![TimerSignal::TimeWarning]);
        assert!(state.observe(481, &thresholds).is_empty());
        assert!(state.observe(599, &thresholds).is_empty());
        assert_eq!(state.observe(600, &thresholds), vec![TimerSignal::Overtime]);
        assert!(state.observe(900, &thresholds).is_empty());
        assert!(state.is_exhausted());
    }

    #[test]
    fn test_state_fires_both_when_late() {
        let thresholds = TimerThresholds::with_reminder_minutes(8);
        let mut state = TimerState::default();
        assert_eq!(
            state.observe(700, &thresholds),
            vec![TimerSignal::TimeWarning, TimerSignal::Overtime]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_warning_then_overtime() {
        let warned_at = Arc::new(AtomicI64::new(-1));
        let overtime_at = Arc::new(AtomicI64::new(-1));
        let w = warned_at.clone();
        let o = overtime_at.clone();

        let timer = PassTimer::start(
            start(),
            start(),
            TimerThresholds::with_reminder_minutes(1),
            move |elapsed| w.store(elapsed, Ordering::SeqCst),
            move |elapsed| o.store(elapsed, Ordering::SeqCst),
        );

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(warned_at.load(Ordering::SeqCst), -1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(warned_at.load(Ordering::SeqCst), 60);
        assert_eq!(overtime_at.load(Ordering::SeqCst), -1);

        tokio::time::sleep(Duration::from_secs(540)).await;
        assert_eq!(overtime_at.load(Ordering::SeqCst), 600);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_accounts_for_time_already_elapsed() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();

        // pass started 9:58 ago
        let now = start() + chrono::Duration::seconds(598);
        let _timer = PassTimer::start(
            start(),
            now,
            TimerThresholds::with_reminder_minutes(8),
            |_| {},
            move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_timer_stops_callbacks() {
        let fired = Arc::new(AtomicUsize::new(0));
        let f = fired.clone();

        let timer = PassTimer::start(
            start(),
            start(),
            TimerThresholds::with_reminder_minutes(1),
            move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
        );
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(timer);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
