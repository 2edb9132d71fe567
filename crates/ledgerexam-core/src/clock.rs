//! Cancellable countdown clock.
//!
//! A [`Clock`] runs on the Tokio runtime and delivers [`ClockEvent`]s through
//! a [`ClockEvents`] receiver: one `Tick` per period carrying the new
//! remaining time, then exactly one `Expired`. Once [`Clock::cancel`] returns,
//! the receiver yields nothing more, including events already buffered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Wall-clock length of one countdown step.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Events emitted by a running clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockEvent {
    /// One second elapsed; `remaining` seconds are left.
    Tick { remaining: u64 },
    /// Remaining time reached zero. Sent once, last.
    Expired,
}

/// Handle to a running countdown.
///
/// Dropping the handle cancels the countdown.
#[derive(Debug)]
pub struct Clock {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Clock {
    /// Start a countdown of `duration_secs` one-second ticks.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(duration_secs: u64) -> (Self, ClockEvents) {
        Self::with_period(duration_secs, TICK_PERIOD)
    }

    /// Start a countdown with a custom tick period.
    pub fn with_period(duration_secs: u64, period: Duration) -> (Self, ClockEvents) {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();

        let flag = Arc::clone(&cancelled);
        let task = tokio::spawn(async move {
            let mut remaining = duration_secs;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while remaining > 0 {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                remaining -= 1;
                if tx.send(ClockEvent::Tick { remaining }).is_err() {
                    return;
                }
            }

            if !flag.load(Ordering::SeqCst) {
                let _ = tx.send(ClockEvent::Expired);
            }
        });

        tracing::debug!(duration_secs, ?period, "clock started");

        let events = ClockEvents {
            rx,
            cancelled: Arc::clone(&cancelled),
        };
        (Self { cancelled, task }, events)
    }

    /// Stop the countdown. No event is delivered after this returns.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            tracing::debug!("clock cancelled");
        }
        self.task.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Receiving end of a clock's events.
#[derive(Debug)]
pub struct ClockEvents {
    rx: mpsc::UnboundedReceiver<ClockEvent>,
    cancelled: Arc<AtomicBool>,
}

impl ClockEvents {
    /// Wait for the next event. `None` once the clock has finished or been
    /// cancelled.
    pub async fn recv(&mut self) -> Option<ClockEvent> {
        if self.cancelled.load(Ordering::SeqCst) {
            self.rx.close();
            return None;
        }
        let event = self.rx.recv().await?;
        if self.cancelled.load(Ordering::SeqCst) {
            self.rx.close();
            return None;
        }
        Some(event)
    }
}

/// Format seconds as `HH:MM:SS`.
pub fn format_hms(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Urgency of the remaining time, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeAlert {
    Normal,
    /// Ten minutes or less.
    Notice,
    /// Five minutes or less.
    Warning,
    /// One minute or less.
    Critical,
}

impl TimeAlert {
    pub fn for_remaining(secs: u64) -> Self {
        match secs {
            0..=60 => TimeAlert::Critical,
            61..=300 => TimeAlert::Warning,
            301..=600 => TimeAlert::Notice,
            _ => TimeAlert::Normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(events: &mut ClockEvents) -> Vec<ClockEvent> {
        let mut seen = Vec::new();
        while let Some(event) = events.recv().await {
            seen.push(event);
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn five_ticks_then_one_expiry() {
        let (_clock, mut events) = Clock::start(5);
        let seen = drain(&mut events).await;
        assert_eq!(
            seen,
            vec![
                ClockEvent::Tick { remaining: 4 },
                ClockEvent::Tick { remaining: 3 },
                ClockEvent::Tick { remaining: 2 },
                ClockEvent::Tick { remaining: 1 },
                ClockEvent::Tick { remaining: 0 },
                ClockEvent::Expired,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_are_one_period_apart() {
        let start = Instant::now();
        let (_clock, mut events) = Clock::start(3);
        assert_eq!(events.recv().await, Some(ClockEvent::Tick { remaining: 2 }));
        assert_eq!(start.elapsed(), Duration::from_secs(1));
        assert_eq!(events.recv().await, Some(ClockEvent::Tick { remaining: 1 }));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_expires_immediately() {
        let (_clock, mut events) = Clock::start(0);
        assert_eq!(drain(&mut events).await, vec![ClockEvent::Expired]);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_after_cancel() {
        let (clock, mut events) = Clock::start(5);
        assert_eq!(events.recv().await, Some(ClockEvent::Tick { remaining: 4 }));
        clock.cancel();
        assert!(clock.is_cancelled());
        assert_eq!(events.recv().await, None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_buffered_expiry() {
        let (clock, mut events) = Clock::start(2);
        // Let every event, including Expired, pile up undelivered.
        tokio::time::sleep(Duration::from_secs(5)).await;
        clock.cancel();
        assert_eq!(events.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_clock_cancels() {
        let (clock, mut events) = Clock::start(3);
        drop(clock);
        assert_eq!(events.recv().await, None);
    }

    #[test]
    fn hms_formatting() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(5400), "01:30:00");
        assert_eq!(format_hms(3661), "01:01:01");
    }

    #[test]
    fn alert_thresholds() {
        assert_eq!(TimeAlert::for_remaining(5400), TimeAlert::Normal);
        assert_eq!(TimeAlert::for_remaining(601), TimeAlert::Normal);
        assert_eq!(TimeAlert::for_remaining(600), TimeAlert::Notice);
        assert_eq!(TimeAlert::for_remaining(300), TimeAlert::Warning);
        assert_eq!(TimeAlert::for_remaining(60), TimeAlert::Critical);
        assert_eq!(TimeAlert::for_remaining(0), TimeAlert::Critical);
        assert!(TimeAlert::Critical > TimeAlert::Warning);
    }
}
