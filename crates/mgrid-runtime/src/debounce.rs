#![forbid(unsafe_code)]

//! Trailing-edge debouncing with explicit time.
//!
//! A [`Debouncer`] holds at most one pending value. Every call pushes the
//! deadline to `last_call + window`; the value is released by
//! [`poll_at`](Debouncer::poll_at) once that deadline has passed with no
//! further calls. Earlier calls inside the window are superseded and never
//! released on their own.
//!
//! The debouncer never reads a clock. Callers pass `now` to every method,
//! which keeps behavior deterministic under test and lets the host decide how
//! to sleep (see [`deadline`](Debouncer::deadline)).
//!
//! # Invariants
//!
//! - **Trailing edge**: a burst of N calls releases exactly one value, no
//!   earlier than `window` after the last call.
//! - **Latest wins** for [`call_at`](Debouncer::call_at); [`merge_at`](Debouncer::merge_at)
//!   folds the burst instead.
//! - **Cancellation**: after [`cancel`](Debouncer::cancel) nothing is released
//!   until a new call arrives.
//!
//! # Failure Modes
//!
//! | Condition                 | Behavior                              |
//! |---------------------------|---------------------------------------|
//! | `window = 0`              | Released on the first poll            |
//! | `now` earlier than a call | Treated as zero elapsed time          |
//! | Poll with nothing pending | Returns `None`                        |

use std::time::Duration;

use web_time::Instant;

#[inline]
pub(crate) fn duration_since_or_zero(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier).unwrap_or(Duration::ZERO)
}

/// A value released by a debouncer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<T> {
    /// The pending value at release time.
    pub value: T,
    /// Number of calls folded into this release.
    pub calls: u64,
    /// Time from the first call of the burst to the release.
    pub waited: Duration,
}

/// Counters for a debouncer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceStats {
    /// Total calls accepted.
    pub calls: u64,
    /// Values released.
    pub fired: u64,
    /// Calls replaced by a later call before release.
    pub superseded: u64,
    /// Pending values dropped by `cancel`.
    pub cancelled: u64,
}

/// Trailing-edge debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<T>,
    first_call: Option<Instant>,
    last_call: Option<Instant>,
    burst_calls: u64,
    stats: DebounceStats,
}

impl<T> Debouncer<T> {
    /// Create a debouncer with a quiet window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            first_call: None,
            last_call: None,
            burst_calls: 0,
            stats: DebounceStats::default(),
        }
    }

    /// The quiet window.
    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether a value is waiting for release.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending value, if any.
    #[inline]
    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Counters since creation.
    #[inline]
    pub fn stats(&self) -> DebounceStats {
        self.stats
    }

    /// Replace the pending value and restart the window now.
    pub fn call(&mut self, value: T) {
        self.call_at(value, Instant::now());
    }

    /// Replace the pending value and restart the window.
    pub fn call_at(&mut self, value: T, now: Instant) {
        if self.pending.replace(value).is_some() {
            self.stats.superseded += 1;
        }
        self.record_call(now);
    }

    /// Fold a value into the pending one and restart the window.
    pub fn merge_at(&mut self, value: T, now: Instant, merge: impl FnOnce(T, T) -> T) {
        let next = match self.pending.take() {
            Some(prev) => {
                self.stats.superseded += 1;
                merge(prev, value)
            }
            None => value,
        };
        self.pending = Some(next);
        self.record_call(now);
    }

    /// When the pending value becomes releasable.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_call.map(|t| t + self.window)
    }

    /// Time left until release, zero if already due.
    pub fn time_until_fire(&self, now: Instant) -> Option<Duration> {
        let deadline = self.deadline()?;
        Some(duration_since_or_zero(deadline, now))
    }

    /// Release the pending value if it is due now.
    pub fn poll(&mut self) -> Option<Fired<T>> {
        self.poll_at(Instant::now())
    }

    /// Release the pending value if the window has elapsed since the last call.
    pub fn poll_at(&mut self, now: Instant) -> Option<Fired<T>> {
        let last_call = self.last_call?;
        if self.pending.is_none() || duration_since_or_zero(now, last_call) < self.window {
            return None;
        }
        let value = self.pending.take()?;
        let waited = self
            .first_call
            .map(|first| duration_since_or_zero(now, first))
            .unwrap_or(Duration::ZERO);
        let calls = self.burst_calls;
        self.reset_burst();
        self.stats.fired += 1;
        Some(Fired {
            value,
            calls,
            waited,
        })
    }

    /// Drop any pending value without releasing it.
    pub fn cancel(&mut self) -> Option<T> {
        let dropped = self.pending.take();
        if dropped.is_some() {
            self.stats.cancelled += 1;
        }
        self.reset_burst();
        dropped
    }

    fn record_call(&mut self, now: Instant) {
        self.stats.calls += 1;
        self.burst_calls += 1;
        if self.first_call.is_none() {
            self.first_call = Some(now);
        }
        self.last_call = Some(now);
    }

    fn reset_burst(&mut self) {
        self.first_call = None;
        self.last_call = None;
        self.burst_calls = 0;
    }
}
