#![forbid(unsafe_code)]

//! Bounded waits for web-font loads.
//!
//! Card heights change once the final font is available, so the grid asks
//! for a repack when each watched weight settles. A watch settles exactly
//! once: on load, on failure, or when its timeout elapses, whichever comes
//! first. All three outcomes mean "repack now".

use std::fmt;
use std::time::Duration;

use web_time::Instant;

/// Weights watched by default.
pub const DEFAULT_FONT_WEIGHTS: [u16; 3] = [400, 600, 700];

/// Time before a pending font watch gives up.
pub const DEFAULT_FONT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// How a font watch settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontOutcome {
    Loaded,
    Failed,
    TimedOut,
}

impl fmt::Display for FontOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loaded => "loaded",
            Self::Failed => "failed",
            Self::TimedOut => "timed-out",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FontWatch {
    weight: u16,
    deadline: Instant,
    outcome: Option<FontOutcome>,
}

/// Tracks a set of font watches racing their timeouts.
#[derive(Debug, Clone, Default)]
pub struct FontLoadTracker {
    timeout: Duration,
    watches: Vec<FontWatch>,
}

impl FontLoadTracker {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            watches: Vec::new(),
        }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start watching a weight from now.
    pub fn watch(&mut self, weight: u16) {
        self.watch_at(weight, Instant::now());
    }

    /// Start watching a weight. A weight already watched is left alone.
    pub fn watch_at(&mut self, weight: u16, now: Instant) {
        if self.watches.iter().any(|w| w.weight == weight) {
            return;
        }
        self.watches.push(FontWatch {
            weight,
            deadline: now + self.timeout,
            outcome: None,
        });
    }

    /// Settle a watch from a load report.
    ///
    /// Returns `true` if this report settled a pending watch. Reports for
    /// unknown or already settled weights are ignored.
    pub fn resolve(&mut self, weight: u16, outcome: FontOutcome) -> bool {
        let Some(watch) = self
            .watches
            .iter_mut()
            .find(|w| w.weight == weight && w.outcome.is_none())
        else {
            return false;
        };
        watch.outcome = Some(outcome);
        tracing::debug!(weight, %outcome, "font watch settled");
        true
    }

    /// Time out watches that are overdue now.
    pub fn poll(&mut self) -> Vec<u16> {
        self.poll_at(Instant::now())
    }

    /// Time out every pending watch whose deadline has passed.
    ///
    /// Returns the weights that timed out on this poll.
    pub fn poll_at(&mut self, now: Instant) -> Vec<u16> {
        let mut expired = Vec::new();
        for watch in &mut self.watches {
            if watch.outcome.is_none() && now >= watch.deadline {
                watch.outcome = Some(FontOutcome::TimedOut);
                expired.push(watch.weight);
            }
        }
        if !expired.is_empty() {
            tracing::debug!(weights = ?expired, "font watches timed out");
        }
        expired
    }

    /// Earliest pending timeout.
    pub fn deadline(&self) -> Option<Instant> {
        self.watches
            .iter()
            .filter(|w| w.outcome.is_none())
            .map(|w| w.deadline)
            .min()
    }

    /// Outcome for a weight, `None` while pending or unknown.
    pub fn outcome(&self, weight: u16) -> Option<FontOutcome> {
        self.watches
            .iter()
            .find(|w| w.weight == weight)
            .and_then(|w| w.outcome)
    }

    /// Number of watches still pending.
    pub fn pending(&self) -> usize {
        self.watches.iter().filter(|w| w.outcome.is_none()).count()
    }

    /// Whether every watch has settled.
    pub fn all_settled(&self) -> bool {
        self.pending() == 0
    }

    /// Drop every watch. Later reports are ignored.
    pub fn clear(&mut self) {
        self.watches.clear();
    }
}
