#![forbid(unsafe_code)]

//! Viewport width tracking with oscillation damping.
//!
//! Resizing a container can feed back into its own width: adding a column
//! makes a scrollbar appear, the narrower viewport drops the column, the
//! scrollbar disappears, and the cycle repeats. [`ViewportTracker`] watches
//! the last [`HISTORY_LEN`] widths and, when it sees a strict two-value
//! flip-flop, widens the effective group width by [`WIDTH_ADJUST_STEP`] so
//! the next layout lands on one side of the breakpoint. Any non-oscillating
//! update resets the adjustment.
//!
//! # Invariants
//!
//! 1. `history().len() <= HISTORY_LEN`, most recent first.
//! 2. `width_adjust()` is a multiple of [`WIDTH_ADJUST_STEP`] in
//!    `0..=WIDTH_ADJUST_MAX`.
//! 3. The adjustment only grows by one step per oscillating update, or drops
//!    straight to zero.
//! 4. Re-reporting the current width is idempotent: width and adjustment are
//!    unchanged.

use std::fmt;

/// Number of widths remembered for oscillation detection.
pub const HISTORY_LEN: usize = 4;

/// Pixels added to the group width per detected oscillation.
pub const WIDTH_ADJUST_STEP: u32 = 20;

/// Upper bound for the width adjustment.
pub const WIDTH_ADJUST_MAX: u32 = 200;

/// Outcome of the oscillation check for one update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oscillation {
    /// The window is not full yet, or the width did not change.
    NotChecked,
    /// The window does not flip-flop.
    Stable,
    /// Strict two-value flip-flop detected.
    Detected,
}

impl fmt::Display for Oscillation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotChecked => "not-checked",
            Self::Stable => "stable",
            Self::Detected => "detected",
        };
        f.write_str(s)
    }
}

/// What one [`ViewportTracker::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportChange {
    pub previous_width: u32,
    pub width: u32,
    pub previous_adjust: u32,
    pub width_adjust: u32,
    pub oscillation: Oscillation,
}

impl ViewportChange {
    /// Whether the width moved.
    #[inline]
    pub fn width_changed(&self) -> bool {
        self.previous_width != self.width
    }

    /// Whether the adjustment moved, which changes the effective group width.
    #[inline]
    pub fn adjust_changed(&self) -> bool {
        self.previous_adjust != self.width_adjust
    }
}

/// Tracks the container width and damps layout oscillation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewportTracker {
    width: u32,
    width_adjust: u32,
    history: Vec<u32>,
    oscillations: u64,
}

impl ViewportTracker {
    /// Start tracking at the mount-time width with an empty history.
    #[must_use]
    pub fn new(width: u32) -> Self {
        Self {
            width,
            width_adjust: 0,
            history: Vec::with_capacity(HISTORY_LEN + 1),
            oscillations: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn width_adjust(&self) -> u32 {
        self.width_adjust
    }

    /// Recent widths, most recent first.
    #[inline]
    pub fn history(&self) -> &[u32] {
        &self.history
    }

    /// Number of updates that detected an oscillation.
    #[inline]
    pub fn oscillations(&self) -> u64 {
        self.oscillations
    }

    /// Configured group width plus the current adjustment.
    #[inline]
    pub fn effective_group_width(&self, configured: u32) -> u32 {
        configured.saturating_add(self.width_adjust)
    }

    /// Record a new container width.
    pub fn update(&mut self, new_width: u32) -> ViewportChange {
        let previous_width = self.width;
        let previous_adjust = self.width_adjust;

        let repeated = new_width == self.width;
        self.history.insert(0, new_width);
        self.history.truncate(HISTORY_LEN);

        let oscillation = if repeated || self.history.len() < HISTORY_LEN {
            Oscillation::NotChecked
        } else if is_oscillating(&self.history, new_width) {
            Oscillation::Detected
        } else {
            Oscillation::Stable
        };

        match oscillation {
            Oscillation::Detected => {
                self.oscillations += 1;
                self.width_adjust = (self.width_adjust + WIDTH_ADJUST_STEP).min(WIDTH_ADJUST_MAX);
                if self.width_adjust == WIDTH_ADJUST_MAX {
                    tracing::info!(
                        width = new_width,
                        width_adjust = self.width_adjust,
                        history = ?self.history,
                        "viewport still oscillating at maximum width adjustment"
                    );
                } else {
                    tracing::debug!(
                        width = new_width,
                        width_adjust = self.width_adjust,
                        "viewport oscillation damped"
                    );
                }
            }
            Oscillation::Stable => self.width_adjust = 0,
            Oscillation::NotChecked => {}
        }
        self.width = new_width;

        tracing::trace!(
            previous_width,
            width = new_width,
            width_adjust = self.width_adjust,
            %oscillation,
            "viewport updated"
        );

        ViewportChange {
            previous_width,
            width: new_width,
            previous_adjust,
            width_adjust: self.width_adjust,
            oscillation,
        }
    }
}

/// Strict two-value flip-flop test over a full history window that already
/// holds the incoming width.
///
/// The newest two samples differ, the newest and oldest differ, the incoming
/// width is in the window, and the window splits 2-2 between exactly two
/// widths.
fn is_oscillating(history: &[u32], new_width: u32) -> bool {
    if history.len() < HISTORY_LEN {
        return false;
    }
    if history[0] == history[1] || history[0] == history[HISTORY_LEN - 1] {
        return false;
    }
    if !history.contains(&new_width) {
        return false;
    }

    let mut counts: [(u32, usize); HISTORY_LEN] = [(0, 0); HISTORY_LEN];
    let mut distinct = 0;
    for &w in history {
        match counts[..distinct].iter_mut().find(|(v, _)| *v == w) {
            Some((_, n)) => *n += 1,
            None => {
                counts[distinct] = (w, 1);
                distinct += 1;
            }
        }
    }
    distinct == 2 && counts[0].1 == counts[1].1
}
