#![forbid(unsafe_code)]

//! Incremental reveal of long item lists.
//!
//! Rendering thousands of cards at once is slow, so the grid starts with a
//! fixed prefix and grows it when the user scrolls near the bottom. The
//! controller only tracks counts; slicing is left to the caller via
//! [`RevealController::visible_range`].

use std::ops::Range;

use serde::Serialize;

/// Items rendered before any load-more.
pub const INITIAL_REVEAL: usize = 50;

/// Items added per load-more.
pub const REVEAL_STEP: usize = 30;

/// Distance from the bottom, in pixels, at which scrolling loads more.
pub const SCROLL_THRESHOLD_PX: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    /// Some items are still hidden.
    HasMore,
    /// Every item is revealed.
    Complete,
}

/// Snapshot of the reveal window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderWindow {
    pub revealed: usize,
    pub total: usize,
}

impl RenderWindow {
    #[inline]
    pub fn has_more(&self) -> bool {
        self.revealed < self.total
    }
}

/// Grows a revealed prefix in fixed steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealController {
    initial: usize,
    step: usize,
    threshold_px: u32,
    limit: usize,
    total: usize,
    load_more_calls: u64,
}

impl Default for RevealController {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RevealController {
    /// Controller with the default initial count, step and threshold.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self::with_steps(INITIAL_REVEAL, REVEAL_STEP, SCROLL_THRESHOLD_PX, total)
    }

    /// Controller with explicit sizing. A zero step is treated as one.
    #[must_use]
    pub fn with_steps(initial: usize, step: usize, threshold_px: u32, total: usize) -> Self {
        Self {
            initial,
            step: step.max(1),
            threshold_px,
            limit: initial,
            total,
            load_more_calls: 0,
        }
    }

    /// Items currently revealed, never more than the total.
    #[inline]
    pub fn revealed(&self) -> usize {
        self.limit.min(self.total)
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn threshold_px(&self) -> u32 {
        self.threshold_px
    }

    #[inline]
    pub fn state(&self) -> RevealState {
        if self.revealed() < self.total {
            RevealState::HasMore
        } else {
            RevealState::Complete
        }
    }

    #[inline]
    pub fn has_more(&self) -> bool {
        self.state() == RevealState::HasMore
    }

    /// Honoured load-more calls since creation.
    #[inline]
    pub fn load_more_calls(&self) -> u64 {
        self.load_more_calls
    }

    #[inline]
    pub fn window(&self) -> RenderWindow {
        RenderWindow {
            revealed: self.revealed(),
            total: self.total,
        }
    }

    /// Index range of revealed items.
    #[inline]
    pub fn visible_range(&self) -> Range<usize> {
        0..self.revealed()
    }

    /// Reveal the next step. Returns `false` when nothing is hidden.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        let before = self.revealed();
        self.limit = before.saturating_add(self.step).min(self.total);
        self.load_more_calls += 1;
        tracing::debug!(
            revealed = self.limit,
            total = self.total,
            "reveal grew"
        );
        self.revealed() > before
    }

    /// Handle a scroll report. Loads more when within the threshold.
    pub fn on_scroll(&mut self, distance_to_bottom_px: u32) -> bool {
        if distance_to_bottom_px > self.threshold_px {
            return false;
        }
        self.load_more()
    }

    /// Change the item count. Growth past the limit leaves new items hidden.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
    }

    /// Return to the initial count.
    pub fn reset(&mut self) {
        self.limit = self.initial;
        tracing::trace!(revealed = self.revealed(), "reveal reset");
    }
}
