#![forbid(unsafe_code)]

//! Coalesced repack requests.
//!
//! Mounting, resizing, font loads, card self-resizes and item changes all
//! want the masonry layout recomputed. [`RepackScheduler`] funnels every one
//! of them through a single trailing-edge [`Debouncer`], so a burst of
//! requests produces one [`PackingEngine::force_pack`] call.
//!
//! ```text
//! schedule(Resize) ─┐
//! schedule(Font)   ─┼─► debounce 10ms ─► force_pack()
//! schedule(Item)   ─┘
//! ```

use std::fmt;
use std::time::Duration;

use bitflags::bitflags;
use mgrid_layout::PackingEngine;
use serde::Serialize;
use web_time::Instant;

use crate::debounce::Debouncer;

/// Default quiet window before a repack fires.
pub const DEFAULT_REPACK_DEBOUNCE: Duration = Duration::from_millis(10);

/// Why a repack was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepackTrigger {
    Mount,
    Resize,
    FontReady,
    ItemResized,
    ItemsChanged,
    Remount,
}

impl RepackTrigger {
    pub const ALL: [Self; 6] = [
        Self::Mount,
        Self::Resize,
        Self::FontReady,
        Self::ItemResized,
        Self::ItemsChanged,
        Self::Remount,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::Resize => "resize",
            Self::FontReady => "font-ready",
            Self::ItemResized => "item-resized",
            Self::ItemsChanged => "items-changed",
            Self::Remount => "remount",
        }
    }
}

impl fmt::Display for RepackTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Set of triggers folded into one repack.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RepackTriggers: u8 {
        const MOUNT = 1 << 0;
        const RESIZE = 1 << 1;
        const FONT_READY = 1 << 2;
        const ITEM_RESIZED = 1 << 3;
        const ITEMS_CHANGED = 1 << 4;
        const REMOUNT = 1 << 5;
    }
}

impl From<RepackTrigger> for RepackTriggers {
    fn from(trigger: RepackTrigger) -> Self {
        match trigger {
            RepackTrigger::Mount => Self::MOUNT,
            RepackTrigger::Resize => Self::RESIZE,
            RepackTrigger::FontReady => Self::FONT_READY,
            RepackTrigger::ItemResized => Self::ITEM_RESIZED,
            RepackTrigger::ItemsChanged => Self::ITEMS_CHANGED,
            RepackTrigger::Remount => Self::REMOUNT,
        }
    }
}

impl RepackTriggers {
    /// Whether a trigger is in the set.
    #[inline]
    pub fn has(self, trigger: RepackTrigger) -> bool {
        self.contains(trigger.into())
    }

    /// Triggers in the set, in declaration order.
    pub fn iter_triggers(self) -> impl Iterator<Item = RepackTrigger> {
        RepackTrigger::ALL.into_iter().filter(move |t| self.has(*t))
    }
}

/// What a poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepackOutcome {
    /// Nothing scheduled.
    Idle,
    /// Scheduled but the window has not elapsed.
    Pending,
    /// The engine was repacked.
    Packed {
        triggers: RepackTriggers,
        requests: u64,
    },
    /// Due, but no engine was registered.
    NoEngine { triggers: RepackTriggers },
}

impl RepackOutcome {
    #[inline]
    pub fn packed(&self) -> bool {
        matches!(self, Self::Packed { .. })
    }
}

/// Repack counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepackStats {
    /// Requests accepted.
    pub requests: u64,
    /// `force_pack` calls made.
    pub repacks: u64,
    /// Due repacks dropped because no engine was registered.
    pub skipped_no_engine: u64,
    /// Pending repacks dropped by cancel or teardown.
    pub cancelled: u64,
}

/// Trailing-edge debounced repack scheduler.
#[derive(Debug, Clone)]
pub struct RepackScheduler {
    debounce: Debouncer<RepackTriggers>,
    torn_down: bool,
    stats: RepackStats,
}

impl Default for RepackScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_REPACK_DEBOUNCE)
    }
}

impl RepackScheduler {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            debounce: Debouncer::new(window),
            torn_down: false,
            stats: RepackStats::default(),
        }
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.debounce.window()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Triggers waiting in the current window.
    #[inline]
    pub fn pending_triggers(&self) -> RepackTriggers {
        self.debounce.pending().copied().unwrap_or_default()
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    #[inline]
    pub fn stats(&self) -> RepackStats {
        self.stats
    }

    #[inline]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Request a repack now.
    pub fn schedule(&mut self, trigger: RepackTrigger) {
        self.schedule_at(trigger, Instant::now());
    }

    /// Request a repack. Restarts the quiet window.
    pub fn schedule_at(&mut self, trigger: RepackTrigger, now: Instant) {
        if self.torn_down {
            tracing::trace!(%trigger, "repack request after teardown ignored");
            return;
        }
        self.stats.requests += 1;
        self.debounce
            .merge_at(trigger.into(), now, |pending, next| pending | next);
        tracing::trace!(%trigger, "repack scheduled");
    }

    /// Fire the pending repack if it is due now.
    pub fn poll<E>(&mut self, engine: Option<&mut E>) -> RepackOutcome
    where
        E: PackingEngine + ?Sized,
    {
        self.poll_at(Instant::now(), engine)
    }

    /// Fire the pending repack if its window has elapsed.
    pub fn poll_at<E>(&mut self, now: Instant, engine: Option<&mut E>) -> RepackOutcome
    where
        E: PackingEngine + ?Sized,
    {
        if !self.debounce.is_pending() {
            return RepackOutcome::Idle;
        }
        let Some(fired) = self.debounce.poll_at(now) else {
            return RepackOutcome::Pending;
        };
        let triggers = fired.value;
        match engine {
            Some(engine) => {
                engine.force_pack();
                self.stats.repacks += 1;
                tracing::debug!(
                    triggers = ?triggers,
                    requests = fired.calls,
                    waited_ms = fired.waited.as_millis() as u64,
                    "repack fired"
                );
                RepackOutcome::Packed {
                    triggers,
                    requests: fired.calls,
                }
            }
            None => {
                self.stats.skipped_no_engine += 1;
                tracing::trace!(triggers = ?triggers, "repack skipped, no engine");
                RepackOutcome::NoEngine { triggers }
            }
        }
    }

    /// Drop any pending repack.
    pub fn cancel(&mut self) {
        if self.debounce.cancel().is_some() {
            self.stats.cancelled += 1;
        }
    }

    /// Cancel and refuse every later request.
    pub fn teardown(&mut self) {
        self.cancel();
        self.torn_down = true;
    }
}
