#![forbid(unsafe_code)]

//! The grid container.
//!
//! [`GridContainer`] owns everything a masonry grid of alert-group cards
//! needs between host events and the packed layout: the viewport tracker,
//! the resize and repack debouncers, font-load watches, the reveal window and
//! the packing engine itself. Hosts feed it events stamped with `now` and
//! call [`tick_at`](GridContainer::tick_at) whenever
//! [`next_deadline`](GridContainer::next_deadline) passes.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──mount_at──► Mounted ──teardown──► TornDown
//! ```
//!
//! Font and item-resize events are only acted on while mounted. Item
//! updates, group-width changes and resizes before mount are stored; mount
//! re-seeds the viewport tracker with the host's current width and packs
//! from there. After teardown every event is ignored and no timer can fire.
//!
//! # Remounts
//!
//! The packing engine reads its breakpoint table once, so a change of the
//! effective group width (configured width plus the viewport tracker's
//! oscillation adjustment) builds a fresh engine and bumps the
//! [`LayoutGeneration`]. Measured heights do not carry over; cards re-render
//! at the new width and report again.

use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;

use mgrid_layout::{GridLayout, GridSizes, MasonryPacker, Rect};
use serde::Serialize;
use web_time::Instant;

use crate::config::{ConfigError, GridConfig};
use crate::debounce::Debouncer;
use crate::fonts::{FontLoadTracker, FontOutcome};
use crate::repack::{RepackOutcome, RepackScheduler, RepackTrigger};
use crate::reveal::{RenderWindow, RevealController};
use crate::viewport::{ViewportChange, ViewportTracker};

/// An item the grid can lay out.
pub trait GridItem {
    /// Stable identity used to key measured heights.
    type Id: Clone + Eq + Hash + fmt::Debug;

    fn id(&self) -> Self::Id;
}

/// Identity of the current packing-engine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LayoutGeneration(u64);

impl LayoutGeneration {
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LayoutGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Created,
    Mounted,
    TornDown,
}

/// Container counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GridStats {
    pub resize_events: u64,
    pub viewport_updates: u64,
    pub oscillations: u64,
    pub remounts: u64,
    pub repack_requests: u64,
    pub repacks: u64,
    pub repacks_skipped_no_engine: u64,
    pub load_more_calls: u64,
    pub fonts_loaded: u64,
    pub fonts_failed: u64,
    pub fonts_timed_out: u64,
    /// Events dropped because the container was not mounted.
    pub ignored_events: u64,
}

/// What one [`GridContainer::tick_at`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Debounced resize applied to the viewport tracker.
    pub viewport: Option<ViewportChange>,
    /// New engine generation if the resize caused a remount.
    pub remounted: Option<LayoutGeneration>,
    /// Font weights whose wait timed out.
    pub fonts_timed_out: Vec<u16>,
    pub repack: RepackOutcome,
}

impl TickReport {
    fn idle() -> Self {
        Self {
            viewport: None,
            remounted: None,
            fonts_timed_out: Vec::new(),
            repack: RepackOutcome::Idle,
        }
    }

    /// Whether the tick changed nothing.
    pub fn is_idle(&self) -> bool {
        self.viewport.is_none()
            && self.remounted.is_none()
            && self.fonts_timed_out.is_empty()
            && matches!(self.repack, RepackOutcome::Idle | RepackOutcome::Pending)
    }
}

/// One revealed card in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridCard<'a, T> {
    pub item: &'a T,
    /// Width style for the card renderer.
    pub width_px: u32,
    /// Packed position, `None` until the engine has placed the card.
    pub position: Option<Rect>,
}

/// Everything a renderer needs for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridFrame<'a, T> {
    pub generation: LayoutGeneration,
    pub viewport_width: u32,
    pub layout: GridLayout,
    /// Breakpoint descriptor handed to the packing engine.
    pub sizes: Cow<'a, GridSizes>,
    pub cards: Vec<GridCard<'a, T>>,
    pub content_height: u32,
    pub window: RenderWindow,
    pub has_more: bool,
    /// Render the loading affordance below the cards.
    pub show_loader: bool,
    pub scroll_threshold_px: u32,
    /// Cards show their source when more than one cluster feeds the store.
    pub show_source: bool,
}

/// Masonry grid container.
#[derive(Debug)]
pub struct GridContainer<T: GridItem> {
    config: GridConfig,
    group_width: u32,
    lifecycle: Lifecycle,
    viewport: ViewportTracker,
    resize: Debouncer<u32>,
    repack: RepackScheduler,
    reveal: RevealController,
    fonts: FontLoadTracker,
    items: Vec<T>,
    cluster_count: usize,
    engine: Option<MasonryPacker<T::Id>>,
    generation: LayoutGeneration,
    stats: GridStats,
}

impl<T: GridItem> GridContainer<T> {
    /// Create an unmounted container at the host's current width.
    #[must_use]
    pub fn new(config: GridConfig, viewport_width: u32) -> Self {
        Self {
            group_width: config.group_width_px,
            lifecycle: Lifecycle::Created,
            viewport: ViewportTracker::new(viewport_width),
            resize: Debouncer::new(config.resize_debounce()),
            repack: RepackScheduler::new(config.repack_debounce()),
            reveal: RevealController::with_steps(
                config.initial_reveal,
                config.reveal_step,
                config.scroll_threshold_px,
                0,
            ),
            fonts: FontLoadTracker::new(config.font_timeout()),
            items: Vec::new(),
            cluster_count: 0,
            engine: None,
            generation: LayoutGeneration::default(),
            stats: GridStats::default(),
            config,
        }
    }

    /// Validate the config, then create the container.
    pub fn try_new(config: GridConfig, viewport_width: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, viewport_width))
    }

    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
    }

    #[inline]
    pub fn viewport(&self) -> &ViewportTracker {
        &self.viewport
    }

    #[inline]
    pub fn reveal(&self) -> &RevealController {
        &self.reveal
    }

    #[inline]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn generation(&self) -> LayoutGeneration {
        self.generation
    }

    /// The packing engine, present while mounted.
    #[inline]
    pub fn engine(&self) -> Option<&MasonryPacker<T::Id>> {
        self.engine.as_ref()
    }

    /// Configured group width.
    #[inline]
    pub fn group_width(&self) -> u32 {
        self.group_width
    }

    /// Configured group width plus the oscillation adjustment.
    #[inline]
    pub fn effective_group_width(&self) -> u32 {
        self.viewport.effective_group_width(self.group_width)
    }

    /// Breakpoint table for the effective group width.
    pub fn sizes(&self) -> GridSizes {
        GridSizes::with_gutter(i64::from(self.effective_group_width()), self.config.gutter_px)
    }

    /// Column layout at the tracked width, recomputed on every call.
    pub fn layout(&self) -> GridLayout {
        self.sizes().layout_for(self.viewport.width())
    }

    #[inline]
    pub fn show_source(&self) -> bool {
        self.cluster_count > 1
    }

    pub fn stats(&self) -> GridStats {
        let repack = self.repack.stats();
        GridStats {
            oscillations: self.viewport.oscillations(),
            repack_requests: repack.requests,
            repacks: repack.repacks,
            repacks_skipped_no_engine: repack.skipped_no_engine,
            load_more_calls: self.reveal.load_more_calls(),
            ..self.stats
        }
    }

    /// Mount now at the current viewport width.
    pub fn mount(&mut self, viewport_width: u32) {
        self.mount_at(viewport_width, Instant::now());
    }

    /// Wire the container at the current viewport width: start font
    /// watches, build the engine, and schedule the first repack.
    pub fn mount_at(&mut self, viewport_width: u32, now: Instant) {
        if self.lifecycle != Lifecycle::Created {
            self.ignore("mount");
            return;
        }
        self.lifecycle = Lifecycle::Mounted;
        self.viewport = ViewportTracker::new(viewport_width);
        for &weight in &self.config.font_weights {
            self.fonts.watch_at(weight, now);
        }
        self.rebuild_engine();
        self.repack.schedule_at(RepackTrigger::Mount, now);
        tracing::debug!(
            width = self.viewport.width(),
            group_width = self.group_width,
            items = self.items.len(),
            fonts = self.config.font_weights.len(),
            "grid mounted"
        );
    }

    /// Report a container width now.
    pub fn resize(&mut self, width: u32) {
        self.resize_at(width, Instant::now());
    }

    /// Report a container width. Debounced; the latest width wins.
    ///
    /// Before mount nothing is laid out yet, so the width is taken as is.
    pub fn resize_at(&mut self, width: u32, now: Instant) {
        match self.lifecycle {
            Lifecycle::Mounted => {}
            Lifecycle::Created => {
                self.stats.resize_events += 1;
                self.viewport = ViewportTracker::new(width);
                tracing::trace!(width, "viewport width recorded before mount");
                return;
            }
            Lifecycle::TornDown => {
                self.ignore("resize");
                return;
            }
        }
        self.stats.resize_events += 1;
        self.resize.call_at(width, now);
    }

    pub fn font_loaded(&mut self, weight: u16) -> bool {
        self.font_loaded_at(weight, Instant::now())
    }

    /// A watched font weight finished loading.
    pub fn font_loaded_at(&mut self, weight: u16, now: Instant) -> bool {
        self.settle_font(weight, FontOutcome::Loaded, now)
    }

    pub fn font_failed(&mut self, weight: u16) -> bool {
        self.font_failed_at(weight, Instant::now())
    }

    /// A watched font weight failed to load. Treated like a load.
    pub fn font_failed_at(&mut self, weight: u16, now: Instant) -> bool {
        self.settle_font(weight, FontOutcome::Failed, now)
    }

    /// A card measured its height now.
    pub fn item_resized(&mut self, id: &T::Id, height: u32) -> bool {
        self.item_resized_at(id, height, Instant::now())
    }

    /// A card re-rendered and measured its height.
    ///
    /// Returns `true` if the height differs from what the engine knew.
    pub fn item_resized_at(&mut self, id: &T::Id, height: u32, now: Instant) -> bool {
        if !self.is_mounted() {
            self.ignore("item-resized");
            return false;
        }
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        if !engine.contains(id) {
            tracing::trace!(?id, "resize report for card not on the grid");
            return false;
        }
        let changed = engine.set_height(id, height);
        self.repack.schedule_at(RepackTrigger::ItemResized, now);
        changed
    }

    /// Update the item sequence, keeping the reveal window.
    pub fn set_items(&mut self, items: Vec<T>, now: Instant) {
        if self.lifecycle == Lifecycle::TornDown {
            self.ignore("set-items");
            return;
        }
        self.items = items;
        self.reveal.set_total(self.items.len());
        self.sync_engine(now);
    }

    /// Replace the item set with a different one.
    ///
    /// Resets the reveal window when configured to.
    pub fn replace_items(&mut self, items: Vec<T>, now: Instant) {
        if self.lifecycle == Lifecycle::TornDown {
            self.ignore("replace-items");
            return;
        }
        if self.config.reset_reveal_on_identity_change {
            self.reveal.reset();
        }
        self.set_items(items, now);
    }

    /// Number of upstream clusters feeding the items.
    pub fn set_cluster_count(&mut self, clusters: usize) {
        self.cluster_count = clusters;
    }

    /// Change the configured group width now.
    pub fn set_group_width(&mut self, px: u32) -> Option<LayoutGeneration> {
        self.set_group_width_at(px, Instant::now())
    }

    /// Change the configured group width. Remounts the engine when mounted.
    pub fn set_group_width_at(&mut self, px: u32, now: Instant) -> Option<LayoutGeneration> {
        if self.lifecycle == Lifecycle::TornDown || px == self.group_width {
            return None;
        }
        self.group_width = px;
        if !self.is_mounted() {
            return None;
        }
        Some(self.remount_at(now))
    }

    pub fn load_more(&mut self) -> bool {
        self.load_more_at(Instant::now())
    }

    /// Reveal the next step of items.
    pub fn load_more_at(&mut self, now: Instant) -> bool {
        if self.lifecycle == Lifecycle::TornDown || !self.reveal.load_more() {
            return false;
        }
        self.sync_engine(now);
        true
    }

    pub fn scrolled(&mut self, distance_to_bottom_px: u32) -> bool {
        self.scrolled_at(distance_to_bottom_px, Instant::now())
    }

    /// Handle a scroll report; loads more near the bottom.
    pub fn scrolled_at(&mut self, distance_to_bottom_px: u32, now: Instant) -> bool {
        if self.lifecycle == Lifecycle::TornDown || !self.reveal.on_scroll(distance_to_bottom_px) {
            return false;
        }
        self.sync_engine(now);
        true
    }

    /// Run every timer that is due now.
    pub fn tick(&mut self) -> TickReport {
        self.tick_at(Instant::now())
    }

    /// Run every timer that is due.
    pub fn tick_at(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::idle();
        if !self.is_mounted() {
            return report;
        }

        if let Some(fired) = self.resize.poll_at(now) {
            let change = self.viewport.update(fired.value);
            self.stats.viewport_updates += 1;
            if change.adjust_changed() {
                report.remounted = Some(self.remount_at(now));
            } else if let Some(engine) = self.engine.as_mut() {
                engine.resize(change.width);
            }
            self.repack.schedule_at(RepackTrigger::Resize, now);
            tracing::trace!(
                width = change.width,
                coalesced = fired.calls,
                "resize applied"
            );
            report.viewport = Some(change);
        }

        let expired = self.fonts.poll_at(now);
        for _ in &expired {
            self.repack.schedule_at(RepackTrigger::FontReady, now);
        }
        self.stats.fonts_timed_out += expired.len() as u64;
        report.fonts_timed_out = expired;

        report.repack = self.repack.poll_at(now, self.engine.as_mut());
        report
    }

    /// Earliest instant at which [`tick_at`](Self::tick_at) has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        if !self.is_mounted() {
            return None;
        }
        [
            self.resize.deadline(),
            self.fonts.deadline(),
            self.repack.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Cancel every timer and release the engine.
    pub fn teardown(&mut self) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.lifecycle = Lifecycle::TornDown;
        self.resize.cancel();
        self.repack.teardown();
        self.fonts.clear();
        self.engine = None;
        tracing::debug!(generation = %self.generation, "grid torn down");
    }

    /// Snapshot for rendering.
    pub fn frame(&self) -> GridFrame<'_, T> {
        let layout = self.layout();
        let window = self.reveal.window();
        let sizes = match &self.engine {
            Some(engine) => Cow::Borrowed(engine.sizes()),
            None => Cow::Owned(self.sizes()),
        };
        let cards = self.items[..window.revealed]
            .iter()
            .map(|item| GridCard {
                item,
                width_px: layout.column_width,
                position: self
                    .engine
                    .as_ref()
                    .and_then(|engine| engine.position(&item.id())),
            })
            .collect();
        GridFrame {
            generation: self.generation,
            viewport_width: self.viewport.width(),
            layout,
            sizes,
            cards,
            content_height: self.engine.as_ref().map_or(0, MasonryPacker::content_height),
            window,
            has_more: window.has_more(),
            show_loader: window.has_more(),
            scroll_threshold_px: self.reveal.threshold_px(),
            show_source: self.show_source(),
        }
    }

    fn settle_font(&mut self, weight: u16, outcome: FontOutcome, now: Instant) -> bool {
        if !self.is_mounted() {
            self.ignore("font");
            return false;
        }
        if !self.fonts.resolve(weight, outcome) {
            return false;
        }
        match outcome {
            FontOutcome::Failed => self.stats.fonts_failed += 1,
            _ => self.stats.fonts_loaded += 1,
        }
        self.repack.schedule_at(RepackTrigger::FontReady, now);
        true
    }

    fn remount_at(&mut self, now: Instant) -> LayoutGeneration {
        self.rebuild_engine();
        self.stats.remounts += 1;
        self.repack.schedule_at(RepackTrigger::Remount, now);
        self.generation
    }

    fn rebuild_engine(&mut self) {
        let width = self.viewport.width();
        let mut engine = MasonryPacker::new(self.sizes(), width)
            .with_estimated_height(self.config.estimated_item_height_px);
        let revealed = self.reveal.revealed();
        engine.sync_items(self.items[..revealed].iter().map(GridItem::id));
        engine.pack(width);
        self.engine = Some(engine);
        self.generation = self.generation.next();
        tracing::debug!(
            generation = %self.generation,
            group_width = self.effective_group_width(),
            width,
            "packing engine mounted"
        );
    }

    /// Align the engine with the revealed prefix and place new cards.
    fn sync_engine(&mut self, now: Instant) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        let revealed = self.reveal.revealed();
        if engine.sync_items(self.items[..revealed].iter().map(GridItem::id)) {
            engine.update();
            self.repack.schedule_at(RepackTrigger::ItemsChanged, now);
        }
    }

    fn ignore(&mut self, event: &'static str) {
        self.stats.ignored_events += 1;
        tracing::trace!(event, lifecycle = ?self.lifecycle, "grid event ignored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Card(u32);

    impl GridItem for Card {
        type Id = u32;

        fn id(&self) -> u32 {
            self.0
        }
    }

    fn cards(n: u32) -> Vec<Card> {
        (0..n).map(Card).collect()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn mounted(width: u32, items: u32, t0: Instant) -> GridContainer<Card> {
        mounted_at(width, width, items, t0)
    }

    fn mounted_at(created: u32, width: u32, items: u32, t0: Instant) -> GridContainer<Card> {
        let mut grid = GridContainer::new(GridConfig::default(), created);
        grid.set_items(cards(items), t0);
        grid.mount_at(width, t0);
        grid
    }

    #[test]
    fn mount_builds_engine_and_packs_revealed_prefix() {
        let t0 = Instant::now();
        let grid = mounted(1280, 200, t0);
        assert!(grid.is_mounted());
        assert_eq!(grid.generation().get(), 1);
        let engine = grid.engine().expect("engine after mount");
        assert_eq!(engine.len(), 50);
        assert_eq!(engine.columns(), 3);
        assert_eq!(grid.next_deadline(), Some(t0 + ms(10)));
    }

    #[test]
    fn mount_repack_fires_after_window() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 10, t0);
        assert!(!grid.tick_at(t0 + ms(9)).repack.packed());
        assert!(grid.tick_at(t0 + ms(10)).repack.packed());
        assert_eq!(grid.stats().repacks, 1);
    }

    #[test]
    fn events_before_mount_are_ignored() {
        let t0 = Instant::now();
        let mut grid: GridContainer<Card> = GridContainer::new(GridConfig::default(), 800);
        assert!(!grid.font_loaded_at(400, t0));
        assert!(!grid.item_resized_at(&1, 90, t0));
        assert!(grid.tick_at(t0 + ms(500)).is_idle());
        assert_eq!(grid.stats().ignored_events, 2);
        assert_eq!(grid.next_deadline(), None);
    }

    #[test]
    fn resize_before_mount_sets_first_layout_width() {
        let t0 = Instant::now();
        let mut grid: GridContainer<Card> = GridContainer::new(GridConfig::default(), 800);
        grid.set_items(cards(10), t0);
        grid.resize_at(1200, t0);
        grid.resize_at(1700, t0 + ms(5));
        assert_eq!(grid.viewport().width(), 1700);
        assert_eq!(grid.next_deadline(), None, "nothing debounces before mount");

        grid.mount_at(1700, t0 + ms(10));
        assert_eq!(grid.engine().map(MasonryPacker::columns), Some(4));
        assert_eq!(grid.frame().layout.columns, 4);
        assert!(grid.viewport().history().is_empty());
        assert_eq!(grid.stats().ignored_events, 0);
    }

    #[test]
    fn mount_uses_host_width_over_construction_width() {
        let t0 = Instant::now();
        let grid = mounted_at(800, 1700, 10, t0);
        assert_eq!(grid.viewport().width(), 1700);
        assert_eq!(grid.engine().map(MasonryPacker::container_width), Some(1700));
        assert_eq!(grid.layout().columns, 4);
        assert_eq!(grid.generation().get(), 1);
    }

    #[test]
    fn resize_tick_keeps_card_width_and_positions_in_step() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 10, t0);
        grid.tick_at(t0 + ms(10));

        // Three columns either way, but 426 px columns become 533 px.
        grid.resize_at(1600, t0 + ms(20));
        let report = grid.tick_at(t0 + ms(120));
        assert!(report.viewport.is_some());
        assert!(!report.repack.packed(), "resize repack still pending");

        let frame = grid.frame();
        assert_eq!(frame.layout.columns, 3);
        for card in &frame.cards {
            let rect = card.position.expect("placed");
            assert_eq!(rect.width, card.width_px);
        }
        let rects: Vec<Rect> = frame.cards.iter().filter_map(|c| c.position).collect();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn resize_is_debounced_and_latest_wins() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 10, t0);
        grid.tick_at(t0 + ms(10));

        grid.resize_at(1000, t0 + ms(20));
        grid.resize_at(1700, t0 + ms(60));
        assert!(grid.tick_at(t0 + ms(150)).viewport.is_none());

        let report = grid.tick_at(t0 + ms(160));
        let change = report.viewport.expect("resize applied");
        assert_eq!(change.width, 1700);
        assert_eq!(grid.viewport().history(), &[1700]);
        assert_eq!(grid.layout().columns, 4);
        assert_eq!(grid.stats().resize_events, 2);
        assert_eq!(grid.stats().viewport_updates, 1);
    }

    #[test]
    fn font_resolution_schedules_repack() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 10, t0);
        grid.tick_at(t0 + ms(10));

        assert!(grid.font_loaded_at(400, t0 + ms(100)));
        assert!(!grid.font_loaded_at(400, t0 + ms(101)));
        assert!(grid.font_failed_at(600, t0 + ms(102)));
        assert!(grid.tick_at(t0 + ms(112)).repack.packed());

        let stats = grid.stats();
        assert_eq!(stats.fonts_loaded, 1);
        assert_eq!(stats.fonts_failed, 1);
        assert_eq!(stats.repacks, 2);
    }

    #[test]
    fn font_timeout_schedules_repack() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 10, t0);
        grid.tick_at(t0 + ms(10));
        assert_eq!(grid.next_deadline(), Some(t0 + ms(30_000)));

        let report = grid.tick_at(t0 + ms(30_000));
        assert_eq!(report.fonts_timed_out, vec![400, 600, 700]);
        assert!(grid.tick_at(t0 + ms(30_010)).repack.packed());
        assert_eq!(grid.next_deadline(), None);
    }

    #[test]
    fn item_resize_updates_height_and_repacks() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 4, t0);
        grid.tick_at(t0 + ms(10));

        assert!(grid.item_resized_at(&0, 300, t0 + ms(20)));
        assert!(!grid.item_resized_at(&99, 300, t0 + ms(20)));
        grid.tick_at(t0 + ms(30));

        let engine = grid.engine().expect("engine");
        assert_eq!(engine.position(&0).map(|r| r.height), Some(300));
        // Card 3 lands under the shortest column, which is column 1.
        assert_eq!(engine.position(&3).map(|r| (r.x, r.y)), Some((426, 120)));
    }

    #[test]
    fn group_width_change_remounts() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 10, t0);
        grid.item_resized_at(&1, 200, t0);

        assert_eq!(grid.set_group_width_at(420, t0), None);
        let generation = grid.set_group_width_at(300, t0).expect("remount");
        assert_eq!(generation.get(), 2);
        assert_eq!(grid.engine().map(MasonryPacker::columns), Some(4));
        // Fresh engine: measured heights are gone.
        assert_eq!(
            grid.engine().and_then(|e| e.position(&1)).map(|r| r.height),
            Some(120)
        );
        assert_eq!(grid.stats().remounts, 1);
    }

    #[test]
    fn oscillation_remounts_with_wider_groups() {
        let t0 = Instant::now();
        let mut grid = mounted(1300, 10, t0);
        let mut now = t0;
        let mut remounts = Vec::new();
        for width in [1240, 1300, 1240, 1300] {
            grid.resize_at(width, now);
            now += ms(100);
            if let Some(generation) = grid.tick_at(now).remounted {
                remounts.push(generation.get());
            }
        }
        assert_eq!(remounts, vec![2]);
        assert_eq!(grid.viewport().width_adjust(), 20);
        assert_eq!(grid.effective_group_width(), 440);
    }

    #[test]
    fn scrolling_reveals_and_syncs_engine() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 65, t0);
        assert!(!grid.scrolled_at(200, t0));
        assert!(grid.scrolled_at(10, t0));
        assert_eq!(grid.reveal().revealed(), 65);
        assert_eq!(grid.engine().map(MasonryPacker::len), Some(65));
        assert!(!grid.load_more_at(t0));
        assert!(!grid.frame().has_more);
    }

    #[test]
    fn set_items_keeps_window_replace_resets() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 200, t0);
        grid.load_more_at(t0);
        assert_eq!(grid.reveal().revealed(), 80);

        grid.set_items(cards(300), t0);
        assert_eq!(grid.reveal().revealed(), 80);

        grid.replace_items((1000..1300).map(Card).collect(), t0);
        assert_eq!(grid.reveal().revealed(), 50);
        assert!(grid.engine().is_some_and(|e| e.contains(&1000)));
    }

    #[test]
    fn replace_without_reset_keeps_window() {
        let t0 = Instant::now();
        let config = GridConfig::default().with_reset_reveal_on_identity_change(false);
        let mut grid = GridContainer::new(config, 1280);
        grid.set_items(cards(200), t0);
        grid.mount_at(1280, t0);
        grid.load_more_at(t0);
        grid.replace_items((500..700).map(Card).collect(), t0);
        assert_eq!(grid.reveal().revealed(), 80);
    }

    #[test]
    fn frame_describes_revealed_cards() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 120, t0);
        grid.set_cluster_count(2);
        let frame = grid.frame();
        assert_eq!(frame.cards.len(), 50);
        assert!(frame.cards.iter().all(|c| c.width_px == 426));
        assert!(frame.cards.iter().all(|c| c.position.is_some()));
        assert_eq!(frame.cards[3].position.map(|r| (r.x, r.y)), Some((0, 120)));
        assert!(frame.has_more);
        assert!(frame.show_loader);
        assert!(frame.show_source);
        assert_eq!(frame.scroll_threshold_px, 50);
        assert_eq!(frame.sizes.breakpoints()[1].min_width, 840);
        assert_eq!(frame.window, RenderWindow { revealed: 50, total: 120 });
    }

    #[test]
    fn teardown_cancels_everything() {
        let t0 = Instant::now();
        let mut grid = mounted(1280, 10, t0);
        grid.resize_at(900, t0);
        grid.teardown();

        assert_eq!(grid.next_deadline(), None);
        assert!(grid.engine().is_none());
        assert!(grid.tick_at(t0 + ms(40_000)).is_idle());
        assert_eq!(grid.stats().repacks, 0);
        assert_eq!(grid.set_group_width_at(300, t0), None);
        grid.mount_at(1280, t0);
        assert_eq!(grid.lifecycle(), Lifecycle::TornDown);
    }

    #[test]
    fn wall_clock_wrappers_drive_the_same_state() {
        let config = GridConfig {
            resize_debounce_ms: 60_000,
            repack_debounce_ms: 60_000,
            ..GridConfig::default()
        };
        let mut grid = GridContainer::new(config, 800);
        grid.set_items(cards(120), Instant::now());
        grid.mount(1280);
        assert_eq!(grid.layout().columns, 3);

        grid.resize(1700);
        assert!(grid.item_resized(&0, 300));
        assert!(grid.font_loaded(400));
        assert!(grid.font_failed(700));
        assert!(grid.load_more());
        assert!(grid.scrolled(0));
        assert_eq!(grid.reveal().revealed(), 110);
        assert_eq!(grid.set_group_width(320).map(LayoutGeneration::get), Some(2));

        let report = grid.tick();
        assert!(report.viewport.is_none(), "resize still debouncing");
        assert!(!report.repack.packed());
        assert_eq!(grid.stats().resize_events, 1);
        assert_eq!(grid.stats().fonts_loaded, 1);
        assert_eq!(grid.stats().fonts_failed, 1);
    }

    #[test]
    fn try_new_validates() {
        let config = GridConfig::default().with_reveal(50, 0);
        assert!(GridContainer::<Card>::try_new(config, 1280).is_err());
    }
}
