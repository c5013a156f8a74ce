#![forbid(unsafe_code)]

//! Shortest-column masonry packer.
//!
//! [`MasonryPacker`] assigns absolute positions to a sequence of
//! variable-height cards. Each card is placed into the column whose current
//! bottom edge is highest on screen (lowest index wins ties), which keeps
//! vertical gaps small without reordering cards across rows.
//!
//! The packer reads its [`GridSizes`] table once, at construction. A
//! different group width means a different packer; hosts swap the whole
//! instance instead of patching the table.
//!
//! # Operations
//!
//! | Method          | Work                                                   |
//! |-----------------|--------------------------------------------------------|
//! | [`pack`]        | Reposition every card at a container width             |
//! | [`update`]      | Place only cards appended since the last pack          |
//! | [`resize`]      | Repack only if the column layout changed               |
//! | [`force_pack`]  | Full pack at the last known container width            |
//!
//! [`pack`]: MasonryPacker::pack
//! [`update`]: MasonryPacker::update
//! [`resize`]: MasonryPacker::resize
//! [`force_pack`]: PackingEngine::force_pack

use std::hash::Hash;

use mgrid_core::geometry::Rect;
use rustc_hash::FxHashMap;

use crate::{GridLayout, GridSizes};

/// Height assumed for cards that have not reported a measurement yet.
pub const DEFAULT_ESTIMATED_HEIGHT: u32 = 120;

/// The handle the repack scheduler drives.
pub trait PackingEngine {
    /// Recompute every card position from current measurements.
    fn force_pack(&mut self);
}

#[derive(Debug, Clone)]
struct Slot<K> {
    id: K,
    height: u32,
    measured: bool,
    rect: Option<Rect>,
}

/// Masonry packer keyed by card id.
#[derive(Debug, Clone)]
pub struct MasonryPacker<K> {
    sizes: GridSizes,
    container_width: u32,
    layout: GridLayout,
    estimated_height: u32,
    slots: Vec<Slot<K>>,
    index: FxHashMap<K, usize>,
    /// Bottom edge of each column including the trailing gutter.
    column_bottoms: Vec<u32>,
    /// Number of leading slots that hold a position from the last pack.
    packed_len: usize,
    pack_count: u64,
}

impl<K: Eq + Hash + Clone> MasonryPacker<K> {
    /// Create a packer for a sizing table and initial container width.
    #[must_use]
    pub fn new(sizes: GridSizes, container_width: u32) -> Self {
        let layout = sizes.layout_for(container_width);
        Self {
            sizes,
            container_width,
            layout,
            estimated_height: DEFAULT_ESTIMATED_HEIGHT,
            slots: Vec::new(),
            index: FxHashMap::default(),
            column_bottoms: vec![0; layout.columns as usize],
            packed_len: 0,
            pack_count: 0,
        }
    }

    /// Set the height used for cards without a measurement.
    #[must_use]
    pub fn with_estimated_height(mut self, height: u32) -> Self {
        self.estimated_height = height;
        self
    }

    /// The sizing table this packer was built with.
    #[inline]
    pub fn sizes(&self) -> &GridSizes {
        &self.sizes
    }

    /// Container width of the last pack.
    #[inline]
    pub fn container_width(&self) -> u32 {
        self.container_width
    }

    /// Column configuration of the last pack.
    #[inline]
    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    #[inline]
    pub fn columns(&self) -> u32 {
        self.layout.columns
    }

    /// Whether a card id is known to the packer.
    #[inline]
    pub fn contains(&self, id: &K) -> bool {
        self.index.contains_key(id)
    }

    /// Number of cards known to the packer.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the packer holds no cards.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of full or incremental packs performed.
    #[inline]
    pub fn pack_count(&self) -> u64 {
        self.pack_count
    }

    /// Whether some cards have no position yet.
    #[inline]
    pub fn has_unpacked(&self) -> bool {
        self.packed_len < self.slots.len()
    }

    /// Align the packer with the visible card order.
    ///
    /// Heights of cards that stay are kept. If the new order only appends
    /// to the old one, existing positions stay valid and [`update`] can
    /// place the tail; any other change invalidates every position.
    ///
    /// Returns `true` if the sequence changed.
    ///
    /// [`update`]: MasonryPacker::update
    pub fn sync_items<I>(&mut self, ids: I) -> bool
    where
        I: IntoIterator<Item = K>,
    {
        let mut old: FxHashMap<K, Slot<K>> = self
            .slots
            .drain(..)
            .map(|slot| (slot.id.clone(), slot))
            .collect();
        let old_order: Vec<K> = {
            let mut pairs: Vec<(usize, K)> = self
                .index
                .drain()
                .map(|(id, idx)| (idx, id))
                .collect();
            pairs.sort_unstable_by_key(|(idx, _)| *idx);
            pairs.into_iter().map(|(_, id)| id).collect()
        };

        for id in ids {
            if self.index.contains_key(&id) {
                continue;
            }
            let slot = old.remove(&id).unwrap_or_else(|| Slot {
                id: id.clone(),
                height: self.estimated_height,
                measured: false,
                rect: None,
            });
            self.index.insert(id, self.slots.len());
            self.slots.push(slot);
        }

        let prefix_kept = old_order.len() <= self.slots.len()
            && old_order
                .iter()
                .zip(self.slots.iter())
                .all(|(old_id, slot)| *old_id == slot.id);
        let changed = !(prefix_kept && old_order.len() == self.slots.len());

        if !prefix_kept {
            self.invalidate();
        } else {
            self.packed_len = self.packed_len.min(self.slots.len());
        }

        mgrid_core::trace!(
            cards = self.slots.len(),
            prefix_kept,
            changed,
            "masonry items synced"
        );
        changed
    }

    /// Record a measured card height.
    ///
    /// Returns `true` if the height changed. Unknown ids are ignored.
    pub fn set_height(&mut self, id: &K, height: u32) -> bool {
        let Some(&idx) = self.index.get(id) else {
            return false;
        };
        let slot = &mut self.slots[idx];
        let changed = slot.height != height || !slot.measured;
        slot.height = height;
        slot.measured = true;
        changed
    }

    /// Reposition every card for a container width.
    pub fn pack(&mut self, container_width: u32) {
        self.container_width = container_width;
        self.layout = self.sizes.layout_for(container_width);
        self.invalidate();
        let placed = self.place_tail();
        mgrid_core::debug!(
            container_width,
            columns = self.layout.columns,
            column_width = self.layout.column_width,
            placed,
            "masonry pack"
        );
    }

    /// Place cards appended since the last pack.
    ///
    /// Returns the number of cards placed.
    pub fn update(&mut self) -> usize {
        if !self.has_unpacked() {
            return 0;
        }
        let placed = self.place_tail();
        mgrid_core::trace!(placed, "masonry update");
        placed
    }

    /// Repack if the column count or column width changes at the new width.
    ///
    /// Positions always agree with [`layout`](Self::layout) afterwards.
    /// Returns `true` if a full pack ran.
    pub fn resize(&mut self, container_width: u32) -> bool {
        let next = self.sizes.layout_for(container_width);
        if next == self.layout && self.packed_len > 0 {
            self.container_width = container_width;
            return false;
        }
        self.pack(container_width);
        true
    }

    /// Position of a card from the last pack.
    pub fn position(&self, id: &K) -> Option<Rect> {
        self.index.get(id).and_then(|&idx| self.slots[idx].rect)
    }

    /// Positions of every placed card, in card order.
    pub fn positions(&self) -> impl Iterator<Item = (&K, Rect)> {
        self.slots
            .iter()
            .filter_map(|slot| slot.rect.map(|rect| (&slot.id, rect)))
    }

    /// Height of the packed content (tallest column, no trailing gutter).
    pub fn content_height(&self) -> u32 {
        let tallest = self.column_bottoms.iter().copied().max().unwrap_or(0);
        if tallest == 0 {
            0
        } else {
            tallest.saturating_sub(self.layout.gutter)
        }
    }

    fn invalidate(&mut self) {
        self.packed_len = 0;
        self.column_bottoms.clear();
        self.column_bottoms
            .resize(self.layout.columns.max(1) as usize, 0);
        for slot in &mut self.slots {
            slot.rect = None;
        }
    }

    fn place_tail(&mut self) -> usize {
        let stride = self.layout.column_width.saturating_add(self.layout.gutter);
        let start = self.packed_len;
        for slot in &mut self.slots[start..] {
            let column = shortest_column(&self.column_bottoms);
            let top = self.column_bottoms[column];
            let x = stride.saturating_mul(column as u32);
            slot.rect = Some(Rect::new(x, top, self.layout.column_width, slot.height));
            self.column_bottoms[column] = top
                .saturating_add(slot.height)
                .saturating_add(self.layout.gutter);
        }
        self.packed_len = self.slots.len();
        self.pack_count += 1;
        self.slots.len() - start
    }
}

impl<K: Eq + Hash + Clone> PackingEngine for MasonryPacker<K> {
    fn force_pack(&mut self) {
        self.pack(self.container_width);
    }
}

fn shortest_column(bottoms: &[u32]) -> usize {
    let mut index = 0;
    let mut best = bottoms.first().copied().unwrap_or(0);
    for (i, bottom) in bottoms.iter().enumerate().skip(1) {
        if *bottom < best {
            best = *bottom;
            index = i;
        }
    }
    index
}
