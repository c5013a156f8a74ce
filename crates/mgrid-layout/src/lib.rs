#![forbid(unsafe_code)]

//! Grid sizing and masonry packing.
//!
//! This crate provides the layout half of the alert-group grid:
//!
//! - [`GridSizes`] - the breakpoint table handed to the packing engine
//! - [`GridLayout`] - the column count and width matching one viewport width
//! - [`compute_layout`], [`grid_sizes`], [`column_width`] - the pure sizing
//!   functions the runtime recomputes on every read
//! - [`packing`] - the shortest-column masonry packer
//!
//! # Sizing Rule
//!
//! For a group width `g > 0` the table holds one breakpoint per column count
//! `k` in `1..=MAX_COLUMNS`. Breakpoint `k` starts at `g * k` pixels (the
//! first one at 0). A viewport width matches the last breakpoint whose
//! threshold it reaches, and each column gets
//! `floor((width - gutter * (k - 1)) / k)` pixels.
//!
//! ```
//! use mgrid_layout::{compute_layout, grid_sizes};
//!
//! let layout = compute_layout(1300, 420);
//! assert_eq!(layout.columns, 3);
//! assert_eq!(layout.column_width, 433);
//!
//! // The scalar agrees with the full descriptor.
//! assert_eq!(grid_sizes(420).column_width_for(1300), layout.column_width);
//! ```
//!
//! # Invariants
//!
//! 1. Every table has a breakpoint at width 0 with one column.
//! 2. Thresholds are strictly increasing, so matching is unambiguous.
//! 3. [`column_width`] always equals the width implied by the matching
//!    breakpoint of [`grid_sizes`] for the same inputs.
//!
//! # Failure Modes
//!
//! None. Non-positive group widths produce a single full-width column and
//! non-positive viewport widths produce a single zero-width column.

pub mod packing;

pub use mgrid_core::geometry::Rect;
pub use packing::{MasonryPacker, PackingEngine};

use mgrid_core::geometry::clamp_px;
use serde::Serialize;

/// Upper bound on the number of breakpoints in a sizing table.
///
/// Keeps tables bounded for tiny group widths; with the default 420 px
/// group width this covers viewports far beyond 8K.
pub const MAX_COLUMNS: u32 = 64;

/// One row of the sizing table: from `min_width` upwards, use `columns`
/// columns separated by `gutter` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Breakpoint {
    /// Minimum viewport width (inclusive) for this breakpoint.
    pub min_width: u32,
    /// Column count.
    pub columns: u32,
    /// Horizontal and vertical gap between cards.
    pub gutter: u32,
}

impl Breakpoint {
    /// CSS media query for this breakpoint, `None` for the base entry.
    #[must_use]
    pub fn media_query(&self) -> Option<String> {
        (self.min_width > 0).then(|| format!("(min-width: {}px)", self.min_width))
    }

    /// Column width implied by this breakpoint for a viewport width.
    #[inline]
    #[must_use]
    pub const fn column_width(&self, viewport_width: u32) -> u32 {
        let columns = if self.columns == 0 { 1 } else { self.columns };
        let gaps = self.gutter.saturating_mul(columns - 1);
        viewport_width.saturating_sub(gaps) / columns
    }
}

/// Breakpoint table read by the packing engine at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridSizes {
    group_width: u32,
    breakpoints: Vec<Breakpoint>,
}

impl GridSizes {
    /// Build the table for a group width with no gutter.
    ///
    /// Non-positive group widths yield a single one-column breakpoint.
    #[must_use]
    pub fn new(group_width: i64) -> Self {
        Self::with_gutter(group_width, 0)
    }

    /// Build the table for a group width and gutter.
    #[must_use]
    pub fn with_gutter(group_width: i64, gutter: u32) -> Self {
        let group_width = clamp_px(group_width);
        let mut breakpoints = vec![Breakpoint {
            min_width: 0,
            columns: 1,
            gutter,
        }];

        if group_width > 0 {
            for columns in 2..=MAX_COLUMNS {
                let Some(min_width) = group_width.checked_mul(columns) else {
                    break;
                };
                breakpoints.push(Breakpoint {
                    min_width,
                    columns,
                    gutter,
                });
            }
        }

        Self {
            group_width,
            breakpoints,
        }
    }

    /// Group width the table was built for (after clamping).
    #[inline]
    #[must_use]
    pub const fn group_width(&self) -> u32 {
        self.group_width
    }

    /// All breakpoints in ascending threshold order.
    #[inline]
    #[must_use]
    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// The breakpoint matching a viewport width.
    #[must_use]
    pub fn matching(&self, viewport_width: u32) -> Breakpoint {
        // Thresholds are strictly increasing and the first one is 0.
        let idx = self
            .breakpoints
            .partition_point(|bp| bp.min_width <= viewport_width);
        self.breakpoints[idx.saturating_sub(1)]
    }

    /// Column count for a viewport width.
    #[inline]
    #[must_use]
    pub fn columns_for(&self, viewport_width: u32) -> u32 {
        self.matching(viewport_width).columns
    }

    /// Column width for a viewport width.
    #[inline]
    #[must_use]
    pub fn column_width_for(&self, viewport_width: u32) -> u32 {
        self.matching(viewport_width).column_width(viewport_width)
    }

    /// Full layout for a viewport width.
    #[must_use]
    pub fn layout_for(&self, viewport_width: u32) -> GridLayout {
        let bp = self.matching(viewport_width);
        GridLayout {
            columns: bp.columns,
            column_width: bp.column_width(viewport_width),
            gutter: bp.gutter,
        }
    }
}

/// Column configuration for a single viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridLayout {
    /// Column count, always at least 1.
    pub columns: u32,
    /// Width of each column in pixels.
    pub column_width: u32,
    /// Gap between columns.
    pub gutter: u32,
}

/// Compute the layout for a viewport width and group width.
#[must_use]
pub fn compute_layout(viewport_width: i64, group_width: i64) -> GridLayout {
    grid_sizes(group_width).layout_for(clamp_px(viewport_width))
}

/// The breakpoint table for a group width.
#[must_use]
pub fn grid_sizes(group_width: i64) -> GridSizes {
    GridSizes::new(group_width)
}

/// The scalar column width used to style a single card.
#[must_use]
pub fn column_width(viewport_width: i64, group_width: i64) -> u32 {
    compute_layout(viewport_width, group_width).column_width
}
