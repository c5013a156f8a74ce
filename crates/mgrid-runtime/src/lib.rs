#![forbid(unsafe_code)]

//! Event-driven runtime for mgrid masonry grids.
//!
//! The runtime turns host events (container resizes, font loads, card
//! measurements, scrolling, item updates) into a packed layout. Everything is
//! single-threaded and clock-free: each event carries `now`, and hosts drive
//! timers by calling [`GridContainer::tick_at`] once
//! [`GridContainer::next_deadline`] has passed.
//!
//! | Module       | Role                                                  |
//! |--------------|-------------------------------------------------------|
//! | [`viewport`] | Width history and oscillation damping                 |
//! | [`debounce`] | Trailing-edge debouncer                               |
//! | [`repack`]   | Coalesced `force_pack` scheduling                     |
//! | [`reveal`]   | Incremental reveal of long lists                      |
//! | [`fonts`]    | Font-load waits bounded by a timeout                  |
//! | [`grid`]     | The container wiring it all together                  |
//! | [`config`]   | Tunables, environment and TOML loading                |

pub mod config;
pub mod debounce;
pub mod fonts;
pub mod grid;
pub mod repack;
pub mod reveal;
pub mod viewport;

pub use config::{ConfigError, GridConfig};
pub use debounce::{DebounceStats, Debouncer, Fired};
pub use fonts::{FontLoadTracker, FontOutcome};
pub use grid::{
    GridCard, GridContainer, GridFrame, GridItem, GridStats, LayoutGeneration, Lifecycle,
    TickReport,
};
pub use repack::{RepackOutcome, RepackScheduler, RepackStats, RepackTrigger, RepackTriggers};
pub use reveal::{RenderWindow, RevealController, RevealState};
pub use viewport::{Oscillation, ViewportChange, ViewportTracker};
