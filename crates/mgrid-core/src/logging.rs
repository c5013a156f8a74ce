#![forbid(unsafe_code)]

//! Logging shim for the layout crates.
//!
//! Sizing and packing code logs through `mgrid_core::debug!` and
//! `mgrid_core::trace!`. With the `tracing` feature these are the `tracing`
//! macros; without it they expand to nothing and `tracing` is not linked.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace};

/// Whether layout events can reach a subscriber.
pub const ENABLED: bool = cfg!(feature = "tracing");

#[cfg(not(feature = "tracing"))]
mod noop {
    /// Discards a `debug!` event.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards a `trace!` event.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
}
