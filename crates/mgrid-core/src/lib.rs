#![forbid(unsafe_code)]

//! Core: pixel geometry and the logging shim shared by the grid crates.

pub mod geometry;
pub mod logging;

#[cfg(feature = "tracing")]
pub use logging::{debug, trace};
