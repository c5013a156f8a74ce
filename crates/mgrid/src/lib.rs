#![forbid(unsafe_code)]

//! mgrid public facade crate.
//!
//! Re-exports the sizing, packing and runtime types a host needs to drive an
//! adaptive masonry grid, plus a prelude and a crate-wide error type.
//!
//! ```ignore
//! use mgrid::prelude::*;
//!
//! let mut grid: GridContainer<MyCard> = GridContainer::try_new(load_config()?, 1280)?;
//! grid.set_items(cards, now);
//! grid.mount_at(1280, now);
//! ```

use std::fmt;

// --- Layout re-exports -----------------------------------------------------

pub use mgrid_layout::{
    Breakpoint, GridLayout, GridSizes, MasonryPacker, PackingEngine, Rect, column_width,
    compute_layout, grid_sizes,
};

// --- Runtime re-exports ----------------------------------------------------

pub use mgrid_runtime::{
    ConfigError, GridCard, GridConfig, GridContainer, GridFrame, GridItem, GridStats,
    LayoutGeneration, Lifecycle, RenderWindow, RepackOutcome, RepackTrigger, RevealController,
    RevealState, TickReport, ViewportChange, ViewportTracker,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for mgrid hosts.
#[derive(Debug)]
pub enum Error {
    /// I/O failure while reading a config file.
    Io(std::io::Error),
    /// Invalid configuration.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for mgrid APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Default config with `MGRID_*` environment overrides applied.
pub fn load_config() -> Result<GridConfig> {
    Ok(GridConfig::from_env()?)
}

/// Read a TOML config file, then apply `MGRID_*` environment overrides.
#[cfg(feature = "policy-config")]
pub fn load_config_file(path: impl AsRef<std::path::Path>) -> Result<GridConfig> {
    let source = std::fs::read_to_string(path)?;
    let config = GridConfig::from_toml_str(&source)?;
    Ok(config.with_overrides(|var| std::env::var(var).ok())?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, GridConfig, GridContainer, GridFrame, GridItem, GridLayout, GridSizes,
        PackingEngine, Rect, Result, TickReport, load_config,
    };

    pub use crate::{core, layout, runtime};
}

pub use mgrid_core as core;
pub use mgrid_layout as layout;
pub use mgrid_runtime as runtime;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn config_errors_convert_and_chain() {
        let err: Error = ConfigError::Parse("bad".into()).into();
        assert_eq!(err.to_string(), "config parse error: bad");
        assert!(err.source().is_some());
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
