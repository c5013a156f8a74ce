#![forbid(unsafe_code)]

//! Grid configuration.
//!
//! [`GridConfig`] collects every tunable the container uses. Defaults match
//! the stock alert-group grid; hosts can override them from the environment
//! ([`GridConfig::from_env`]), from a TOML document with the `policy-config`
//! feature, or in code with the `with_*` builders.
//!
//! # Environment Variables
//!
//! | Variable                    | Field                              |
//! |-----------------------------|------------------------------------|
//! | `MGRID_GROUP_WIDTH`         | `group_width_px`                   |
//! | `MGRID_GUTTER`              | `gutter_px`                        |
//! | `MGRID_INITIAL_REVEAL`      | `initial_reveal`                   |
//! | `MGRID_REVEAL_STEP`         | `reveal_step`                      |
//! | `MGRID_SCROLL_THRESHOLD`    | `scroll_threshold_px`              |
//! | `MGRID_RESIZE_DEBOUNCE_MS`  | `resize_debounce_ms`               |
//! | `MGRID_REPACK_DEBOUNCE_MS`  | `repack_debounce_ms`               |
//! | `MGRID_FONT_TIMEOUT_MS`     | `font_timeout_ms`                  |
//! | `MGRID_FONT_WEIGHTS`        | `font_weights` (comma separated)   |
//! | `MGRID_ESTIMATED_HEIGHT`    | `estimated_item_height_px`         |
//! | `MGRID_RESET_REVEAL`        | `reset_reveal_on_identity_change`  |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::fonts::{DEFAULT_FONT_TIMEOUT, DEFAULT_FONT_WEIGHTS};
use crate::reveal::{INITIAL_REVEAL, REVEAL_STEP, SCROLL_THRESHOLD_PX};

/// Default configured card width in pixels.
pub const DEFAULT_GROUP_WIDTH: u32 = 420;

/// Default resize quiet window in milliseconds.
pub const DEFAULT_RESIZE_DEBOUNCE_MS: u64 = 100;

/// Default repack quiet window in milliseconds.
pub const DEFAULT_REPACK_DEBOUNCE_MS: u64 = 10;

/// Errors produced while building a [`GridConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unparsable value.
    InvalidEnv { var: &'static str, value: String },
    /// A field failed validation.
    Invalid { field: &'static str, reason: String },
    /// A TOML document could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnv { var, value } => {
                write!(f, "invalid value {value:?} for {var}")
            }
            Self::Invalid { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(feature = "policy-config")]
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Tunables for a grid container.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Configured card width; also the per-column breakpoint step.
    pub group_width_px: u32,
    /// Gap between columns and between stacked cards.
    pub gutter_px: u32,
    pub initial_reveal: usize,
    pub reveal_step: usize,
    pub scroll_threshold_px: u32,
    pub resize_debounce_ms: u64,
    pub repack_debounce_ms: u64,
    pub font_timeout_ms: u64,
    /// Font weights watched on mount.
    pub font_weights: Vec<u16>,
    /// Height used for cards that have not been measured yet.
    pub estimated_item_height_px: u32,
    /// Reset the reveal window when the item set is replaced.
    pub reset_reveal_on_identity_change: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            group_width_px: DEFAULT_GROUP_WIDTH,
            gutter_px: 0,
            initial_reveal: INITIAL_REVEAL,
            reveal_step: REVEAL_STEP,
            scroll_threshold_px: SCROLL_THRESHOLD_PX,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            repack_debounce_ms: DEFAULT_REPACK_DEBOUNCE_MS,
            font_timeout_ms: DEFAULT_FONT_TIMEOUT.as_millis() as u64,
            font_weights: DEFAULT_FONT_WEIGHTS.to_vec(),
            estimated_item_height_px: mgrid_layout::packing::DEFAULT_ESTIMATED_HEIGHT,
            reset_reveal_on_identity_change: true,
        }
    }
}

impl GridConfig {
    #[must_use]
    pub fn with_group_width(mut self, px: u32) -> Self {
        self.group_width_px = px;
        self
    }

    #[must_use]
    pub fn with_gutter(mut self, px: u32) -> Self {
        self.gutter_px = px;
        self
    }

    #[must_use]
    pub fn with_reveal(mut self, initial: usize, step: usize) -> Self {
        self.initial_reveal = initial;
        self.reveal_step = step;
        self
    }

    #[must_use]
    pub fn with_font_weights(mut self, weights: impl IntoIterator<Item = u16>) -> Self {
        self.font_weights = weights.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_reset_reveal_on_identity_change(mut self, reset: bool) -> Self {
        self.reset_reveal_on_identity_change = reset;
        self
    }

    #[inline]
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    #[inline]
    pub fn repack_debounce(&self) -> Duration {
        Duration::from_millis(self.repack_debounce_ms)
    }

    #[inline]
    pub fn font_timeout(&self) -> Duration {
        Duration::from_millis(self.font_timeout_ms)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reveal_step == 0 {
            return Err(ConfigError::Invalid {
                field: "reveal_step",
                reason: "must be at least 1".into(),
            });
        }
        if self.gutter_px >= self.group_width_px && self.group_width_px > 0 {
            return Err(ConfigError::Invalid {
                field: "gutter_px",
                reason: format!(
                    "{} must be smaller than group_width_px {}",
                    self.gutter_px, self.group_width_px
                ),
            });
        }
        for (i, w) in self.font_weights.iter().enumerate() {
            if !(1..=1000).contains(w) {
                return Err(ConfigError::Invalid {
                    field: "font_weights",
                    reason: format!("weight {w} outside 1..=1000"),
                });
            }
            if self.font_weights[..i].contains(w) {
                return Err(ConfigError::Invalid {
                    field: "font_weights",
                    reason: format!("weight {w} listed twice"),
                });
            }
        }
        Ok(())
    }

    /// Defaults overridden by `MGRID_*` environment variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from a variable lookup, then validate.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };
        env.read("MGRID_GROUP_WIDTH", &mut self.group_width_px)?;
        env.read("MGRID_GUTTER", &mut self.gutter_px)?;
        env.read("MGRID_INITIAL_REVEAL", &mut self.initial_reveal)?;
        env.read("MGRID_REVEAL_STEP", &mut self.reveal_step)?;
        env.read("MGRID_SCROLL_THRESHOLD", &mut self.scroll_threshold_px)?;
        env.read("MGRID_RESIZE_DEBOUNCE_MS", &mut self.resize_debounce_ms)?;
        env.read("MGRID_REPACK_DEBOUNCE_MS", &mut self.repack_debounce_ms)?;
        env.read("MGRID_FONT_TIMEOUT_MS", &mut self.font_timeout_ms)?;
        env.read("MGRID_ESTIMATED_HEIGHT", &mut self.estimated_item_height_px)?;
        env.read_bool("MGRID_RESET_REVEAL", &mut self.reset_reveal_on_identity_change)?;
        env.read_list("MGRID_FONT_WEIGHTS", &mut self.font_weights)?;
        self.validate()?;
        Ok(self)
    }

    /// Parse a TOML document. Missing keys take their defaults.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn raw(&self, var: &'static str) -> Option<String> {
        (self.lookup)(var)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    fn read<T: FromStr>(&self, var: &'static str, slot: &mut T) -> Result<(), ConfigError> {
        let Some(value) = self.raw(var) else {
            return Ok(());
        };
        *slot = value
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { var, value })?;
        Ok(())
    }

    fn read_bool(&self, var: &'static str, slot: &mut bool) -> Result<(), ConfigError> {
        let Some(value) = self.raw(var) else {
            return Ok(());
        };
        *slot = match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => return Err(ConfigError::InvalidEnv { var, value }),
        };
        Ok(())
    }

    fn read_list<T: FromStr>(&self, var: &'static str, slot: &mut Vec<T>) -> Result<(), ConfigError> {
        let Some(value) = self.raw(var) else {
            return Ok(());
        };
        let parsed: Result<Vec<T>, _> = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect();
        *slot = parsed.map_err(|_| ConfigError::InvalidEnv { var, value })?;
        Ok(())
    }
}
