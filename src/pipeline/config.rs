//! Runtime configuration.
//!
//! # Modes
//!
//! - **Strict** - validate driver registration, check capabilities, report
//!   unknown sinks. Default in debug builds.
//! - **Relaxed** - skip the checks; mismatches are dropped silently. Default
//!   in release builds.
//!
//! # Environment
//!
//! - `SPARK_CYCLE_MODE` - `strict` or `relaxed`
//! - `SPARK_CYCLE_MAX_DEPTH` - maximum nesting of re-entrant cycles

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

pub const ENV_MODE: &str = "SPARK_CYCLE_MODE";
pub const ENV_MAX_DEPTH: &str = "SPARK_CYCLE_MAX_DEPTH";

/// Default maximum depth of nested `run` calls.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How much checking the dispatch loop does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Strict,
    Relaxed,
}

impl Mode {
    pub fn is_strict(self) -> bool {
        self == Mode::Strict
    }
}

impl Default for Mode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Mode::Strict
        } else {
            Mode::Relaxed
        }
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "dev" | "development" => Ok(Mode::Strict),
            "relaxed" | "prod" | "production" => Ok(Mode::Relaxed),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Strict => f.write_str("strict"),
            Mode::Relaxed => f.write_str("relaxed"),
        }
    }
}

/// Configuration of one [`Runtime`](super::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub mode: Mode,
    /// Nested `run` calls beyond this depth are refused before they start.
    pub max_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl RuntimeConfig {
    pub fn strict() -> Self {
        Self {
            mode: Mode::Strict,
            ..Self::default()
        }
    }

    pub fn relaxed() -> Self {
        Self {
            mode: Mode::Relaxed,
            ..Self::default()
        }
    }

    /// Zero is raised to one; the top-level cycle always runs.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Defaults overridden by `SPARK_CYCLE_MODE` and `SPARK_CYCLE_MAX_DEPTH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = env::var(ENV_MODE).ok();
        let depth = env::var(ENV_MAX_DEPTH).ok();
        Self::from_env_values(mode.as_deref(), depth.as_deref())
    }

    fn from_env_values(mode: Option<&str>, depth: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(mode) = mode.filter(|m| !m.trim().is_empty()) {
            config.mode = mode.parse()?;
        }
        if let Some(depth) = depth.filter(|d| !d.trim().is_empty()) {
            config.max_depth = match depth.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidDepth(depth.to_string())),
            };
        }
        Ok(config)
    }
}
