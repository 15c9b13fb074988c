//! Error types.
//!
//! The reconciliation engine has no error paths; descriptions are assumed
//! well formed. Everything here is raised at the driver boundary.

use thiserror::Error;

/// Problems detected by the driver registry and the dispatch loop.
///
/// These are reported through the runtime's diagnostics, never returned
/// from the middle of a cycle.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error("driver name must not be empty")]
    EmptyDriverName,

    #[error("driver '{name}' registered more than once")]
    DuplicateDriver { name: String },

    #[error("driver '{driver}' has no {capability} capability")]
    MissingCapability {
        driver: String,
        capability: &'static str,
    },

    #[error("application produced output for unregistered driver '{name}'")]
    UnknownSink { name: String },

    #[error("driver '{driver}' failed to apply output: {source}")]
    Driver {
        driver: String,
        #[source]
        source: DriverError,
    },

    #[error("nested dispatch refused at depth {depth}")]
    ReentryLimit { depth: usize },

    #[error("no resource found for mount key '{key}'")]
    UnresolvedRoot { key: String },
}

/// Failures raised by a driver's `output`.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    #[error("expected {expected} value, got {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },

    #[error("output arrived while the previous one was still being applied")]
    Busy,

    /// The adopted root has no parent, so it cannot be swapped for a
    /// resource of another kind.
    #[error("root is a '{expected}' and cannot be replaced by a '{found}'")]
    RootKindMismatch { expected: String, found: String },
}

/// Invalid runtime configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid mode '{0}' (expected 'strict' or 'relaxed')")]
    InvalidMode(String),

    #[error("invalid max depth '{0}' (expected a positive integer)")]
    InvalidDepth(String),
}
