//! Dispatch Pipeline
//!
//! This module implements the loop that connects a pure application to its
//! drivers.
//!
//! # Pipeline Architecture
//!
//! ```text
//! drivers.input() → Sources → App → Sinks → drivers.output()
//!                                              │
//!                               view: patch → Host → event → run (nested)
//! ```
//!
//! ## Key Design Principles
//!
//! - **Pure application**: only drivers perform effects
//! - **Explicit context**: registry, diagnostics and depth live in a [`Runtime`],
//!   not in globals, so independent instances never interfere
//! - **Call stack, not queue**: an event runs a nested cycle to completion

pub mod config;
pub mod mount;
pub mod runtime;

// Re-exports
pub use config::{Mode, RuntimeConfig, DEFAULT_MAX_DEPTH};
pub use mount::{mount, MountHandle, VIEW_DRIVER};
pub use runtime::{CycleReport, Runtime, WeakRuntime};
