//! # spark-cycle
//!
//! Driver-based application runtime for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! view driver's event slot.
//!
//! ## Architecture
//!
//! An application is a pure function from driver inputs to driver outputs.
//! The [`Runtime`] gathers every driver's `input`, calls the application, and
//! hands each named output to its driver. Effects happen only there.
//!
//! The view driver turns its output, an immutable [`Node`] tree, into minimal
//! edits on a mutable [`Host`] graph:
//! ```text
//! App → Node tree → Reconciler::patch → Host ops → native event → Runtime::run
//! ```
//!
//! Unchanged subtrees are skipped by reference identity. Reuse the same
//! `Node` (or `Rc` group / child list) across cycles to make that apply.
//!
//! ## Modules
//!
//! - [`types`] - Core values (Value, PropValue, App, HostEvent, Capabilities)
//! - [`primitives`] - Description nodes and tagged attributes
//! - [`host`] - Resource graph boundary and an in-memory host
//! - [`engine`] - Reconciliation: create, patch, defaults, event dispatch
//! - [`drivers`] - Driver trait, view/store/trace drivers
//! - [`pipeline`] - Runtime, configuration, mount

pub mod drivers;
pub mod engine;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod primitives;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{ConfigError, DriverError, RuntimeError};

pub use drivers::{Driver, Drivers, MountPoint, StoreDriver, TraceDriver, ViewDriver};

pub use engine::{DefaultValueCache, EventDispatcher, EventSink, Reconciler, ShadowNode};

pub use host::{Host, HostOp, Listener, MemoryHost};

pub use pipeline::{
    mount, CycleReport, Mode, MountHandle, Runtime, RuntimeConfig, WeakRuntime, VIEW_DRIVER,
};

pub use primitives::{
    Attr, AttrKey, Attributes, ElementBuilder, Group, GroupKind, Kind, Node, EVENT_SIGIL, TEXT_DATA,
};
