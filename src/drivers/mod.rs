//! Drivers - named effect boundaries.
//!
//! A driver exposes two capabilities to the dispatch loop: `input`, read
//! at the start of every cycle, and `output`, called with whatever the
//! application returned under the driver's name. All side effects of a
//! cycle happen inside `output`.
//!
//! # Drivers in this crate
//!
//! - [`ViewDriver`] - reconciles description trees against a [`Host`](crate::host::Host)
//! - [`StoreDriver`] - holds one value between cycles
//! - [`TraceDriver`] - output only; records and logs values
//!
//! # Example
//!
//! ```ignore
//! let store = StoreDriver::new(0);
//! let drivers = Drivers::new()
//!     .with("data", store.clone())
//!     .with("trace", TraceDriver::new());
//! runtime.register(drivers)?;
//! ```

mod store;
mod trace;
mod view;

pub use store::StoreDriver;
pub use trace::TraceDriver;
pub use view::{MountPoint, ViewDriver};

use std::rc::Rc;

use crate::error::DriverError;
use crate::types::{Capabilities, Value};

/// Effect boundary driven by the dispatch loop.
///
/// A driver that lacks a capability leaves its flag out of
/// [`capabilities`](Driver::capabilities); the matching method is then
/// never called.
pub trait Driver {
    fn capabilities(&self) -> Capabilities {
        Capabilities::INPUT | Capabilities::OUTPUT
    }

    /// Value offered to the application this cycle.
    fn input(&self) -> Value {
        Value::Null
    }

    /// Apply the application's output.
    fn output(&self, value: Value) -> Result<(), DriverError>;
}

/// Ordered list of named drivers, consumed by
/// [`Runtime::register`](crate::pipeline::Runtime::register).
///
/// Names are not checked here; duplicates and empty names are caught at
/// registration.
#[derive(Clone, Default)]
pub struct Drivers {
    entries: Vec<(String, Rc<dyn Driver>)>,
}

impl Drivers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a driver under `name`.
    pub fn with(mut self, name: impl Into<String>, driver: impl Driver + 'static) -> Self {
        self.entries.push((name.into(), Rc::new(driver)));
        self
    }

    /// Add an already shared driver.
    pub fn with_shared(mut self, name: impl Into<String>, driver: Rc<dyn Driver>) -> Self {
        self.entries.push((name.into(), driver));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl IntoIterator for Drivers {
    type Item = (String, Rc<dyn Driver>);
    type IntoIter = std::vec::IntoIter<(String, Rc<dyn Driver>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
