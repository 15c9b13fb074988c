//! Trace driver - output only.
//!
//! Every value the application sends is logged at info level and kept in
//! an in-memory history. It never offers input.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::DriverError;
use crate::types::{Capabilities, Value};
use super::Driver;

#[derive(Clone, Debug, Default)]
pub struct TraceDriver {
    history: Rc<RefCell<Vec<Value>>>,
}

impl TraceDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values received so far, oldest first.
    pub fn history(&self) -> Vec<Value> {
        self.history.borrow().clone()
    }

    pub fn last(&self) -> Option<Value> {
        self.history.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.history.borrow_mut().clear();
    }
}

impl Driver for TraceDriver {
    fn capabilities(&self) -> Capabilities {
        Capabilities::OUTPUT
    }

    fn output(&self, value: Value) -> Result<(), DriverError> {
        tracing::info!(target: "spark_cycle::trace", value = ?value, "output");
        self.history.borrow_mut().push(value);
        Ok(())
    }
}
