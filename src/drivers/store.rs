//! Store driver - one value carried from cycle to cycle.
//!
//! `input` yields the last stored value, `output` replaces it. Handles are
//! cheap clones sharing the same cell, so a test or an embedding program can
//! keep one and inspect the state the application settled on.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::DriverError;
use crate::types::Value;
use super::Driver;

#[derive(Clone, Debug, Default)]
pub struct StoreDriver {
    value: Rc<RefCell<Value>>,
}

impl StoreDriver {
    pub fn new(initial: impl Into<Value>) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial.into())),
        }
    }

    /// Current value.
    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.value.borrow_mut() = value.into();
    }
}

impl Driver for StoreDriver {
    fn input(&self) -> Value {
        self.get()
    }

    fn output(&self, value: Value) -> Result<(), DriverError> {
        tracing::trace!(value = value.type_name(), "store updated");
        *self.value.borrow_mut() = value;
        Ok(())
    }
}
