//! Event dispatch - one native listener per event type per resource.
//!
//! A resource with event bindings gets an [`EventDispatcher`]: a table from
//! event type to the application currently bound. The native listener
//! installed on the host looks the application up when the event fires, so
//! rebinding only swaps the table entry and never touches the host.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::host::Listener;
use crate::types::{App, HostEvent};

/// Called by a fired listener with the event and the bound application.
///
/// The view driver supplies this; it records the event and runs one
/// dispatch cycle.
pub type EventSink = Rc<dyn Fn(&HostEvent, &App)>;

/// Per-resource table of bound applications.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    bindings: Rc<RefCell<HashMap<String, App>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `app` to `event`.
    ///
    /// Returns true if the event type was not bound before, meaning the
    /// caller still has to install the native listener.
    pub fn bind(&self, event: &str, app: App) -> bool {
        self.bindings
            .borrow_mut()
            .insert(event.to_string(), app)
            .is_none()
    }

    pub fn unbind(&self, event: &str) -> Option<App> {
        self.bindings.borrow_mut().remove(event)
    }

    /// Application currently bound to `event`.
    pub fn handler(&self, event: &str) -> Option<App> {
        self.bindings.borrow().get(event).cloned()
    }

    /// Bound event types, sorted.
    pub fn events(&self) -> Vec<String> {
        let mut events: Vec<String> = self.bindings.borrow().keys().cloned().collect();
        events.sort();
        events
    }

    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }

    /// Native listener for this dispatcher.
    ///
    /// Holds the table weakly: once the owning record is dropped, the
    /// listener does nothing.
    pub fn listener(&self, sink: EventSink) -> Listener {
        let bindings = Rc::downgrade(&self.bindings);
        Rc::new(move |event: &HostEvent| {
            let Some(bindings) = bindings.upgrade() else {
                return;
            };
            let app = bindings.borrow().get(&event.kind).cloned();
            match app {
                Some(app) => sink(event, &app),
                None => tracing::trace!(event = %event.kind, target = %event.target, "no binding for fired event"),
            }
        })
    }
}
