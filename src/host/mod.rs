//! Host - the external resource graph the view driver reconciles against.
//!
//! The engine only talks to the host through [`Host`]. Every method takes
//! `&self`: a listener fired by the host may synchronously start a new
//! dispatch cycle that patches the same host, so implementations must not
//! hold internal borrows while calling back into a [`Listener`].

mod memory;

pub use memory::{HostOp, MemoryHost};

use std::rc::Rc;

use crate::primitives::GroupKind;
use crate::types::{HostEvent, PropValue, ResourceId};

/// Native listener installed on a resource for one event type.
pub type Listener = Rc<dyn Fn(&HostEvent)>;

/// Mutable resource graph (a rendered UI tree).
pub trait Host {
    /// Create a detached element of the given tag.
    fn create_element(&self, tag: &str) -> ResourceId;

    /// Create a detached text resource.
    fn create_text(&self, data: &str) -> ResourceId;

    fn append_child(&self, parent: ResourceId, child: ResourceId);

    /// Detach `child` from `parent`.
    fn remove_child(&self, parent: ResourceId, child: ResourceId);

    /// Put `new` where `old` currently sits under `parent`, detaching `old`.
    fn replace_child(&self, parent: ResourceId, new: ResourceId, old: ResourceId);

    fn parent(&self, resource: ResourceId) -> Option<ResourceId>;

    /// Tag of an element, `None` for text resources.
    fn tag(&self, resource: ResourceId) -> Option<String>;

    /// Attributes declared on the resource when it was created outside the
    /// engine (markup attributes).
    fn declared_attributes(&self, resource: ResourceId) -> Vec<(String, String)>;

    /// Resolve a lookup key (an element id) to a resource.
    fn resolve(&self, key: &str) -> Option<ResourceId>;

    /// Current value of a generic property. Unset properties read as the
    /// platform default for the resource's kind.
    fn property(&self, resource: ResourceId, name: &str) -> PropValue;

    fn set_property(&self, resource: ResourceId, name: &str, value: &PropValue);

    fn set_group_entry(&self, resource: ResourceId, group: GroupKind, key: &str, value: &str);

    fn remove_group_entry(&self, resource: ResourceId, group: GroupKind, key: &str);

    fn set_class_name(&self, resource: ResourceId, class: &str);

    /// Label association (`for`).
    fn set_html_for(&self, resource: ResourceId, target: &str);

    fn focus(&self, resource: ResourceId);

    fn blur(&self, resource: ResourceId);

    /// Install the native listener for `event` on `resource`.
    fn add_listener(&self, resource: ResourceId, event: &str, listener: Listener);

    fn remove_listener(&self, resource: ResourceId, event: &str);
}
