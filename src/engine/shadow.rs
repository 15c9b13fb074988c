//! Shadow nodes - the mutable side of reconciliation.
//!
//! A [`ShadowNode`] pairs the last description applied to a resource with
//! the resource itself and the shadows of its children. It is created once
//! and patched in place every cycle; `children.len()` always equals the
//! number of children in `description`.

use crate::host::Host;
use crate::primitives::Node;
use crate::types::ResourceId;
use super::events::EventDispatcher;

/// Reconciliation record for one live resource.
pub struct ShadowNode {
    pub(crate) description: Node,
    pub(crate) resource: ResourceId,
    pub(crate) children: Vec<ShadowNode>,
    pub(crate) dispatcher: Option<EventDispatcher>,
}

impl ShadowNode {
    pub(crate) fn new(description: Node, resource: ResourceId) -> Self {
        Self {
            description,
            resource,
            children: Vec::new(),
            dispatcher: None,
        }
    }

    /// Adopt a resource that already exists in the host.
    ///
    /// The seed description is read from the resource's declared attributes.
    /// Nothing is created.
    pub fn adopt(host: &dyn Host, resource: ResourceId) -> Self {
        Self::new(Node::from_host(host, resource), resource)
    }

    /// Last applied description.
    pub fn description(&self) -> &Node {
        &self.description
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn children(&self) -> &[ShadowNode] {
        &self.children
    }

    /// Event table, present once any event was bound.
    pub fn dispatcher(&self) -> Option<&EventDispatcher> {
        self.dispatcher.as_ref()
    }
}

impl std::fmt::Debug for ShadowNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowNode")
            .field("kind", self.description.kind())
            .field("resource", &self.resource)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
