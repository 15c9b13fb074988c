//! Description nodes - immutable values describing the desired UI.
//!
//! A [`Node`] is produced fresh every cycle and never mutated afterwards.
//! Cloning a node shares it, and the reconciler treats a shared node as
//! unchanged without looking inside.
//!
//! # Memoization contract
//!
//! Producers that want a subtree skipped must hand back the *same* node (or
//! the same group / child list) they returned last cycle. Two nodes that are
//! structurally equal but separately built are always re-diffed. Diffing a
//! node costs O(attributes), never O(tree), because of this.
//!
//! # Example
//!
//! ```ignore
//! use spark_cycle::primitives::Node;
//!
//! let view = Node::element("button")
//!     .on("click", increment)
//!     .style([("color", "red")])
//!     .child(Node::text("0"))
//!     .build();
//! ```

use std::fmt;
use std::rc::Rc;

use crate::host::Host;
use crate::types::{App, PropValue, ResourceId};
use super::types::{Attr, AttrKey, Attributes, Group, GroupKind};

/// Attribute name carrying a text node's payload.
pub const TEXT_DATA: &str = "data";

// =============================================================================
// Kind
// =============================================================================

/// What kind of resource a node materializes into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Text leaf. Carries only a `data` attribute.
    Text,
    /// Element with a tag identifier.
    Element(Rc<str>),
}

impl Kind {
    /// Tag identifier (`"#text"` for text leaves).
    pub fn tag(&self) -> &str {
        match self {
            Kind::Text => "#text",
            Kind::Element(tag) => tag,
        }
    }
}

// =============================================================================
// Node
// =============================================================================

struct NodeData {
    kind: Kind,
    attributes: Attributes,
}

/// Immutable description of one element or text leaf.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

impl Node {
    pub fn new(kind: Kind, attributes: Attributes) -> Self {
        Self(Rc::new(NodeData { kind, attributes }))
    }

    /// Text leaf.
    pub fn text(data: impl Into<Rc<str>>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(Attr::Prop(Rc::from(TEXT_DATA), PropValue::Str(data.into())));
        Self::new(Kind::Text, attributes)
    }

    /// Start building an element.
    pub fn element(tag: impl Into<Rc<str>>) -> ElementBuilder {
        ElementBuilder {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Seed description for a resource that already exists in the host.
    ///
    /// Only declared scalar attributes are picked up; existing children are
    /// left out of the description.
    pub fn from_host(host: &dyn Host, resource: ResourceId) -> Self {
        let Some(tag) = host.tag(resource) else {
            return Node::text(host.property(resource, TEXT_DATA).to_string());
        };

        let mut attributes = Attributes::new();
        for (key, value) in host.declared_attributes(resource) {
            match Attr::from_scalar(&key, PropValue::from(value)) {
                Some(attr) => {
                    attributes.insert(attr);
                }
                None => tracing::trace!(%resource, key = %key, "skipping structured attribute on adopted root"),
            }
        }
        Self::new(Kind::Element(Rc::from(tag)), attributes)
    }

    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.0.attributes
    }

    pub fn is_text(&self) -> bool {
        self.0.kind == Kind::Text
    }

    /// Payload of a text leaf.
    pub fn text_data(&self) -> Option<&str> {
        if !self.is_text() {
            return None;
        }
        match self.0.attributes.get(&AttrKey::Prop(Rc::from(TEXT_DATA))) {
            Some(Attr::Prop(_, value)) => value.as_str(),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        self.0.attributes.children()
    }

    /// Reference identity.
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// Nodes are equal only when they are the same allocation.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Node::ptr_eq(self, other)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.0.kind)
            .field("attributes", &self.0.attributes)
            .finish()
    }
}

// =============================================================================
// ElementBuilder
// =============================================================================

/// Builder for element nodes.
///
/// Children added one at a time are collected and stored as a single shared
/// list when the node is built.
pub struct ElementBuilder {
    tag: Rc<str>,
    attributes: Attributes,
    children: Vec<Node>,
}

impl ElementBuilder {
    /// Bind an event type to an application.
    pub fn on(mut self, event: &str, app: App) -> Self {
        self.attributes.insert(Attr::On(Rc::from(event), app));
        self
    }

    pub fn style<K, V>(self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.group(GroupKind::Style, Rc::new(collect_group(entries)))
    }

    pub fn dataset<K, V>(self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.group(GroupKind::Dataset, Rc::new(collect_group(entries)))
    }

    pub fn aria<K, V>(self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.group(GroupKind::Aria, Rc::new(collect_group(entries)))
    }

    /// Attach a shared group. Reusing the same `Rc` across cycles lets the
    /// reconciler skip the whole group.
    pub fn group(mut self, kind: GroupKind, group: Rc<Group>) -> Self {
        self.attributes.insert(Attr::Group(kind, group));
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Attach an already shared child list, replacing individually added
    /// children.
    pub fn child_list(mut self, children: Rc<[Node]>) -> Self {
        self.children.clear();
        self.attributes.insert(Attr::Children(children));
        self
    }

    pub fn class(mut self, class: impl Into<Rc<str>>) -> Self {
        self.attributes.insert(Attr::Class(class.into()));
        self
    }

    /// Label association (`for`).
    pub fn html_for(mut self, target: impl Into<Rc<str>>) -> Self {
        self.attributes.insert(Attr::For(target.into()));
        self
    }

    pub fn focus(mut self, focused: bool) -> Self {
        self.attributes.insert(Attr::Focus(focused));
        self
    }

    /// Generic property assignment.
    pub fn prop(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.attributes.insert(Attr::Prop(Rc::from(name), value.into()));
        self
    }

    /// Any prebuilt attribute.
    pub fn attr(mut self, attr: Attr) -> Self {
        self.attributes.insert(attr);
        self
    }

    pub fn build(self) -> Node {
        let ElementBuilder {
            tag,
            mut attributes,
            children,
        } = self;
        if !children.is_empty() {
            attributes.insert(Attr::Children(Rc::from(children)));
        }
        Node::new(Kind::Element(tag), attributes)
    }
}

fn collect_group<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Group
where
    K: Into<String>,
    V: Into<String>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn test_text_node() {
        let node = Node::text("hello");
        assert!(node.is_text());
        assert_eq!(node.text_data(), Some("hello"));
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_builder_collects_children() {
        let node = Node::element("ul")
            .child(Node::text("a"))
            .children([Node::text("b"), Node::text("c")])
            .class("list")
            .build();

        assert_eq!(node.kind(), &Kind::Element(Rc::from("ul")));
        assert_eq!(node.children().len(), 3);
        assert_eq!(node.children()[1].text_data(), Some("b"));
        assert!(node.attributes().contains(&AttrKey::Class));
    }

    #[test]
    fn test_childless_element_has_no_children_attr() {
        let node = Node::element("br").build();
        assert!(!node.attributes().contains(&AttrKey::Children));
    }

    #[test]
    fn test_equality_is_identity() {
        let a = Node::text("x");
        let b = a.clone();
        let c = Node::text("x");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_host_reads_declared_attributes() {
        let host = MemoryHost::new();
        let root = host.create_with_attributes("div", &[("id", "app"), ("class", "root")]);

        let node = Node::from_host(&host, root);
        assert_eq!(node.kind().tag(), "div");
        match node.attributes().get(&AttrKey::Class) {
            Some(Attr::Class(class)) => assert_eq!(&**class, "root"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(node.attributes().contains(&AttrKey::parse("id")));
    }
}
