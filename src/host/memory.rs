//! In-memory host - a headless resource graph.
//!
//! Resources live in an arena and are addressed by index, like component
//! slots in parallel arrays. Every mutation is appended to an operation log
//! so callers can count exactly which effects a patch produced.
//!
//! Platform defaults are modelled per tag: an unset property reads as what a
//! freshly created resource of that tag would report (`input.value` is `""`,
//! `button.type` is `"submit"`, ...).

use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{Host, Listener};
use crate::primitives::{GroupKind, TEXT_DATA};
use crate::types::{HostEvent, PropValue, ResourceId};

// =============================================================================
// Operation log
// =============================================================================

/// One effect applied to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateElement { resource: ResourceId, tag: String },
    CreateText { resource: ResourceId, data: String },
    Append { parent: ResourceId, child: ResourceId },
    Remove { parent: ResourceId, child: ResourceId },
    Replace { parent: ResourceId, new: ResourceId, old: ResourceId },
    SetProperty { resource: ResourceId, name: String, value: PropValue },
    SetGroupEntry { resource: ResourceId, group: GroupKind, key: String, value: String },
    RemoveGroupEntry { resource: ResourceId, group: GroupKind, key: String },
    SetClassName { resource: ResourceId, class: String },
    SetHtmlFor { resource: ResourceId, target: String },
    Focus { resource: ResourceId },
    Blur { resource: ResourceId },
    AddListener { resource: ResourceId, event: String },
    RemoveListener { resource: ResourceId, event: String },
}

impl HostOp {
    /// Creation or tree-shape change.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            HostOp::CreateElement { .. }
                | HostOp::CreateText { .. }
                | HostOp::Append { .. }
                | HostOp::Remove { .. }
                | HostOp::Replace { .. }
        )
    }
}

// =============================================================================
// Graph
// =============================================================================

#[derive(Default)]
struct Resource {
    /// `None` for text resources.
    tag: Option<String>,
    data: String,
    parent: Option<ResourceId>,
    children: Vec<ResourceId>,
    declared: Vec<(String, String)>,
    props: BTreeMap<String, PropValue>,
    style: BTreeMap<String, String>,
    dataset: BTreeMap<String, String>,
    aria: BTreeMap<String, String>,
    class_name: String,
    html_for: String,
    listeners: BTreeMap<String, Listener>,
}

impl Resource {
    fn group(&self, group: GroupKind) -> &BTreeMap<String, String> {
        match group {
            GroupKind::Style => &self.style,
            GroupKind::Dataset => &self.dataset,
            GroupKind::Aria => &self.aria,
        }
    }

    fn group_mut(&mut self, group: GroupKind) -> &mut BTreeMap<String, String> {
        match group {
            GroupKind::Style => &mut self.style,
            GroupKind::Dataset => &mut self.dataset,
            GroupKind::Aria => &mut self.aria,
        }
    }
}

#[derive(Default)]
struct Graph {
    resources: Vec<Resource>,
    focused: Option<ResourceId>,
    ops: Vec<HostOp>,
}

impl Graph {
    fn get(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id.index())
    }

    fn get_mut(&mut self, id: ResourceId) -> Option<&mut Resource> {
        self.resources.get_mut(id.index())
    }

    fn alloc(&mut self, resource: Resource) -> ResourceId {
        let id = ResourceId(self.resources.len());
        self.resources.push(resource);
        id
    }

    fn detach(&mut self, child: ResourceId) {
        let Some(parent) = self.get(child).and_then(|r| r.parent) else {
            return;
        };
        if let Some(parent) = self.get_mut(parent) {
            parent.children.retain(|&c| c != child);
        }
        if let Some(child) = self.get_mut(child) {
            child.parent = None;
        }
    }
}

/// Factory default of a property for a freshly created resource.
fn factory_default(tag: Option<&str>, name: &str) -> PropValue {
    match (tag, name) {
        (None, TEXT_DATA) => PropValue::empty(),
        (Some("input" | "textarea" | "select"), "value") => PropValue::empty(),
        (Some("input"), "type") => PropValue::from("text"),
        (Some("input"), "checked") => PropValue::Bool(false),
        (Some("button"), "type") => PropValue::from("submit"),
        (Some("a"), "href") => PropValue::empty(),
        (Some("a" | "button" | "input" | "select" | "textarea"), "tabIndex") => PropValue::Number(0.0),
        (Some(_), "tabIndex") => PropValue::Number(-1.0),
        (Some(_), "id" | "title" | "lang") => PropValue::empty(),
        (Some(_), "hidden" | "disabled") => PropValue::Bool(false),
        _ => PropValue::Null,
    }
}

// =============================================================================
// MemoryHost
// =============================================================================

/// Headless [`Host`] backed by an in-memory arena.
#[derive(Default)]
pub struct MemoryHost {
    graph: RefCell<Graph>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element with declared (markup) attributes, as if it came
    /// from a page the engine did not build. Nothing is logged.
    pub fn create_with_attributes(&self, tag: &str, attributes: &[(&str, &str)]) -> ResourceId {
        let mut resource = Resource {
            tag: Some(tag.to_string()),
            ..Resource::default()
        };
        for &(key, value) in attributes {
            resource.declared.push((key.to_string(), value.to_string()));
            match key {
                "class" => resource.class_name = value.to_string(),
                "for" => resource.html_for = value.to_string(),
                _ => {
                    resource.props.insert(key.to_string(), PropValue::from(value));
                }
            }
        }
        self.graph.borrow_mut().alloc(resource)
    }

    /// Fire a native event. Returns false when no listener is installed.
    ///
    /// The listener runs after the graph borrow is released, so it may patch
    /// this host.
    pub fn dispatch(&self, event: HostEvent) -> bool {
        let listener = {
            let graph = self.graph.borrow();
            graph
                .get(event.target)
                .and_then(|r| r.listeners.get(&event.kind))
                .cloned()
        };
        match listener {
            Some(listener) => {
                listener(&event);
                true
            }
            None => false,
        }
    }

    /// Fire a `click` on `target`.
    pub fn click(&self, target: ResourceId) -> bool {
        self.dispatch(HostEvent::new("click", target))
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Snapshot of the operation log.
    pub fn ops(&self) -> Vec<HostOp> {
        self.graph.borrow().ops.clone()
    }

    pub fn op_count(&self) -> usize {
        self.graph.borrow().ops.len()
    }

    pub fn clear_ops(&self) {
        self.graph.borrow_mut().ops.clear();
    }

    /// Number of resources ever created.
    pub fn resource_count(&self) -> usize {
        self.graph.borrow().resources.len()
    }

    pub fn children(&self, resource: ResourceId) -> Vec<ResourceId> {
        self.graph
            .borrow()
            .get(resource)
            .map(|r| r.children.clone())
            .unwrap_or_default()
    }

    /// Concatenated text of all descendant text resources.
    pub fn text_content(&self, resource: ResourceId) -> String {
        fn collect(graph: &Graph, id: ResourceId, out: &mut String) {
            let Some(r) = graph.get(id) else { return };
            if r.tag.is_none() {
                out.push_str(&r.data);
            }
            for &child in &r.children {
                collect(graph, child, out);
            }
        }

        let graph = self.graph.borrow();
        let mut out = String::new();
        collect(&graph, resource, &mut out);
        out
    }

    /// Style entry; unset entries read as "".
    pub fn style(&self, resource: ResourceId, key: &str) -> String {
        self.group_entry(resource, GroupKind::Style, key)
            .unwrap_or_default()
    }

    pub fn group_entry(&self, resource: ResourceId, group: GroupKind, key: &str) -> Option<String> {
        self.graph
            .borrow()
            .get(resource)
            .and_then(|r| r.group(group).get(key).cloned())
    }

    pub fn class_name(&self, resource: ResourceId) -> String {
        self.graph
            .borrow()
            .get(resource)
            .map(|r| r.class_name.clone())
            .unwrap_or_default()
    }

    pub fn html_for(&self, resource: ResourceId) -> String {
        self.graph
            .borrow()
            .get(resource)
            .map(|r| r.html_for.clone())
            .unwrap_or_default()
    }

    pub fn focused(&self) -> Option<ResourceId> {
        self.graph.borrow().focused
    }

    pub fn has_listener(&self, resource: ResourceId, event: &str) -> bool {
        self.graph
            .borrow()
            .get(resource)
            .is_some_and(|r| r.listeners.contains_key(event))
    }

    fn log(&self, op: HostOp) {
        self.graph.borrow_mut().ops.push(op);
    }
}

impl Host for MemoryHost {
    fn create_element(&self, tag: &str) -> ResourceId {
        let resource = self.graph.borrow_mut().alloc(Resource {
            tag: Some(tag.to_string()),
            ..Resource::default()
        });
        self.log(HostOp::CreateElement {
            resource,
            tag: tag.to_string(),
        });
        resource
    }

    fn create_text(&self, data: &str) -> ResourceId {
        let resource = self.graph.borrow_mut().alloc(Resource {
            data: data.to_string(),
            ..Resource::default()
        });
        self.log(HostOp::CreateText {
            resource,
            data: data.to_string(),
        });
        resource
    }

    fn append_child(&self, parent: ResourceId, child: ResourceId) {
        {
            let mut graph = self.graph.borrow_mut();
            graph.detach(child);
            if let Some(p) = graph.get_mut(parent) {
                p.children.push(child);
            }
            if let Some(c) = graph.get_mut(child) {
                c.parent = Some(parent);
            }
        }
        self.log(HostOp::Append { parent, child });
    }

    fn remove_child(&self, parent: ResourceId, child: ResourceId) {
        {
            let mut graph = self.graph.borrow_mut();
            let attached = graph.get(child).is_some_and(|c| c.parent == Some(parent));
            if attached {
                graph.detach(child);
            }
        }
        self.log(HostOp::Remove { parent, child });
    }

    fn replace_child(&self, parent: ResourceId, new: ResourceId, old: ResourceId) {
        {
            let mut graph = self.graph.borrow_mut();
            graph.detach(new);
            let position = graph
                .get(parent)
                .and_then(|p| p.children.iter().position(|&c| c == old));
            if let Some(position) = position {
                if let Some(p) = graph.get_mut(parent) {
                    p.children[position] = new;
                }
                if let Some(o) = graph.get_mut(old) {
                    o.parent = None;
                }
                if let Some(n) = graph.get_mut(new) {
                    n.parent = Some(parent);
                }
            }
        }
        self.log(HostOp::Replace { parent, new, old });
    }

    fn parent(&self, resource: ResourceId) -> Option<ResourceId> {
        self.graph.borrow().get(resource).and_then(|r| r.parent)
    }

    fn tag(&self, resource: ResourceId) -> Option<String> {
        self.graph.borrow().get(resource).and_then(|r| r.tag.clone())
    }

    fn declared_attributes(&self, resource: ResourceId) -> Vec<(String, String)> {
        self.graph
            .borrow()
            .get(resource)
            .map(|r| r.declared.clone())
            .unwrap_or_default()
    }

    fn resolve(&self, key: &str) -> Option<ResourceId> {
        let graph = self.graph.borrow();
        graph
            .resources
            .iter()
            .position(|r| r.props.get("id").and_then(PropValue::as_str) == Some(key))
            .map(ResourceId)
    }

    fn property(&self, resource: ResourceId, name: &str) -> PropValue {
        let graph = self.graph.borrow();
        let Some(r) = graph.get(resource) else {
            return PropValue::Null;
        };
        if r.tag.is_none() && name == TEXT_DATA {
            return PropValue::from(r.data.as_str());
        }
        r.props
            .get(name)
            .cloned()
            .unwrap_or_else(|| factory_default(r.tag.as_deref(), name))
    }

    fn set_property(&self, resource: ResourceId, name: &str, value: &PropValue) {
        {
            let mut graph = self.graph.borrow_mut();
            if let Some(r) = graph.get_mut(resource) {
                if r.tag.is_none() && name == TEXT_DATA {
                    r.data = value.to_string();
                } else {
                    r.props.insert(name.to_string(), value.clone());
                }
            }
        }
        self.log(HostOp::SetProperty {
            resource,
            name: name.to_string(),
            value: value.clone(),
        });
    }

    fn set_group_entry(&self, resource: ResourceId, group: GroupKind, key: &str, value: &str) {
        if let Some(r) = self.graph.borrow_mut().get_mut(resource) {
            r.group_mut(group).insert(key.to_string(), value.to_string());
        }
        self.log(HostOp::SetGroupEntry {
            resource,
            group,
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    fn remove_group_entry(&self, resource: ResourceId, group: GroupKind, key: &str) {
        if let Some(r) = self.graph.borrow_mut().get_mut(resource) {
            r.group_mut(group).remove(key);
        }
        self.log(HostOp::RemoveGroupEntry {
            resource,
            group,
            key: key.to_string(),
        });
    }

    fn set_class_name(&self, resource: ResourceId, class: &str) {
        if let Some(r) = self.graph.borrow_mut().get_mut(resource) {
            r.class_name = class.to_string();
        }
        self.log(HostOp::SetClassName {
            resource,
            class: class.to_string(),
        });
    }

    fn set_html_for(&self, resource: ResourceId, target: &str) {
        if let Some(r) = self.graph.borrow_mut().get_mut(resource) {
            r.html_for = target.to_string();
        }
        self.log(HostOp::SetHtmlFor {
            resource,
            target: target.to_string(),
        });
    }

    fn focus(&self, resource: ResourceId) {
        self.graph.borrow_mut().focused = Some(resource);
        self.log(HostOp::Focus { resource });
    }

    fn blur(&self, resource: ResourceId) {
        {
            let mut graph = self.graph.borrow_mut();
            if graph.focused == Some(resource) {
                graph.focused = None;
            }
        }
        self.log(HostOp::Blur { resource });
    }

    fn add_listener(&self, resource: ResourceId, event: &str, listener: Listener) {
        if let Some(r) = self.graph.borrow_mut().get_mut(resource) {
            r.listeners.insert(event.to_string(), listener);
        }
        self.log(HostOp::AddListener {
            resource,
            event: event.to_string(),
        });
    }

    fn remove_listener(&self, resource: ResourceId, event: &str) {
        if let Some(r) = self.graph.borrow_mut().get_mut(resource) {
            r.listeners.remove(event);
        }
        self.log(HostOp::RemoveListener {
            resource,
            event: event.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_factory_defaults() {
        let host = MemoryHost::new();
        let input = host.create_element("input");
        let button = host.create_element("button");

        assert_eq!(host.property(input, "value"), PropValue::empty());
        assert_eq!(host.property(input, "type"), PropValue::from("text"));
        assert_eq!(host.property(button, "type"), PropValue::from("submit"));
        assert_eq!(host.property(button, "unknown"), PropValue::Null);
    }

    #[test]
    fn test_tree_edits() {
        let host = MemoryHost::new();
        let parent = host.create_element("div");
        let a = host.create_text("a");
        let b = host.create_text("b");
        let c = host.create_text("c");

        host.append_child(parent, a);
        host.append_child(parent, b);
        assert_eq!(host.text_content(parent), "ab");

        host.replace_child(parent, c, a);
        assert_eq!(host.children(parent), vec![c, b]);
        assert_eq!(host.parent(a), None);

        host.remove_child(parent, b);
        assert_eq!(host.text_content(parent), "c");
    }

    #[test]
    fn test_text_data_property() {
        let host = MemoryHost::new();
        let text = host.create_text("0");
        host.set_property(text, TEXT_DATA, &PropValue::from("1"));
        assert_eq!(host.property(text, TEXT_DATA), PropValue::from("1"));
        assert_eq!(host.tag(text), None);
    }

    #[test]
    fn test_resolve_by_id() {
        let host = MemoryHost::new();
        host.create_element("span");
        let app = host.create_with_attributes("div", &[("id", "app")]);
        assert_eq!(host.resolve("app"), Some(app));
        assert_eq!(host.resolve("missing"), None);
    }

    #[test]
    fn test_dispatch_reaches_single_listener() {
        let host = MemoryHost::new();
        let button = host.create_element("button");
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        host.add_listener(button, "click", Rc::new(move |_: &HostEvent| counter.set(counter.get() + 1)));
        assert!(host.click(button));
        assert!(!host.dispatch(HostEvent::new("input", button)));
        assert_eq!(hits.get(), 1);

        host.remove_listener(button, "click");
        assert!(!host.click(button));
    }

    #[test]
    fn test_focus_tracks_single_resource() {
        let host = MemoryHost::new();
        let a = host.create_element("input");
        let b = host.create_element("input");

        host.focus(a);
        host.focus(b);
        host.blur(a);
        assert_eq!(host.focused(), Some(b));
        host.blur(b);
        assert_eq!(host.focused(), None);
    }
}
