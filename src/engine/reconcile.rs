//! Reconciler - create and patch host resources from descriptions.
//!
//! # Algorithm
//!
//! `create` materializes a description: one host resource, every attribute
//! applied, children created recursively and appended in order.
//!
//! `patch` moves a shadow node to a new description:
//! 1. Store the new description (the old one is kept locally for diffing)
//! 2. Different kind: create a fresh subtree and swap it in, done
//! 3. Same kind: for each new attribute, skip it if identical to the old
//!    one, otherwise apply the difference; then undo every attribute that
//!    only the old description had
//!
//! Children are diffed by position only. Shared prefix is patched (or
//! skipped when identical), extra old children are removed from the end,
//! extra new children are created and appended.

use std::rc::Rc;

use crate::host::Host;
use crate::primitives::{Attr, GroupKind, Group, Kind, Node};
use crate::types::{App, ResourceId};
use super::defaults::DefaultValueCache;
use super::events::{EventDispatcher, EventSink};
use super::shadow::ShadowNode;

/// Everything one application instance needs to reconcile against a host.
pub struct Reconciler {
    host: Rc<dyn Host>,
    defaults: DefaultValueCache,
    sink: EventSink,
}

impl Reconciler {
    pub fn new(host: Rc<dyn Host>, sink: EventSink) -> Self {
        Self {
            host,
            defaults: DefaultValueCache::new(),
            sink,
        }
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        &self.host
    }

    pub fn defaults(&self) -> &DefaultValueCache {
        &self.defaults
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Materialize `node` as a new, detached resource tree.
    pub fn create(&self, node: &Node) -> ShadowNode {
        let resource = match node.kind() {
            Kind::Text => {
                let resource = self.host.create_text(node.text_data().unwrap_or_default());
                return ShadowNode::new(node.clone(), resource);
            }
            Kind::Element(tag) => self.host.create_element(tag),
        };

        let mut shadow = ShadowNode::new(node.clone(), resource);
        for (_, attr) in node.attributes().iter() {
            self.apply(&mut shadow, attr);
        }
        shadow
    }

    fn apply(&self, shadow: &mut ShadowNode, attr: &Attr) {
        let resource = shadow.resource;
        match attr {
            Attr::On(event, app) => self.bind_event(shadow, event, app),
            Attr::Group(kind, group) => {
                for (key, value) in group.iter() {
                    self.host.set_group_entry(resource, *kind, key, value);
                }
            }
            Attr::Children(children) => {
                for child in children.iter() {
                    self.append_child(shadow, child);
                }
            }
            // A fresh resource is already blurred.
            Attr::Focus(focused) => {
                if *focused {
                    self.host.focus(resource);
                }
            }
            Attr::Class(class) => self.host.set_class_name(resource, class),
            Attr::For(target) => self.host.set_html_for(resource, target),
            Attr::Prop(name, value) => self.host.set_property(resource, name, value),
        }
    }

    // =========================================================================
    // Patch
    // =========================================================================

    /// Bring `shadow` in line with `next` using as few host effects as
    /// possible.
    pub fn patch(&self, shadow: &mut ShadowNode, next: &Node) {
        if Node::ptr_eq(&shadow.description, next) {
            return;
        }

        let previous = std::mem::replace(&mut shadow.description, next.clone());

        if previous.kind() != next.kind() {
            self.replace(shadow, next);
            return;
        }

        let old = previous.attributes();
        let new = next.attributes();

        for (key, attr) in new.iter() {
            let prior = old.get(key);
            if prior.is_some_and(|prior| prior.is_identical(attr)) {
                continue;
            }
            self.update(shadow, prior, attr);
        }

        for (key, attr) in old.iter() {
            if !new.contains(key) {
                self.remove(shadow, previous.kind(), attr);
            }
        }
    }

    /// Swap the whole subtree for a freshly created one.
    fn replace(&self, shadow: &mut ShadowNode, next: &Node) {
        let fresh = self.create(next);
        let old = shadow.resource;

        match self.host.parent(old) {
            Some(parent) => self.host.replace_child(parent, fresh.resource, old),
            None => tracing::debug!(%old, "replacing a resource that has no parent"),
        }
        tracing::trace!(%old, new = %fresh.resource, kind = next.kind().tag(), "structural replacement");

        *shadow = fresh;
    }

    fn update(&self, shadow: &mut ShadowNode, prior: Option<&Attr>, attr: &Attr) {
        let resource = shadow.resource;
        match attr {
            Attr::On(event, app) => self.bind_event(shadow, event, app),
            Attr::Group(kind, group) => {
                let prior = match prior {
                    Some(Attr::Group(_, prior)) => Some(&**prior),
                    _ => None,
                };
                self.diff_group(resource, *kind, prior, group);
            }
            Attr::Children(children) => {
                let prior: &[Node] = match prior {
                    Some(Attr::Children(prior)) => &**prior,
                    _ => &[],
                };
                self.diff_children(shadow, prior, children);
            }
            Attr::Focus(true) => self.host.focus(resource),
            Attr::Focus(false) => self.host.blur(resource),
            Attr::Class(class) => self.host.set_class_name(resource, class),
            Attr::For(target) => self.host.set_html_for(resource, target),
            Attr::Prop(name, value) => self.host.set_property(resource, name, value),
        }
    }

    /// Undo an attribute that is no longer described.
    fn remove(&self, shadow: &mut ShadowNode, kind: &Kind, attr: &Attr) {
        let resource = shadow.resource;
        match attr {
            Attr::On(event, _) => self.unbind_event(shadow, event),
            Attr::Group(group_kind, group) => {
                for key in group.keys() {
                    self.clear_group_entry(resource, *group_kind, key);
                }
            }
            Attr::Children(_) => self.truncate_children(shadow, 0),
            Attr::Focus(focused) => {
                if *focused {
                    self.host.blur(resource);
                }
            }
            Attr::Class(_) => self.host.set_class_name(resource, ""),
            Attr::For(_) => self.host.set_html_for(resource, ""),
            Attr::Prop(name, _) => {
                let default = self.defaults.default_for(self.host.as_ref(), kind, name);
                self.host.set_property(resource, name, &default);
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn bind_event(&self, shadow: &mut ShadowNode, event: &str, app: &App) {
        let resource = shadow.resource;
        let dispatcher = shadow.dispatcher.get_or_insert_with(EventDispatcher::new);
        if dispatcher.bind(event, app.clone()) {
            self.host
                .add_listener(resource, event, dispatcher.listener(self.sink.clone()));
        }
    }

    fn unbind_event(&self, shadow: &mut ShadowNode, event: &str) {
        if let Some(dispatcher) = &shadow.dispatcher {
            dispatcher.unbind(event);
        }
        self.host.remove_listener(shadow.resource, event);
    }

    /// Uninstall every native listener in the subtree.
    ///
    /// Resources and attributes are left as they are; only events stop
    /// reaching the application.
    pub fn release_listeners(&self, shadow: &mut ShadowNode) {
        if let Some(dispatcher) = shadow.dispatcher.take() {
            for event in dispatcher.events() {
                dispatcher.unbind(&event);
                self.host.remove_listener(shadow.resource, &event);
            }
        }
        for child in &mut shadow.children {
            self.release_listeners(child);
        }
    }

    // =========================================================================
    // Groups
    // =========================================================================

    fn diff_group(&self, resource: ResourceId, kind: GroupKind, old: Option<&Group>, new: &Group) {
        for (key, value) in new.iter() {
            if old.and_then(|old| old.get(key)) == Some(value) {
                continue;
            }
            self.host.set_group_entry(resource, kind, key, value);
        }

        let Some(old) = old else { return };
        for key in old.keys() {
            if !new.contains_key(key) {
                self.clear_group_entry(resource, kind, key);
            }
        }
    }

    /// Style entries reset to ""; dataset and aria entries are deleted.
    fn clear_group_entry(&self, resource: ResourceId, kind: GroupKind, key: &str) {
        match kind {
            GroupKind::Style => self.host.set_group_entry(resource, kind, key, ""),
            GroupKind::Dataset | GroupKind::Aria => self.host.remove_group_entry(resource, kind, key),
        }
    }

    // =========================================================================
    // Children
    // =========================================================================

    fn diff_children(&self, shadow: &mut ShadowNode, old: &[Node], new: &[Node]) {
        debug_assert_eq!(shadow.children.len(), old.len());

        let shared = shadow.children.len().min(new.len());
        for (index, next) in new.iter().enumerate().take(shared) {
            if old.get(index).is_some_and(|old| Node::ptr_eq(old, next)) {
                continue;
            }
            self.patch(&mut shadow.children[index], next);
        }

        self.truncate_children(shadow, new.len());

        for next in &new[shared..] {
            self.append_child(shadow, next);
        }
    }

    fn append_child(&self, shadow: &mut ShadowNode, node: &Node) {
        let child = self.create(node);
        self.host.append_child(shadow.resource, child.resource);
        tracing::trace!(parent = %shadow.resource, child = %child.resource, "appended child");
        shadow.children.push(child);
    }

    /// Remove children from the end until `len` remain.
    fn truncate_children(&self, shadow: &mut ShadowNode, len: usize) {
        if shadow.children.len() <= len {
            return;
        }
        let parent = shadow.resource;
        for child in shadow.children.drain(len..).rev() {
            self.host.remove_child(parent, child.resource);
            tracing::trace!(%parent, child = %child.resource, "removed child");
        }
    }
}
