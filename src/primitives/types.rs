//! Attribute types - the closed set of things a description node can carry.
//!
//! Every attribute is resolved into a tagged union when the node is built,
//! so the reconciler matches exhaustively over [`Attr`] instead of branching
//! on key strings. The string conventions (`@click`, `style`, `children`, ...)
//! only exist at the edge, in [`AttrKey::parse`].

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::rc::Rc;

use crate::types::{App, PropValue};
use super::node::Node;

/// Leading character marking an event binding key, e.g. `@click`.
pub const EVENT_SIGIL: char = '@';

// =============================================================================
// Groups
// =============================================================================

/// Sub-mapping attributes that are diffed entry by entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKind {
    /// Inline style declarations. Removed entries reset to "".
    Style,
    /// `data-*` entries. Removed entries are deleted.
    Dataset,
    /// `aria-*` entries. Removed entries are deleted.
    Aria,
}

impl GroupKind {
    pub fn name(self) -> &'static str {
        match self {
            GroupKind::Style => "style",
            GroupKind::Dataset => "dataset",
            GroupKind::Aria => "aria",
        }
    }
}

/// Entries of a style/dataset/aria group.
pub type Group = BTreeMap<String, String>;

// =============================================================================
// AttrKey
// =============================================================================

/// Key of an attribute. Its variant fixes the variant of the value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttrKey {
    Event(Rc<str>),
    Group(GroupKind),
    Children,
    Class,
    For,
    Focus,
    Prop(Rc<str>),
}

impl AttrKey {
    /// Resolve a string key using the reserved naming conventions.
    pub fn parse(key: &str) -> AttrKey {
        if let Some(event) = key.strip_prefix(EVENT_SIGIL) {
            return AttrKey::Event(Rc::from(event));
        }
        match key {
            "style" => AttrKey::Group(GroupKind::Style),
            "dataset" => AttrKey::Group(GroupKind::Dataset),
            "aria" => AttrKey::Group(GroupKind::Aria),
            "children" => AttrKey::Children,
            "class" => AttrKey::Class,
            "for" => AttrKey::For,
            "focus" => AttrKey::Focus,
            other => AttrKey::Prop(Rc::from(other)),
        }
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrKey::Event(event) => write!(f, "{EVENT_SIGIL}{event}"),
            AttrKey::Group(kind) => f.write_str(kind.name()),
            AttrKey::Children => f.write_str("children"),
            AttrKey::Class => f.write_str("class"),
            AttrKey::For => f.write_str("for"),
            AttrKey::Focus => f.write_str("focus"),
            AttrKey::Prop(name) => f.write_str(name),
        }
    }
}

// =============================================================================
// Attr
// =============================================================================

/// One attribute of a description node.
#[derive(Debug, Clone)]
pub enum Attr {
    /// Event binding: fired events of this type run the application.
    On(Rc<str>, App),
    /// Style, dataset or aria group.
    Group(GroupKind, Rc<Group>),
    /// Ordered child descriptions.
    Children(Rc<[Node]>),
    /// Class name.
    Class(Rc<str>),
    /// Label association.
    For(Rc<str>),
    /// Focus state.
    Focus(bool),
    /// Generic property assignment.
    Prop(Rc<str>, PropValue),
}

impl Attr {
    pub fn key(&self) -> AttrKey {
        match self {
            Attr::On(event, _) => AttrKey::Event(event.clone()),
            Attr::Group(kind, _) => AttrKey::Group(*kind),
            Attr::Children(_) => AttrKey::Children,
            Attr::Class(_) => AttrKey::Class,
            Attr::For(_) => AttrKey::For,
            Attr::Focus(_) => AttrKey::Focus,
            Attr::Prop(name, _) => AttrKey::Prop(name.clone()),
        }
    }

    /// Identity check used by the reconciler to skip unchanged attributes.
    ///
    /// Shared values (handlers, groups, child lists) compare by reference.
    /// Scalars compare by value, the same way the host compares primitives.
    /// No deep comparison is ever done.
    pub fn is_identical(&self, other: &Attr) -> bool {
        match (self, other) {
            (Attr::On(a_event, a), Attr::On(b_event, b)) => a_event == b_event && App::ptr_eq(a, b),
            (Attr::Group(a_kind, a), Attr::Group(b_kind, b)) => a_kind == b_kind && Rc::ptr_eq(a, b),
            (Attr::Children(a), Attr::Children(b)) => Rc::ptr_eq(a, b),
            (Attr::Class(a), Attr::Class(b)) => a == b,
            (Attr::For(a), Attr::For(b)) => a == b,
            (Attr::Focus(a), Attr::Focus(b)) => a == b,
            (Attr::Prop(a_name, a), Attr::Prop(b_name, b)) => a_name == b_name && a == b,
            _ => false,
        }
    }

    /// Build an attribute from a string key and a scalar value.
    ///
    /// Returns `None` for keys whose value cannot be a scalar (events,
    /// groups, children).
    pub fn from_scalar(key: &str, value: PropValue) -> Option<Attr> {
        match AttrKey::parse(key) {
            AttrKey::Class => Some(Attr::Class(Rc::from(value.to_string()))),
            AttrKey::For => Some(Attr::For(Rc::from(value.to_string()))),
            AttrKey::Focus => Some(Attr::Focus(declared_flag(&value))),
            AttrKey::Prop(name) => Some(Attr::Prop(name, value)),
            AttrKey::Event(_) | AttrKey::Group(_) | AttrKey::Children => None,
        }
    }
}

/// Markup spells booleans as strings; `"false"` and `""` mean off.
fn declared_flag(value: &PropValue) -> bool {
    match value {
        PropValue::Str(s) => !(s.is_empty() || s.eq_ignore_ascii_case("false")),
        other => other.is_truthy(),
    }
}

// =============================================================================
// Attributes
// =============================================================================

/// Attribute map of a description node.
///
/// Entries are keyed by [`Attr::key`], so a key can never hold a value of
/// the wrong variant.
#[derive(Debug, Clone, Default)]
pub struct Attributes(BTreeMap<AttrKey, Attr>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an attribute, returning the one it replaced.
    pub fn insert(&mut self, attr: Attr) -> Option<Attr> {
        self.0.insert(attr.key(), attr)
    }

    pub fn get(&self, key: &AttrKey) -> Option<&Attr> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &AttrKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, AttrKey, Attr> {
        self.0.iter()
    }

    /// Child descriptions, empty when there is no `children` attribute.
    pub fn children(&self) -> &[Node] {
        match self.0.get(&AttrKey::Children) {
            Some(Attr::Children(children)) => children.as_ref(),
            _ => &[],
        }
    }
}

impl FromIterator<Attr> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attr>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for attr in iter {
            attributes.insert(attr);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reserved_keys() {
        assert_eq!(AttrKey::parse("@click"), AttrKey::Event(Rc::from("click")));
        assert_eq!(AttrKey::parse("style"), AttrKey::Group(GroupKind::Style));
        assert_eq!(AttrKey::parse("dataset"), AttrKey::Group(GroupKind::Dataset));
        assert_eq!(AttrKey::parse("aria"), AttrKey::Group(GroupKind::Aria));
        assert_eq!(AttrKey::parse("children"), AttrKey::Children);
        assert_eq!(AttrKey::parse("for"), AttrKey::For);
        assert_eq!(AttrKey::parse("value"), AttrKey::Prop(Rc::from("value")));
        assert_eq!(AttrKey::parse("@click").to_string(), "@click");
    }

    #[test]
    fn test_from_scalar_rejects_structured_keys() {
        assert!(Attr::from_scalar("@click", PropValue::Null).is_none());
        assert!(Attr::from_scalar("style", "color: red".into()).is_none());
        assert!(Attr::from_scalar("children", PropValue::Null).is_none());

        match Attr::from_scalar("class", "big".into()) {
            Some(Attr::Class(class)) => assert_eq!(&*class, "big"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_declared_focus_strings() {
        let focus = |value: &str| match Attr::from_scalar("focus", value.into()) {
            Some(Attr::Focus(focused)) => focused,
            other => panic!("unexpected {other:?}"),
        };

        assert!(!focus("false"));
        assert!(!focus("FALSE"));
        assert!(!focus(""));
        assert!(focus("true"));
        assert!(focus("focus"));
        assert!(matches!(
            Attr::from_scalar("focus", PropValue::Bool(false)),
            Some(Attr::Focus(false))
        ));
    }

    #[test]
    fn test_identity_is_by_reference_for_groups() {
        let group: Rc<Group> = Rc::new([("color".to_string(), "red".to_string())].into());
        let same = Attr::Group(GroupKind::Style, group.clone());
        let shared = Attr::Group(GroupKind::Style, group);
        let equal_copy = Attr::Group(
            GroupKind::Style,
            Rc::new([("color".to_string(), "red".to_string())].into()),
        );

        assert!(same.is_identical(&shared));
        assert!(!same.is_identical(&equal_copy));
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let mut attributes = Attributes::new();
        attributes.insert(Attr::Prop(Rc::from("value"), "a".into()));
        let replaced = attributes.insert(Attr::Prop(Rc::from("value"), "b".into()));

        assert!(replaced.is_some());
        assert_eq!(attributes.len(), 1);
    }
}
