//! Default-value cache - factory defaults read from blank resources.
//!
//! When a generic property disappears from a description, the reconciler
//! assigns whatever a freshly created resource of the same kind reports for
//! that property. One blank resource per kind is created on first use and
//! kept for the lifetime of the cache, so the cache grows with the number of
//! distinct kinds ever seen and never shrinks.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::host::Host;
use crate::primitives::Kind;
use crate::types::{PropValue, ResourceId};

/// Blank resources keyed by kind.
#[derive(Default)]
pub struct DefaultValueCache {
    blanks: RefCell<HashMap<Kind, ResourceId>>,
}

impl DefaultValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory default of `name` for resources of `kind`.
    pub fn default_for(&self, host: &dyn Host, kind: &Kind, name: &str) -> PropValue {
        let blank = self.blank(host, kind);
        host.property(blank, name)
    }

    /// Number of kinds with a cached blank resource.
    pub fn len(&self) -> usize {
        self.blanks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blanks.borrow().is_empty()
    }

    fn blank(&self, host: &dyn Host, kind: &Kind) -> ResourceId {
        if let Some(&blank) = self.blanks.borrow().get(kind) {
            return blank;
        }

        let blank = match kind {
            Kind::Text => host.create_text(""),
            Kind::Element(tag) => host.create_element(tag),
        };
        tracing::trace!(kind = kind.tag(), %blank, "cached blank resource for defaults");
        self.blanks.borrow_mut().insert(kind.clone(), blank);
        blank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use std::rc::Rc;

    #[test]
    fn test_reads_platform_default() {
        let host = MemoryHost::new();
        let cache = DefaultValueCache::new();
        let input = Kind::Element(Rc::from("input"));

        assert_eq!(cache.default_for(&host, &input, "value"), PropValue::empty());
        assert_eq!(cache.default_for(&host, &input, "type"), PropValue::from("text"));
    }

    #[test]
    fn test_one_blank_per_kind() {
        let host = MemoryHost::new();
        let cache = DefaultValueCache::new();
        let input = Kind::Element(Rc::from("input"));
        let button = Kind::Element(Rc::from("button"));

        cache.default_for(&host, &input, "value");
        cache.default_for(&host, &input, "type");
        cache.default_for(&host, &button, "type");
        cache.default_for(&host, &Kind::Text, "data");

        assert_eq!(cache.len(), 3);
        assert_eq!(host.resource_count(), 3);
    }
}
