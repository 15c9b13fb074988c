//! View driver - adapts the reconciliation engine to the driver contract.
//!
//! The root resource is adopted, not built: its declared attributes seed the
//! first description and no `create` runs for it. Every `output` patches the
//! root record with the description the application returned.
//!
//! `input` yields the event that started the current cycle. A fired listener
//! stores the event, runs one nested cycle with the application bound to it,
//! then puts back whatever the slot held before, so the event is only
//! visible to the cycle it triggered.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use spark_signals::{signal, Signal};

use crate::engine::{EventSink, Reconciler, ShadowNode};
use crate::error::{DriverError, RuntimeError};
use crate::host::Host;
use crate::pipeline::Runtime;
use crate::types::{App, HostEvent, ResourceId, Value};
use super::Driver;

// =============================================================================
// Mount point
// =============================================================================

/// Where the view driver attaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountPoint {
    Resource(ResourceId),
    /// Looked up once through [`Host::resolve`].
    Key(String),
}

impl From<ResourceId> for MountPoint {
    fn from(id: ResourceId) -> Self {
        MountPoint::Resource(id)
    }
}

impl From<&str> for MountPoint {
    fn from(key: &str) -> Self {
        MountPoint::Key(key.to_string())
    }
}

impl From<String> for MountPoint {
    fn from(key: String) -> Self {
        MountPoint::Key(key)
    }
}

// =============================================================================
// View driver
// =============================================================================

struct ViewInner {
    reconciler: Reconciler,
    root: RefCell<ShadowNode>,
    last_event: Signal<Option<HostEvent>>,
}

/// Driver owning the root reconciliation record.
///
/// Cloning shares the same root.
#[derive(Clone)]
pub struct ViewDriver {
    inner: Rc<ViewInner>,
}

impl ViewDriver {
    /// Adopt the resource at `root`.
    ///
    /// Events fired on resources this driver builds run nested cycles on
    /// `runtime`. The driver holds the runtime weakly.
    pub fn new(
        host: Rc<dyn Host>,
        root: impl Into<MountPoint>,
        runtime: &Runtime,
    ) -> Result<Self, RuntimeError> {
        let resource = match root.into() {
            MountPoint::Resource(id) => id,
            MountPoint::Key(key) => match host.resolve(&key) {
                Some(id) => id,
                None => return Err(RuntimeError::UnresolvedRoot { key }),
            },
        };

        let last_event: Signal<Option<HostEvent>> = signal(None);
        let sink = event_sink(runtime, last_event.clone());
        let root = ShadowNode::adopt(host.as_ref(), resource);
        tracing::debug!(root = %resource, kind = %root.description().kind().tag(), "view driver adopted root");

        Ok(Self {
            inner: Rc::new(ViewInner {
                reconciler: Reconciler::new(host, sink),
                root: RefCell::new(root),
                last_event,
            }),
        })
    }

    /// Resource the driver is attached to.
    pub fn root_resource(&self) -> ResourceId {
        self.inner.root.borrow().resource()
    }

    /// Root reconciliation record.
    ///
    /// # Panics
    ///
    /// Panics if called while the root is being patched.
    pub fn root(&self) -> Ref<'_, ShadowNode> {
        self.inner.root.borrow()
    }

    /// Event that triggered the cycle currently running, if any.
    pub fn last_event(&self) -> Option<HostEvent> {
        self.inner.last_event.get()
    }

    pub fn host(&self) -> &Rc<dyn Host> {
        self.inner.reconciler.host()
    }

    /// Uninstall every listener this driver installed, so no further event
    /// starts a cycle. The rendered resources stay in place.
    pub fn detach(&self) {
        match self.inner.root.try_borrow_mut() {
            Ok(mut root) => self.inner.reconciler.release_listeners(&mut root),
            Err(_) => tracing::warn!("detach refused while the root is being patched"),
        }
    }
}

impl Driver for ViewDriver {
    fn input(&self) -> Value {
        self.last_event().into()
    }

    fn output(&self, value: Value) -> Result<(), DriverError> {
        let node = match value {
            Value::Node(node) => node,
            other => {
                return Err(DriverError::UnexpectedValue {
                    expected: "node",
                    found: other.type_name(),
                })
            }
        };
        // A listener fired synchronously from inside a patch would land
        // here with the root still borrowed.
        let mut root = self
            .inner
            .root
            .try_borrow_mut()
            .map_err(|_| DriverError::Busy)?;

        // A kind change swaps the resource inside its parent. Without one
        // the new tree would end up detached and invisible.
        let current = root.description().kind();
        if current != node.kind() && self.host().parent(root.resource()).is_none() {
            return Err(DriverError::RootKindMismatch {
                expected: current.tag().to_string(),
                found: node.kind().tag().to_string(),
            });
        }

        self.inner.reconciler.patch(&mut root, &node);
        Ok(())
    }
}

fn event_sink(runtime: &Runtime, slot: Signal<Option<HostEvent>>) -> EventSink {
    let runtime = runtime.downgrade();
    Rc::new(move |event: &HostEvent, app: &App| {
        let Some(runtime) = runtime.upgrade() else {
            tracing::trace!(event = %event.kind, "runtime dropped, event ignored");
            return;
        };
        let previous = slot.get();
        slot.set(Some(event.clone()));
        let report = runtime.run(app);
        slot.set(previous);
        tracing::trace!(event = %event.kind, applied = report.applied, skipped = report.skipped, "event cycle done");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Drivers;
    use crate::host::{HostOp, MemoryHost};
    use crate::pipeline::RuntimeConfig;
    use crate::primitives::Node;
    use crate::types::{Sinks, Sources};

    fn setup() -> (Rc<MemoryHost>, Runtime, ViewDriver) {
        let host = Rc::new(MemoryHost::new());
        let root = host.create_with_attributes("div", &[("id", "app")]);
        let runtime = Runtime::new(RuntimeConfig::strict());
        let view = ViewDriver::new(host.clone(), root, &runtime).unwrap();
        (host, runtime, view)
    }

    #[test]
    fn test_adopts_root_by_key() {
        let host = Rc::new(MemoryHost::new());
        let root = host.create_with_attributes("main", &[("id", "app")]);
        let runtime = Runtime::default();

        let view = ViewDriver::new(host.clone(), "app", &runtime).unwrap();
        assert_eq!(view.root_resource(), root);
        assert_eq!(view.root().description().kind().tag(), "main");
        assert_eq!(host.op_count(), 0);
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let host = Rc::new(MemoryHost::new());
        let runtime = Runtime::default();

        let err = ViewDriver::new(host, "missing", &runtime).err().unwrap();
        assert!(matches!(err, RuntimeError::UnresolvedRoot { key } if key == "missing"));
    }

    #[test]
    fn test_output_patches_root() {
        let (host, _runtime, view) = setup();
        let node = Node::element("div")
            .prop("id", "app")
            .child(Node::text("hi"))
            .build();

        view.output(Value::Node(node)).unwrap();
        assert_eq!(host.text_content(view.root_resource()), "hi");
        assert_eq!(view.root().children().len(), 1);
    }

    #[test]
    fn test_output_rejects_non_node() {
        let (_host, _runtime, view) = setup();
        let err = view.output(Value::from(3)).unwrap_err();
        assert!(matches!(
            err,
            DriverError::UnexpectedValue { expected: "node", found: "number" }
        ));
    }

    #[test]
    fn test_declared_false_focus_is_not_blurred() {
        let host = Rc::new(MemoryHost::new());
        let root = host.create_with_attributes("input", &[("focus", "false")]);
        let runtime = Runtime::default();
        let view = ViewDriver::new(host.clone(), root, &runtime).unwrap();

        view.output(Value::Node(Node::element("input").build())).unwrap();

        assert!(!host.ops().iter().any(|op| matches!(op, HostOp::Blur { .. })));
    }

    #[test]
    fn test_kind_change_swaps_root_inside_parent() {
        let host = Rc::new(MemoryHost::new());
        let parent = host.create_with_attributes("section", &[]);
        let root = host.create_with_attributes("p", &[]);
        host.append_child(parent, root);
        let runtime = Runtime::default();
        let view = ViewDriver::new(host.clone(), root, &runtime).unwrap();

        view.output(Value::Node(Node::element("div").build())).unwrap();

        assert_ne!(view.root_resource(), root);
        assert_eq!(host.children(parent), vec![view.root_resource()]);
        assert_eq!(host.tag(view.root_resource()).as_deref(), Some("div"));
    }

    #[test]
    fn test_input_is_null_outside_event_cycles() {
        let (_host, _runtime, view) = setup();
        assert!(view.input().is_null());
    }

    #[test]
    fn test_event_is_visible_only_to_its_cycle() {
        let (host, runtime, view) = setup();
        runtime
            .register(Drivers::new().with("view", view.clone()))
            .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let record = seen.clone();
        let handler = App::new(move |sources: &Sources| {
            let kind = sources
                .get("view")
                .and_then(Value::as_event)
                .map(|e| e.kind.clone());
            record.borrow_mut().push(kind);
            Sinks::new()
        });
        let button = Node::element("button").on("click", handler).build();
        let node = Node::element("div").prop("id", "app").child(button).build();
        view.output(Value::Node(node)).unwrap();

        let target = view.root().children()[0].resource();
        assert!(host.click(target));

        assert_eq!(*seen.borrow(), vec![Some("click".to_string())]);
        assert!(view.last_event().is_none());
    }
}
