//! Core types shared by the engine, the drivers and the dispatch loop.
//!
//! - [`ResourceId`] - opaque handle into the host's resource graph
//! - [`PropValue`] - scalar value of a generic property or group entry
//! - [`HostEvent`] - native event payload handed to applications
//! - [`Value`] - anything a driver produces or consumes
//! - [`App`] - the application function, `Sources -> Sinks`

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::primitives::Node;

// =============================================================================
// ResourceId
// =============================================================================

/// Handle to a live resource owned by a [`Host`](crate::host::Host).
///
/// Resources are indices into the host's arena, not objects. The engine never
/// looks inside a handle; it only passes it back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(pub usize);

impl ResourceId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// PropValue
// =============================================================================

/// Scalar value assigned to a resource property.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
}

impl PropValue {
    /// Truthiness as the host platform sees it.
    ///
    /// `Null`, `false`, `0`, `NaN` and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Null => false,
            PropValue::Bool(b) => *b,
            PropValue::Number(n) => *n != 0.0 && !n.is_nan(),
            PropValue::Str(s) => !s.is_empty(),
        }
    }

    /// String view, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Empty string value.
    pub fn empty() -> Self {
        PropValue::Str(Rc::from(""))
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Null => Ok(()),
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Number(n) => write!(f, "{n}"),
            PropValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for PropValue {
    fn from(value: Rc<str>) -> Self {
        PropValue::Str(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(f64::from(value))
    }
}

// =============================================================================
// HostEvent
// =============================================================================

/// Native event payload.
///
/// The engine only reads `kind` to pick the bound application. Everything
/// else is passed through untouched to whoever reads the view driver's input.
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    /// Event type, e.g. "click" or "input".
    pub kind: String,
    /// Resource the event fired on.
    pub target: ResourceId,
    /// Optional payload (current input value, key name, ...).
    pub value: PropValue,
}

impl HostEvent {
    /// Create an event without a payload.
    pub fn new(kind: impl Into<String>, target: ResourceId) -> Self {
        Self {
            kind: kind.into(),
            target,
            value: PropValue::Null,
        }
    }

    /// Attach a payload.
    pub fn with_value(mut self, value: impl Into<PropValue>) -> Self {
        self.value = value.into();
        self
    }
}

// =============================================================================
// Value
// =============================================================================

/// Input record handed to an application, keyed by driver name.
pub type Sources = BTreeMap<String, Value>;

/// Output record returned by an application, keyed by driver name.
pub type Sinks = BTreeMap<String, Value>;

/// A value flowing through a driver.
///
/// `Node` compares by identity, see [`Node`]'s `PartialEq`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Node(Node),
    Event(HostEvent),
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Node(_) => "node",
            Value::Event(_) => "event",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&HostEvent> {
        match self {
            Value::Event(event) => Some(event),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Node> for Value {
    fn from(value: Node) -> Self {
        Value::Node(value)
    }
}

impl From<HostEvent> for Value {
    fn from(value: HostEvent) -> Self {
        Value::Event(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

// =============================================================================
// App
// =============================================================================

/// An application: a pure function from driver inputs to driver outputs.
///
/// Cloning shares the same function, so clones are identical for the purpose
/// of event rebinding. Two separately constructed `App`s are never identical,
/// even if they wrap the same code.
#[derive(Clone)]
pub struct App(Rc<dyn Fn(&Sources) -> Sinks>);

impl App {
    pub fn new(f: impl Fn(&Sources) -> Sinks + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the application for one cycle.
    pub fn call(&self, sources: &Sources) -> Sinks {
        (self.0)(sources)
    }

    /// Reference identity.
    pub fn ptr_eq(a: &App, b: &App) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "App({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

// =============================================================================
// Driver capabilities (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// What a driver can do.
    ///
    /// A driver without `INPUT` contributes nothing to the sources record;
    /// a driver without `OUTPUT` cannot be named in the sinks record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u8 {
        const INPUT = 1 << 0;
        const OUTPUT = 1 << 1;
    }
}
