//! Primitives - description nodes and their attributes.
//!
//! These are the values an application returns to the view driver. They have
//! no behaviour; the engine turns them into host resources.

mod node;
mod types;

pub use node::{ElementBuilder, Kind, Node, TEXT_DATA};
pub use types::{Attr, AttrKey, Attributes, Group, GroupKind, EVENT_SIGIL};
