//! Reconciliation engine - keeps a host resource tree in line with
//! description nodes.
//!
//! - [`Reconciler`]: `create` and `patch`
//! - [`ShadowNode`]: last applied description + live resource + child shadows
//! - [`EventDispatcher`]: per-resource event table behind one native listener
//! - [`DefaultValueCache`]: factory defaults used when a property is removed
//!
//! # Re-entrancy
//!
//! `patch` runs synchronously to completion. A listener fired by the host may
//! start a new dispatch cycle, but it must not patch the shadow node that is
//! currently being patched; the view driver refuses such a nested patch.

mod defaults;
mod events;
mod reconcile;
mod shadow;

pub use defaults::DefaultValueCache;
pub use events::{EventDispatcher, EventSink};
pub use reconcile::Reconciler;
pub use shadow::ShadowNode;
