//! Mount API - application lifecycle.
//!
//! Wires a view driver onto a host resource, registers it alongside the
//! caller's drivers, and runs the first cycle.
//!
//! # Example
//!
//! ```ignore
//! use spark_cycle::pipeline::{mount, Runtime};
//!
//! let runtime = Runtime::from_env()?;
//! let handle = mount(&runtime, host, "app", Drivers::new().with("data", store), &app)?;
//!
//! // Events fired on the host now run cycles on their own.
//! handle.refresh();
//!
//! handle.unmount();
//! ```

use std::rc::Rc;

use crate::drivers::{Drivers, MountPoint, ViewDriver};
use crate::error::RuntimeError;
use crate::host::Host;
use crate::types::App;
use super::runtime::{CycleReport, Runtime};

/// Name the view driver is registered under.
pub const VIEW_DRIVER: &str = "view";

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`mount`].
///
/// Dropping the handle leaves the application running: listeners already
/// installed keep dispatching. Call [`unmount`](MountHandle::unmount) to
/// detach the drivers.
pub struct MountHandle {
    runtime: Runtime,
    view: ViewDriver,
    app: App,
    initial: CycleReport,
}

impl MountHandle {
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn view(&self) -> &ViewDriver {
        &self.view
    }

    /// Report of the first cycle.
    pub fn initial_report(&self) -> CycleReport {
        self.initial
    }

    /// Run the root application again, e.g. after external state changed.
    pub fn refresh(&self) -> CycleReport {
        self.runtime.run(&self.app)
    }

    /// Uninstall the view's listeners and empty the registry. The rendered
    /// resources stay where they are.
    pub fn unmount(self) {
        tracing::debug!(root = %self.view.root_resource(), "unmount");
        self.view.detach();
        self.runtime.clear();
    }
}

// =============================================================================
// Mount Function
// =============================================================================

/// Mount `app` on `root`.
///
/// This:
/// 1. Adopts the root resource in a new [`ViewDriver`]
/// 2. Registers `drivers` plus the view driver under `"view"`
/// 3. Runs the first cycle
pub fn mount(
    runtime: &Runtime,
    host: Rc<dyn Host>,
    root: impl Into<MountPoint>,
    drivers: Drivers,
    app: &App,
) -> Result<MountHandle, RuntimeError> {
    let view = ViewDriver::new(host, root, runtime)?;
    runtime.register(drivers.with(VIEW_DRIVER, view.clone()))?;

    let initial = runtime.run(app);
    tracing::debug!(
        root = %view.root_resource(),
        applied = initial.applied,
        skipped = initial.skipped,
        "mounted"
    );

    Ok(MountHandle {
        runtime: runtime.clone(),
        view,
        app: app.clone(),
        initial,
    })
}
