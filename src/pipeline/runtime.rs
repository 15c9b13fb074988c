//! Runtime - driver registry and dispatch loop.
//!
//! One [`Runtime`] is one application instance. It owns the registry of
//! named drivers, the diagnostics reported so far, and the nesting depth of
//! the cycle currently running.
//!
//! # Dispatch cycle
//!
//! ```text
//! input() of every driver → Sources → app → Sinks → output(value) per name
//! ```
//!
//! # Re-entrancy
//!
//! A driver's `output` may call [`Runtime::run`] again (the view driver does
//! so for every fired event). The nested cycle runs to completion before the
//! outer output loop continues; there is no queue. The registry is an `Rc`
//! snapshot, so no borrow is held while drivers run, and a `register` from
//! inside a cycle only affects cycles that start afterwards.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::drivers::{Driver, Drivers};
use crate::error::{ConfigError, RuntimeError};
use crate::types::{App, Capabilities, Sources};
use super::config::RuntimeConfig;

type Registry = BTreeMap<String, Rc<dyn Driver>>;

/// Outcome of one dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Outputs delivered to a driver that accepted them.
    pub applied: usize,
    /// Outputs dropped: unknown name, missing capability, or driver error.
    pub skipped: usize,
}

struct RuntimeInner {
    config: RuntimeConfig,
    registry: RefCell<Rc<Registry>>,
    diagnostics: RefCell<Vec<RuntimeError>>,
    depth: Cell<usize>,
}

/// Handle to an application instance. Clones share the same instance.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

/// Non-owning handle, held by event listeners.
#[derive(Clone)]
pub struct WeakRuntime {
    inner: Weak<RuntimeInner>,
}

impl WeakRuntime {
    pub fn upgrade(&self) -> Option<Runtime> {
        self.inner.upgrade().map(|inner| Runtime { inner })
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                registry: RefCell::new(Rc::new(Registry::new())),
                diagnostics: RefCell::new(Vec::new()),
                depth: Cell::new(0),
            }),
        }
    }

    /// Runtime configured from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(RuntimeConfig::from_env()?))
    }

    pub fn config(&self) -> RuntimeConfig {
        self.inner.config
    }

    pub fn downgrade(&self) -> WeakRuntime {
        WeakRuntime {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // -------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------

    /// Replace the whole registry.
    ///
    /// In strict mode an empty name, a repeated name, or a driver with no
    /// capabilities at all is reported and the previous registry is kept.
    /// Relaxed mode skips validation; a repeated name keeps the last driver.
    pub fn register(&self, drivers: Drivers) -> Result<(), RuntimeError> {
        let strict = self.inner.config.mode.is_strict();
        let mut registry = Registry::new();

        for (name, driver) in drivers {
            if strict {
                if let Err(err) = validate(&registry, &name, &*driver) {
                    self.report(err.clone());
                    return Err(err);
                }
            }
            registry.insert(name, driver);
        }

        tracing::debug!(drivers = registry.len(), "registry replaced");
        *self.inner.registry.borrow_mut() = Rc::new(registry);
        Ok(())
    }

    /// Drop every registered driver.
    pub fn clear(&self) {
        *self.inner.registry.borrow_mut() = Rc::new(Registry::new());
    }

    /// Names of the registered drivers, sorted.
    pub fn driver_names(&self) -> Vec<String> {
        self.snapshot().keys().cloned().collect()
    }

    pub fn driver(&self, name: &str) -> Option<Rc<dyn Driver>> {
        self.snapshot().get(name).cloned()
    }

    fn snapshot(&self) -> Rc<Registry> {
        Rc::clone(&self.inner.registry.borrow())
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Nesting depth of the cycle currently running; 0 when idle.
    pub fn depth(&self) -> usize {
        self.inner.depth.get()
    }

    /// Run one dispatch cycle.
    ///
    /// Outputs are delivered in name order. A failing output is reported
    /// and skipped; the remaining outputs are still delivered. A nested call
    /// beyond the configured maximum depth is refused before it starts.
    pub fn run(&self, app: &App) -> CycleReport {
        let depth = self.inner.depth.get();
        if depth >= self.inner.config.max_depth {
            self.report(RuntimeError::ReentryLimit { depth });
            return CycleReport::default();
        }
        let _guard = DepthGuard::enter(&self.inner.depth);

        let span = tracing::debug_span!("cycle", depth);
        let _enter = span.enter();

        let strict = self.inner.config.mode.is_strict();
        let registry = self.snapshot();

        let mut sources = Sources::new();
        for (name, driver) in registry.iter() {
            if driver.capabilities().contains(Capabilities::INPUT) {
                sources.insert(name.clone(), driver.input());
            }
        }

        let sinks = app.call(&sources);
        let mut report = CycleReport::default();

        for (name, value) in sinks {
            let Some(driver) = registry.get(&name) else {
                if strict {
                    self.report(RuntimeError::UnknownSink { name });
                } else {
                    tracing::trace!(sink = %name, "dropped output for unknown driver");
                }
                report.skipped += 1;
                continue;
            };

            if !driver.capabilities().contains(Capabilities::OUTPUT) {
                if strict {
                    self.report(RuntimeError::MissingCapability {
                        driver: name,
                        capability: "output",
                    });
                } else {
                    tracing::trace!(sink = %name, "dropped output for input-only driver");
                }
                report.skipped += 1;
                continue;
            }

            match driver.output(value) {
                Ok(()) => report.applied += 1,
                Err(source) => {
                    self.report(RuntimeError::Driver {
                        driver: name,
                        source,
                    });
                    report.skipped += 1;
                }
            }
        }

        tracing::debug!(applied = report.applied, skipped = report.skipped, "cycle complete");
        report
    }

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------

    /// Drain everything reported so far.
    pub fn take_diagnostics(&self) -> Vec<RuntimeError> {
        std::mem::take(&mut *self.inner.diagnostics.borrow_mut())
    }

    fn report(&self, error: RuntimeError) {
        tracing::warn!(%error, "runtime diagnostic");
        self.inner.diagnostics.borrow_mut().push(error);
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("drivers", &self.driver_names())
            .field("depth", &self.depth())
            .finish()
    }
}

fn validate(registry: &Registry, name: &str, driver: &dyn Driver) -> Result<(), RuntimeError> {
    if name.is_empty() {
        return Err(RuntimeError::EmptyDriverName);
    }
    if registry.contains_key(name) {
        return Err(RuntimeError::DuplicateDriver {
            name: name.to_string(),
        });
    }
    if driver.capabilities().is_empty() {
        return Err(RuntimeError::MissingCapability {
            driver: name.to_string(),
            capability: "input or output",
        });
    }
    Ok(())
}

/// Restores the depth counter even if a driver panics.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{StoreDriver, TraceDriver};
    use crate::error::DriverError;
    use crate::pipeline::config::Mode;
    use crate::types::{Sinks, Value};

    struct Failing;

    impl Driver for Failing {
        fn output(&self, _value: Value) -> Result<(), DriverError> {
            Err(DriverError::Busy)
        }
    }

    struct Inert;

    impl Driver for Inert {
        fn capabilities(&self) -> Capabilities {
            Capabilities::empty()
        }

        fn output(&self, _value: Value) -> Result<(), DriverError> {
            Ok(())
        }
    }

    fn sinks(entries: &[(&str, Value)]) -> Sinks {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_run_feeds_inputs_and_distributes_outputs() {
        let runtime = Runtime::new(RuntimeConfig::strict());
        let store = StoreDriver::new(1);
        runtime
            .register(Drivers::new().with("data", store.clone()))
            .unwrap();

        let double = App::new(|sources: &Sources| {
            let n = sources.get("data").and_then(Value::as_number).unwrap_or(0.0);
            sinks(&[("data", Value::from(n * 2.0))])
        });

        assert_eq!(runtime.run(&double), CycleReport { applied: 1, skipped: 0 });
        runtime.run(&double);
        assert_eq!(store.get(), Value::from(4.0));
        assert!(runtime.take_diagnostics().is_empty());
    }

    #[test]
    fn test_output_only_driver_gets_no_input() {
        let runtime = Runtime::new(RuntimeConfig::strict());
        runtime
            .register(Drivers::new().with("trace", TraceDriver::new()))
            .unwrap();

        let app = App::new(|sources: &Sources| {
            assert!(!sources.contains_key("trace"));
            Sinks::new()
        });
        runtime.run(&app);
    }

    #[test]
    fn test_strict_registration_rejects_duplicates() {
        let runtime = Runtime::new(RuntimeConfig::strict());
        runtime
            .register(Drivers::new().with("data", StoreDriver::default()))
            .unwrap();

        let result = runtime.register(
            Drivers::new()
                .with("a", StoreDriver::default())
                .with("a", StoreDriver::default()),
        );
        assert!(matches!(result, Err(RuntimeError::DuplicateDriver { .. })));
        // Previous registry kept.
        assert_eq!(runtime.driver_names(), vec!["data".to_string()]);
        assert_eq!(runtime.take_diagnostics().len(), 1);
    }

    #[test]
    fn test_strict_registration_rejects_empty_name_and_inert_driver() {
        let runtime = Runtime::new(RuntimeConfig::strict());
        assert!(matches!(
            runtime.register(Drivers::new().with("", StoreDriver::default())),
            Err(RuntimeError::EmptyDriverName)
        ));
        assert!(matches!(
            runtime.register(Drivers::new().with("x", Inert)),
            Err(RuntimeError::MissingCapability { .. })
        ));
        assert!(runtime.driver_names().is_empty());
    }

    #[test]
    fn test_relaxed_registration_keeps_last_duplicate() {
        let runtime = Runtime::new(RuntimeConfig::relaxed());
        let second = StoreDriver::new("second");
        runtime
            .register(
                Drivers::new()
                    .with("a", StoreDriver::new("first"))
                    .with("a", second.clone()),
            )
            .unwrap();

        let input = runtime.driver("a").unwrap().input();
        assert_eq!(input, second.get());
        assert!(runtime.take_diagnostics().is_empty());
    }

    #[test]
    fn test_unknown_sink_reported_in_strict_mode_only() {
        for (mode, expected) in [(Mode::Strict, 1), (Mode::Relaxed, 0)] {
            let runtime = Runtime::new(RuntimeConfig { mode, ..RuntimeConfig::default() });
            let store = StoreDriver::default();
            runtime.register(Drivers::new().with("data", store.clone())).unwrap();

            let app = App::new(|_: &Sources| sinks(&[("data", Value::from(1)), ("nope", Value::Null)]));
            let report = runtime.run(&app);

            assert_eq!(report, CycleReport { applied: 1, skipped: 1 });
            assert_eq!(store.get(), Value::from(1));
            assert_eq!(runtime.take_diagnostics().len(), expected);
        }
    }

    #[test]
    fn test_output_to_input_only_driver_is_skipped() {
        struct Source;
        impl Driver for Source {
            fn capabilities(&self) -> Capabilities {
                Capabilities::INPUT
            }
            fn output(&self, _value: Value) -> Result<(), DriverError> {
                panic!("output called on input-only driver");
            }
        }

        let runtime = Runtime::new(RuntimeConfig::strict());
        runtime.register(Drivers::new().with("src", Source)).unwrap();
        let report = runtime.run(&App::new(|_: &Sources| sinks(&[("src", Value::Null)])));

        assert_eq!(report.skipped, 1);
        let diagnostics = runtime.take_diagnostics();
        assert!(matches!(
            diagnostics.as_slice(),
            [RuntimeError::MissingCapability { capability: "output", .. }]
        ));
    }

    #[test]
    fn test_driver_failure_does_not_stop_cycle() {
        let runtime = Runtime::new(RuntimeConfig::relaxed());
        let store = StoreDriver::default();
        runtime
            .register(Drivers::new().with("a", Failing).with("b", store.clone()))
            .unwrap();

        let app = App::new(|_: &Sources| sinks(&[("a", Value::Null), ("b", Value::from(true))]));
        let report = runtime.run(&app);

        assert_eq!(report, CycleReport { applied: 1, skipped: 1 });
        assert_eq!(store.get(), Value::from(true));
        // Driver failures are reported even in relaxed mode.
        assert!(matches!(
            runtime.take_diagnostics().as_slice(),
            [RuntimeError::Driver { driver, .. }] if driver == "a"
        ));
    }

    #[test]
    fn test_nested_runs_complete_before_outer_continues() {
        struct Nesting {
            runtime: WeakRuntime,
            inner: App,
            log: Rc<RefCell<Vec<&'static str>>>,
        }

        impl Driver for Nesting {
            fn capabilities(&self) -> Capabilities {
                Capabilities::OUTPUT
            }
            fn output(&self, _value: Value) -> Result<(), DriverError> {
                self.log.borrow_mut().push("outer output");
                if let Some(runtime) = self.runtime.upgrade() {
                    assert_eq!(runtime.depth(), 1);
                    runtime.run(&self.inner);
                }
                self.log.borrow_mut().push("outer output done");
                Ok(())
            }
        }

        let runtime = Runtime::new(RuntimeConfig::strict());
        let log = Rc::new(RefCell::new(Vec::new()));
        let store = StoreDriver::default();
        let inner_log = log.clone();
        let inner = App::new(move |_: &Sources| {
            inner_log.borrow_mut().push("inner app");
            sinks(&[("data", Value::from("nested"))])
        });
        runtime
            .register(
                Drivers::new()
                    .with("data", store.clone())
                    .with("nest", Nesting { runtime: runtime.downgrade(), inner, log: log.clone() }),
            )
            .unwrap();

        runtime.run(&App::new(|_: &Sources| sinks(&[("nest", Value::Null)])));

        assert_eq!(*log.borrow(), vec!["outer output", "inner app", "outer output done"]);
        assert_eq!(store.get(), Value::from("nested"));
        assert_eq!(runtime.depth(), 0);
    }

    #[test]
    fn test_zero_depth_still_runs_top_level_cycle() {
        let runtime = Runtime::new(RuntimeConfig::strict().with_max_depth(0));
        let store = StoreDriver::default();
        runtime.register(Drivers::new().with("data", store.clone())).unwrap();

        let report = runtime.run(&App::new(|_: &Sources| sinks(&[("data", Value::from(1))])));

        assert_eq!(report.applied, 1);
        assert!(runtime.take_diagnostics().is_empty());
    }

    #[test]
    fn test_depth_limit_refuses_nested_cycle() {
        struct Recurse {
            runtime: WeakRuntime,
            app: RefCell<Option<App>>,
        }

        impl Driver for Recurse {
            fn capabilities(&self) -> Capabilities {
                Capabilities::OUTPUT
            }
            fn output(&self, _value: Value) -> Result<(), DriverError> {
                let app = self.app.borrow().clone();
                if let (Some(runtime), Some(app)) = (self.runtime.upgrade(), app) {
                    runtime.run(&app);
                }
                Ok(())
            }
        }

        let runtime = Runtime::new(RuntimeConfig::strict().with_max_depth(3));
        let recurse = Rc::new(Recurse { runtime: runtime.downgrade(), app: RefCell::new(None) });
        let app = App::new(|_: &Sources| sinks(&[("loop", Value::Null)]));
        *recurse.app.borrow_mut() = Some(app.clone());
        runtime
            .register(Drivers::new().with_shared("loop", recurse.clone()))
            .unwrap();

        runtime.run(&app);

        assert!(matches!(
            runtime.take_diagnostics().as_slice(),
            [RuntimeError::ReentryLimit { depth: 3 }]
        ));
        assert_eq!(runtime.depth(), 0);
    }

    #[test]
    fn test_register_inside_cycle_applies_to_later_cycles() {
        struct Swap {
            runtime: WeakRuntime,
            replacement: StoreDriver,
        }

        impl Driver for Swap {
            fn capabilities(&self) -> Capabilities {
                Capabilities::OUTPUT
            }
            fn output(&self, _value: Value) -> Result<(), DriverError> {
                if let Some(runtime) = self.runtime.upgrade() {
                    runtime
                        .register(Drivers::new().with("data", self.replacement.clone()))
                        .ok();
                }
                Ok(())
            }
        }

        let runtime = Runtime::new(RuntimeConfig::strict());
        let original = StoreDriver::default();
        let replacement = StoreDriver::default();
        runtime
            .register(
                Drivers::new()
                    .with("data", original.clone())
                    .with("swap", Swap { runtime: runtime.downgrade(), replacement: replacement.clone() }),
            )
            .unwrap();

        // "data" sorts before "swap", so it is delivered from the old snapshot.
        let app = App::new(|_: &Sources| sinks(&[("data", Value::from(1)), ("swap", Value::Null)]));
        runtime.run(&app);
        assert_eq!(original.get(), Value::from(1));

        runtime.run(&App::new(|_: &Sources| sinks(&[("data", Value::from(2))])));
        assert_eq!(replacement.get(), Value::from(2));
        assert_eq!(original.get(), Value::from(1));
    }
}
