//! Widget lifecycle: deferred initializers and reverse-order cleanup.
//!
//! Every scoped resource a widget acquires (solver node, instance slot,
//! effect subscriptions) goes through an [`InitializerRegistry`]. Initializers
//! are queued while the widget is described, run exactly once at mount, and
//! each returns a cleanup closure. Unmount runs the collected cleanups in
//! reverse registration order, so dependents tear down before the resources
//! they depend on.

use crate::error::{Result, UiError};

/// Teardown closure returned by an initializer.
pub type Cleanup = Box<dyn FnOnce()>;

/// Resource acquisition deferred until mount.
pub type Initializer = Box<dyn FnOnce() -> Result<Cleanup>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Described but not yet mounted.
    Idle,
    Mounted,
    /// Terminal. A registry is single-shot; build a new widget to re-mount.
    Unmounted,
}

// =============================================================================
// InitializerRegistry
// =============================================================================

pub struct InitializerRegistry {
    phase: LifecyclePhase,
    pending: Vec<Initializer>,
    cleanups: Vec<Cleanup>,
}

impl InitializerRegistry {
    pub fn new() -> Self {
        Self {
            phase: LifecyclePhase::Idle,
            pending: Vec::new(),
            cleanups: Vec::new(),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// Queue an initializer. If the registry is already mounted the
    /// initializer runs immediately and its cleanup joins the stack.
    pub fn register(&mut self, init: Initializer) -> Result<()> {
        match self.phase {
            LifecyclePhase::Idle => {
                self.pending.push(init);
                Ok(())
            }
            LifecyclePhase::Mounted => {
                let cleanup = init()?;
                self.cleanups.push(cleanup);
                Ok(())
            }
            LifecyclePhase::Unmounted => Err(UiError::invalid_state(
                "cannot register initializer on an unmounted widget",
            )),
        }
    }

    /// Run all queued initializers in registration order.
    ///
    /// On the first failure the remaining initializers are skipped; cleanups
    /// already collected stay on the stack so [`unmount`](Self::unmount) can
    /// still release what was acquired.
    pub fn mount(&mut self) -> Result<()> {
        match self.phase {
            LifecyclePhase::Idle => {}
            LifecyclePhase::Mounted => {
                return Err(UiError::invalid_state("widget already mounted"));
            }
            LifecyclePhase::Unmounted => {
                return Err(UiError::invalid_state("cannot re-mount an unmounted widget"));
            }
        }
        self.phase = LifecyclePhase::Mounted;

        let pending = std::mem::take(&mut self.pending);
        for init in pending {
            match init() {
                Ok(cleanup) => self.cleanups.push(cleanup),
                Err(err) => {
                    log::warn!("widget initializer failed: {err}");
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Run cleanups in reverse registration order. Idempotent: a second call
    /// is a no-op.
    pub fn unmount(&mut self) {
        if self.phase == LifecyclePhase::Unmounted {
            return;
        }
        self.phase = LifecyclePhase::Unmounted;
        self.pending.clear();
        while let Some(cleanup) = self.cleanups.pop() {
            cleanup();
        }
    }
}

impl Default for InitializerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// A bundle of effect stop-handles released as one cleanup.
pub struct Subscriptions {
    stops: Vec<Box<dyn FnOnce()>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self { stops: Vec::new() }
    }

    pub fn add(&mut self, stop: impl FnOnce() + 'static) {
        self.stops.push(Box::new(stop));
    }

    /// Consume the bundle into a single cleanup that stops everything in
    /// reverse order.
    pub fn into_cleanup(self) -> Cleanup {
        let mut stops = self.stops;
        Box::new(move || {
            while let Some(stop) = stops.pop() {
                stop();
            }
        })
    }
}

impl Default for Subscriptions {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tracking_init(log: &Rc<RefCell<Vec<&'static str>>>, run: &'static str, clean: &'static str) -> Initializer {
        let log = log.clone();
        Box::new(move || {
            log.borrow_mut().push(run);
            let log = log.clone();
            Ok(Box::new(move || log.borrow_mut().push(clean)) as Cleanup)
        })
    }

    #[test]
    fn test_mount_runs_in_order_and_cleanup_reverses() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = InitializerRegistry::new();
        registry.register(tracking_init(&log, "a", "drop-a")).unwrap();
        registry.register(tracking_init(&log, "b", "drop-b")).unwrap();

        registry.mount().unwrap();
        assert_eq!(*log.borrow(), vec!["a", "b"]);

        registry.unmount();
        assert_eq!(*log.borrow(), vec!["a", "b", "drop-b", "drop-a"]);
    }

    #[test]
    fn test_unmount_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = InitializerRegistry::new();
        registry.register(tracking_init(&log, "a", "drop-a")).unwrap();
        registry.mount().unwrap();

        registry.unmount();
        registry.unmount();
        assert_eq!(*log.borrow(), vec!["a", "drop-a"]);
    }

    #[test]
    fn test_double_mount_fails() {
        let mut registry = InitializerRegistry::new();
        registry.mount().unwrap();
        assert!(matches!(registry.mount(), Err(UiError::InvalidState(_))));
    }

    #[test]
    fn test_remount_after_unmount_fails() {
        let mut registry = InitializerRegistry::new();
        registry.mount().unwrap();
        registry.unmount();
        assert!(matches!(registry.mount(), Err(UiError::InvalidState(_))));
    }

    #[test]
    fn test_failed_initializer_aborts_but_keeps_earlier_cleanups() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = InitializerRegistry::new();
        registry.register(tracking_init(&log, "a", "drop-a")).unwrap();
        registry
            .register(Box::new(|| Err(UiError::invalid_state("boom"))))
            .unwrap();
        registry.register(tracking_init(&log, "c", "drop-c")).unwrap();

        assert!(registry.mount().is_err());
        // Third initializer never ran; first one's cleanup still fires.
        assert_eq!(*log.borrow(), vec!["a"]);
        registry.unmount();
        assert_eq!(*log.borrow(), vec!["a", "drop-a"]);
    }

    #[test]
    fn test_register_while_mounted_runs_immediately() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = InitializerRegistry::new();
        registry.mount().unwrap();
        registry.register(tracking_init(&log, "late", "drop-late")).unwrap();
        assert_eq!(*log.borrow(), vec!["late"]);

        registry.unmount();
        assert_eq!(*log.borrow(), vec!["late", "drop-late"]);
    }

    #[test]
    fn test_subscriptions_stop_in_reverse() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Subscriptions::new();
        for name in ["s1", "s2", "s3"] {
            let log = log.clone();
            subs.add(move || log.borrow_mut().push(name));
        }
        subs.into_cleanup()();
        assert_eq!(*log.borrow(), vec!["s3", "s2", "s1"]);
    }
}
