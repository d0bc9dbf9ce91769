//! Attachment point for window managers.
//!
//! Every window publishes its manager here under its own [`WindowId`], so a
//! parent can reach a child's manager (and the other way round) by walking
//! window handles. Commands sent as JSON are validated here before any
//! manager sees them.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::command::{CommandOutcome, ManagerCommand};
use crate::error::{Error, Result};
use crate::host::WindowId;
use crate::manager::WindowManager;

/// Maps window identities to their attached managers.
///
/// Cloning is cheap; clones share the same map.
#[derive(Clone, Default)]
pub struct WindowRegistry {
    inner: Arc<Mutex<WindowRegistryInner>>,
}

#[derive(Default)]
struct WindowRegistryInner {
    managers: HashMap<WindowId, Arc<WindowManager>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> Self {
        static INSTANCE: OnceLock<WindowRegistry> = OnceLock::new();
        INSTANCE.get_or_init(WindowRegistry::new).clone()
    }

    /// Publishes `manager` for `window`, replacing whatever was attached.
    pub fn attach(&self, window: WindowId, manager: Arc<WindowManager>) {
        let previous = self.inner.lock().managers.insert(window, manager);
        if previous.is_some() {
            log::debug!("replaced manager attached to {}", window);
        }
    }

    /// Detaches `window` only if `manager` is the one attached to it.
    pub fn detach_manager(&self, window: WindowId, manager: &WindowManager) -> bool {
        let mut inner = self.inner.lock();
        let attached = inner
            .managers
            .get(&window)
            .is_some_and(|current| std::ptr::eq(Arc::as_ptr(current), manager));
        if attached {
            inner.managers.remove(&window);
        }
        attached
    }

    pub fn get(&self, window: WindowId) -> Option<Arc<WindowManager>> {
        self.inner.lock().managers.get(&window).cloned()
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.inner.lock().managers.contains_key(&window)
    }

    /// Windows with an attached manager, in id order.
    pub fn windows(&self) -> Vec<WindowId> {
        let mut windows: Vec<_> = self.inner.lock().managers.keys().copied().collect();
        windows.sort();
        windows
    }

    pub fn window_count(&self) -> usize {
        self.inner.lock().managers.len()
    }

    /// Parses `command` and runs it on the manager attached to `window`.
    ///
    /// Malformed commands are rejected before the manager is looked up.
    pub fn invoke(&self, window: WindowId, command: &Value) -> Result<CommandOutcome> {
        let command = ManagerCommand::from_value(command)?;
        let manager = self.get(window).ok_or(Error::Detached(window))?;
        manager.dispatch(command)
    }
}
