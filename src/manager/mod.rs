//! Per-window tree manager.
//!
//! A [`WindowManager`] tracks the windows its own window opened, keeps the
//! name cache in step with them, and closes whole subtrees furthest
//! descendant first. Managers of different windows find each other only
//! through the [`WindowRegistry`].

use parking_lot::Mutex;
use std::sync::Arc;

use windowtree_cache::{PersistenceStore, WindowNameCache};

use crate::command::{CommandOutcome, ManagerCommand};
use crate::config::TreeConfig;
use crate::error::{Error, Result};
use crate::host::{BLANK_URL, WindowHost, WindowId};
use crate::registry::WindowRegistry;


/// Callback run when the managed window unloads.
pub type UnloadCallback = Box<dyn FnOnce() + Send>;

/// Everything the managers of one process share.
#[derive(Clone)]
pub struct TreeContext {
    host: Arc<dyn WindowHost>,
    registry: WindowRegistry,
    store: Arc<dyn PersistenceStore>,
    config: Arc<TreeConfig>,
}

impl TreeContext {
    pub fn new(
        host: Arc<dyn WindowHost>,
        registry: WindowRegistry,
        store: Arc<dyn PersistenceStore>,
        config: TreeConfig,
    ) -> Self {
        Self {
            host,
            registry,
            store,
            config: Arc::new(config),
        }
    }

    pub fn host(&self) -> &Arc<dyn WindowHost> {
        &self.host
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn PersistenceStore> {
        &self.store
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Returns a page-load hook that bootstraps a manager for every window
    /// that finishes loading.
    pub fn page_loader(&self) -> Box<dyn Fn(WindowId) + Send + Sync> {
        let context = self.clone();
        Box::new(move |window| {
            if let Err(e) = WindowManager::bootstrap(window, context.clone()) {
                log::error!("failed to start window manager for {}: {}", window, e);
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerPhase {
    Uninitialized,
    Initialized,
    Unloading,
    Detached,
}

pub struct WindowManager {
    window: WindowId,
    parent: Option<WindowId>,
    context: TreeContext,
    state: Mutex<ManagerState>,
}

struct ManagerState {
    phase: ManagerPhase,
    /// Direct children in open order.
    children: Vec<WindowId>,
    unload_callbacks: Vec<UnloadCallback>,
    cache: Option<WindowNameCache>,
}

impl WindowManager {
    pub fn new(window: WindowId, context: TreeContext) -> Arc<Self> {
        let parent = context.host.opener(window);
        Arc::new(Self {
            window,
            parent,
            context,
            state: Mutex::new(ManagerState {
                phase: ManagerPhase::Uninitialized,
                children: Vec::new(),
                unload_callbacks: Vec::new(),
                cache: None,
            }),
        })
    }

    /// Creates and initializes the manager for a freshly loaded window.
    pub fn bootstrap(window: WindowId, context: TreeContext) -> Result<Arc<Self>> {
        Self::new(window, context).init()
    }

    /// Restores the name cache, attaches to the registry and reopens every
    /// remembered child.
    ///
    /// Nothing is published if the cache cannot be restored. Once attached,
    /// a child that fails to restore is logged and skipped.
    pub fn init(self: &Arc<Self>) -> Result<Arc<Self>> {
        if self.phase() != ManagerPhase::Uninitialized {
            return Err(Error::contract(format!(
                "manager for {} is already initialized",
                self.window
            )));
        }

        let host = &self.context.host;
        if host.name(self.window).unwrap_or_default().is_empty() {
            host.set_name(self.window, &self.context.config.root_window_name);
        }

        let cache = WindowNameCache::new(self.name(), Arc::clone(&self.context.store))
            .with_key(self.context.config.cache_key.clone())
            .init()?;
        let remembered = cache.names().to_vec();
        self.context.registry.attach(self.window, Arc::clone(self));
        {
            let mut state = self.state.lock();
            state.cache = Some(cache);
            state.phase = ManagerPhase::Initialized;
        }

        let weak = Arc::downgrade(self);
        host.on_unload(
            self.window,
            Box::new(move || {
                if let Some(manager) = weak.upgrade() {
                    manager.handle_unload();
                }
            }),
        );

        log::info!(
            "window manager ready for {} ({}), restoring {} children",
            self.name(),
            self.window,
            remembered.len()
        );
        for name in remembered {
            if let Err(e) = self.open("", Some(name.as_str())) {
                log::warn!("{} could not restore child {:?}: {}", self.window, name, e);
            }
        }
        Ok(Arc::clone(self))
    }

    /// Opens a child window.
    ///
    /// An empty `link` is a restore attempt: the host is asked for the named
    /// window without navigating, and if all it produced is a blank page the
    /// window is closed again and forgotten.
    ///
    /// Once the host has produced a window the outcome is returned even if
    /// the cache could not be written; the cache then still matches the store.
    pub fn open(&self, link: &str, name: Option<&str>) -> Result<Option<WindowId>> {
        let target = match name {
            Some(name) if !name.is_empty() => name,
            _ => link,
        };
        let features = self.context.config.window.to_string();
        let host = &self.context.host;

        let Some(child) = host.open(self.window, link, target, &features) else {
            log::debug!("open of {:?} from {} was declined", target, self.window);
            return Ok(None);
        };
        self.add_child(child);

        if !link.is_empty() {
            let child_name = host.name(child).unwrap_or_else(|| target.to_string());
            if let Err(e) = self.with_cache(|cache| cache.add_name(&child_name)) {
                log::warn!("{} opened but not remembered: {}", child, e);
            }
            return Ok(Some(child));
        }

        if host.document_url(child).as_deref() != Some(BLANK_URL) {
            return Ok(Some(child));
        }
        log::debug!("restored window {:?} has no document, discarding", target);
        host.close(child);
        if let Err(e) = self.with_cache(|cache| cache.remove_name(target)) {
            log::warn!("discarded window {:?} is still remembered: {}", target, e);
        }
        Ok(None)
    }

    /// Adds `child` and drops every child the host reports closed.
    pub fn add_child(&self, child: WindowId) {
        // Host queries run without the state lock held.
        let snapshot = {
            let mut state = self.state.lock();
            if !state.children.contains(&child) {
                state.children.push(child);
            }
            state.children.clone()
        };
        let closed: Vec<WindowId> = snapshot
            .into_iter()
            .filter(|kid| self.context.host.is_closed(*kid))
            .collect();
        self.state
            .lock()
            .children
            .retain(|kid| !closed.contains(kid));
    }

    /// Forgets every child named `name`, both live and cached.
    pub fn pop_child(&self, name: &str) -> Result<()> {
        let named: Vec<WindowId> = self
            .children()
            .into_iter()
            .filter(|kid| self.context.host.name(*kid).as_deref() == Some(name))
            .collect();
        let mut state = self.state.lock();
        state.children.retain(|kid| !named.contains(kid));
        if let Some(cache) = state.cache.as_mut() {
            cache.remove_name(name)?;
        }
        Ok(())
    }

    /// Closes every descendant, most recently opened child first, each
    /// subtree bottom-up. A nonzero `depth` also closes this window last.
    ///
    /// A failing child does not stop its siblings from closing; the first
    /// error is returned once the whole level has been visited.
    pub fn recursively_close(&self, depth: u32) -> Result<()> {
        let snapshot = self.children();
        let mut first_error = None;

        for child in snapshot.iter().rev() {
            if self.context.host.is_closed(*child) {
                continue;
            }
            let Some(manager) = self.context.registry.get(*child) else {
                log::debug!("{} has no manager attached, skipping", child);
                continue;
            };
            if let Err(e) = manager.recursively_close(depth.saturating_add(1)) {
                log::warn!("closing subtree of {} failed: {}", child, e);
                first_error.get_or_insert(e);
            }
        }

        if depth != 0 {
            if let Err(e) = self.close() {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn register_unload_callback(&self, callback: impl FnOnce() + Send + 'static) {
        self.state.lock().unload_callbacks.push(Box::new(callback));
    }

    /// Runs a command received through the registry.
    pub fn dispatch(&self, command: ManagerCommand) -> Result<CommandOutcome> {
        match command {
            ManagerCommand::OpenWindow { link, name } => {
                let opened = self.open(&link, name.as_deref())?;
                Ok(CommandOutcome::Opened(opened))
            }
            ManagerCommand::PopChild { name } => {
                self.pop_child(&name)?;
                Ok(CommandOutcome::Done)
            }
            ManagerCommand::RecursivelyClose { depth } => {
                self.recursively_close(depth)?;
                Ok(CommandOutcome::Done)
            }
        }
    }

    pub fn window(&self) -> WindowId {
        self.window
    }

    pub fn parent(&self) -> Option<WindowId> {
        self.parent
    }

    pub fn name(&self) -> String {
        self.context.host.name(self.window).unwrap_or_default()
    }

    pub fn phase(&self) -> ManagerPhase {
        self.state.lock().phase
    }

    pub fn children(&self) -> Vec<WindowId> {
        self.state.lock().children.clone()
    }

    pub fn has_children(&self) -> bool {
        !self.state.lock().children.is_empty()
    }

    /// Child names currently persisted for this window.
    pub fn cached_names(&self) -> Vec<String> {
        self.state
            .lock()
            .cache
            .as_ref()
            .map(|cache| cache.names().to_vec())
            .unwrap_or_default()
    }

    fn parent_manager(&self) -> Option<Arc<WindowManager>> {
        self.parent
            .and_then(|parent| self.context.registry.get(parent))
    }

    fn with_cache(
        &self,
        f: impl FnOnce(&mut WindowNameCache) -> windowtree_cache::CacheResult<()>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        match state.cache.as_mut() {
            Some(cache) => Ok(f(cache)?),
            None => Ok(()),
        }
    }

    /// Detaches from the parent, then asks the host to close this window.
    fn close(&self) -> Result<()> {
        let detached = match self.parent_manager() {
            Some(parent) => parent.pop_child(&self.name()),
            None => Ok(()),
        };
        self.context.host.close(self.window);
        detached
    }

    fn handle_unload(&self) {
        let callbacks = {
            let mut state = self.state.lock();
            if matches!(
                state.phase,
                ManagerPhase::Unloading | ManagerPhase::Detached
            ) {
                return;
            }
            state.phase = ManagerPhase::Unloading;
            std::mem::take(&mut state.unload_callbacks)
        };

        if let Some(parent) = self.parent_manager() {
            if let Err(e) = parent.pop_child(&self.name()) {
                log::warn!("{} could not detach from its parent: {}", self.window, e);
            }
        }
        for callback in callbacks {
            callback();
        }

        self.context.registry.detach_manager(self.window, self);
        self.state.lock().phase = ManagerPhase::Detached;
        log::debug!("{} unloaded", self.window);
    }
}
