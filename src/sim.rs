//! In-process window host.
//!
//! Behaves like a browser as far as the manager can tell: named windows are
//! reused, popups can be blocked, windows opened without a URL stay on
//! `about:blank`, and unload handlers fire synchronously on close and
//! reload. A page loader hook stands in for the script every real page runs
//! once it has loaded.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::host::{BLANK_URL, UnloadHandler, WindowHost, WindowId};

/// Hook run after a window finishes loading a real document.
pub type PageLoader = Arc<dyn Fn(WindowId) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Opened(WindowId),
    Closed(WindowId),
    Reloaded(WindowId),
}

#[derive(Clone, Default)]
pub struct SimulatedHost {
    inner: Arc<Mutex<HostInner>>,
}

#[derive(Default)]
struct HostInner {
    windows: BTreeMap<WindowId, SimWindow>,
    next_id: u64,
    popups_blocked: bool,
    loader: Option<PageLoader>,
    requested_features: Vec<String>,
    events: Vec<HostEvent>,
}

struct SimWindow {
    name: String,
    opener: Option<WindowId>,
    url: String,
    closed: bool,
    unload_handlers: Vec<UnloadHandler>,
}

impl HostInner {
    fn insert(&mut self, name: &str, opener: Option<WindowId>, url: &str) -> WindowId {
        self.next_id += 1;
        let id = WindowId::new(self.next_id);
        let url = if url.is_empty() { BLANK_URL } else { url };
        self.windows.insert(
            id,
            SimWindow {
                name: name.to_string(),
                opener,
                url: url.to_string(),
                closed: false,
                unload_handlers: Vec::new(),
            },
        );
        self.events.push(HostEvent::Opened(id));
        id
    }

    fn find_open(&self, name: &str) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|(_, window)| !window.closed && window.name == name)
            .map(|(id, _)| *id)
    }
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a top-level window with no opener and no name. No page
    /// loader runs; the caller bootstraps the root itself.
    pub fn create_root(&self, url: &str) -> WindowId {
        self.inner.lock().insert("", None, url)
    }

    pub fn set_popups_blocked(&self, blocked: bool) {
        self.inner.lock().popups_blocked = blocked;
    }

    pub fn set_page_loader(&self, loader: impl Fn(WindowId) + Send + Sync + 'static) {
        self.inner.lock().loader = Some(Arc::new(loader));
    }

    /// Unloads the window's current document and loads it again.
    pub fn reload(&self, window: WindowId) {
        let (handlers, loader) = {
            let mut inner = self.inner.lock();
            let loader = inner.loader.clone();
            let Some(entry) = inner.windows.get_mut(&window) else {
                return;
            };
            if entry.closed {
                return;
            }
            let handlers = std::mem::take(&mut entry.unload_handlers);
            let has_document = entry.url != BLANK_URL;
            inner.events.push(HostEvent::Reloaded(window));
            (handlers, loader.filter(|_| has_document))
        };
        for handler in handlers {
            handler();
        }
        if let Some(loader) = loader {
            loader(window);
        }
    }

    /// Open window with the given name, if any.
    pub fn window_named(&self, name: &str) -> Option<WindowId> {
        self.inner.lock().find_open(name)
    }

    /// Every feature string passed to `open`, declined requests included.
    pub fn requested_features(&self) -> Vec<String> {
        self.inner.lock().requested_features.clone()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.inner.lock().events.clone()
    }

    /// Windows in the order they were closed.
    pub fn closed_order(&self) -> Vec<WindowId> {
        self.inner
            .lock()
            .events
            .iter()
            .filter_map(|event| match event {
                HostEvent::Closed(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn open_windows(&self) -> Vec<WindowId> {
        self.inner
            .lock()
            .windows
            .iter()
            .filter(|(_, window)| !window.closed)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl WindowHost for SimulatedHost {
    fn open(&self, opener: WindowId, url: &str, name: &str, features: &str) -> Option<WindowId> {
        let (window, loader) = {
            let mut inner = self.inner.lock();
            inner.requested_features.push(features.to_string());
            if inner.popups_blocked {
                return None;
            }
            if !name.is_empty() {
                if let Some(existing) = inner.find_open(name) {
                    if url.is_empty() {
                        return Some(existing);
                    }
                    drop(inner);
                    // Opening a URL into an existing named window navigates it.
                    if let Some(entry) = self.inner.lock().windows.get_mut(&existing) {
                        entry.url = url.to_string();
                    }
                    self.reload(existing);
                    return Some(existing);
                }
            }
            let window = inner.insert(name, Some(opener), url);
            let loader = inner.loader.clone().filter(|_| !url.is_empty());
            (window, loader)
        };
        if let Some(loader) = loader {
            loader(window);
        }
        Some(window)
    }

    fn close(&self, window: WindowId) {
        let handlers = {
            let mut inner = self.inner.lock();
            let Some(entry) = inner.windows.get_mut(&window) else {
                return;
            };
            if entry.closed {
                return;
            }
            entry.closed = true;
            let handlers = std::mem::take(&mut entry.unload_handlers);
            inner.events.push(HostEvent::Closed(window));
            handlers
        };
        for handler in handlers {
            handler();
        }
    }

    fn is_closed(&self, window: WindowId) -> bool {
        self.inner
            .lock()
            .windows
            .get(&window)
            .is_none_or(|entry| entry.closed)
    }

    fn name(&self, window: WindowId) -> Option<String> {
        self.inner
            .lock()
            .windows
            .get(&window)
            .map(|entry| entry.name.clone())
    }

    fn set_name(&self, window: WindowId, name: &str) {
        if let Some(entry) = self.inner.lock().windows.get_mut(&window) {
            entry.name = name.to_string();
        }
    }

    fn opener(&self, window: WindowId) -> Option<WindowId> {
        self.inner
            .lock()
            .windows
            .get(&window)
            .and_then(|entry| entry.opener)
    }

    fn document_url(&self, window: WindowId) -> Option<String> {
        self.inner
            .lock()
            .windows
            .get(&window)
            .map(|entry| entry.url.clone())
    }

    fn on_unload(&self, window: WindowId, handler: UnloadHandler) {
        if let Some(entry) = self.inner.lock().windows.get_mut(&window) {
            entry.unload_handlers.push(handler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_blank_window_for_empty_url() {
        let host = SimulatedHost::new();
        let root = host.create_root("https://app.test/");
        let child = host.open(root, "", "popup", "").unwrap();
        assert_eq!(host.document_url(child).as_deref(), Some(BLANK_URL));
        assert_eq!(host.opener(child), Some(root));
        assert_eq!(host.name(child).as_deref(), Some("popup"));
    }

    #[test]
    fn test_named_window_is_reused() {
        let host = SimulatedHost::new();
        let root = host.create_root("https://app.test/");
        let first = host.open(root, "https://app.test/a", "a", "").unwrap();
        let again = host.open(root, "", "a", "").unwrap();
        assert_eq!(first, again);
        assert_eq!(host.document_url(again).as_deref(), Some("https://app.test/a"));
    }

    #[test]
    fn test_blocked_popup_still_records_features() {
        let host = SimulatedHost::new();
        let root = host.create_root("https://app.test/");
        host.set_popups_blocked(true);
        assert!(host.open(root, "https://app.test/a", "a", "width=1").is_none());
        assert_eq!(host.requested_features(), ["width=1"]);
    }

    #[test]
    fn test_close_runs_unload_handlers_once() {
        let host = SimulatedHost::new();
        let root = host.create_root("https://app.test/");
        let child = host.open(root, "https://app.test/a", "a", "").unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        host.on_unload(
            child,
            Box::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
        );

        host.close(child);
        host.close(child);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(host.is_closed(child));
        assert_eq!(host.closed_order(), [child]);
    }

    #[test]
    fn test_loader_runs_only_for_real_documents() {
        let host = SimulatedHost::new();
        let root = host.create_root("https://app.test/");
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let sink = loaded.clone();
        host.set_page_loader(move |window| sink.lock().push(window));

        let real = host.open(root, "https://app.test/a", "a", "").unwrap();
        host.open(root, "", "blank", "").unwrap();
        host.reload(real);

        assert_eq!(*loaded.lock(), [real, real]);
    }
}
