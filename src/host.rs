//! Contract with the environment that actually owns windows.
//!
//! The manager never creates, names or closes a window itself; it asks the
//! host. Everything about a window that can change behind the manager's
//! back (its `closed` flag, its current document) is queried on demand.

use std::fmt;

/// Document URL of a window that never navigated anywhere.
pub const BLANK_URL: &str = "about:blank";

/// Opaque identity of one window context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

/// Handler run once when a window is about to be discarded.
pub type UnloadHandler = Box<dyn FnOnce() + Send>;

pub trait WindowHost: Send + Sync {
    /// Asks `opener` to open `url` in a window called `name`.
    ///
    /// Returns `None` when the request is declined (popup blocking and the
    /// like). A host may hand back an already open window with the same name.
    fn open(&self, opener: WindowId, url: &str, name: &str, features: &str) -> Option<WindowId>;

    /// Closes the window. Unload handlers registered for it run before this
    /// returns. Closing a closed window does nothing.
    fn close(&self, window: WindowId);

    fn is_closed(&self, window: WindowId) -> bool;

    fn name(&self, window: WindowId) -> Option<String>;

    fn set_name(&self, window: WindowId, name: &str);

    /// The window that opened `window`, if any.
    fn opener(&self, window: WindowId) -> Option<WindowId>;

    /// URL of the window's current document, `None` if it cannot be read.
    fn document_url(&self, window: WindowId) -> Option<String>;

    /// Subscribes `handler` to the window's unload notification.
    fn on_unload(&self, window: WindowId, handler: UnloadHandler);
}
