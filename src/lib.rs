//! Window tree lifecycle management.
//!
//! Tracks the windows opened transitively from a root window so that
//! closing an ancestor closes every descendant furthest-first, and so that
//! a reloaded window can find the children it had opened before.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let context = TreeContext::new(host, WindowRegistry::new(), store, TreeConfig::load());
//! let manager = WindowManager::bootstrap(root, context.clone())?;
//!
//! manager.open("https://example.test/report", Some("report"))?;
//! manager.register_unload_callback(|| log::info!("root going away"));
//!
//! // On logout, close everything the root opened.
//! manager.recursively_close(0)?;
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod manager;
pub mod registry;
pub mod sim;

pub use command::{CommandOutcome, ManagerCommand};
pub use config::{TreeConfig, WindowFeatures};
pub use error::{Error, Result};
pub use host::{BLANK_URL, UnloadHandler, WindowHost, WindowId};
pub use manager::{ManagerPhase, TreeContext, UnloadCallback, WindowManager};
pub use registry::WindowRegistry;
pub use windowtree_cache::{
    CacheError, FileStore, MemoryStore, NameTable, PersistenceStore, WindowNameCache,
};
