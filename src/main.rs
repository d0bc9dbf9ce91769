//! Scripted walk through the window tree against the simulated host.
//!
//! Opens a small tree, reloads the root, restores it, then closes
//! everything from the root. The name cache lives in the file store, so a
//! second run starts by trying to restore whatever the first one left.

use std::sync::Arc;

use anyhow::{Context, Result};
use windowtree::sim::SimulatedHost;
use windowtree::{
    FileStore, TreeConfig, TreeContext, WindowHost, WindowManager, WindowRegistry,
};
use windowtree_cache::storage::default_storage_root;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TreeConfig::load();
    let store = FileStore::new(default_storage_root(), config.store_profile.clone());
    let host = SimulatedHost::new();
    let context = TreeContext::new(
        Arc::new(host.clone()),
        WindowRegistry::global(),
        Arc::new(store),
        config,
    );
    host.set_page_loader(context.page_loader());

    let root = host.create_root("https://windowtree.test/");
    let manager = WindowManager::bootstrap(root, context.clone())
        .context("failed to start root window manager")?;

    let settings = manager
        .open("https://windowtree.test/settings", Some("settings"))?
        .context("settings window was blocked")?;
    manager.open("https://windowtree.test/report", Some("report"))?;
    if let Some(settings_manager) = context.registry().get(settings) {
        settings_manager.open("https://windowtree.test/settings/advanced", Some("advanced"))?;
    }
    log::info!(
        "tree open: root children {:?}, {} managers attached",
        manager.cached_names(),
        context.registry().window_count()
    );

    host.reload(root);
    let manager = context
        .registry()
        .get(root)
        .context("root manager missing after reload")?;
    log::info!("after reload root restored {:?}", manager.cached_names());

    manager.recursively_close(0)?;
    let closed: Vec<String> = host
        .closed_order()
        .into_iter()
        .filter_map(|window| host.name(window))
        .collect();
    log::info!("closed in order: {}", closed.join(", "));
    Ok(())
}
