// Reload watcher
//
// Watches the config file for changes and rebuilds the registry. Any
// failure (unreadable file, bad YAML, schema compilation) is logged and the
// previously active registry stays in service; a bad edit never takes the
// server down.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config;
use crate::registry::{RegistryHandle, ToolRegistry};

/// Debounce window: editors often emit several events per save.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// A running reload watcher.
///
/// Dropping this stops the underlying filesystem watcher.
pub struct ReloadWatcher {
    _watcher: RecommendedWatcher,
}

/// Watch `path` and swap the registry on every successful reload.
///
/// The parent directory is watched rather than the file itself: editors
/// that replace files by rename would otherwise detach the watch.
pub fn spawn(path: PathBuf, registry: RegistryHandle) -> Result<ReloadWatcher> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let file_name = path.file_name().map(|n| n.to_os_string());

    let (tx, rx) = mpsc::channel::<()>(8);

    // Forward relevant notify events into the tokio channel; the notify
    // callback runs on its own thread.
    let mut watcher = RecommendedWatcher::new(
        move |result: std::result::Result<Event, notify::Error>| {
            let Ok(event) = result else { return };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }
            let concerns_config = event
                .paths
                .iter()
                .any(|p| p.file_name().map(|n| Some(n.to_os_string()) == file_name) == Some(true));
            if concerns_config {
                let _ = tx.try_send(());
            }
        },
        notify::Config::default(),
    )
    .context("Failed to create filesystem watcher")?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    tracing::info!(path = %path.display(), "Watching tool config for changes");

    tokio::spawn(reload_loop(rx, path, registry));

    Ok(ReloadWatcher { _watcher: watcher })
}

async fn reload_loop(mut rx: mpsc::Receiver<()>, path: PathBuf, registry: RegistryHandle) {
    while rx.recv().await.is_some() {
        // Coalesce bursts of events into one reload
        tokio::time::sleep(DEBOUNCE).await;
        while rx.try_recv().is_ok() {}

        reload(&path, &registry).await;
    }
}

/// One reload attempt: load, build, swap. The swap only happens after the
/// new registry is fully built, so callers never observe a partial set.
pub async fn reload(path: &Path, registry: &RegistryHandle) {
    let config = match config::load(path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(error = %err, "Reload failed to load config; keeping active tools");
            return;
        }
    };

    match ToolRegistry::build(&config.tools) {
        Ok(rebuilt) => {
            let count = rebuilt.len();
            registry.swap(rebuilt).await;
            tracing::info!(tools = count, "Reloaded tool config");
        }
        Err(err) => {
            tracing::warn!(error = %err, "Reload failed to compile tools; keeping active tools");
        }
    }
}
