//! Configuration file watcher for hot reload.
//!
//! Reloaded configs are validated before they are sent; a broken edit keeps
//! the running configuration.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::ShimConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<ShimConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<ShimConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// `current` seeds change detection so saving an unchanged file is a no-op.
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self, current: ShimConfig) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let filter = ReloadFilter::new(current);

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(new_config) => {
                            if !filter.accept(&new_config) {
                                tracing::debug!(path = ?path, "Config file touched without changes");
                                return;
                            }
                            tracing::info!(path = ?path, "Config file changed, reloading");
                            if tx.send(new_config).is_err() {
                                tracing::debug!("Config receiver dropped, ignoring reload");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Drops reloads identical to the last accepted config.
///
/// Editors commonly emit several modify events per save.
struct ReloadFilter {
    last: Mutex<ShimConfig>,
}

impl ReloadFilter {
    fn new(current: ShimConfig) -> Self {
        Self {
            last: Mutex::new(current),
        }
    }

    fn accept(&self, candidate: &ShimConfig) -> bool {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *last == *candidate {
            return false;
        }
        *last = candidate.clone();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_filter_skips_duplicates() {
        let filter = ReloadFilter::new(ShimConfig::default());
        assert!(!filter.accept(&ShimConfig::default()));

        let mut changed = ShimConfig::default();
        changed.rewrite.update_canonical = false;
        assert!(filter.accept(&changed));
        assert!(!filter.accept(&changed));
        assert!(filter.accept(&ShimConfig::default()));
    }
}
