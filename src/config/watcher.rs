use std::path::Path;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::AppConfig;

/// Watches the config file and broadcasts every successfully reloaded
/// configuration.
pub struct ConfigWatcher {
    config_path: String,
    _watcher: RecommendedWatcher,
    reload_tx: broadcast::Sender<AppConfig>,
}

impl ConfigWatcher {
    pub fn new(config_path: &str) -> Result<Self> {
        let (reload_tx, _) = broadcast::channel(16);

        let reload_tx_clone = reload_tx.clone();
        let path = config_path.to_string();

        // notify invokes the handler on its own thread, outside the runtime
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) if event.kind.is_modify() => {
                    info!("Configuration file changed, reloading...");

                    match AppConfig::load_from(&path) {
                        Ok(new_config) => {
                            if let Err(e) = reload_tx_clone.send(new_config) {
                                warn!("No active config reload subscribers: {}", e);
                            } else {
                                info!("Configuration reloaded successfully");
                            }
                        }
                        Err(e) => {
                            error!("Failed to reload configuration: {}", e);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("File watcher error: {}", e);
                }
            },
            Config::default(),
        )?;

        watcher.watch(Path::new(config_path), RecursiveMode::NonRecursive)?;
        info!("Started watching configuration file: {}", config_path);

        Ok(ConfigWatcher {
            config_path: config_path.to_string(),
            _watcher: watcher,
            reload_tx,
        })
    }

    pub fn config_path(&self) -> &str {
        &self.config_path
    }

    pub fn subscribe_to_reloads(&self) -> broadcast::Receiver<AppConfig> {
        self.reload_tx.subscribe()
    }
}
