//! Hot reload of the instance configuration file
//!
//! Editors often write a file in several steps, so each modify event waits briefly before the file
//! is re-read. A file that fails to load or validate is reported and the running config is kept.
//! Reloads that produce the config already in effect are not forwarded.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::ModuleConfig;

const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Yields a fresh [`ModuleConfig`] each time the file changes to something new and valid
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
    rx: mpsc::Receiver<ModuleConfig>,
}

impl ConfigWatcher {
    /// Load `config_path` and start watching it
    pub async fn new(config_path: String) -> Result<(Self, ModuleConfig)> {
        let initial = ModuleConfig::load(&config_path)
            .await
            .context("Failed to load initial config")?;

        let (tx, rx) = mpsc::channel(10);
        let last = Arc::new(Mutex::new(initial.clone()));
        let path = PathBuf::from(&config_path);

        // notify calls back on its own thread, outside the runtime
        let runtime = tokio::runtime::Handle::current();
        let watched = path.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    error!("Config watch error: {}", e);
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            let ours = |p: &PathBuf| p.file_name() == watched.file_name();
            if !event.paths.is_empty() && !event.paths.iter().any(ours) {
                return;
            }
            debug!("Config file event: {:?}", event.kind);

            let tx = tx.clone();
            let last = Arc::clone(&last);
            let path = watched.clone();
            runtime.spawn(async move {
                tokio::time::sleep(SETTLE_DELAY).await;
                reload(&path, &last, &tx).await;
            });
        })?;

        watcher
            .watch(Path::new(&config_path), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config file: {}", config_path))?;

        info!("👀 Watching {} for changes", config_path);

        Ok((
            Self {
                _watcher: watcher,
                path,
                rx,
            },
            initial,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next changed config, or `None` once the watcher is gone
    pub async fn next_config(&mut self) -> Option<ModuleConfig> {
        self.rx.recv().await
    }
}

async fn reload(path: &Path, last: &Mutex<ModuleConfig>, tx: &mpsc::Sender<ModuleConfig>) {
    let config = match ModuleConfig::load(&path.to_string_lossy()).await {
        Ok(config) => config,
        Err(e) => {
            warn!("Keeping current config, reload failed: {:#}", e);
            return;
        }
    };

    {
        let mut last = last.lock();
        if *last == config {
            debug!("Config file rewritten without changes");
            return;
        }
        *last = config.clone();
    }

    info!("🔁 Configuration reloaded");
    if tx.send(config).await.is_err() {
        debug!("Config receiver closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelId;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initial_load_and_reload() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("atem.yaml");
        fs::write(&config_path, "host: 10.0.0.1\nmodel_id: 0\n")?;

        let (mut watcher, config) =
            ConfigWatcher::new(config_path.to_string_lossy().to_string()).await?;
        assert_eq!(config.host, "10.0.0.1");
        assert!(config.model_id.is_auto());
        assert_eq!(watcher.path(), config_path.as_path());

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&config_path, "host: 10.0.0.2\nmodel_id: 12\nfade_fps: 25\n")?;

        // File events are not delivered on every platform; only check what arrives
        let reloaded = tokio::time::timeout(Duration::from_secs(2), watcher.next_config()).await;
        if let Ok(Some(reloaded)) = reloaded {
            assert_eq!(reloaded.host, "10.0.0.2");
            assert_eq!(reloaded.model_id, ModelId::MINI);
            assert_eq!(reloaded.fade_fps, 25);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.yaml");
        assert!(ConfigWatcher::new(path.to_string_lossy().to_string())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_unchanged_or_invalid_reload_is_not_forwarded() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("atem.yaml");
        fs::write(&path, "host: 10.0.0.1\n")?;

        let current = ModuleConfig::load(&path.to_string_lossy()).await?;
        let last = Mutex::new(current);
        let (tx, mut rx) = mpsc::channel(4);

        reload(&path, &last, &tx).await;
        fs::write(&path, "host: ''\n")?;
        reload(&path, &last, &tx).await;
        assert!(rx.try_recv().is_err());

        fs::write(&path, "host: 10.0.0.9\n")?;
        reload(&path, &last, &tx).await;
        assert_eq!(rx.try_recv().map(|c| c.host).ok().as_deref(), Some("10.0.0.9"));
        Ok(())
    }
}
