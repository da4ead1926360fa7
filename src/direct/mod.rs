use std::path::PathBuf;

use crate::config::DirectConfig;
use crate::error::{ConfigError, Result};
use crate::events::{AppEvent, EventBus};
use crate::paths::Paths;
use crate::store::{self, DocumentCache};

/// Read/save access to the direct-connection profiles.
pub struct DirectConfigService {
    paths: Paths,
    cache: DocumentCache<DirectConfig>,
    events: EventBus,
}

impl DirectConfigService {
    pub fn new(paths: Paths, events: EventBus) -> Self {
        Self {
            paths,
            cache: DocumentCache::new(),
            events,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.paths.direct_config()
    }

    pub async fn read(&self) -> Result<DirectConfig> {
        let path = self.config_path();
        if let Some(config) = self.cache.get(&path).await {
            return Ok(config);
        }

        let config: DirectConfig = store::read_json(&path).await?;
        self.cache.store(&path, config.clone()).await;
        Ok(config)
    }

    /// Like [`read`](Self::read), but a missing file reads as an empty config.
    pub async fn read_or_default(&self) -> Result<DirectConfig> {
        match self.read().await {
            Err(e) if e.is_not_found() => Ok(DirectConfig::default()),
            other => other,
        }
    }

    pub async fn save(&self, config: &DirectConfig) -> Result<()> {
        config.validate().map_err(ConfigError::validation)?;

        let path = self.config_path();
        store::write_json(&path, config).await?;
        self.cache.store(&path, config.clone()).await;

        tracing::info!(
            path = %path.display(),
            entries = config.direct_configs.len(),
            "Saved direct config"
        );
        self.events.publish(AppEvent::DirectConfigChanged);
        Ok(())
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectConfigEntry;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> DirectConfigService {
        DirectConfigService::new(Paths::from_home(dir.path()), EventBus::new())
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir);
        assert!(service.read().await.unwrap_err().is_not_found());
        assert_eq!(service.read_or_default().await.unwrap(), DirectConfig::default());
    }

    #[tokio::test]
    async fn save_rejects_unnamed_entries() {
        let dir = TempDir::new().unwrap();
        let config = DirectConfig {
            direct_configs: vec![DirectConfigEntry::default()],
            ..Default::default()
        };
        let err = service(&dir).save(&config).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(!dir.path().join(".claude").exists());
    }

    #[tokio::test]
    async fn save_publishes_change() {
        let dir = TempDir::new().unwrap();
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let service = DirectConfigService::new(Paths::from_home(dir.path()), events);

        service.save(&DirectConfig::default()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), AppEvent::DirectConfigChanged);
        assert_eq!(service.read().await.unwrap(), DirectConfig::default());
    }
}
