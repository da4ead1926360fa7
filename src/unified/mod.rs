//! The application's own settings document.

use crate::config::{timestamp_now, ConfigSnapshot, SectionPatch, UnifiedAppConfig};
use crate::error::Result;
use crate::events::{AppEvent, EventBus};
use crate::paths::Paths;
use crate::store::{self, DocumentCache};

pub struct UnifiedConfigService {
    paths: Paths,
    cache: DocumentCache<UnifiedAppConfig>,
    events: EventBus,
}

impl UnifiedConfigService {
    pub fn new(paths: Paths, events: EventBus) -> Self {
        Self {
            paths,
            cache: DocumentCache::new(),
            events,
        }
    }

    /// Read the document, writing the default one first if it does not exist.
    pub async fn read(&self) -> Result<UnifiedAppConfig> {
        let path = self.paths.unified_config();
        if let Some(config) = self.cache.get(&path).await {
            return Ok(config);
        }

        match store::read_json::<UnifiedAppConfig>(&path).await {
            Ok(config) => {
                self.cache.store(&path, config.clone()).await;
                Ok(config)
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(path = %path.display(), "Creating default app config");
                self.save(UnifiedAppConfig::default()).await
            }
            Err(e) => Err(e),
        }
    }

    /// Stamp `lastModified` and write. Returns the stored document.
    pub async fn save(&self, mut config: UnifiedAppConfig) -> Result<UnifiedAppConfig> {
        config.last_modified = timestamp_now();

        let path = self.paths.unified_config();
        store::write_json(&path, &config).await?;
        self.cache.store(&path, config.clone()).await;

        tracing::debug!(path = %path.display(), "Saved app config");
        self.events.publish(AppEvent::UnifiedConfigChanged);
        Ok(config)
    }

    pub async fn update_section(&self, patch: SectionPatch) -> Result<UnifiedAppConfig> {
        let mut config = self.read().await?;
        config.apply(patch);
        self.save(config).await
    }

    pub async fn update_snapshot(&self, snapshot: ConfigSnapshot) -> Result<UnifiedAppConfig> {
        self.update_section(SectionPatch::BackupSnapshot(snapshot))
            .await
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}
