use crate::config::{WebDavConfig, WebDavPatch};
use crate::error::Result;
use crate::events::{AppEvent, EventBus};
use crate::paths::Paths;
use crate::store::{self, DocumentCache};

/// Persisted WebDAV credentials. The password only leaves this type through
/// [`get`](Self::get), which is for building clients.
pub struct WebDavStore {
    paths: Paths,
    cache: DocumentCache<WebDavConfig>,
    events: EventBus,
}

impl WebDavStore {
    pub fn new(paths: Paths, events: EventBus) -> Self {
        Self {
            paths,
            cache: DocumentCache::new(),
            events,
        }
    }

    /// Stored config with the real password. A missing file yields defaults.
    pub async fn get(&self) -> Result<WebDavConfig> {
        self.migrate_legacy().await;

        let path = self.paths.webdav_config();
        if let Some(config) = self.cache.get(&path).await {
            return Ok(config);
        }

        match store::read_json::<WebDavConfig>(&path).await {
            Ok(config) => {
                self.cache.store(&path, config.clone()).await;
                Ok(config)
            }
            Err(e) if e.is_not_found() => Ok(WebDavConfig::default()),
            Err(e) => Err(e),
        }
    }

    /// Stored config with the password replaced by a mask.
    pub async fn get_masked(&self) -> Result<WebDavConfig> {
        Ok(self.get().await?.masked())
    }

    /// Merge `patch` into the stored config and save. Returns the masked
    /// result.
    pub async fn set(&self, patch: WebDavPatch) -> Result<WebDavConfig> {
        let mut config = self.get().await?;
        patch.apply(&mut config);

        let path = self.paths.webdav_config();
        store::write_json(&path, &config).await?;
        self.cache.store(&path, config.clone()).await;

        tracing::info!(path = %path.display(), server = %config.server, "Saved WebDAV config");
        self.events.publish(AppEvent::WebDavConfigChanged);
        Ok(config.masked())
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Move a config left in the router's directory by older versions.
    /// Best effort: failures are logged and the legacy file is kept.
    pub async fn migrate_legacy(&self) -> bool {
        let legacy = self.paths.legacy_webdav_config();
        if !tokio::fs::try_exists(&legacy).await.unwrap_or(false) {
            return false;
        }

        tracing::info!(from = %legacy.display(), "Migrating legacy WebDAV config");
        let config = match store::read_json::<WebDavConfig>(&legacy).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read legacy WebDAV config");
                return false;
            }
        };

        let target = self.paths.webdav_config();
        if let Err(e) = store::write_json(&target, &config).await {
            tracing::warn!(error = %e, "Failed to write migrated WebDAV config");
            return false;
        }
        self.cache.invalidate();

        if let Err(e) = tokio::fs::remove_file(&legacy).await {
            tracing::warn!(path = %legacy.display(), error = %e, "Failed to remove legacy WebDAV config");
        }
        true
    }
}
