//! Capture and restore the router and direct configs as one unit.

use std::path::Path;
use std::sync::Arc;

use crate::config::{
    timestamp_now, CcrSnapshot, ConfigSnapshot, DirectConfig, DirectSnapshot, Provider,
    RouterConfig, RouterRole, UnifiedAppConfig, DEFAULT_LONG_CONTEXT_THRESHOLD,
};
use crate::direct::DirectConfigService;
use crate::error::{ConfigError, Result, Side};
use crate::events::{AppEvent, EventBus};
use crate::router::RouterConfigService;
use crate::store::{self, Transaction};

pub struct SnapshotService {
    router: Arc<RouterConfigService>,
    direct: Arc<DirectConfigService>,
    events: EventBus,
}

impl SnapshotService {
    pub fn new(
        router: Arc<RouterConfigService>,
        direct: Arc<DirectConfigService>,
        events: EventBus,
    ) -> Self {
        Self {
            router,
            direct,
            events,
        }
    }

    /// Both documents must be readable; a failure names the side.
    pub async fn create_snapshot(&self) -> Result<ConfigSnapshot> {
        let (router, direct) = tokio::try_join!(
            async {
                self.router
                    .read_config()
                    .await
                    .map_err(|e| e.on_side(Side::Router))
            },
            async { self.direct.read().await.map_err(|e| e.on_side(Side::Direct)) },
        )?;

        Ok(ConfigSnapshot {
            ccr_config: CcrSnapshot::from(&router),
            direct_config: DirectSnapshot::from(&direct),
            timestamp: timestamp_now(),
        })
    }

    /// Write both documents from `snapshot`, or neither.
    pub async fn restore_from_snapshot(&self, snapshot: &ConfigSnapshot) -> Result<()> {
        let router_path = self.router.config_path();
        let direct_path = self.direct.config_path();

        let router = restored_router(existing(&router_path).await, &snapshot.ccr_config);
        let direct = restored_direct(existing(&direct_path).await, &snapshot.direct_config);

        let mut transaction = Transaction::new();
        transaction
            .stage(&router_path, &router)
            .await
            .map_err(|e| e.on_side(Side::Router))?;
        transaction
            .stage(&direct_path, &direct)
            .await
            .map_err(|e| e.on_side(Side::Direct))?;
        transaction.commit().await.map_err(|(index, e)| {
            let side = if index == 0 { Side::Router } else { Side::Direct };
            e.on_side(side)
        })?;

        self.router.invalidate_cache();
        self.direct.invalidate_cache();
        tracing::info!(
            providers = router.providers.len(),
            direct_configs = direct.direct_configs.len(),
            taken_at = %snapshot.timestamp,
            "Restored configuration from snapshot"
        );
        self.events.publish(AppEvent::RouterConfigChanged);
        self.events.publish(AppEvent::DirectConfigChanged);
        Ok(())
    }

    /// Restore from a backup document (a saved unified config).
    pub async fn restore_from_backup_file(&self, path: &Path) -> Result<ConfigSnapshot> {
        let backup: UnifiedAppConfig = store::read_json(path).await?;
        let snapshot = backup.backup_snapshot.complete().ok_or_else(|| {
            ConfigError::validation(format!(
                "Backup file '{}' contains no configuration snapshot",
                path.display()
            ))
        })?;

        self.restore_from_snapshot(&snapshot).await?;
        Ok(snapshot)
    }
}

/// Current content of a document being replaced. Unreadable documents are
/// overwritten.
async fn existing<T: serde::de::DeserializeOwned + Default>(path: &Path) -> T {
    match store::read_json(path).await {
        Ok(value) => value,
        Err(e) => {
            if !e.is_not_found() {
                tracing::warn!(path = %path.display(), error = %e, "Replacing unreadable document");
            }
            T::default()
        }
    }
}

/// Providers come back as `{name, models}` only; other top-level and Router
/// keys survive.
fn restored_router(mut config: RouterConfig, snapshot: &CcrSnapshot) -> RouterConfig {
    config.providers = snapshot
        .providers
        .iter()
        .map(|p| Provider {
            name: p.name.clone(),
            models: p.models.clone(),
            ..Default::default()
        })
        .collect();

    let routes = &snapshot.router;
    let section = &mut config.router;
    section.set_route(RouterRole::Default, routes.default.clone());
    section.set_route(RouterRole::Background, routes.background.clone());
    section.set_route(RouterRole::Think, routes.think.clone());
    section.set_route(RouterRole::LongContext, routes.long_context.clone());
    section.long_context_threshold = Some(match routes.long_context_threshold {
        0 => DEFAULT_LONG_CONTEXT_THRESHOLD,
        n => n,
    });
    config
}

fn restored_direct(mut config: DirectConfig, snapshot: &DirectSnapshot) -> DirectConfig {
    config.direct_configs = snapshot.direct_configs.clone();
    config.settings = snapshot.settings.clone();
    config
}
