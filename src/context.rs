use std::sync::Arc;

use crate::backup::BackupService;
use crate::direct::DirectConfigService;
use crate::events::EventBus;
use crate::network::NetworkModeResolver;
use crate::paths::Paths;
use crate::router::RouterConfigService;
use crate::snapshot::SnapshotService;
use crate::status::StatusService;
use crate::unified::UnifiedConfigService;
use crate::webdav::WebDavStore;

/// One instance of every service, wired to a shared [`EventBus`].
#[derive(Clone)]
pub struct AppContext {
    pub paths: Paths,
    pub events: EventBus,
    pub router: Arc<RouterConfigService>,
    pub direct: Arc<DirectConfigService>,
    pub network: Arc<NetworkModeResolver>,
    pub unified: Arc<UnifiedConfigService>,
    pub snapshots: Arc<SnapshotService>,
    pub webdav: Arc<WebDavStore>,
    pub backups: Arc<BackupService>,
    pub status: Arc<StatusService>,
}

impl AppContext {
    pub fn new(paths: Paths) -> Self {
        let events = EventBus::new();

        let router = Arc::new(RouterConfigService::new(paths.clone(), events.clone()));
        let direct = Arc::new(DirectConfigService::new(paths.clone(), events.clone()));
        let network = Arc::new(NetworkModeResolver::new(
            paths.clone(),
            Arc::clone(&direct),
            events.clone(),
        ));
        let unified = Arc::new(UnifiedConfigService::new(paths.clone(), events.clone()));
        let snapshots = Arc::new(SnapshotService::new(
            Arc::clone(&router),
            Arc::clone(&direct),
            events.clone(),
        ));
        let webdav = Arc::new(WebDavStore::new(paths.clone(), events.clone()));
        let backups = Arc::new(BackupService::new(
            paths.clone(),
            Arc::clone(&unified),
            Arc::clone(&snapshots),
            Arc::clone(&webdav),
        ));
        let status = Arc::new(StatusService::new(
            Arc::clone(&router),
            Arc::clone(&direct),
            Arc::clone(&network),
        ));

        Self {
            paths,
            events,
            router,
            direct,
            network,
            unified,
            snapshots,
            webdav,
            backups,
            status,
        }
    }

    /// Move files left behind by older versions. Failures are logged only.
    pub async fn run_startup_migrations(&self) {
        self.webdav.migrate_legacy().await;
        if let Err(e) = self.backups.migrate_legacy_backups().await {
            tracing::warn!(error = %e, "Legacy backup migration failed");
        }
    }
}
