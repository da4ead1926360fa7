//! Local and WebDAV backups of the unified app config.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::UnifiedAppConfig;
use crate::error::{ConfigError, Result};
use crate::paths::Paths;
use crate::shutdown::ShutdownHandle;
use crate::snapshot::SnapshotService;
use crate::store;
use crate::unified::UnifiedConfigService;
use crate::webdav::{Depth, WebDavClient, WebDavStore};

pub const BACKUP_PREFIX: &str = "ccr-desktop-backup-";
const BACKUP_EXTENSION: &str = ".json";
const SECONDS_PER_HOUR: u64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupOptions {
    pub use_webdav: bool,
    /// Refresh the embedded snapshot before writing.
    pub update_snapshot: bool,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            use_webdav: false,
            update_snapshot: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BackupLocation {
    Local { path: PathBuf },
    WebDav { url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupOutcome {
    pub file_name: String,
    pub location: BackupLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteBackup {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub modified: Option<DateTime<FixedOffset>>,
}

/// Result of moving backups out of the legacy directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationReport {
    pub copied: Vec<String>,
    /// Names already present in the new directory; the legacy copy is dropped.
    pub already_present: Vec<String>,
    pub failed: Vec<String>,
    pub removed_legacy_dir: bool,
}

pub struct BackupService {
    paths: Paths,
    unified: Arc<UnifiedConfigService>,
    snapshots: Arc<SnapshotService>,
    webdav: Arc<WebDavStore>,
}

impl BackupService {
    pub fn new(
        paths: Paths,
        unified: Arc<UnifiedConfigService>,
        snapshots: Arc<SnapshotService>,
        webdav: Arc<WebDavStore>,
    ) -> Self {
        Self {
            paths,
            unified,
            snapshots,
            webdav,
        }
    }

    pub async fn backup(&self, options: BackupOptions) -> Result<BackupOutcome> {
        if options.update_snapshot {
            self.refresh_snapshot().await;
        }

        let config = self.unified.read().await?;
        let file_name = backup_file_name(Utc::now());

        let location = if options.use_webdav {
            self.upload(config, &file_name).await?
        } else {
            let path = self.paths.backups_dir().join(&file_name);
            store::write_json(&path, &config).await?;
            BackupLocation::Local { path }
        };

        tracing::info!(file = %file_name, webdav = options.use_webdav, "Backup created");
        Ok(BackupOutcome {
            file_name,
            location,
        })
    }

    /// Backups in the configured remote directory, newest first.
    pub async fn list_remote_backups(&self) -> Result<Vec<RemoteBackup>> {
        let config = self.webdav.get().await?;
        let client = WebDavClient::new(&config)?;

        let mut backups: Vec<RemoteBackup> = client
            .list(&config.remote_path, Depth::One)
            .await?
            .into_iter()
            .filter(|entry| !entry.is_dir && is_backup_name(&entry.name))
            .map(|entry| RemoteBackup {
                name: entry.name,
                path: entry.path,
                size: entry.size,
                modified: entry.modified,
            })
            .collect();

        backups.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(backups)
    }

    /// Download a remote backup and make it the unified config.
    pub async fn restore_from_remote(&self, remote_path: &str) -> Result<UnifiedAppConfig> {
        let config = self.webdav.get().await?;
        let client = WebDavClient::new(&config)?;
        let bytes = client.get(remote_path).await?;

        let restored: UnifiedAppConfig =
            serde_json::from_slice(&bytes).map_err(|e| ConfigError::Parse {
                path: PathBuf::from(remote_path),
                message: e.to_string(),
            })?;

        store::write_atomic(&self.paths.unified_config(), &bytes).await?;
        self.unified.invalidate_cache();
        tracing::info!(remote = %remote_path, "Restored app config from WebDAV");
        Ok(restored)
    }

    /// Move `*.json` files from the legacy backups directory. Per-file
    /// failures are recorded and skipped.
    pub async fn migrate_legacy_backups(&self) -> Result<MigrationReport> {
        let legacy = self.paths.legacy_backups_dir();
        let mut report = MigrationReport::default();
        if !tokio::fs::try_exists(&legacy).await.unwrap_or(false) {
            return Ok(report);
        }

        let target_dir = self.paths.backups_dir();
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|e| store::write_error(&target_dir, e))?;

        let mut entries = tokio::fs::read_dir(&legacy)
            .await
            .map_err(|e| store::read_error(&legacy, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| store::read_error(&legacy, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(BACKUP_EXTENSION) {
                continue;
            }

            let source = entry.path();
            let target = target_dir.join(&name);
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                report.already_present.push(name);
            } else if let Err(e) = tokio::fs::copy(&source, &target).await {
                tracing::warn!(file = %name, error = %e, "Failed to migrate legacy backup");
                report.failed.push(name);
                continue;
            } else {
                report.copied.push(name);
            }

            if let Err(e) = tokio::fs::remove_file(&source).await {
                tracing::warn!(path = %source.display(), error = %e, "Failed to remove legacy backup");
            }
        }

        // Only succeeds once the directory is empty.
        report.removed_legacy_dir = tokio::fs::remove_dir(&legacy).await.is_ok();

        tracing::info!(
            copied = report.copied.len(),
            failed = report.failed.len(),
            removed_dir = report.removed_legacy_dir,
            "Migrated legacy backups"
        );
        Ok(report)
    }

    /// Back up locally every `backupInterval` hours while `autoBackup` is on.
    /// The settings are re-read each cycle.
    pub async fn run_auto_backup(&self, shutdown: ShutdownHandle) {
        loop {
            let hours = match self.unified.read().await {
                Ok(config) => config.app_settings.backup_interval.max(1),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read auto-backup settings");
                    24
                }
            };
            let period = Duration::from_secs(u64::from(hours) * SECONDS_PER_HOUR);

            tokio::select! {
                _ = shutdown.wait() => break,
                _ = tokio::time::sleep(period) => {}
            }

            let enabled = self
                .unified
                .read()
                .await
                .map(|c| c.app_settings.auto_backup)
                .unwrap_or(false);
            if !enabled {
                continue;
            }

            if let Err(e) = self.backup(BackupOptions::default()).await {
                tracing::warn!(error = %e, "Automatic backup failed");
            }
        }
        tracing::debug!("Auto-backup loop stopped");
    }

    async fn refresh_snapshot(&self) {
        match self.snapshots.create_snapshot().await {
            Ok(snapshot) => {
                if let Err(e) = self.unified.update_snapshot(snapshot).await {
                    tracing::warn!(error = %e, "Failed to store config snapshot");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to create config snapshot"),
        }
    }

    async fn upload(&self, config: UnifiedAppConfig, file_name: &str) -> Result<BackupLocation> {
        let webdav = self.webdav.get().await?;
        let client = WebDavClient::new(&webdav)?;

        let config = self.unified.save(config).await?;
        let bytes = store::to_pretty_json(&config)?;

        client.ensure_dir(&webdav.remote_path).await?;
        let remote = format!("{}/{}", webdav.remote_path.trim_end_matches('/'), file_name);
        client.put(&remote, bytes).await?;

        Ok(BackupLocation::WebDav {
            url: client.url_for(&remote),
        })
    }
}

/// `ccr-desktop-backup-2024-05-01T12-00-00-000Z.json`
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}{}{}", BACKUP_PREFIX, stamp, BACKUP_EXTENSION)
}

fn is_backup_name(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn file_name_replaces_colons_and_dots() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 15).unwrap();
        assert_eq!(
            backup_file_name(now),
            "ccr-desktop-backup-2024-05-01T12-30-15-000Z.json"
        );
    }

    #[test]
    fn backup_name_filter() {
        assert!(is_backup_name("ccr-desktop-backup-x.json"));
        assert!(!is_backup_name("settings-backup-x.json"));
        assert!(!is_backup_name("ccr-desktop-backup-x.json.bak"));
    }
}
