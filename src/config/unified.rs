//! This application's own document (`~/.ccr-desktop/config.json`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::claude_settings::NetworkMode;
use super::credentials::SecureString;
use super::direct::DirectConfigEntry;
use super::snapshot::{CcrSnapshot, ConfigSnapshot, DirectSnapshot};

pub const DEFAULT_REMOTE_PATH: &str = "/ccr-backups";
const CURRENT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedAppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub last_modified: String,
    #[serde(default)]
    pub direct_configs: Vec<DirectConfigEntry>,
    #[serde(default)]
    pub webdav_config: WebDavConfig,
    #[serde(default)]
    pub app_settings: AppSettings,
    #[serde(default)]
    pub backup_snapshot: BackupSnapshot,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UnifiedAppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            last_modified: String::new(),
            direct_configs: Vec::new(),
            webdav_config: WebDavConfig::default(),
            app_settings: AppSettings::default(),
            backup_snapshot: BackupSnapshot::default(),
            extra: Map::new(),
        }
    }
}

fn default_version() -> String {
    CURRENT_VERSION.to_string()
}

impl UnifiedAppConfig {
    /// Shallow-merge one section. Only fields present in the patch change;
    /// arrays are replaced, never concatenated.
    pub fn apply(&mut self, patch: SectionPatch) {
        match patch {
            SectionPatch::AppSettings(p) => p.apply(&mut self.app_settings),
            SectionPatch::WebDav(p) => p.apply(&mut self.webdav_config),
            SectionPatch::DirectConfigs(entries) => self.direct_configs = entries,
            SectionPatch::BackupSnapshot(snapshot) => {
                self.backup_snapshot = BackupSnapshot::from(snapshot)
            }
        }
    }
}

/// WebDAV server credentials and target directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDavConfig {
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: SecureString,
    #[serde(default = "default_remote_path")]
    pub remote_path: String,
}

impl Default for WebDavConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            username: String::new(),
            password: SecureString::default(),
            remote_path: default_remote_path(),
        }
    }
}

fn default_remote_path() -> String {
    DEFAULT_REMOTE_PATH.to_string()
}

impl WebDavConfig {
    /// Server, username and password are all set.
    pub fn is_complete(&self) -> bool {
        !self.server.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }

    /// Copy safe to hand to a display surface.
    pub fn masked(&self) -> Self {
        Self {
            password: self.password.masked(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebDavPatch {
    pub server: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub remote_path: Option<String>,
}

impl WebDavPatch {
    pub fn apply(self, config: &mut WebDavConfig) {
        if let Some(server) = self.server {
            config.server = server;
        }
        if let Some(username) = self.username {
            config.username = username;
        }
        if let Some(password) = self.password {
            config.password = SecureString::new(password);
        }
        if let Some(remote_path) = self.remote_path {
            config.remote_path = remote_path;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub network_mode: NetworkMode,
    #[serde(default)]
    pub default_direct_config: String,
    #[serde(default)]
    pub auto_backup: bool,
    /// Hours between automatic backups.
    #[serde(default = "default_backup_interval")]
    pub backup_interval: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            network_mode: NetworkMode::Proxy,
            default_direct_config: String::new(),
            auto_backup: false,
            backup_interval: default_backup_interval(),
        }
    }
}

fn default_backup_interval() -> u32 {
    24
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettingsPatch {
    pub network_mode: Option<NetworkMode>,
    pub default_direct_config: Option<String>,
    pub auto_backup: Option<bool>,
    pub backup_interval: Option<u32>,
}

impl AppSettingsPatch {
    fn apply(self, settings: &mut AppSettings) {
        if let Some(mode) = self.network_mode {
            settings.network_mode = mode;
        }
        if let Some(name) = self.default_direct_config {
            settings.default_direct_config = name;
        }
        if let Some(auto) = self.auto_backup {
            settings.auto_backup = auto;
        }
        if let Some(hours) = self.backup_interval {
            settings.backup_interval = hours;
        }
    }
}

/// Snapshot embedded in the unified config. All fields are `null` until the
/// first backup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    #[serde(default)]
    pub ccr_config: Option<CcrSnapshot>,
    #[serde(default)]
    pub direct_config: Option<DirectSnapshot>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl BackupSnapshot {
    /// Complete snapshot, if both halves are present.
    pub fn complete(&self) -> Option<ConfigSnapshot> {
        Some(ConfigSnapshot {
            ccr_config: self.ccr_config.clone()?,
            direct_config: self.direct_config.clone()?,
            timestamp: self.timestamp.clone().unwrap_or_default(),
        })
    }
}

impl From<ConfigSnapshot> for BackupSnapshot {
    fn from(snapshot: ConfigSnapshot) -> Self {
        Self {
            ccr_config: Some(snapshot.ccr_config),
            direct_config: Some(snapshot.direct_config),
            timestamp: Some(snapshot.timestamp),
        }
    }
}

/// One typed update per section of [`UnifiedAppConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum SectionPatch {
    AppSettings(AppSettingsPatch),
    WebDav(WebDavPatch),
    DirectConfigs(Vec<DirectConfigEntry>),
    BackupSnapshot(ConfigSnapshot),
}
