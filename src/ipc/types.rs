use serde_json::Value;
use tokio::sync::oneshot;

use crate::backup::{BackupOptions, BackupOutcome, RemoteBackup};
use crate::config::{
    ConfigSnapshot, DirectConfig, DirectConfigEntry, NetworkMode, Provider, ProviderPatch,
    RouterConfig, RouterRole, UnifiedAppConfig, WebDavConfig, WebDavPatch,
};
use crate::error::ConfigError;
use crate::network::NetworkStatus;
use crate::paths::PathInfo;
use crate::status::StatusSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcError {
    Disconnected,
    Timeout,
}

impl IpcError {
    pub fn code(&self) -> &'static str {
        match self {
            IpcError::Disconnected => "IPC_DISCONNECTED",
            IpcError::Timeout => "IPC_TIMEOUT",
        }
    }
}

impl std::fmt::Display for IpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IpcError::Disconnected => write!(f, "IPC channel disconnected"),
            IpcError::Timeout => write!(f, "IPC request timed out"),
        }
    }
}

impl std::error::Error for IpcError {}

/// Server-side reply to a fallible command.
pub type Reply<T> = oneshot::Sender<Result<T, ConfigError>>;

pub enum IpcCommand {
    ReadRouterConfig {
        respond_to: Reply<RouterConfig>,
    },
    SaveRouterConfig {
        config: RouterConfig,
        respond_to: Reply<()>,
    },
    AddProvider {
        provider: Provider,
        respond_to: Reply<RouterConfig>,
    },
    UpdateProvider {
        name: String,
        patch: ProviderPatch,
        respond_to: Reply<RouterConfig>,
    },
    DeleteProvider {
        name: String,
        respond_to: Reply<RouterConfig>,
    },
    UpdateDefaultModel {
        value: String,
        respond_to: Reply<RouterConfig>,
    },
    UpdateRoute {
        role: RouterRole,
        value: String,
        respond_to: Reply<RouterConfig>,
    },
    UpdateLongContextThreshold {
        threshold: u64,
        respond_to: Reply<RouterConfig>,
    },
    DetectNetworkMode {
        respond_to: oneshot::Sender<NetworkStatus>,
    },
    SwitchNetworkMode {
        mode: NetworkMode,
        respond_to: Reply<NetworkStatus>,
    },
    ReadDirectConfig {
        respond_to: Reply<DirectConfig>,
    },
    SaveDirectConfig {
        config: DirectConfig,
        respond_to: Reply<()>,
    },
    ApplyDirectConfig {
        name: String,
        respond_to: Reply<DirectConfigEntry>,
    },
    ReadFile {
        path: String,
        respond_to: Reply<Value>,
    },
    WriteFile {
        path: String,
        data: Value,
        respond_to: Reply<()>,
    },
    GetPaths {
        respond_to: oneshot::Sender<PathInfo>,
    },
    GetWebDavConfig {
        respond_to: Reply<WebDavConfig>,
    },
    SetWebDavConfig {
        patch: WebDavPatch,
        respond_to: Reply<WebDavConfig>,
    },
    TestWebDav {
        respond_to: Reply<()>,
    },
    Backup {
        options: BackupOptions,
        respond_to: Reply<BackupOutcome>,
    },
    ListRemoteBackups {
        respond_to: Reply<Vec<RemoteBackup>>,
    },
    RestoreFromBackupFile {
        path: String,
        respond_to: Reply<ConfigSnapshot>,
    },
    RestoreFromRemote {
        path: String,
        respond_to: Reply<UnifiedAppConfig>,
    },
    GetStatus {
        respond_to: oneshot::Sender<StatusSummary>,
    },
}

impl IpcCommand {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadRouterConfig { .. } => "ReadRouterConfig",
            Self::SaveRouterConfig { .. } => "SaveRouterConfig",
            Self::AddProvider { .. } => "AddProvider",
            Self::UpdateProvider { .. } => "UpdateProvider",
            Self::DeleteProvider { .. } => "DeleteProvider",
            Self::UpdateDefaultModel { .. } => "UpdateDefaultModel",
            Self::UpdateRoute { .. } => "UpdateRoute",
            Self::UpdateLongContextThreshold { .. } => "UpdateLongContextThreshold",
            Self::DetectNetworkMode { .. } => "DetectNetworkMode",
            Self::SwitchNetworkMode { .. } => "SwitchNetworkMode",
            Self::ReadDirectConfig { .. } => "ReadDirectConfig",
            Self::SaveDirectConfig { .. } => "SaveDirectConfig",
            Self::ApplyDirectConfig { .. } => "ApplyDirectConfig",
            Self::ReadFile { .. } => "ReadFile",
            Self::WriteFile { .. } => "WriteFile",
            Self::GetPaths { .. } => "GetPaths",
            Self::GetWebDavConfig { .. } => "GetWebDavConfig",
            Self::SetWebDavConfig { .. } => "SetWebDavConfig",
            Self::TestWebDav { .. } => "TestWebDav",
            Self::Backup { .. } => "Backup",
            Self::ListRemoteBackups { .. } => "ListRemoteBackups",
            Self::RestoreFromBackupFile { .. } => "RestoreFromBackupFile",
            Self::RestoreFromRemote { .. } => "RestoreFromRemote",
            Self::GetStatus { .. } => "GetStatus",
        }
    }
}
