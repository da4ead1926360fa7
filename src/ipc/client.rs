use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::backup::{BackupOptions, BackupOutcome, RemoteBackup};
use crate::config::{
    ConfigSnapshot, DirectConfig, DirectConfigEntry, NetworkMode, Provider, ProviderPatch,
    RouterConfig, RouterRole, UnifiedAppConfig, WebDavConfig, WebDavPatch,
};
use crate::error::ConfigError;
use crate::network::NetworkStatus;
use crate::paths::PathInfo;
use crate::status::StatusSummary;

use super::types::{IpcCommand, IpcError};

const IPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Outer error: transport. Inner error: the operation itself.
pub type IpcResult<T> = Result<Result<T, ConfigError>, IpcError>;

#[derive(Clone)]
pub struct IpcClient {
    sender: mpsc::Sender<IpcCommand>,
}

impl IpcClient {
    pub fn new(sender: mpsc::Sender<IpcCommand>) -> Self {
        Self { sender }
    }

    pub async fn read_router_config(&self) -> IpcResult<RouterConfig> {
        self.call(|respond_to| IpcCommand::ReadRouterConfig { respond_to })
            .await
    }

    pub async fn save_router_config(&self, config: RouterConfig) -> IpcResult<()> {
        self.call(|respond_to| IpcCommand::SaveRouterConfig { config, respond_to })
            .await
    }

    pub async fn add_provider(&self, provider: Provider) -> IpcResult<RouterConfig> {
        self.call(|respond_to| IpcCommand::AddProvider {
            provider,
            respond_to,
        })
        .await
    }

    pub async fn update_provider(
        &self,
        name: String,
        patch: ProviderPatch,
    ) -> IpcResult<RouterConfig> {
        self.call(|respond_to| IpcCommand::UpdateProvider {
            name,
            patch,
            respond_to,
        })
        .await
    }

    pub async fn delete_provider(&self, name: String) -> IpcResult<RouterConfig> {
        self.call(|respond_to| IpcCommand::DeleteProvider { name, respond_to })
            .await
    }

    pub async fn update_default_model(&self, value: String) -> IpcResult<RouterConfig> {
        self.call(|respond_to| IpcCommand::UpdateDefaultModel { value, respond_to })
            .await
    }

    pub async fn update_route(&self, role: RouterRole, value: String) -> IpcResult<RouterConfig> {
        self.call(|respond_to| IpcCommand::UpdateRoute {
            role,
            value,
            respond_to,
        })
        .await
    }

    pub async fn update_long_context_threshold(&self, threshold: u64) -> IpcResult<RouterConfig> {
        self.call(|respond_to| IpcCommand::UpdateLongContextThreshold {
            threshold,
            respond_to,
        })
        .await
    }

    pub async fn detect_network_mode(&self) -> Result<NetworkStatus, IpcError> {
        self.call(|respond_to| IpcCommand::DetectNetworkMode { respond_to })
            .await
    }

    pub async fn switch_network_mode(&self, mode: NetworkMode) -> IpcResult<NetworkStatus> {
        self.call(|respond_to| IpcCommand::SwitchNetworkMode { mode, respond_to })
            .await
    }

    pub async fn read_direct_config(&self) -> IpcResult<DirectConfig> {
        self.call(|respond_to| IpcCommand::ReadDirectConfig { respond_to })
            .await
    }

    pub async fn save_direct_config(&self, config: DirectConfig) -> IpcResult<()> {
        self.call(|respond_to| IpcCommand::SaveDirectConfig { config, respond_to })
            .await
    }

    pub async fn apply_direct_config(&self, name: String) -> IpcResult<DirectConfigEntry> {
        self.call(|respond_to| IpcCommand::ApplyDirectConfig { name, respond_to })
            .await
    }

    /// Read any JSON file. A leading `~` is expanded.
    pub async fn read_file(&self, path: String) -> IpcResult<Value> {
        self.call(|respond_to| IpcCommand::ReadFile { path, respond_to })
            .await
    }

    pub async fn write_file(&self, path: String, data: Value) -> IpcResult<()> {
        self.call(|respond_to| IpcCommand::WriteFile {
            path,
            data,
            respond_to,
        })
        .await
    }

    pub async fn get_paths(&self) -> Result<PathInfo, IpcError> {
        self.call(|respond_to| IpcCommand::GetPaths { respond_to })
            .await
    }

    /// The password comes back masked.
    pub async fn get_webdav_config(&self) -> IpcResult<WebDavConfig> {
        self.call(|respond_to| IpcCommand::GetWebDavConfig { respond_to })
            .await
    }

    pub async fn set_webdav_config(&self, patch: WebDavPatch) -> IpcResult<WebDavConfig> {
        self.call(|respond_to| IpcCommand::SetWebDavConfig { patch, respond_to })
            .await
    }

    pub async fn test_webdav(&self) -> IpcResult<()> {
        self.call(|respond_to| IpcCommand::TestWebDav { respond_to })
            .await
    }

    pub async fn backup(&self, options: BackupOptions) -> IpcResult<BackupOutcome> {
        self.call(|respond_to| IpcCommand::Backup {
            options,
            respond_to,
        })
        .await
    }

    pub async fn list_remote_backups(&self) -> IpcResult<Vec<RemoteBackup>> {
        self.call(|respond_to| IpcCommand::ListRemoteBackups { respond_to })
            .await
    }

    pub async fn restore_from_backup_file(&self, path: String) -> IpcResult<ConfigSnapshot> {
        self.call(|respond_to| IpcCommand::RestoreFromBackupFile { path, respond_to })
            .await
    }

    pub async fn restore_from_remote(&self, path: String) -> IpcResult<UnifiedAppConfig> {
        self.call(|respond_to| IpcCommand::RestoreFromRemote { path, respond_to })
            .await
    }

    pub async fn get_status(&self) -> Result<StatusSummary, IpcError> {
        self.call(|respond_to| IpcCommand::GetStatus { respond_to })
            .await
    }

    async fn call<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> IpcCommand,
    ) -> Result<T, IpcError> {
        let (respond_to, receiver) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .await
            .map_err(|_| IpcError::Disconnected)?;

        recv_with_timeout(receiver).await
    }
}

async fn recv_with_timeout<T>(receiver: oneshot::Receiver<T>) -> Result<T, IpcError> {
    match tokio::time::timeout(IPC_TIMEOUT, receiver).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(IpcError::Disconnected),
        Err(_) => Err(IpcError::Timeout),
    }
}
