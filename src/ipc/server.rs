use tokio::sync::{mpsc, oneshot};

use crate::context::AppContext;
use crate::store;
use crate::webdav::WebDavClient;

use super::types::IpcCommand;

pub struct IpcServer {
    pub(crate) receiver: mpsc::Receiver<IpcCommand>,
}

impl IpcServer {
    pub fn new(receiver: mpsc::Receiver<IpcCommand>) -> Self {
        Self { receiver }
    }

    /// Serve commands one at a time until every client is dropped.
    pub async fn run(mut self, ctx: AppContext) {
        while let Some(command) = self.receiver.recv().await {
            let name = command.name();
            tracing::trace!(command = name, "IPC: handling command");

            match command {
                IpcCommand::ReadRouterConfig { respond_to } => {
                    reply(name, respond_to, ctx.router.read_config().await);
                }
                IpcCommand::SaveRouterConfig { config, respond_to } => {
                    reply(name, respond_to, ctx.router.save_config(&config).await);
                }
                IpcCommand::AddProvider {
                    provider,
                    respond_to,
                } => {
                    reply(name, respond_to, ctx.router.add_provider(provider).await);
                }
                IpcCommand::UpdateProvider {
                    name: provider,
                    patch,
                    respond_to,
                } => {
                    let result = ctx.router.update_provider(&provider, patch).await;
                    reply(name, respond_to, result);
                }
                IpcCommand::DeleteProvider {
                    name: provider,
                    respond_to,
                } => {
                    reply(name, respond_to, ctx.router.delete_provider(&provider).await);
                }
                IpcCommand::UpdateDefaultModel { value, respond_to } => {
                    let result = ctx.router.update_default_model(&value).await;
                    reply(name, respond_to, result);
                }
                IpcCommand::UpdateRoute {
                    role,
                    value,
                    respond_to,
                } => {
                    reply(name, respond_to, ctx.router.update_route(role, &value).await);
                }
                IpcCommand::UpdateLongContextThreshold {
                    threshold,
                    respond_to,
                } => {
                    let result = ctx.router.update_long_context_threshold(threshold).await;
                    reply(name, respond_to, result);
                }
                IpcCommand::DetectNetworkMode { respond_to } => {
                    reply(name, respond_to, ctx.network.detect().await);
                }
                IpcCommand::SwitchNetworkMode { mode, respond_to } => {
                    reply(name, respond_to, ctx.network.switch_to(mode).await);
                }
                IpcCommand::ReadDirectConfig { respond_to } => {
                    reply(name, respond_to, ctx.direct.read_or_default().await);
                }
                IpcCommand::SaveDirectConfig { config, respond_to } => {
                    reply(name, respond_to, ctx.direct.save(&config).await);
                }
                IpcCommand::ApplyDirectConfig {
                    name: config,
                    respond_to,
                } => {
                    let result = ctx.network.apply_direct_config(&config).await;
                    reply(name, respond_to, result);
                }
                IpcCommand::ReadFile { path, respond_to } => {
                    let path = ctx.paths.expand(&path);
                    reply(name, respond_to, store::read_json(&path).await);
                }
                IpcCommand::WriteFile {
                    path,
                    data,
                    respond_to,
                } => {
                    let path = ctx.paths.expand(&path);
                    reply(name, respond_to, store::write_json(&path, &data).await);
                }
                IpcCommand::GetPaths { respond_to } => {
                    reply(name, respond_to, ctx.paths.well_known());
                }
                IpcCommand::GetWebDavConfig { respond_to } => {
                    reply(name, respond_to, ctx.webdav.get_masked().await);
                }
                IpcCommand::SetWebDavConfig { patch, respond_to } => {
                    reply(name, respond_to, ctx.webdav.set(patch).await);
                }
                IpcCommand::TestWebDav { respond_to } => {
                    let result = match ctx.webdav.get().await {
                        Ok(config) => match WebDavClient::new(&config) {
                            Ok(client) => client.test().await,
                            Err(e) => Err(e),
                        },
                        Err(e) => Err(e),
                    };
                    reply(name, respond_to, result);
                }
                IpcCommand::Backup {
                    options,
                    respond_to,
                } => {
                    reply(name, respond_to, ctx.backups.backup(options).await);
                }
                IpcCommand::ListRemoteBackups { respond_to } => {
                    reply(name, respond_to, ctx.backups.list_remote_backups().await);
                }
                IpcCommand::RestoreFromBackupFile { path, respond_to } => {
                    let path = ctx.paths.expand(&path);
                    let result = ctx.snapshots.restore_from_backup_file(&path).await;
                    reply(name, respond_to, result);
                }
                IpcCommand::RestoreFromRemote { path, respond_to } => {
                    reply(name, respond_to, ctx.backups.restore_from_remote(&path).await);
                }
                IpcCommand::GetStatus { respond_to } => {
                    reply(name, respond_to, ctx.status.current().await);
                }
            }
        }
        tracing::debug!("IPC: all clients gone, server stopping");
    }
}

fn reply<T>(command: &'static str, respond_to: oneshot::Sender<T>, value: T) {
    if respond_to.send(value).is_err() {
        tracing::trace!(command, "IPC: response dropped (receiver gone)");
    }
}
