use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use ccr_desktop::backup::BackupOptions;
use ccr_desktop::config::{
    DirectConfig, NetworkMode, Provider, ProviderPatch, RouterConfig, RouterRole, WebDavPatch,
    DEFAULT_LONG_CONTEXT_THRESHOLD,
};
use ccr_desktop::ipc::{Envelope, IpcClient, IpcError, IpcLayer, IpcResult};
use ccr_desktop::logging;
use ccr_desktop::paths::{Paths, HOME_ENV};
use ccr_desktop::shutdown::ShutdownCoordinator;
use ccr_desktop::status::{StatusMonitor, StatusSummary, DEFAULT_REFRESH_INTERVAL};
use ccr_desktop::AppContext;

#[derive(Parser, Debug)]
#[command(
    name = "ccr-desktop",
    version,
    about = "Manage Claude Code Router and Claude client configuration"
)]
struct Cli {
    /// Home directory holding .claude, .claude-code-router and .ccr-desktop
    #[arg(long, global = true, env = HOME_ENV)]
    home: Option<PathBuf>,

    /// Print the raw {success, data|error} envelope
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the well-known file locations
    Paths,
    /// Read or replace the router config
    #[command(subcommand)]
    Router(RouterCommand),
    /// Manage router providers
    #[command(subcommand)]
    Provider(ProviderCommand),
    /// Set the default route (`provider,model`; empty clears it)
    Model { value: String },
    /// Set a route: default, background, think or longContext
    Route { role: RouterRole, value: String },
    /// Set the long-context token threshold
    Threshold { value: u64 },
    /// Show the network mode, or switch it
    Mode { mode: Option<NetworkMode> },
    /// Direct-mode API configurations
    #[command(subcommand)]
    Direct(DirectCommand),
    /// Read or write any JSON file (`~` is expanded)
    #[command(subcommand)]
    File(FileCommand),
    /// WebDAV backup target
    #[command(subcommand)]
    Webdav(WebDavCommand),
    /// Back up the app config
    Backup {
        /// Upload to WebDAV instead of the local backups directory
        #[arg(long)]
        webdav: bool,
        /// Skip refreshing the embedded config snapshot
        #[arg(long)]
        no_snapshot: bool,
    },
    /// List backups on the WebDAV server, newest first
    Backups,
    /// Restore router and direct configs from a backup file
    Restore {
        /// Local backup file, or a remote path with --remote
        source: String,
        /// Download `source` from WebDAV and make it the app config
        #[arg(long)]
        remote: bool,
    },
    /// Print the one-line status
    Status,
    /// Follow status changes until interrupted; runs auto-backup meanwhile
    Watch {
        /// Refresh interval in seconds
        #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs())]
        interval: u64,
    },
}

#[derive(Subcommand, Debug)]
enum RouterCommand {
    Show,
    /// Replace the router config with the contents of a JSON file
    Save { file: PathBuf },
}

#[derive(Args, Debug)]
struct ProviderFields {
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    key: Option<String>,
    /// Repeat for each model
    #[arg(long = "model")]
    models: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum ProviderCommand {
    Add {
        name: String,
        #[command(flatten)]
        fields: ProviderFields,
    },
    Update {
        name: String,
        #[command(flatten)]
        fields: ProviderFields,
    },
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum DirectCommand {
    Show,
    /// Replace the direct config with the contents of a JSON file
    Save { file: PathBuf },
    /// Point the client at a named direct config
    Apply { name: String },
}

#[derive(Subcommand, Debug)]
enum FileCommand {
    Read { path: String },
    Write {
        path: String,
        #[arg(value_name = "JSON")]
        content: String,
    },
}

#[derive(Subcommand, Debug)]
enum WebDavCommand {
    /// Show the WebDAV config with the password masked
    Show,
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        remote_path: Option<String>,
    },
    /// Check that the server accepts the credentials
    Test,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_tracing();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let paths = match cli.home {
        Some(home) => Paths::from_home(home),
        None => Paths::discover(),
    };
    tracing::debug!(home = %paths.home().display(), "Resolved home directory");

    let ctx = AppContext::new(paths);
    ctx.run_startup_migrations().await;

    if let Command::Watch { interval } = cli.command {
        watch(ctx, Duration::from_secs(interval.max(1))).await;
        return Ok(ExitCode::SUCCESS);
    }

    let (client, server) = IpcLayer::new();
    let server_task = tokio::spawn(server.run(ctx));
    let out = Output { json: cli.json };

    let code = dispatch(&client, cli.command, out).await?;

    drop(client);
    if let Err(e) = server_task.await {
        tracing::warn!(error = %e, "IPC server task failed");
    }
    Ok(code)
}

async fn dispatch(client: &IpcClient, command: Command, out: Output) -> anyhow::Result<ExitCode> {
    let code = match command {
        Command::Paths => out.print(lift(client.get_paths().await), pretty),
        Command::Router(RouterCommand::Show) => {
            out.print(reply(client.read_router_config().await), pretty)
        }
        Command::Router(RouterCommand::Save { file }) => {
            let config: RouterConfig = read_json_file(&file).await?;
            out.print(reply(client.save_router_config(config).await), |_| {
                "Router config saved".to_string()
            })
        }
        Command::Provider(ProviderCommand::Add { name, fields }) => {
            let provider = Provider {
                name,
                api_base_url: fields.url,
                api_key: fields.key,
                models: fields.models,
                ..Default::default()
            };
            out.print(reply(client.add_provider(provider).await), providers)
        }
        Command::Provider(ProviderCommand::Update { name, fields }) => {
            let patch = ProviderPatch {
                api_base_url: fields.url,
                api_key: fields.key,
                models: (!fields.models.is_empty()).then_some(fields.models),
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to update: pass --url, --key or --model");
            }
            out.print(reply(client.update_provider(name, patch).await), providers)
        }
        Command::Provider(ProviderCommand::Delete { name }) => {
            out.print(reply(client.delete_provider(name).await), providers)
        }
        Command::Model { value } => {
            out.print(reply(client.update_default_model(value).await), routes)
        }
        Command::Route { role, value } => {
            out.print(reply(client.update_route(role, value).await), routes)
        }
        Command::Threshold { value } => out.print(
            reply(client.update_long_context_threshold(value).await),
            routes,
        ),
        Command::Mode { mode: None } => {
            let status = client.detect_network_mode().await;
            out.print(lift(status), |s| s.mode.to_string())
        }
        Command::Mode { mode: Some(mode) } => {
            out.print(reply(client.switch_network_mode(mode).await), |s| {
                format!("Switched to {} mode", s.mode)
            })
        }
        Command::Direct(DirectCommand::Show) => {
            out.print(reply(client.read_direct_config().await), pretty)
        }
        Command::Direct(DirectCommand::Save { file }) => {
            let config: DirectConfig = read_json_file(&file).await?;
            out.print(reply(client.save_direct_config(config).await), |_| {
                "Direct config saved".to_string()
            })
        }
        Command::Direct(DirectCommand::Apply { name }) => {
            out.print(reply(client.apply_direct_config(name).await), |entry| {
                format!("Applied direct config '{}' ({})", entry.name, entry.base_url)
            })
        }
        Command::File(FileCommand::Read { path }) => {
            out.print(reply(client.read_file(path).await), pretty)
        }
        Command::File(FileCommand::Write { path, content }) => {
            let data = serde_json::from_str(&content).context("argument is not valid JSON")?;
            out.print(reply(client.write_file(path, data).await), |_| {
                "Written".to_string()
            })
        }
        Command::Webdav(WebDavCommand::Show) => {
            out.print(reply(client.get_webdav_config().await), pretty)
        }
        Command::Webdav(WebDavCommand::Set {
            server,
            username,
            password,
            remote_path,
        }) => {
            let patch = WebDavPatch {
                server,
                username,
                password,
                remote_path,
            };
            out.print(reply(client.set_webdav_config(patch).await), pretty)
        }
        Command::Webdav(WebDavCommand::Test) => {
            out.print(reply(client.test_webdav().await), |_| {
                "WebDAV connection OK".to_string()
            })
        }
        Command::Backup {
            webdav,
            no_snapshot,
        } => {
            let options = BackupOptions {
                use_webdav: webdav,
                update_snapshot: !no_snapshot,
            };
            out.print(reply(client.backup(options).await), |outcome| {
                format!("Backup written: {}", outcome.file_name)
            })
        }
        Command::Backups => out.print(reply(client.list_remote_backups().await), |list| {
            if list.is_empty() {
                return "No remote backups".to_string();
            }
            list.iter()
                .map(|b| format!("{}\t{} bytes", b.name, b.size))
                .collect::<Vec<_>>()
                .join("\n")
        }),
        Command::Restore {
            source,
            remote: true,
        } => out.print(reply(client.restore_from_remote(source).await), |_| {
            "App config restored from WebDAV".to_string()
        }),
        Command::Restore {
            source,
            remote: false,
        } => out.print(
            reply(
                client.restore_from_backup_file(source).await,
            ),
            |snapshot| format!("Restored snapshot taken at {}", snapshot.timestamp),
        ),
        Command::Status => {
            let status = client.get_status().await;
            out.print(lift(status), |s| s.label.clone())
        }
        Command::Watch { .. } => ExitCode::SUCCESS,
    };
    Ok(code)
}

/// Print status lines until Ctrl-C. Auto-backup runs alongside.
async fn watch(ctx: AppContext, interval: Duration) {
    let coordinator = ShutdownCoordinator::new();
    let monitor = StatusMonitor::spawn(
        std::sync::Arc::clone(&ctx.status),
        &ctx.events,
        interval,
        coordinator.handle(),
    )
    .await;

    let backups = std::sync::Arc::clone(&ctx.backups);
    let backup_shutdown = coordinator.handle();
    let backup_task = tokio::spawn(async move { backups.run_auto_backup(backup_shutdown).await });

    let mut updates = monitor.subscribe();
    print_status(&monitor.current());
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let summary = updates.borrow_and_update().clone();
                print_status(&summary);
            }
        }
    }

    coordinator.signal();
    monitor.join().await;
    if let Err(e) = backup_task.await {
        tracing::warn!(error = %e, "Auto-backup task failed");
    }
}

fn print_status(summary: &StatusSummary) {
    println!("{}", summary.label);
}

#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn print<T: Serialize>(self, envelope: Envelope<T>, human: impl FnOnce(&T) -> String) -> ExitCode {
        if self.json {
            match serde_json::to_string_pretty(&envelope) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error: failed to encode response: {}", e),
            }
        } else if let Some(data) = &envelope.data {
            println!("{}", human(data));
        } else {
            eprintln!(
                "Error [{}]: {}",
                envelope.code.unwrap_or("UNKNOWN"),
                envelope.error.as_deref().unwrap_or("unknown error")
            );
            if let Some(suggestion) = &envelope.suggestion {
                eprintln!("{}", suggestion.message);
                if let Ok(template) = serde_json::to_string_pretty(&suggestion.template) {
                    eprintln!("{}", template);
                }
            }
        }

        if envelope.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

fn reply<T>(result: IpcResult<T>) -> Envelope<T> {
    result.into()
}

/// For commands that cannot fail past the transport.
fn lift<T>(result: Result<T, IpcError>) -> Envelope<T> {
    match result {
        Ok(data) => Envelope::ok(data),
        Err(e) => Envelope::from_ipc_error(e),
    }
}

fn pretty<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("<unprintable: {}>", e))
}

fn providers(config: &RouterConfig) -> String {
    if config.providers.is_empty() {
        return "No providers".to_string();
    }
    config
        .providers
        .iter()
        .map(|p| {
            format!(
                "{}\t{}\t{}",
                p.name,
                p.api_base_url.as_deref().unwrap_or("-"),
                p.models.join(",")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn routes(config: &RouterConfig) -> String {
    let mut lines: Vec<String> = RouterRole::all()
        .iter()
        .map(|role| match config.router.route(*role) {
            "" => format!("{}: -", role),
            route => format!("{}: {}", role, route),
        })
        .collect();
    lines.push(format!(
        "longContextThreshold: {}",
        config
            .router
            .long_context_threshold
            .unwrap_or(DEFAULT_LONG_CONTEXT_THRESHOLD)
    ));
    lines.join("\n")
}

async fn read_json_file<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> anyhow::Result<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}
