//! One-line summary of where client traffic currently goes.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::NetworkMode;
use crate::direct::DirectConfigService;
use crate::events::EventBus;
use crate::network::NetworkModeResolver;
use crate::router::RouterConfigService;
use crate::shutdown::ShutdownHandle;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

const PROXY_PREFIX: &str = "🔗 Proxy";
const DIRECT_PREFIX: &str = "🔌 Direct";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub mode: NetworkMode,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Direct-config entry in use, when one is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_config: Option<String>,
}

impl StatusSummary {
    fn new(mode: NetworkMode, detail: &str) -> Self {
        let prefix = match mode {
            NetworkMode::Proxy => PROXY_PREFIX,
            NetworkMode::Direct => DIRECT_PREFIX,
        };
        Self {
            mode,
            label: format!("{} | {}", prefix, detail),
            provider: None,
            model: None,
            direct_config: None,
        }
    }
}

pub struct StatusService {
    router: Arc<RouterConfigService>,
    direct: Arc<DirectConfigService>,
    network: Arc<NetworkModeResolver>,
}

impl StatusService {
    pub fn new(
        router: Arc<RouterConfigService>,
        direct: Arc<DirectConfigService>,
        network: Arc<NetworkModeResolver>,
    ) -> Self {
        Self {
            router,
            direct,
            network,
        }
    }

    /// Never fails: unreadable documents render as `unavailable`.
    pub async fn current(&self) -> StatusSummary {
        let status = self.network.detect().await;
        match status.mode {
            NetworkMode::Proxy => self.proxy_summary().await,
            NetworkMode::Direct => self.direct_summary().await,
        }
    }

    async fn proxy_summary(&self) -> StatusSummary {
        let config = match self.router.read_config().await {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!(error = %e, "Router config unavailable for status");
                return StatusSummary::new(NetworkMode::Proxy, "unavailable");
            }
        };

        match config.default_route() {
            Some((provider, model)) => StatusSummary {
                provider: Some(provider.to_string()),
                model: Some(model.to_string()),
                ..StatusSummary::new(NetworkMode::Proxy, &format!("{}/{}", provider, model))
            },
            None => StatusSummary::new(NetworkMode::Proxy, "no model set"),
        }
    }

    async fn direct_summary(&self) -> StatusSummary {
        let entry = match self.network.match_current_direct_config().await {
            Some(entry) => Some(entry),
            None => match self.direct.read_or_default().await {
                Ok(config) => config.default_entry().cloned(),
                Err(e) => {
                    tracing::debug!(error = %e, "Direct config unavailable for status");
                    return StatusSummary::new(NetworkMode::Direct, "unavailable");
                }
            },
        };

        match entry {
            Some(entry) => StatusSummary {
                direct_config: Some(entry.name.clone()),
                ..StatusSummary::new(NetworkMode::Direct, &entry.name)
            },
            None => StatusSummary::new(NetworkMode::Direct, "official API"),
        }
    }
}

/// Background task keeping a [`StatusSummary`] fresh on a timer and on
/// every configuration change.
pub struct StatusMonitor {
    receiver: watch::Receiver<StatusSummary>,
    task: JoinHandle<()>,
}

impl StatusMonitor {
    pub async fn spawn(
        service: Arc<StatusService>,
        events: &EventBus,
        interval: Duration,
        shutdown: ShutdownHandle,
    ) -> Self {
        let (sender, receiver) = watch::channel(service.current().await);
        let mut changes = events.subscribe();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial value is
            // already published.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    _ = ticker.tick() => {}
                    change = changes.recv() => match change {
                        Ok(event) => tracing::trace!(?event, "Refreshing status after change"),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "Status monitor lagged behind events");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }

                let summary = service.current().await;
                sender.send_if_modified(|current| {
                    if *current == summary {
                        return false;
                    }
                    tracing::debug!(label = %summary.label, "Status changed");
                    *current = summary;
                    true
                });
            }
            tracing::debug!("Status monitor stopped");
        });

        Self { receiver, task }
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSummary> {
        self.receiver.clone()
    }

    pub fn current(&self) -> StatusSummary {
        self.receiver.borrow().clone()
    }

    /// Wait for the task to exit after shutdown was signalled.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Status monitor task failed");
        }
    }
}
