//! Proxy/direct detection and switching via the client's `settings.json`.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{
    normalize_url, ClientSettings, DirectConfigEntry, NetworkMode, ENV_API_KEY,
    ENV_AUTH_TOKEN, ENV_BASE_URL, OFFICIAL_API_URL, PROXY_URL,
};
use crate::direct::DirectConfigService;
use crate::error::{ConfigError, Entity, Result};
use crate::events::{AppEvent, EventBus};
use crate::paths::Paths;
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub is_proxy: bool,
    pub mode: NetworkMode,
}

impl From<NetworkMode> for NetworkStatus {
    fn from(mode: NetworkMode) -> Self {
        Self {
            is_proxy: mode.is_proxy(),
            mode,
        }
    }
}

pub struct NetworkModeResolver {
    paths: Paths,
    direct: Arc<DirectConfigService>,
    events: EventBus,
}

impl NetworkModeResolver {
    pub fn new(paths: Paths, direct: Arc<DirectConfigService>, events: EventBus) -> Self {
        Self {
            paths,
            direct,
            events,
        }
    }

    /// Proxy iff the base URL is exactly the local proxy endpoint. Anything
    /// unreadable counts as direct.
    pub async fn detect(&self) -> NetworkStatus {
        let mode = match self.read_settings().await {
            Ok(settings) if settings.base_url() == Some(PROXY_URL) => NetworkMode::Proxy,
            Ok(_) => NetworkMode::Direct,
            Err(e) => {
                tracing::debug!(error = %e, "Client settings unreadable, assuming direct mode");
                NetworkMode::Direct
            }
        };
        NetworkStatus::from(mode)
    }

    pub async fn switch_to(&self, target: NetworkMode) -> Result<NetworkStatus> {
        let mut settings = self.read_settings_or_default().await?;

        match target {
            NetworkMode::Proxy => {
                settings.remove_env(ENV_AUTH_TOKEN);
                settings.set_env(ENV_BASE_URL, PROXY_URL);
            }
            NetworkMode::Direct => {
                let direct = self.direct.read_or_default().await?;
                match direct.default_entry() {
                    Some(entry) => apply_entry(&mut settings, entry),
                    None => {
                        tracing::debug!("No direct config, pointing client at the official API");
                        settings.set_env(ENV_BASE_URL, OFFICIAL_API_URL);
                        settings.set_env(ENV_AUTH_TOKEN, "");
                        settings.remove_env(ENV_API_KEY);
                    }
                }
            }
        }

        self.write_settings(&settings).await?;
        tracing::info!(mode = %target, "Switched network mode");
        self.events.publish(AppEvent::NetworkModeChanged(target));
        Ok(NetworkStatus::from(target))
    }

    /// Point the client at one named direct-config entry.
    pub async fn apply_direct_config(&self, name: &str) -> Result<DirectConfigEntry> {
        let direct = self.direct.read_or_default().await?;
        let entry = direct
            .find(name)
            .cloned()
            .ok_or_else(|| ConfigError::entity_not_found(Entity::DirectConfig, name))?;

        let mut settings = self.read_settings_or_default().await?;
        apply_entry(&mut settings, &entry);
        self.write_settings(&settings).await?;

        tracing::info!(config = %entry.name, "Applied direct config");
        self.events
            .publish(AppEvent::NetworkModeChanged(NetworkMode::Direct));
        Ok(entry)
    }

    /// The direct-config entry the client currently points at, if any.
    ///
    /// URLs are compared without trailing slashes. The API key only takes part
    /// in the comparison for entries that authenticate with one.
    pub async fn match_current_direct_config(&self) -> Option<DirectConfigEntry> {
        let settings = self.read_settings().await.ok()?;
        let base_url = normalize_url(settings.base_url()?);
        let direct = self.direct.read().await.ok()?;
        let api_key = settings.env_str(ENV_API_KEY);

        direct
            .direct_configs
            .into_iter()
            .find(|entry| {
                normalize_url(&entry.base_url) == base_url
                    && (!entry.use_api_key || api_key == Some(entry.api_key.as_str()))
            })
    }

    async fn read_settings(&self) -> Result<ClientSettings> {
        store::read_json(&self.paths.client_settings()).await
    }

    async fn read_settings_or_default(&self) -> Result<ClientSettings> {
        match self.read_settings().await {
            Err(e) if e.is_not_found() => Ok(ClientSettings::default()),
            other => other,
        }
    }

    async fn write_settings(&self, settings: &ClientSettings) -> Result<()> {
        store::write_json(&self.paths.client_settings(), settings).await
    }
}

fn apply_entry(settings: &mut ClientSettings, entry: &DirectConfigEntry) {
    settings.set_env(ENV_BASE_URL, entry.base_url.as_str());
    entry.auth_scheme().apply(settings, &entry.api_key);
}
