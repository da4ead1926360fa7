//! CRUD over the router's providers and routing rules.

use std::path::PathBuf;

use crate::config::{
    default_router_template, split_route, Provider, ProviderPatch, RouterConfig, RouterRole,
};
use crate::error::{ConfigError, Entity, Result, Suggestion};
use crate::events::{AppEvent, EventBus};
use crate::paths::Paths;
use crate::store::{self, DocumentCache};

pub struct RouterConfigService {
    paths: Paths,
    cache: DocumentCache<RouterConfig>,
    events: EventBus,
}

impl RouterConfigService {
    pub fn new(paths: Paths, events: EventBus) -> Self {
        Self {
            paths,
            cache: DocumentCache::new(),
            events,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.paths.router_config()
    }

    /// Read the router config. A missing file carries a [`Suggestion`] with
    /// the directory to create and a starter document.
    pub async fn read_config(&self) -> Result<RouterConfig> {
        let path = self.config_path();
        if let Some(config) = self.cache.get(&path).await {
            return Ok(config);
        }

        let config: RouterConfig = store::read_json(&path)
            .await
            .map_err(|e| self.with_suggestion(e))?;
        self.cache.store(&path, config.clone()).await;
        Ok(config)
    }

    pub async fn save_config(&self, config: &RouterConfig) -> Result<()> {
        let path = self.config_path();
        store::write_json(&path, config).await?;
        self.cache.store(&path, config.clone()).await;

        tracing::info!(
            path = %path.display(),
            providers = config.providers.len(),
            "Saved router config"
        );
        self.events.publish(AppEvent::RouterConfigChanged);
        Ok(())
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    pub async fn add_provider(&self, provider: Provider) -> Result<RouterConfig> {
        let has_url = provider
            .api_base_url
            .as_deref()
            .is_some_and(|url| !url.is_empty());
        if provider.name.is_empty() || !has_url {
            return Err(ConfigError::validation(
                "Provider name and api_base_url are required",
            ));
        }

        let mut config = self.read_config().await?;
        if config.provider(&provider.name).is_some() {
            return Err(ConfigError::validation(format!(
                "Provider '{}' already exists",
                provider.name
            )));
        }

        tracing::debug!(provider = %provider.name, models = provider.models.len(), "Adding provider");
        config.providers.push(provider);
        self.save_config(&config).await?;
        Ok(config)
    }

    pub async fn update_provider(&self, name: &str, patch: ProviderPatch) -> Result<RouterConfig> {
        if patch.api_base_url.as_deref() == Some("") {
            return Err(ConfigError::validation("api_base_url cannot be empty"));
        }

        let mut config = self.read_config().await?;
        let provider = config
            .provider_mut(name)
            .ok_or_else(|| ConfigError::entity_not_found(Entity::Provider, name))?;
        patch.apply(provider);

        self.save_config(&config).await?;
        Ok(config)
    }

    /// Remove a provider. A default route pointing at it is cleared.
    pub async fn delete_provider(&self, name: &str) -> Result<RouterConfig> {
        let mut config = self.read_config().await?;
        let index = config
            .providers
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ConfigError::entity_not_found(Entity::Provider, name))?;
        config.providers.remove(index);

        if config.router.default.starts_with(&format!("{},", name)) {
            tracing::debug!(provider = %name, "Clearing default route of deleted provider");
            config.router.default.clear();
        }

        self.save_config(&config).await?;
        Ok(config)
    }

    pub async fn update_default_model(&self, value: &str) -> Result<RouterConfig> {
        self.update_route(RouterRole::Default, value).await
    }

    /// Set a routing slot to `"provider,model"`. An empty value clears it.
    pub async fn update_route(&self, role: RouterRole, value: &str) -> Result<RouterConfig> {
        let mut config = self.read_config().await?;

        if !value.is_empty() {
            let (provider_name, model) = split_route(value).ok_or_else(|| {
                ConfigError::validation(format!(
                    "Route for '{}' must be \"provider,model\", got '{}'",
                    role, value
                ))
            })?;
            let provider = config
                .provider(provider_name)
                .ok_or_else(|| ConfigError::entity_not_found(Entity::Provider, provider_name))?;
            if !provider.models.iter().any(|m| m == model) {
                return Err(ConfigError::entity_not_found(Entity::Model, model));
            }
        }

        config.router.set_route(role, value.to_string());
        self.save_config(&config).await?;
        Ok(config)
    }

    pub async fn update_long_context_threshold(&self, threshold: u64) -> Result<RouterConfig> {
        if threshold == 0 {
            return Err(ConfigError::validation(
                "Long context threshold must be greater than zero",
            ));
        }

        let mut config = self.read_config().await?;
        config.router.long_context_threshold = Some(threshold);
        self.save_config(&config).await?;
        Ok(config)
    }

    fn with_suggestion(&self, error: ConfigError) -> ConfigError {
        match error {
            ConfigError::NotFound { path, .. } => {
                let directory = self.paths.router_config_dir();
                let message = format!(
                    "Create the directory {} and put a config.json in it",
                    directory.display()
                );
                ConfigError::NotFound {
                    path,
                    suggestion: Some(Box::new(Suggestion {
                        directory,
                        message,
                        template: default_router_template(),
                    })),
                }
            }
            other => other,
        }
    }
}
