//! Reduced, portable projection of the router and direct configs.
//!
//! Provider endpoints and keys are left out; direct-config entries are kept
//! whole, secrets included.

use serde::{Deserialize, Serialize};

use super::direct::{DirectConfig, DirectConfigEntry, DirectSettings};
use super::types::{RouterConfig, DEFAULT_LONG_CONTEXT_THRESHOLD};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub ccr_config: CcrSnapshot,
    pub direct_config: DirectSnapshot,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CcrSnapshot {
    #[serde(default)]
    pub providers: Vec<ProviderSnapshot>,
    #[serde(default)]
    pub router: RouterSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub name: String,
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterSnapshot {
    pub default: String,
    pub background: String,
    pub think: String,
    pub long_context: String,
    pub long_context_threshold: u64,
}

impl Default for RouterSnapshot {
    fn default() -> Self {
        Self {
            default: String::new(),
            background: String::new(),
            think: String::new(),
            long_context: String::new(),
            long_context_threshold: DEFAULT_LONG_CONTEXT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSnapshot {
    #[serde(default)]
    pub direct_configs: Vec<DirectConfigEntry>,
    #[serde(default)]
    pub settings: DirectSettings,
}

impl From<&RouterConfig> for CcrSnapshot {
    fn from(config: &RouterConfig) -> Self {
        let router = &config.router;
        Self {
            providers: config
                .providers
                .iter()
                .map(|p| ProviderSnapshot {
                    name: p.name.clone(),
                    models: p.models.clone(),
                })
                .collect(),
            router: RouterSnapshot {
                default: router.default.clone(),
                background: router.background.clone().unwrap_or_default(),
                think: router.think.clone().unwrap_or_default(),
                long_context: router.long_context.clone().unwrap_or_default(),
                // A zero threshold is treated as unset.
                long_context_threshold: router
                    .long_context_threshold
                    .filter(|t| *t > 0)
                    .unwrap_or(DEFAULT_LONG_CONTEXT_THRESHOLD),
            },
        }
    }
}

impl From<&DirectConfig> for DirectSnapshot {
    fn from(config: &DirectConfig) -> Self {
        Self {
            direct_configs: config.direct_configs.clone(),
            settings: config.settings.clone(),
        }
    }
}
