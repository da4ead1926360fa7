use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Fallback used by snapshots when the router has no threshold set.
pub const DEFAULT_LONG_CONTEXT_THRESHOLD: u64 = 5000;

/// The router's own document (`~/.claude-code-router/config.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(rename = "Providers", default)]
    pub providers: Vec<Provider>,
    #[serde(rename = "Router", default)]
    pub router: RouterSection,
    /// `LOG`, `OPENAI_*`, `HOST`, ... preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RouterConfig {
    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn provider_mut(&mut self, name: &str) -> Option<&mut Provider> {
        self.providers.iter_mut().find(|p| p.name == name)
    }

    /// `Router.default` split into `(provider, model)` when well formed.
    pub fn default_route(&self) -> Option<(&str, &str)> {
        split_route(&self.router.default)
    }
}

/// Split `"provider,model"`. Both halves must be non-empty and there must be
/// exactly one comma.
pub(crate) fn split_route(value: &str) -> Option<(&str, &str)> {
    let (provider, model) = value.split_once(',')?;
    if provider.is_empty() || model.is_empty() || model.contains(',') {
        return None;
    }
    Some((provider, model))
}

/// Upstream API endpoint with its model list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    /// `transformer` and other router-specific keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields a provider update may change. Renaming is not supported.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProviderPatch {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub models: Option<Vec<String>>,
}

impl ProviderPatch {
    pub fn is_empty(&self) -> bool {
        self.api_base_url.is_none() && self.api_key.is_none() && self.models.is_none()
    }

    pub(crate) fn apply(self, provider: &mut Provider) {
        if let Some(url) = self.api_base_url {
            provider.api_base_url = Some(url);
        }
        if let Some(key) = self.api_key {
            provider.api_key = Some(key);
        }
        if let Some(models) = self.models {
            provider.models = models;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterSection {
    #[serde(default)]
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub think: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_context_threshold: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RouterSection {
    pub fn route(&self, role: RouterRole) -> &str {
        match role {
            RouterRole::Default => &self.default,
            RouterRole::Background => self.background.as_deref().unwrap_or(""),
            RouterRole::Think => self.think.as_deref().unwrap_or(""),
            RouterRole::LongContext => self.long_context.as_deref().unwrap_or(""),
        }
    }

    pub fn set_route(&mut self, role: RouterRole, value: String) {
        match role {
            RouterRole::Default => self.default = value,
            RouterRole::Background => self.background = Some(value),
            RouterRole::Think => self.think = Some(value),
            RouterRole::LongContext => self.long_context = Some(value),
        }
    }
}

/// Routing slots of the `Router` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterRole {
    Default,
    Background,
    Think,
    LongContext,
}

impl RouterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Background => "background",
            Self::Think => "think",
            Self::LongContext => "longContext",
        }
    }

    pub fn all() -> &'static [RouterRole] {
        &[
            Self::Default,
            Self::Background,
            Self::Think,
            Self::LongContext,
        ]
    }
}

impl fmt::Display for RouterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouterRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "background" => Ok(Self::Background),
            "think" => Ok(Self::Think),
            "longContext" | "long-context" | "long_context" => Ok(Self::LongContext),
            other => Err(format!(
                "unknown router role '{}', expected one of: default, background, think, longContext",
                other
            )),
        }
    }
}

/// Starter document offered when the router config does not exist.
pub fn default_router_template() -> Value {
    json!({
        "LOG": false,
        "OPENAI_API_KEY": "",
        "OPENAI_BASE_URL": "",
        "OPENAI_MODEL": "",
        "Providers": [
            {
                "name": "your_provider",
                "api_base_url": "https://api.example.com",
                "api_key": "your_api_key",
                "models": ["model1", "model2"]
            }
        ],
        "Router": {
            "default": "your_provider,model1"
        }
    })
}
