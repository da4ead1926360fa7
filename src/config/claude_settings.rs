//! The Claude client's `settings.json`.
//!
//! Owned by another program: only the `env` entries below are interpreted,
//! everything else is carried through untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ENV_BASE_URL: &str = "ANTHROPIC_BASE_URL";
pub const ENV_AUTH_TOKEN: &str = "ANTHROPIC_AUTH_TOKEN";
pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Where client traffic goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    /// Through the local ccr router.
    #[default]
    Proxy,
    /// Straight to an upstream provider.
    Direct,
}

impl NetworkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Direct => "direct",
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy)
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proxy" => Ok(Self::Proxy),
            "direct" => Ok(Self::Direct),
            other => Err(format!("unknown network mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientSettings {
    /// String value of an env entry. Non-string values read as absent.
    pub fn env_str(&self, key: &str) -> Option<&str> {
        self.env.as_ref()?.get(key)?.as_str()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.env_str(ENV_BASE_URL)
    }

    pub fn set_env(&mut self, key: &str, value: impl Into<String>) {
        self.env
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), Value::String(value.into()));
    }

    pub fn remove_env(&mut self, key: &str) {
        if let Some(env) = self.env.as_mut() {
            env.shift_remove(key);
        }
    }
}
