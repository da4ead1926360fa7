use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::auth::AuthScheme;

/// Direct-connection profiles (`~/.claude/config.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectConfig {
    #[serde(default)]
    pub direct_configs: Vec<DirectConfigEntry>,
    #[serde(default)]
    pub settings: DirectSettings,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSettings {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_config: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectConfigEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub use_api_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DirectConfigEntry {
    pub fn auth_scheme(&self) -> AuthScheme {
        AuthScheme::from_use_api_key(self.use_api_key)
    }
}

impl DirectConfig {
    pub fn find(&self, name: &str) -> Option<&DirectConfigEntry> {
        self.direct_configs.iter().find(|c| c.name == name)
    }

    /// Entry used when nothing more specific applies: the one named by
    /// `settings.defaultConfig`, else the first flagged `isDefault`, else the
    /// first entry.
    pub fn default_entry(&self) -> Option<&DirectConfigEntry> {
        let named = Some(self.settings.default_config.as_str())
            .filter(|name| !name.is_empty())
            .and_then(|name| self.find(name));

        named
            .or_else(|| {
                self.direct_configs
                    .iter()
                    .find(|c| c.is_default == Some(true))
            })
            .or_else(|| self.direct_configs.first())
    }

    /// Entry names must be non-empty and unique.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::new();
        for entry in &self.direct_configs {
            if entry.name.is_empty() {
                return Err("Direct config entries must have a name".to_string());
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(format!("Duplicate direct config name '{}'", entry.name));
            }
        }
        Ok(())
    }
}

/// Strip trailing slashes so `https://x/` and `https://x` compare equal.
pub fn normalize_url(url: &str) -> &str {
    url.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(name: &str, is_default: Option<bool>) -> DirectConfigEntry {
        DirectConfigEntry {
            name: name.to_string(),
            base_url: format!("https://{}.test", name),
            is_default,
            ..Default::default()
        }
    }

    #[test]
    fn default_prefers_named_setting() {
        let mut config = DirectConfig {
            direct_configs: vec![entry("a", None), entry("b", Some(true)), entry("c", None)],
            ..Default::default()
        };
        config.settings.default_config = "c".into();
        assert_eq!(config.default_entry().unwrap().name, "c");
    }

    #[test]
    fn default_falls_back_to_flag_then_first() {
        let mut config = DirectConfig {
            direct_configs: vec![entry("a", None), entry("b", Some(true))],
            ..Default::default()
        };
        config.settings.default_config = "missing".into();
        assert_eq!(config.default_entry().unwrap().name, "b");

        config.direct_configs[1].is_default = Some(false);
        assert_eq!(config.default_entry().unwrap().name, "a");

        assert!(DirectConfig::default().default_entry().is_none());
    }

    #[test]
    fn camel_case_document() {
        let config: DirectConfig = serde_json::from_value(json!({
            "directConfigs": [{"name": "w", "baseUrl": "https://w", "apiKey": "k", "useApiKey": true}],
            "settings": {"defaultConfig": "w", "theme": "dark"}
        }))
        .unwrap();
        assert!(config.direct_configs[0].use_api_key);
        assert_eq!(config.direct_configs[0].auth_scheme(), AuthScheme::ApiKey);
        assert_eq!(config.settings.extra["theme"], json!("dark"));
    }

    #[test]
    fn validate_rejects_duplicates() {
        let config = DirectConfig {
            direct_configs: vec![entry("a", None), entry("a", None)],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn normalize_trailing_slashes() {
        assert_eq!(normalize_url("https://x/"), "https://x");
        assert_eq!(normalize_url("https://x"), "https://x");
    }
}
