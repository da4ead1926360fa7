//! Shared test utilities: a throwaway home directory and a mock WebDAV server.

#![allow(dead_code, unused_imports)]

pub mod mock_webdav;

use std::path::{Path, PathBuf};

use ccr_desktop::paths::Paths;
use ccr_desktop::AppContext;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A temp directory standing in for `$HOME`.
pub struct TestHome {
    dir: TempDir,
    pub paths: Paths,
}

impl TestHome {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp home");
        let paths = Paths::from_home(dir.path());
        Self { dir, paths }
    }

    /// Home seeded with the sample router config.
    pub fn with_router() -> Self {
        let home = Self::new();
        home.write_json(&home.paths.router_config(), &router_config_json());
        home
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn context(&self) -> AppContext {
        AppContext::new(self.paths.clone())
    }

    pub fn write_json(&self, path: &Path, value: &Value) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        let text = serde_json::to_string_pretty(value).expect("Failed to encode JSON");
        std::fs::write(path, text).expect("Failed to write JSON");
    }

    pub fn read_json(&self, path: &Path) -> Value {
        let text = std::fs::read_to_string(path).expect("Failed to read JSON");
        serde_json::from_str(&text).expect("File is not valid JSON")
    }

    pub fn settings_env(&self) -> Value {
        self.read_json(&self.paths.client_settings())["env"].clone()
    }
}

/// Two providers, default route on the first, plus a key this crate does not
/// model.
pub fn router_config_json() -> Value {
    json!({
        "LOG": true,
        "Providers": [
            {
                "name": "openrouter",
                "api_base_url": "https://openrouter.ai/api/v1/chat/completions",
                "api_key": "sk-or",
                "models": ["anthropic/claude-sonnet-4", "google/gemini-2.5-pro"],
                "transformer": {"use": ["openrouter"]}
            },
            {
                "name": "deepseek",
                "api_base_url": "https://api.deepseek.com/chat/completions",
                "api_key": "sk-ds",
                "models": ["deepseek-chat", "deepseek-reasoner"]
            }
        ],
        "Router": {
            "default": "openrouter,anthropic/claude-sonnet-4",
            "think": "deepseek,deepseek-reasoner",
            "longContextThreshold": 60000
        }
    })
}

/// Two direct configs; `work` authenticates with an API key and is the
/// default.
pub fn direct_config_json() -> Value {
    json!({
        "directConfigs": [
            {
                "name": "official",
                "baseUrl": "https://api.anthropic.com",
                "apiKey": "tok-official",
                "useApiKey": false
            },
            {
                "name": "work",
                "baseUrl": "https://gateway.work.test/",
                "apiKey": "sk-work",
                "useApiKey": true,
                "isDefault": true
            }
        ],
        "settings": {}
    })
}
