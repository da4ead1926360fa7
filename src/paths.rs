//! Well-known file locations, all derived from a single home directory.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "CCR_DESKTOP_HOME";

const ROUTER_DIR: &str = ".claude-code-router";
const CLAUDE_DIR: &str = ".claude";
const APP_DIR: &str = ".ccr-desktop";
const CONFIG_FILE: &str = "config.json";
const SETTINGS_FILE: &str = "settings.json";
const WEBDAV_FILE: &str = "webdav-config.json";
const BACKUPS_DIR: &str = "backups";

/// Resolves every file this application touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    home: PathBuf,
}

impl Paths {
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Uses `CCR_DESKTOP_HOME` when set, else `dirs::home_dir()`, else the
    /// current directory.
    pub fn discover() -> Self {
        let home = std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_home(home)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn router_config_dir(&self) -> PathBuf {
        self.home.join(ROUTER_DIR)
    }

    /// `~/.claude-code-router/config.json`
    pub fn router_config(&self) -> PathBuf {
        self.router_config_dir().join(CONFIG_FILE)
    }

    pub fn claude_dir(&self) -> PathBuf {
        self.home.join(CLAUDE_DIR)
    }

    /// `~/.claude/settings.json`
    pub fn client_settings(&self) -> PathBuf {
        self.claude_dir().join(SETTINGS_FILE)
    }

    /// `~/.claude/config.json`
    pub fn direct_config(&self) -> PathBuf {
        self.claude_dir().join(CONFIG_FILE)
    }

    pub fn app_dir(&self) -> PathBuf {
        self.home.join(APP_DIR)
    }

    /// `~/.ccr-desktop/config.json`
    pub fn unified_config(&self) -> PathBuf {
        self.app_dir().join(CONFIG_FILE)
    }

    pub fn webdav_config(&self) -> PathBuf {
        self.app_dir().join(WEBDAV_FILE)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.app_dir().join(BACKUPS_DIR)
    }

    /// WebDAV credentials used to live next to the router config.
    pub fn legacy_webdav_config(&self) -> PathBuf {
        self.router_config_dir().join(WEBDAV_FILE)
    }

    pub fn legacy_backups_dir(&self) -> PathBuf {
        self.router_config_dir().join(BACKUPS_DIR)
    }

    /// Expand a leading `~` to the home directory. Other paths pass through.
    pub fn expand(&self, path: &str) -> PathBuf {
        match path.strip_prefix('~') {
            Some(rest) => self.home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(path),
        }
    }

    pub fn well_known(&self) -> PathInfo {
        PathInfo {
            home: self.home.clone(),
            router_config_dir: self.router_config_dir(),
            router_config: self.router_config(),
            claude_dir: self.claude_dir(),
            client_settings: self.client_settings(),
            direct_config: self.direct_config(),
            unified_config: self.unified_config(),
            webdav_config: self.webdav_config(),
            backups_dir: self.backups_dir(),
        }
    }
}

/// Serializable view of [`Paths`] for the IPC surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInfo {
    pub home: PathBuf,
    pub router_config_dir: PathBuf,
    pub router_config: PathBuf,
    pub claude_dir: PathBuf,
    pub client_settings: PathBuf,
    pub direct_config: PathBuf,
    pub unified_config: PathBuf,
    pub webdav_config: PathBuf,
    pub backups_dir: PathBuf,
}
