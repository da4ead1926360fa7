//! Which client env var carries a direct-connection credential.

use super::claude_settings::{ClientSettings, ENV_API_KEY, ENV_AUTH_TOKEN};

/// Authentication scheme for a direct connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `ANTHROPIC_API_KEY`, sent as `x-api-key`.
    ApiKey,
    /// `ANTHROPIC_AUTH_TOKEN`, sent as `Authorization: Bearer`.
    Token,
}

impl AuthScheme {
    pub fn from_use_api_key(use_api_key: bool) -> Self {
        if use_api_key {
            Self::ApiKey
        } else {
            Self::Token
        }
    }

    /// Env var holding the credential for this scheme.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::ApiKey => ENV_API_KEY,
            Self::Token => ENV_AUTH_TOKEN,
        }
    }

    /// The env var of the other scheme, cleared when this one is applied.
    pub fn other_env_var(&self) -> &'static str {
        match self {
            Self::ApiKey => ENV_AUTH_TOKEN,
            Self::Token => ENV_API_KEY,
        }
    }

    /// Write `credential` under this scheme's var and drop the other one.
    pub fn apply(&self, settings: &mut ClientSettings, credential: &str) {
        settings.set_env(self.env_var(), credential);
        settings.remove_env(self.other_env_var());
    }
}
