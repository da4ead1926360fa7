//! Typed views of every JSON document this application reads or writes.
//!
//! Each document keeps keys it does not model in a flattened `extra` map so
//! that round trips never drop fields owned by other programs.

mod auth;
mod claude_settings;
mod credentials;
mod direct;
mod snapshot;
mod types;
mod unified;

pub use auth::AuthScheme;
pub use claude_settings::{ClientSettings, NetworkMode, ENV_API_KEY, ENV_AUTH_TOKEN, ENV_BASE_URL};
pub use credentials::{SecureString, MASK};
pub use direct::{normalize_url, DirectConfig, DirectConfigEntry, DirectSettings};
pub use snapshot::{CcrSnapshot, ConfigSnapshot, DirectSnapshot, ProviderSnapshot, RouterSnapshot};
pub use types::{
    default_router_template, Provider, ProviderPatch, RouterConfig, RouterRole, RouterSection,
    DEFAULT_LONG_CONTEXT_THRESHOLD,
};
pub(crate) use types::split_route;
pub use unified::{
    AppSettings, AppSettingsPatch, BackupSnapshot, SectionPatch, UnifiedAppConfig, WebDavConfig,
    WebDavPatch, DEFAULT_REMOTE_PATH,
};

/// Local ccr proxy endpoint. Proxy mode is detected by exact equality.
pub const PROXY_URL: &str = "http://127.0.0.1:3456";

/// Endpoint used in direct mode when no direct config exists.
pub const OFFICIAL_API_URL: &str = "https://api.anthropic.com";

/// Current UTC time in RFC 3339 with milliseconds, e.g.
/// `2024-05-01T12:00:00.000Z`.
pub(crate) fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
