//! Configuration manager for Claude Code Router: reads and edits the router
//! config, switches the Claude client between proxy and direct mode, and
//! snapshots, backs up and restores the lot locally or over WebDAV.

pub mod backup;
pub mod config;
pub mod context;
pub mod direct;
pub mod error;
pub mod events;
pub mod ipc;
pub mod logging;
pub mod network;
pub mod paths;
pub mod router;
pub mod shutdown;
pub mod snapshot;
pub mod status;
pub mod store;
pub mod unified;
pub mod webdav;

pub use context::AppContext;
pub use error::{ConfigError, ErrorKind, Result};
pub use paths::Paths;
