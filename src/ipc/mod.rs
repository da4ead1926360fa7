//! In-process request/response transport between the front end and the
//! services. Commands travel over an mpsc channel; each carries a oneshot
//! sender for its reply.

mod client;
mod server;
mod types;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::{ConfigError, Suggestion};

pub use client::{IpcClient, IpcResult};
pub use server::IpcServer;
pub use types::{IpcCommand, IpcError, Reply};

const IPC_BUFFER: usize = 16;

pub struct IpcLayer;

impl IpcLayer {
    pub fn new() -> (IpcClient, IpcServer) {
        let (sender, receiver) = mpsc::channel(IPC_BUFFER);
        (IpcClient::new(sender), IpcServer::new(receiver))
    }
}

/// Wire shape of every response: `{success: true, data}` or
/// `{success: false, error, code, suggestion?}`.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            suggestion: None,
        }
    }

    pub fn from_error(error: &ConfigError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(error.kind().code()),
            suggestion: error.suggestion().cloned(),
        }
    }

    pub fn from_ipc_error(error: IpcError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            code: Some(error.code()),
            suggestion: None,
        }
    }
}

impl<T> From<Result<T, ConfigError>> for Envelope<T> {
    fn from(result: Result<T, ConfigError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::from_error(&e),
        }
    }
}

impl<T> From<IpcResult<T>> for Envelope<T> {
    fn from(result: IpcResult<T>) -> Self {
        match result {
            Ok(inner) => inner.into(),
            Err(e) => Self::from_ipc_error(e),
        }
    }
}
