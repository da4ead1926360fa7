//! Error taxonomy shared by every service.
//!
//! All public operations return `Result<T, ConfigError>`. Callers branch on
//! [`ConfigError::kind`] rather than on message text.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Tag identifying the class of a [`ConfigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    ReadError,
    ParseError,
    ValidationError,
    NotFoundError,
    WriteError,
    SerializationError,
    RemoteError,
}

impl ErrorKind {
    /// Stable code string used in IPC envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ReadError => "READ_ERROR",
            Self::ParseError => "PARSE_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFoundError => "NOT_FOUND_ERROR",
            Self::WriteError => "WRITE_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::RemoteError => "REMOTE_ERROR",
        }
    }
}

/// Which half of a two-document operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Router,
    Direct,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Router => write!(f, "router config"),
            Side::Direct => write!(f, "direct config"),
        }
    }
}

/// Hint attached to a missing router config: where to create it and what to
/// put in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub directory: PathBuf,
    pub message: String,
    pub template: Value,
}

/// Entity kinds referenced by `EntityNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Provider,
    Model,
    DirectConfig,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Provider => write!(f, "Provider"),
            Entity::Model => write!(f, "Model"),
            Entity::DirectConfig => write!(f, "Direct config"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file does not exist: {}", path.display())]
    NotFound {
        path: PathBuf,
        suggestion: Option<Box<Suggestion>>,
    },

    #[error("No permission to read config file: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{entity} '{name}' not found")]
    EntityNotFound { entity: Entity, name: String },

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize document: {message}")]
    Serialization { message: String },

    #[error("WebDAV request failed: {message}")]
    Remote {
        message: String,
        status: Option<u16>,
    },

    #[error("Failed on {side}: {source}")]
    Side {
        side: Side,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Read { .. } => ErrorKind::ReadError,
            Self::Parse { .. } => ErrorKind::ParseError,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::EntityNotFound { .. } => ErrorKind::NotFoundError,
            Self::Write { .. } => ErrorKind::WriteError,
            Self::Serialization { .. } => ErrorKind::SerializationError,
            Self::Remote { .. } => ErrorKind::RemoteError,
            Self::Side { source, .. } => source.kind(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The suggestion carried by a missing router config, if any.
    pub fn suggestion(&self) -> Option<&Suggestion> {
        match self {
            Self::NotFound { suggestion, .. } => suggestion.as_deref(),
            Self::Side { source, .. } => source.suggestion(),
            _ => None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn entity_not_found(entity: Entity, name: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity,
            name: name.into(),
        }
    }

    pub fn remote(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Remote {
            message: message.into(),
            status,
        }
    }

    pub(crate) fn on_side(self, side: Side) -> Self {
        Self::Side {
            side,
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
