//! JSON document persistence.
//!
//! Reads map I/O failures onto [`ConfigError`] variants; writes always go to
//! a sibling temp file that is renamed over the target, so readers never see
//! a half-written document. An existing target is resolved through symlinks
//! first and keeps its permission bits.

mod cache;
mod transaction;

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use uuid::Uuid;

use crate::error::{ConfigError, Result};

pub use cache::DocumentCache;
pub use transaction::Transaction;

/// Read and deserialize a JSON document.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| read_error(path, e))?;

    serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Serialize `data` and replace the file at `path`, creating parent
/// directories as needed.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let bytes = to_pretty_json(data)?;
    write_atomic(path, &bytes).await
}

/// Two-space indented JSON, the layout every file here is written with.
pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(data: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(data).map_err(|e| ConfigError::Serialization {
        message: e.to_string(),
    })
}

/// Write raw bytes via temp file + rename.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path).await?;

    let target = resolve_target(path).await;
    let temp = temp_path_for(&target);
    let guard = scopeguard::guard(temp.clone(), |temp| {
        let _ = std::fs::remove_file(temp);
    });

    fs::write(&temp, bytes)
        .await
        .map_err(|e| write_error(path, e))?;
    copy_permissions(&target, &temp)
        .await
        .map_err(|e| write_error(path, e))?;
    fs::rename(&temp, &target)
        .await
        .map_err(|e| write_error(path, e))?;

    // Renamed: nothing left to clean up.
    scopeguard::ScopeGuard::into_inner(guard);
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote JSON document");
    Ok(())
}

/// The file a write to `path` must replace: the symlink target when `path`
/// already exists, otherwise `path` itself.
pub(crate) async fn resolve_target(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Give `temp` the mode of an existing regular file at `target`.
pub(crate) async fn copy_permissions(target: &Path, temp: &Path) -> std::io::Result<()> {
    match fs::metadata(target).await {
        Ok(meta) if meta.is_file() => fs::set_permissions(temp, meta.permissions()).await,
        Ok(_) => Ok(()),
        Err(e) if e.kind() == IoErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

pub(crate) async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| write_error(path, e))?;
    }
    Ok(())
}

/// Hidden sibling of `path`, unique per call.
pub(crate) fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
}

pub(crate) fn read_error(path: &Path, error: std::io::Error) -> ConfigError {
    match error.kind() {
        IoErrorKind::NotFound => ConfigError::NotFound {
            path: path.to_path_buf(),
            suggestion: None,
        },
        IoErrorKind::PermissionDenied => ConfigError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Read {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

pub(crate) fn write_error(path: &Path, error: std::io::Error) -> ConfigError {
    ConfigError::Write {
        path: path.to_path_buf(),
        source: error,
    }
}
