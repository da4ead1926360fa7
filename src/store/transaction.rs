//! Staged multi-file writes.
//!
//! Every document is first written to a temp file next to its target (the
//! symlink-resolved file when one exists, with its mode copied). Commit
//! renames them in staging order; if a rename fails, the targets already
//! replaced get their previous bytes back (or are removed if they did not
//! exist before).

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use super::{
    copy_permissions, ensure_parent, read_error, resolve_target, temp_path_for, to_pretty_json,
    write_error,
};
use crate::error::ConfigError;

struct Staged {
    target: PathBuf,
    temp: PathBuf,
}

/// A set of documents that are replaced together.
#[derive(Default)]
pub struct Transaction {
    staged: Vec<Staged>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `value` into a temp file for `path`. Returns the index used
    /// to identify this entry in a commit failure.
    pub async fn stage<T: Serialize + ?Sized>(
        &mut self,
        path: &Path,
        value: &T,
    ) -> Result<usize, ConfigError> {
        let bytes = to_pretty_json(value)?;
        ensure_parent(path).await?;

        let target = resolve_target(path).await;
        let temp = temp_path_for(&target);
        fs::write(&temp, &bytes)
            .await
            .map_err(|e| write_error(path, e))?;
        if let Err(e) = copy_permissions(&target, &temp).await {
            let _ = fs::remove_file(&temp).await;
            return Err(write_error(path, e));
        }

        self.staged.push(Staged { target, temp });
        Ok(self.staged.len() - 1)
    }

    /// Number of staged documents.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Replace every target. On failure returns the index of the failing
    /// entry; all targets are back to their pre-commit content.
    pub async fn commit(mut self) -> Result<(), (usize, ConfigError)> {
        let staged = std::mem::take(&mut self.staged);
        let mut committed: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());

        for (index, item) in staged.iter().enumerate() {
            let previous = match fs::read(&item.target).await {
                Ok(bytes) => Some(bytes),
                Err(e) if e.kind() == IoErrorKind::NotFound => None,
                Err(e) => {
                    discard(&staged[index..]).await;
                    rollback(committed).await;
                    return Err((index, read_error(&item.target, e)));
                }
            };

            if let Err(e) = fs::rename(&item.temp, &item.target).await {
                discard(&staged[index..]).await;
                rollback(committed).await;
                return Err((index, write_error(&item.target, e)));
            }
            committed.push((item.target.clone(), previous));
        }

        tracing::debug!(documents = committed.len(), "Transaction committed");
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        for item in &self.staged {
            let _ = std::fs::remove_file(&item.temp);
        }
    }
}

async fn discard(items: &[Staged]) {
    for item in items {
        let _ = fs::remove_file(&item.temp).await;
    }
}

async fn rollback(committed: Vec<(PathBuf, Option<Vec<u8>>)>) {
    for (target, previous) in committed.into_iter().rev() {
        let result = match previous {
            Some(bytes) => fs::write(&target, bytes).await,
            None => fs::remove_file(&target).await,
        };
        if let Err(e) = result {
            tracing::warn!(
                path = %target.display(),
                error = %e,
                "Rollback failed; document left in committed state"
            );
        }
    }
}
