//! Service-owned document cache.
//!
//! An entry is only served while the file's modification time and length are
//! unchanged, so edits made by other programs are picked up on the next read.

use std::path::Path;
use std::time::SystemTime;

use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: Option<SystemTime>,
    len: u64,
}

struct Entry<T> {
    value: T,
    fingerprint: Fingerprint,
}

pub struct DocumentCache<T> {
    inner: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> DocumentCache<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Cached value, if the file at `path` has not changed since it was stored.
    pub async fn get(&self, path: &Path) -> Option<T> {
        let current = fingerprint(path).await?;
        let guard = self.inner.read();
        guard
            .as_ref()
            .filter(|entry| entry.fingerprint == current)
            .map(|entry| entry.value.clone())
    }

    /// Remember `value` as the content currently at `path`.
    pub async fn store(&self, path: &Path, value: T) {
        match fingerprint(path).await {
            Some(fingerprint) => *self.inner.write() = Some(Entry { value, fingerprint }),
            None => self.invalidate(),
        }
    }

    pub fn invalidate(&self) {
        *self.inner.write() = None;
    }
}

impl<T: Clone> Default for DocumentCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

async fn fingerprint(path: &Path) -> Option<Fingerprint> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    Some(Fingerprint {
        modified: meta.modified().ok(),
        len: meta.len(),
    })
}
