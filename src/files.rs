use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

use crate::{ResizeKitError, Result};

/// File-storage collaborator: maps request paths into a root directory and
/// answers metadata/content questions about the files there. The disk is the
/// source of truth; the cache layer above is derived from it.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a request path to a location under the root. Paths that try
    /// to climb out of the root resolve to `None` and are never read.
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = request_path.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }
        let candidate = Path::new(relative);
        for component in candidate.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return None,
            }
        }
        Some(self.root.join(candidate))
    }

    /// Last-modification timestamp of a regular file at `location`, or
    /// `None` when there is nothing servable there. `None` is the single
    /// not-found signal the dispatch layer branches on.
    pub async fn last_modified(&self, location: &Path) -> Option<SystemTime> {
        let meta = fs::metadata(location).await.ok()?;
        if !meta.is_file() {
            return None;
        }
        meta.modified().ok()
    }

    pub async fn read(&self, location: &Path) -> Result<Vec<u8>> {
        fs::read(location)
            .await
            .map_err(|e| ResizeKitError::ReadError(format!("{}: {}", location.display(), e)))
    }
}
