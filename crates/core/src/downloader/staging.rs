//! Staging directory maintenance.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

/// Every regular file under `root`, recursively, in sorted order.
pub async fn collect_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot read {:?}: {}", dir, e);
                continue;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => pending.push(entry.path()),
                Ok(ft) if ft.is_file() => files.push(entry.path()),
                _ => {}
            }
        }
    }

    files.sort();
    files
}

/// Delete every file under `root`. Directories are left in place.
///
/// Individual delete failures are logged and skipped. A missing root counts
/// as already purged. Returns the number of files removed.
pub async fn purge_staging(root: &Path) -> usize {
    let mut removed = 0;
    for file in collect_files(root).await {
        match fs::remove_file(&file).await {
            Ok(()) => removed += 1,
            Err(e) => debug!("Failed to remove {:?}: {}", file, e),
        }
    }
    removed
}

/// Whether `path` ends in one of `extensions` (case-insensitive, no dot).
pub fn has_accepted_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|accepted| accepted.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// First file under `root` with an accepted extension.
pub async fn find_artifact(root: &Path, extensions: &[String]) -> Option<PathBuf> {
    collect_files(root)
        .await
        .into_iter()
        .find(|path| has_accepted_extension(path, extensions))
}
