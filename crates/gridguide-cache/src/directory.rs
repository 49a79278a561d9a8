//! Cache directory layout and file operations.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};

use crate::payload::{compress, decompress};

/// File suffix shared by every cached payload.
const PAYLOAD_SUFFIX: &str = ".js.gz";

/// Directory of gzip-compressed provider payloads.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    /// Opens (or creates) the cache directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create directory {}", root.display()))?;
        Ok(Self { root })
    }

    /// Cache directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the payload for the bucket starting at `start_ms`.
    #[must_use]
    pub fn bucket_path(&self, start_ms: i64) -> PathBuf {
        self.root.join(format!("{start_ms}{PAYLOAD_SUFFIX}"))
    }

    /// Path of the detail payload for `program_id` under `prefix`.
    #[must_use]
    pub fn detail_path(&self, prefix: &str, program_id: &str) -> PathBuf {
        self.root.join(format!("{prefix}{program_id}{PAYLOAD_SUFFIX}"))
    }

    /// Reads and decompresses a cached payload.
    ///
    /// Returns `None` when the file is absent, unreadable, or corrupt so the
    /// caller can treat every such case as a cache miss.
    #[must_use]
    pub fn read(&self, path: &Path) -> Option<String> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable cache file, treating as miss");
                return None;
            }
        };

        match decompress(&data) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt cache file, treating as miss");
                None
            }
        }
    }

    /// Compresses and writes a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if compression or the file write fails.
    pub fn write(&self, path: &Path, payload: &str) -> Result<()> {
        let data = compress(payload)?;
        std::fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Removes a cached payload. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be deleted.
    pub fn remove(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                Err(anyhow::Error::new(e).context(format!("failed to delete {}", path.display())))
            }
        }
    }

    /// Copies one cached payload to another name (series sharing).
    ///
    /// # Errors
    ///
    /// Returns an error if the copy fails.
    pub fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::copy(from, to).with_context(|| {
            format!("failed to copy {} to {}", from.display(), to.display())
        })?;
        Ok(())
    }

    /// Deletes payload files last modified more than `max_age` before `now`.
    ///
    /// Files that cannot be inspected or deleted are logged and skipped.
    /// Returns the number of files deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn clean_stale(&self, max_age: Duration, now: SystemTime) -> Result<usize> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to list {}", self.root.display()))?;

        let mut removed = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_payload = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(PAYLOAD_SUFFIX));
            if !is_payload {
                continue;
            }

            let modified = entry.metadata().and_then(|m| m.modified());
            let age = match modified {
                Ok(t) => now.duration_since(t).unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot stat cache file");
                    continue;
                }
            };
            if age <= max_age {
                continue;
            }

            tracing::info!(path = %path.display(), "Deleting old cached file");
            match std::fs::remove_file(&path) {
                Ok(()) => removed = removed.saturating_add(1),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to delete cache file");
                }
            }
        }

        Ok(removed)
    }
}
