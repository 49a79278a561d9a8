//! Station logo references.
//!
//! The pipeline never downloads or crops images. A resolver only maps a
//! logo URL to the local path where the caller keeps (or will keep) the
//! file, and the path is recorded on the station.

use std::path::{Path, PathBuf};

use crate::model::GuideStore;

/// Maps a station logo URL to a local file path.
pub trait IconResolver {
    /// Returns the local path for `logo_url`, or `None` to leave the station untouched.
    fn resolve(&self, logo_url: &str) -> Option<PathBuf>;
}

/// Resolver that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIcons;

impl IconResolver for NoIcons {
    fn resolve(&self, _logo_url: &str) -> Option<PathBuf> {
        None
    }
}

/// Resolver that places every logo in one directory under its URL file name.
#[derive(Debug, Clone)]
pub struct IconDir {
    dir: PathBuf,
}

impl IconDir {
    /// Creates a resolver rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl IconResolver for IconDir {
    fn resolve(&self, logo_url: &str) -> Option<PathBuf> {
        let path = logo_url.split(['?', '#']).next().unwrap_or_default();
        let name = path.rsplit('/').next().filter(|n| !n.is_empty())?;
        Some(self.dir.join(name))
    }
}

/// Records a local logo path on every station that has a logo URL.
///
/// Returns the number of stations updated.
pub fn resolve_station_icons(store: &mut GuideStore, resolver: &dyn IconResolver) -> usize {
    let mut resolved = 0usize;
    for station in store.stations.values_mut() {
        let Some(url) = &station.logo_url else {
            continue;
        };
        if let Some(path) = resolver.resolve(url) {
            tracing::debug!(station = %station.key, path = %path.display(), "Recorded logo path");
            station.icon_path = Some(path);
            resolved = resolved.saturating_add(1);
        }
    }
    resolved
}
