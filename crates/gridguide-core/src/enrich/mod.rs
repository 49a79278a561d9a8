//! Optional per-program detail enrichment.
//!
//! Runs once after every schedule bucket is ingested. Each selected
//! program is looked up at most once: the cached detail payload is used
//! when present, a payload already fetched for the same series is copied
//! under the program's name, and only then is the provider asked.
//! Nothing that fails here aborts the run.

mod details;
mod overview;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gridguide_api::{DetailRequest, LocalListingsApi};
use gridguide_cache::CacheDir;
use tracing::instrument;

use crate::error::GuideError;
use crate::merge::merge_program;
use crate::model::{GuideStore, Program, ProgramKind};
use crate::observation::ProgramObservation;
use crate::options::{GuideOptions, Provider};

pub use details::ProgramDetailsAdapter;
pub use overview::OverviewAdapter;

/// Decodes a provider detail payload for one program.
pub trait DetailAdapter {
    /// Payload kind used in logs and errors.
    fn kind(&self) -> &'static str;

    /// Cache file name prefix for this payload kind.
    fn cache_prefix(&self) -> &'static str;

    /// Decodes `payload` into candidate values for `program`.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::MalformedPayload`] if the payload cannot be decoded.
    fn parse(
        &self,
        program: &Program,
        payload: &str,
        options: &GuideOptions,
    ) -> Result<ProgramObservation, GuideError>;
}

static OVERVIEW: OverviewAdapter = OverviewAdapter;
static DETAILS: ProgramDetailsAdapter = ProgramDetailsAdapter;

/// Returns the detail adapter for `provider`.
#[must_use]
pub fn detail_adapter(provider: Provider) -> &'static dyn DetailAdapter {
    match provider {
        Provider::Gracenote => &OVERVIEW,
        Provider::TvGuide => &DETAILS,
    }
}

/// Returns `true` if `program` should be enriched under `options`.
#[must_use]
pub fn wants_details(program: &Program, options: &GuideOptions) -> bool {
    options.include_icons
        || (options.include_details
            && (program.kind() == ProgramKind::Movie || program.generic == Some(false)))
}

/// Enrichment totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Programs selected for enrichment.
    pub selected: usize,
    /// Programs whose details were merged.
    pub merged: usize,
    /// Programs requested from the provider.
    pub fetched: usize,
    /// Programs skipped after a failure.
    pub skipped: usize,
}

/// Enriches every selected program in `store`.
#[allow(clippy::future_not_send)]
#[instrument(skip_all)]
pub async fn enrich_programs<A: LocalListingsApi>(
    api: &A,
    cache: &CacheDir,
    store: &mut GuideStore,
    options: &GuideOptions,
) -> EnrichReport {
    let adapter = detail_adapter(options.provider);
    let selected: Vec<(String, Option<String>)> = store
        .programs
        .values()
        .filter(|p| wants_details(p, options))
        .map(|p| (p.id.clone(), p.series_id.clone()))
        .collect();

    let mut report = EnrichReport {
        selected: selected.len(),
        ..EnrichReport::default()
    };
    let mut by_series: BTreeMap<String, PathBuf> = BTreeMap::new();

    for (program_id, series_id) in selected {
        let path = cache.detail_path(adapter.cache_prefix(), &program_id);
        let payload = match cached_or_shared(cache, &path, series_id.as_deref(), &by_series) {
            Some(payload) => payload,
            None => {
                report.fetched = report.fetched.saturating_add(1);
                let request = DetailRequest::new(program_id.clone(), series_id.clone());
                match api.fetch_details(&request).await {
                    Ok(payload) => {
                        if let Err(e) = cache.write(&path, &payload) {
                            tracing::warn!(program = %program_id, error = %e, "Failed to cache detail payload");
                        } else if let Some(series) = &series_id {
                            by_series.insert(series.clone(), path.clone());
                        }
                        payload
                    }
                    Err(e) => {
                        tracing::warn!(program = %program_id, error = %e, "Skipping details");
                        report.skipped = report.skipped.saturating_add(1);
                        continue;
                    }
                }
            }
        };

        let Some(program) = store.programs.get_mut(&program_id) else {
            continue;
        };
        match adapter.parse(program, &payload, options) {
            Ok(obs) => {
                tracing::debug!(program = %program_id, kind = adapter.kind(), "Merging details");
                merge_program(program, obs);
                report.merged = report.merged.saturating_add(1);
            }
            Err(e) => {
                tracing::warn!(program = %program_id, error = %e, "Discarding detail payload");
                if let Err(e) = cache.remove(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to delete cache file");
                }
                report.skipped = report.skipped.saturating_add(1);
            }
        }
    }

    tracing::info!(
        selected = report.selected,
        merged = report.merged,
        fetched = report.fetched,
        skipped = report.skipped,
        "Detail enrichment finished"
    );
    report
}

/// Reads the program's own cache entry, or copies one fetched for the same series.
fn cached_or_shared(
    cache: &CacheDir,
    path: &Path,
    series_id: Option<&str>,
    by_series: &BTreeMap<String, PathBuf>,
) -> Option<String> {
    if let Some(payload) = cache.read(path) {
        return Some(payload);
    }
    let shared = by_series.get(series_id?)?;
    if let Err(e) = cache.copy(shared, path) {
        tracing::warn!(error = %e, "Failed to share series payload");
        return cache.read(shared);
    }
    cache.read(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::cell::Cell;

    use gridguide_api::{FetchError, GridWindow};

    use super::*;

    struct MockApi {
        calls: Cell<usize>,
        body: Option<&'static str>,
    }

    impl LocalListingsApi for MockApi {
        async fn fetch_grid(&self, _window: &GridWindow) -> Result<String, FetchError> {
            Err(FetchError::NoData {
                label: String::from("grid"),
            })
        }

        async fn fetch_details(&self, request: &DetailRequest) -> Result<String, FetchError> {
            self.calls.set(self.calls.get().saturating_add(1));
            self.body.map(String::from).ok_or_else(|| FetchError::NoData {
                label: request.program_id.clone(),
            })
        }
    }

    fn episode(id: &str, series: &str) -> Program {
        Program {
            series_id: Some(String::from(series)),
            generic: Some(false),
            ..Program::new(id)
        }
    }

    fn details_options() -> GuideOptions {
        GuideOptions {
            include_details: true,
            ..GuideOptions::default()
        }
    }

    #[test]
    fn test_wants_details() {
        // Arrange
        let options = details_options();
        let movie = Program::new("MV000111220000");
        let generic = Program {
            generic: Some(true),
            ..Program::new("SH000111220000")
        };

        // Act & Assert
        assert!(wants_details(&movie, &options));
        assert!(wants_details(&episode("EP1", "S1"), &options));
        assert!(!wants_details(&generic, &options));
        assert!(!wants_details(&movie, &GuideOptions::default()));
    }

    #[tokio::test]
    async fn test_series_payload_is_fetched_once() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDir::open(dir.path()).unwrap();
        let api = MockApi {
            calls: Cell::new(0),
            body: Some(r#"{"seriesGenres": "Drama"}"#),
        };
        let mut store = GuideStore::new();
        for id in ["EP000000010001", "EP000000010002"] {
            store.programs.insert(String::from(id), episode(id, "SH00000001"));
        }

        // Act
        let report = enrich_programs(&api, &cache, &mut store, &details_options()).await;

        // Assert
        assert_eq!(api.calls.get(), 1);
        assert_eq!(report.merged, 2);
        assert!(cache.detail_path("O", "EP000000010002").exists());
        assert!(store.programs["EP000000010002"].genres.contains("drama"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_skipped() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDir::open(dir.path()).unwrap();
        let api = MockApi {
            calls: Cell::new(0),
            body: None,
        };
        let mut store = GuideStore::new();
        store
            .programs
            .insert(String::from("MV000111220000"), Program::new("MV000111220000"));

        // Act
        let report = enrich_programs(&api, &cache, &mut store, &details_options()).await;

        // Assert
        assert_eq!(report.skipped, 1);
        assert_eq!(report.merged, 0);
    }

    #[tokio::test]
    async fn test_malformed_cached_payload_is_removed() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDir::open(dir.path()).unwrap();
        let path = cache.detail_path("O", "MV000111220000");
        cache.write(&path, "not json").unwrap();
        let api = MockApi {
            calls: Cell::new(0),
            body: None,
        };
        let mut store = GuideStore::new();
        store
            .programs
            .insert(String::from("MV000111220000"), Program::new("MV000111220000"));

        // Act
        let report = enrich_programs(&api, &cache, &mut store, &details_options()).await;

        // Assert
        assert_eq!(api.calls.get(), 0);
        assert_eq!(report.skipped, 1);
        assert!(!path.exists());
    }
}
