//! End-to-end guide run.

use std::fmt;
use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, TimeZone, Utc};
use gridguide_api::LocalListingsApi;
use gridguide_cache::CacheDir;
use tracing::instrument;

use crate::assemble::assemble;
use crate::enrich::{EnrichReport, enrich_programs};
use crate::error::GuideError;
use crate::icons::{IconResolver, resolve_station_icons};
use crate::model::GuideStore;
use crate::normalize::source_adapter;
use crate::options::{GuideOptions, TimeAlignment};
use crate::render::{RenderInput, encode_output, render_document};
use crate::schedule::{fetch_buckets, plan_buckets};

/// Cached payloads older than the fetched range plus this many days are deleted.
const STALE_GRACE_DAYS: u32 = 2;

/// Result of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideReport {
    /// Encoded output document.
    pub document: Vec<u8>,
    /// Stations written.
    pub stations: usize,
    /// Programs known.
    pub programs: usize,
    /// Airings written after assembly.
    pub airings: usize,
    /// Trailing airings dropped by assembly.
    pub dropped: usize,
    /// Bucket fetching stopped early.
    pub halted: bool,
    /// Detail enrichment totals, all zero when enrichment is off.
    pub details: EnrichReport,
}

/// Runs the full pipeline and returns the encoded document.
///
/// `now` fixes both the bucket plan and the timezone of every rendered
/// timestamp. Only configuration errors and an unusable cache directory
/// abort the run; provider and cache file failures are logged and the
/// document is built from whatever was collected.
///
/// # Errors
///
/// - [`GuideError::Configuration`] if the options are invalid.
/// - [`GuideError::CacheIo`] if the cache directory cannot be opened.
/// - [`GuideError::Render`] if formatting the document fails.
#[allow(clippy::future_not_send)]
#[instrument(skip_all)]
pub async fn run<A, Tz>(
    api: &A,
    cache_root: &Path,
    options: &GuideOptions,
    icons: &dyn IconResolver,
    now: &DateTime<Tz>,
) -> Result<GuideReport, GuideError>
where
    A: LocalListingsApi,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    options.validate()?;
    let cache = CacheDir::open(cache_root).map_err(GuideError::CacheIo)?;

    let max_age = Duration::from_secs(
        u64::from(options.days.saturating_add(STALE_GRACE_DAYS)).saturating_mul(86_400),
    );
    match cache.clean_stale(max_age, SystemTime::from(now.with_timezone(&Utc))) {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Deleted stale cache files"),
        Err(e) => tracing::warn!(error = %GuideError::CacheIo(e), "Skipping cache cleanup"),
    }

    let plan = match options.alignment {
        TimeAlignment::Local => plan_buckets(now, options),
        TimeAlignment::Utc => plan_buckets(&now.with_timezone(&Utc), options),
    };
    tracing::info!(
        buckets = plan.buckets.len(),
        grid_hours = plan.grid_hours,
        "Planned schedule buckets"
    );

    let mut store = GuideStore::new();
    let adapter = source_adapter(options.provider);
    let outcome = fetch_buckets(api, &cache, &plan, adapter, &mut store, options).await;
    tracing::info!(
        processed = outcome.processed,
        fetched = outcome.fetched,
        halt = ?outcome.halt,
        stations = store.stations.len(),
        programs = store.programs.len(),
        "Schedule buckets ingested"
    );

    let details = if options.include_details || options.include_icons {
        enrich_programs(api, &cache, &mut store, options).await
    } else {
        EnrichReport::default()
    };
    let logos = resolve_station_icons(&mut store, icons);
    if logos > 0 {
        tracing::debug!(logos, "Resolved station logos");
    }

    let guide = assemble(&mut store);
    let include = options.include_xmltv.as_deref().and_then(read_include);
    let utc_now = now.with_timezone(&Utc);
    let tz = now.timezone();
    let input = RenderInput {
        store: &store,
        guide: &guide,
        options,
        tz: &tz,
        window: plan.window().unwrap_or((utc_now, utc_now)),
        include: include.as_deref(),
    };
    let document = render_document(&input)?;

    let report = GuideReport {
        document: encode_output(&document, options.utf8),
        stations: store.stations.len(),
        programs: store.programs.len(),
        airings: guide.airing_count(),
        dropped: guide.dropped,
        halted: outcome.halted(),
        details,
    };
    tracing::info!(
        stations = report.stations,
        programs = report.programs,
        airings = report.airings,
        dropped = report.dropped,
        details_merged = report.details.merged,
        details_skipped = report.details.skipped,
        bytes = report.document.len(),
        "Guide rendered"
    );
    Ok(report)
}

fn read_include(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Skipping included XMLTV file");
            None
        }
    }
}
