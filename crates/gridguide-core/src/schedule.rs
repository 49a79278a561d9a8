//! Fetch scheduler: time buckets, cache decisions and the bucket loop.

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Timelike, Utc};
use gridguide_api::{FetchError, GridWindow, LocalListingsApi};
use gridguide_cache::CacheDir;
use tracing::instrument;

use crate::model::GuideStore;
use crate::normalize::{SourceAdapter, ingest};
use crate::options::{GuideOptions, NoCachePolicy};

/// One fixed-width request window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// 0-based position in the run.
    pub index: u32,
    /// 1-based day index.
    pub day: u32,
    /// Aligned start.
    pub start: DateTime<Utc>,
}

impl Bucket {
    /// Start in epoch milliseconds (the cache key).
    #[must_use]
    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }
}

/// All buckets of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPlan {
    /// Buckets in request order.
    pub buckets: Vec<Bucket>,
    /// Bucket width in hours.
    pub grid_hours: u32,
}

impl BucketPlan {
    /// Request window for `bucket`.
    #[must_use]
    pub const fn grid_window(&self, bucket: &Bucket) -> GridWindow {
        GridWindow::new(bucket.start, self.grid_hours)
    }

    /// First bucket start through one millisecond before the last bucket ends.
    #[must_use]
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.buckets.first()?;
        let last = self.buckets.last()?;
        let span_ms = i64::from(self.grid_hours)
            .saturating_mul(3_600_000)
            .saturating_sub(1);
        let end = last
            .start
            .checked_add_signed(TimeDelta::milliseconds(span_ms))?;
        Some((first.start, end))
    }
}

/// Enumerates the buckets for `options`, aligned on the clock of `now`.
///
/// With a start offset of zero the first bucket begins at the current grid
/// slot of today; otherwise it begins at today's midnight. The offset in
/// days is then added. Later buckets follow at fixed intervals.
#[must_use]
pub fn plan_buckets<Tz: TimeZone>(now: &DateTime<Tz>, options: &GuideOptions) -> BucketPlan {
    let grid = options.grid_hours.max(1);
    let hour = if options.start_day == 0 {
        now.hour().checked_div(grid).unwrap_or(0).saturating_mul(grid)
    } else {
        0
    };
    let slot = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    let naive = now.date_naive().and_time(slot);
    let aligned = now
        .timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map_or_else(|| naive.and_utc(), |t| t.with_timezone(&Utc));
    let first = aligned
        .checked_add_signed(TimeDelta::days(i64::from(options.start_day)))
        .unwrap_or(aligned);

    let per_day = options.buckets_per_day().max(1);
    let total = options.days.saturating_mul(per_day);
    let step = TimeDelta::hours(i64::from(grid));
    let mut buckets = Vec::new();
    let mut start = first;
    for index in 0..total {
        buckets.push(Bucket {
            index,
            day: index.checked_div(per_day).unwrap_or(0).saturating_add(1),
            start,
        });
        let Some(next) = start.checked_add_signed(step) else {
            break;
        };
        start = next;
    }

    BucketPlan {
        buckets,
        grid_hours: grid,
    }
}

/// Returns `true` if the bucket must be requested from the provider.
#[must_use]
pub fn must_fetch(cached: bool, day: u32, days: u32, policy: &NoCachePolicy) -> bool {
    !cached || policy.forces(day, days)
}

/// Why the bucket loop stopped before the end of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltCause {
    /// A request failed on every attempt.
    RetriesExhausted,
    /// A request could not be built; retrying would not help.
    InvalidRequest,
}

/// Bucket loop totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Buckets whose payload was ingested.
    pub processed: usize,
    /// Buckets requested from the provider.
    pub fetched: usize,
    /// Set when the loop stopped early.
    pub halt: Option<HaltCause>,
}

impl FetchOutcome {
    /// Returns `true` if the loop stopped early.
    #[must_use]
    pub const fn halted(&self) -> bool {
        self.halt.is_some()
    }
}

/// Fetches or reuses every bucket in `plan` and ingests it into `store`.
///
/// A request that exhausts its retries or cannot be built stops the loop;
/// everything ingested so far stays in the store. Cache write and delete failures are logged
/// and otherwise ignored.
#[allow(clippy::future_not_send)]
#[instrument(skip_all)]
pub async fn fetch_buckets<A: LocalListingsApi>(
    api: &A,
    cache: &CacheDir,
    plan: &BucketPlan,
    adapter: &dyn SourceAdapter,
    store: &mut GuideStore,
    options: &GuideOptions,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    let total = plan.buckets.len();

    for bucket in &plan.buckets {
        let path = cache.bucket_path(bucket.start_ms());
        let reusable = !must_fetch(path.exists(), bucket.day, options.days, &options.no_cache);
        let cached = if reusable { cache.read(&path) } else { None };

        let payload = if let Some(payload) = cached {
            payload
        } else {
            outcome.fetched = outcome.fetched.saturating_add(1);
            match api.fetch_grid(&plan.grid_window(bucket)).await {
                Ok(payload) => {
                    if let Err(e) = cache.write(&path, &payload) {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to cache payload");
                    }
                    payload
                }
                Err(e @ FetchError::NoData { .. }) => {
                    tracing::warn!(bucket = bucket.index, error = %e, "Skipping bucket");
                    continue;
                }
                Err(e @ FetchError::Url { .. }) => {
                    tracing::error!(
                        bucket = bucket.index,
                        error = %e,
                        processed = outcome.processed,
                        "Request could not be built, stopping bucket iteration"
                    );
                    outcome.halt = Some(HaltCause::InvalidRequest);
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        bucket = bucket.index,
                        error = %e,
                        processed = outcome.processed,
                        "Retries exhausted, stopping bucket iteration"
                    );
                    outcome.halt = Some(HaltCause::RetriesExhausted);
                    break;
                }
            }
        };

        tracing::info!(
            bucket = bucket.index.saturating_add(1),
            total,
            path = %path.display(),
            "Parsing"
        );
        let batch = match adapter.adapt(&payload, options) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping bucket");
                remove_quietly(cache, &path);
                continue;
            }
        };
        tracing::debug!(programs = batch.program_ids().len(), "Bucket decoded");

        let report = ingest(store, batch, options);
        outcome.processed = outcome.processed.saturating_add(1);

        if options.no_placeholder_cache && report.placeholder {
            tracing::info!(path = %path.display(), "Deleting cached bucket with placeholder titles");
            remove_quietly(cache, &path);
        } else if report.expired {
            tracing::info!(path = %path.display(), "Deleting expired cached bucket");
            remove_quietly(cache, &path);
        }
    }

    outcome
}

fn remove_quietly(cache: &CacheDir, path: &std::path::Path) {
    if let Err(e) = cache.remove(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to delete cache file");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::cell::RefCell;
    use std::collections::VecDeque;

    use chrono_tz::America::New_York;
    use gridguide_api::DetailRequest;

    use super::*;
    use crate::normalize::GridAdapter;
    use crate::options::LineupInfo;

    struct ScriptedApi {
        responses: RefCell<VecDeque<Result<String, FetchError>>>,
        requested: RefCell<Vec<i64>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<Result<String, FetchError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl LocalListingsApi for ScriptedApi {
        async fn fetch_grid(&self, window: &GridWindow) -> Result<String, FetchError> {
            self.requested.borrow_mut().push(window.start_secs());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(String::from(r#"{"channels": []}"#)))
        }

        async fn fetch_details(&self, request: &DetailRequest) -> Result<String, FetchError> {
            Err(FetchError::NoData {
                label: request.program_id.clone(),
            })
        }
    }

    fn one_day() -> GuideOptions {
        GuideOptions {
            days: 1,
            lineup: LineupInfo {
                id: String::from("USA-OTA10001"),
                ..LineupInfo::default()
            },
            ..GuideOptions::default()
        }
    }

    fn exhausted() -> FetchError {
        FetchError::Exhausted {
            label: String::from("grid"),
            attempts: 3,
            last: String::from("HTTP 503"),
        }
    }

    #[test]
    fn test_plan_aligns_to_local_grid_slot() {
        // Arrange
        let now = New_York.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();

        // Act
        let plan = plan_buckets(&now, &one_day());

        // Assert
        assert_eq!(plan.buckets.len(), 8);
        assert_eq!(
            plan.buckets[0].start,
            Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap()
        );
        assert_eq!(
            plan.buckets[1].start,
            Utc.with_ymd_and_hms(2024, 3, 10, 13, 0, 0).unwrap()
        );
        assert!(plan.buckets.iter().all(|b| b.day == 1));
    }

    #[test]
    fn test_plan_with_start_offset_begins_at_midnight() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 17, 45, 0).unwrap();
        let options = GuideOptions {
            start_day: 2,
            days: 2,
            ..one_day()
        };

        // Act
        let plan = plan_buckets(&now, &options);

        // Assert
        assert_eq!(
            plan.buckets[0].start,
            Utc.with_ymd_and_hms(2024, 1, 17, 0, 0, 0).unwrap()
        );
        assert_eq!(plan.buckets[8].day, 2);
        let (first, last) = plan.window().unwrap();
        assert_eq!(first, plan.buckets[0].start);
        assert_eq!(
            last,
            DateTime::from_timestamp_millis(1_705_622_399_999).unwrap()
        );
    }

    #[test]
    fn test_must_fetch_is_pure() {
        // Arrange
        let policy = NoCachePolicy {
            from_end: 2,
            from_start: 1,
            day: Some(4),
        };

        // Act & Assert
        assert!(must_fetch(false, 3, 7, &NoCachePolicy::default()));
        assert!(!must_fetch(true, 3, 7, &NoCachePolicy::default()));
        assert!(must_fetch(true, 1, 7, &policy));
        assert!(!must_fetch(true, 2, 7, &policy));
        assert!(must_fetch(true, 4, 7, &policy));
        assert!(must_fetch(true, 6, 7, &policy));
        assert!(!must_fetch(true, 5, 7, &policy));
    }

    #[tokio::test]
    async fn test_cached_buckets_are_not_requested() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDir::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let options = one_day();
        let plan = plan_buckets(&now, &options);
        for bucket in &plan.buckets {
            cache
                .write(&cache.bucket_path(bucket.start_ms()), r#"{"channels": []}"#)
                .unwrap();
        }
        let api = ScriptedApi::new(Vec::new());
        let mut store = GuideStore::new();

        // Act
        let outcome =
            fetch_buckets(&api, &cache, &plan, &GridAdapter, &mut store, &options).await;

        // Assert
        assert!(api.requested.borrow().is_empty());
        assert_eq!(outcome.processed, 8);
        assert_eq!(outcome.fetched, 0);
    }

    #[tokio::test]
    async fn test_exhausted_retries_halt_but_keep_results() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDir::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let options = one_day();
        let plan = plan_buckets(&now, &options);
        let first = r#"{"channels": [{"channelId": "1", "channelNo": "2", "events": [
            {"program": {"id": "EP1", "title": "Show"}, "startTime": "2024-01-15T00:00:00Z"}
        ]}]}"#;
        let api = ScriptedApi::new(vec![Ok(String::from(first)), Err(exhausted())]);
        let mut store = GuideStore::new();

        // Act
        let outcome =
            fetch_buckets(&api, &cache, &plan, &GridAdapter, &mut store, &options).await;

        // Assert
        assert_eq!(outcome.halt, Some(HaltCause::RetriesExhausted));
        assert_eq!(outcome.processed, 1);
        assert_eq!(api.requested.borrow().len(), 2);
        assert_eq!(store.airing_count(), 1);
        assert!(cache.bucket_path(plan.buckets[0].start_ms()).exists());
    }

    #[tokio::test]
    async fn test_unbuildable_request_halts_with_its_own_cause() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDir::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let options = one_day();
        let plan = plan_buckets(&now, &options);
        let invalid = FetchError::Url {
            label: String::from("grid"),
            source: url::ParseError::EmptyHost,
        };
        let api = ScriptedApi::new(vec![Err(invalid)]);
        let mut store = GuideStore::new();

        // Act
        let outcome =
            fetch_buckets(&api, &cache, &plan, &GridAdapter, &mut store, &options).await;

        // Assert
        assert_eq!(outcome.halt, Some(HaltCause::InvalidRequest));
        assert!(outcome.halted());
        assert_eq!(outcome.processed, 0);
        assert_eq!(api.requested.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_and_expired_buckets_are_evicted() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDir::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let options = GuideOptions {
            no_placeholder_cache: true,
            ..one_day()
        };
        let plan = plan_buckets(&now, &options);
        let tba = r#"{"channels": [{"channelId": "1", "channelNo": "2", "events": [
            {"program": {"id": "SH1", "title": "TBA"}, "startTime": "2024-01-15T00:00:00Z"}
        ]}]}"#;
        let expired = r#"{"expired": true, "channels": []}"#;
        let api = ScriptedApi::new(vec![Ok(String::from(tba)), Ok(String::from(expired))]);
        let mut store = GuideStore::new();

        // Act
        let outcome =
            fetch_buckets(&api, &cache, &plan, &GridAdapter, &mut store, &options).await;

        // Assert
        assert_eq!(outcome.processed, 8);
        assert!(!cache.bucket_path(plan.buckets[0].start_ms()).exists());
        assert!(!cache.bucket_path(plan.buckets[1].start_ms()).exists());
        assert!(cache.bucket_path(plan.buckets[2].start_ms()).exists());
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_refetched() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDir::open(dir.path()).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let options = GuideOptions {
            grid_hours: 24,
            ..one_day()
        };
        let plan = plan_buckets(&now, &options);
        let path = cache.bucket_path(plan.buckets[0].start_ms());
        std::fs::write(&path, b"not gzip").unwrap();
        let api = ScriptedApi::new(Vec::new());
        let mut store = GuideStore::new();

        // Act
        let outcome =
            fetch_buckets(&api, &cache, &plan, &GridAdapter, &mut store, &options).await;

        // Assert
        assert_eq!(outcome.fetched, 1);
        assert_eq!(api.requested.borrow().len(), 1);
        assert_eq!(cache.read(&path).as_deref(), Some(r#"{"channels": []}"#));
    }
}
