//! `ListingsApi` trait definition.
#![allow(clippy::future_not_send)]

use chrono::{DateTime, Utc};

use crate::error::FetchError;

/// One schedule bucket to request from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridWindow {
    /// Bucket start (aligned by the scheduler).
    pub start: DateTime<Utc>,
    /// Bucket width in hours.
    pub hours: u32,
}

impl GridWindow {
    /// Creates a window starting at `start` spanning `hours`.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, hours: u32) -> Self {
        Self { start, hours }
    }

    /// Bucket start in whole epoch seconds.
    #[must_use]
    pub fn start_secs(&self) -> i64 {
        self.start.timestamp()
    }

    /// Bucket width in minutes.
    #[must_use]
    pub const fn minutes(&self) -> u32 {
        self.hours.saturating_mul(60)
    }
}

/// A per-program detail lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    /// Provider program id.
    pub program_id: String,
    /// Provider series id, if the program belongs to one.
    pub series_id: Option<String>,
}

impl DetailRequest {
    /// Creates a detail request for `program_id`.
    #[must_use]
    pub fn new(program_id: impl Into<String>, series_id: Option<String>) -> Self {
        Self {
            program_id: program_id.into(),
            series_id,
        }
    }
}

/// Listings provider API.
///
/// Abstracts provider operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
/// Both operations return the raw response body; decoding belongs to
/// the guide normalizers so the body can be cached verbatim.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(ListingsApi: Send)]
pub trait LocalListingsApi {
    /// Fetches the schedule payload for one bucket.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Exhausted`] when every attempt failed and
    /// [`FetchError::NoData`] when the provider answered that it has none.
    async fn fetch_grid(&self, window: &GridWindow) -> Result<String, FetchError>;

    /// Fetches the detail payload for one program.
    ///
    /// # Errors
    ///
    /// Same conditions as [`LocalListingsApi::fetch_grid`].
    async fn fetch_details(&self, request: &DetailRequest) -> Result<String, FetchError>;
}
