//! Provider-neutral observations produced by the source and detail adapters.

use std::collections::BTreeSet;

use crate::model::{AiringFlags, CreditEntry, SeriesNumber, StationKey};

/// A station as seen in one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationObservation {
    /// Compound key.
    pub key: StationKey,
    /// Provider channel id.
    pub provider_id: String,
    /// Call sign.
    pub call_sign: String,
    /// Full name.
    pub full_name: Option<String>,
    /// Channel number without leading zeros.
    pub number: String,
    /// Logo URL.
    pub logo_url: Option<String>,
}

/// Field values for one program as seen in one payload.
///
/// Every field is a candidate; the merge engine decides whether it lands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramObservation {
    /// Program id (merge key).
    pub id: String,
    /// Title candidate.
    pub title: Option<String>,
    /// Episode title candidate.
    pub episode_title: Option<String>,
    /// Description candidate.
    pub description: Option<String>,
    /// Rating candidate.
    pub rating: Option<String>,
    /// Star rating candidate.
    pub star_rating: Option<String>,
    /// Original air date candidate, epoch milliseconds.
    pub original_air_date: Option<i64>,
    /// Image URL candidate.
    pub image_url: Option<String>,
    /// Program URL candidate.
    pub url: Option<String>,
    /// Release year candidate.
    pub year: Option<String>,
    /// Season candidate.
    pub season: Option<SeriesNumber>,
    /// Episode candidate.
    pub episode: Option<SeriesNumber>,
    /// Duration candidate in minutes.
    pub duration: Option<u32>,
    /// Series id candidate.
    pub series_id: Option<String>,
    /// Generic flag candidate.
    pub generic: Option<bool>,
    /// Genres with explicit ranks.
    pub genres: Vec<(String, u32)>,
    /// Genres appended after the current highest rank.
    pub appended_genres: Vec<String>,
    /// Add the synthetic `series` genre.
    pub series: bool,
    /// Credits.
    pub credits: Vec<CreditEntry>,
}

impl ProgramObservation {
    /// Creates an observation with only the id set.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// An airing as seen in one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiringObservation {
    /// Station key.
    pub station: StationKey,
    /// Program id.
    pub program_id: String,
    /// Start, epoch milliseconds.
    pub start_ms: i64,
    /// End, epoch milliseconds.
    pub end_ms: Option<i64>,
    /// Flags.
    pub flags: AiringFlags,
}

/// Everything one schedule payload contributed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawBatch {
    /// Stations in payload order.
    pub stations: Vec<StationObservation>,
    /// Program observations in payload order.
    pub programs: Vec<ProgramObservation>,
    /// Airings in payload order.
    pub airings: Vec<AiringObservation>,
    /// Provider flagged the payload as expired.
    pub expired: bool,
}

impl RawBatch {
    /// Distinct program ids in the batch.
    #[must_use]
    pub fn program_ids(&self) -> BTreeSet<&str> {
        self.programs.iter().map(|p| p.id.as_str()).collect()
    }
}
