//! Per-field merge policies for program records.
//!
//! Normalizers and enrichers never assign program fields directly: every
//! candidate value goes through [`merge_program`], which consults
//! [`policy_for`] so the outcome does not depend on which payload arrived
//! first unless the policy says it should.

use crate::model::{Program, SeriesNumber};
use crate::observation::ProgramObservation;

/// Rating value that later candidates may replace.
pub const NOT_RATED: &str = "NR";

/// How a candidate value combines with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep the first value recorded.
    FirstWriteWins,
    /// Replace only with a strictly longer value.
    LongestWins,
    /// Keep the smallest value seen.
    EarliestWins,
    /// Set when unset or when the current value equals the sentinel.
    UpgradeFromSentinel(&'static str),
}

/// Merged program fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramField {
    /// Title.
    Title,
    /// Episode title.
    EpisodeTitle,
    /// Description.
    Description,
    /// Parental rating.
    Rating,
    /// Star rating.
    StarRating,
    /// Original air date.
    OriginalAirDate,
    /// Image URL.
    ImageUrl,
    /// Program URL.
    Url,
    /// Release year.
    Year,
    /// Season number.
    Season,
    /// Episode number.
    Episode,
    /// Duration.
    Duration,
    /// Series id.
    SeriesId,
    /// Generic flag.
    Generic,
}

/// Static policy table.
const POLICY_TABLE: [(ProgramField, MergePolicy); 14] = [
    (ProgramField::Title, MergePolicy::FirstWriteWins),
    (ProgramField::EpisodeTitle, MergePolicy::FirstWriteWins),
    (ProgramField::Description, MergePolicy::LongestWins),
    (
        ProgramField::Rating,
        MergePolicy::UpgradeFromSentinel(NOT_RATED),
    ),
    (ProgramField::StarRating, MergePolicy::FirstWriteWins),
    (ProgramField::OriginalAirDate, MergePolicy::EarliestWins),
    (ProgramField::ImageUrl, MergePolicy::FirstWriteWins),
    (ProgramField::Url, MergePolicy::FirstWriteWins),
    (ProgramField::Year, MergePolicy::FirstWriteWins),
    (ProgramField::Season, MergePolicy::FirstWriteWins),
    (ProgramField::Episode, MergePolicy::FirstWriteWins),
    (ProgramField::Duration, MergePolicy::FirstWriteWins),
    (ProgramField::SeriesId, MergePolicy::FirstWriteWins),
    (ProgramField::Generic, MergePolicy::FirstWriteWins),
];

/// Looks up the policy for `field`.
#[must_use]
pub fn policy_for(field: ProgramField) -> MergePolicy {
    POLICY_TABLE
        .iter()
        .find(|(f, _)| *f == field)
        .map_or(MergePolicy::FirstWriteWins, |(_, policy)| *policy)
}

/// A value that can be merged under any [`MergePolicy`].
pub trait FieldValue: PartialOrd {
    /// Length used by [`MergePolicy::LongestWins`].
    fn weight(&self) -> usize;

    /// Returns `true` if the value equals the sentinel.
    fn is_sentinel(&self, sentinel: &str) -> bool;
}

impl FieldValue for String {
    fn weight(&self) -> usize {
        self.chars().count()
    }

    fn is_sentinel(&self, sentinel: &str) -> bool {
        self == sentinel
    }
}

impl FieldValue for i64 {
    fn weight(&self) -> usize {
        0
    }

    fn is_sentinel(&self, _sentinel: &str) -> bool {
        false
    }
}

impl FieldValue for u32 {
    fn weight(&self) -> usize {
        0
    }

    fn is_sentinel(&self, _sentinel: &str) -> bool {
        false
    }
}

impl FieldValue for SeriesNumber {
    fn weight(&self) -> usize {
        0
    }

    fn is_sentinel(&self, _sentinel: &str) -> bool {
        false
    }
}

impl FieldValue for bool {
    fn weight(&self) -> usize {
        0
    }

    fn is_sentinel(&self, _sentinel: &str) -> bool {
        false
    }
}

/// Merges `candidate` into `slot` under `policy`. Returns `true` if the slot changed.
pub fn merge_value<T: FieldValue>(
    slot: &mut Option<T>,
    candidate: Option<T>,
    policy: MergePolicy,
) -> bool {
    let Some(candidate) = candidate else {
        return false;
    };
    let replace = match (slot.as_ref(), policy) {
        (None, _) => true,
        (Some(_), MergePolicy::FirstWriteWins) => false,
        (Some(current), MergePolicy::LongestWins) => candidate.weight() > current.weight(),
        (Some(current), MergePolicy::EarliestWins) => candidate < *current,
        (Some(current), MergePolicy::UpgradeFromSentinel(sentinel)) => {
            current.is_sentinel(sentinel)
        }
    };
    if replace {
        *slot = Some(candidate);
    }
    replace
}

/// Merges one observation into a program record.
pub fn merge_program(program: &mut Program, obs: ProgramObservation) {
    use ProgramField as F;

    merge_value(&mut program.title, obs.title, policy_for(F::Title));
    merge_value(
        &mut program.episode_title,
        obs.episode_title,
        policy_for(F::EpisodeTitle),
    );
    merge_value(
        &mut program.description,
        obs.description,
        policy_for(F::Description),
    );
    merge_value(&mut program.rating, obs.rating, policy_for(F::Rating));
    merge_value(
        &mut program.star_rating,
        obs.star_rating,
        policy_for(F::StarRating),
    );
    merge_value(
        &mut program.original_air_date,
        obs.original_air_date,
        policy_for(F::OriginalAirDate),
    );
    merge_value(&mut program.image_url, obs.image_url, policy_for(F::ImageUrl));
    merge_value(&mut program.url, obs.url, policy_for(F::Url));
    merge_value(&mut program.year, obs.year, policy_for(F::Year));
    merge_value(&mut program.season, obs.season, policy_for(F::Season));
    merge_value(&mut program.episode, obs.episode, policy_for(F::Episode));
    merge_value(&mut program.duration, obs.duration, policy_for(F::Duration));
    merge_value(&mut program.series_id, obs.series_id, policy_for(F::SeriesId));
    merge_value(&mut program.generic, obs.generic, policy_for(F::Generic));

    for (name, rank) in &obs.genres {
        program.genres.insert(name, *rank);
    }
    if obs.series {
        program.genres.insert("series", SERIES_GENRE_RANK);
    }
    program
        .genres
        .append(obs.appended_genres.iter().map(String::as_str));

    for credit in obs.credits {
        program.add_credit(credit);
    }
}

/// Rank of the synthetic `series` genre.
pub const SERIES_GENRE_RANK: u32 = 99;
