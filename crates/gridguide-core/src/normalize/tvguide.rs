//! TV Guide schedules JSON adapter.

use chrono::NaiveDate;
use serde::Deserialize;

use super::SourceAdapter;
use super::de::{lenient_i64, lenient_series_number, lenient_string};
use crate::error::GuideError;
use crate::model::{AiringFlags, SeriesNumber, StationKey};
use crate::observation::{AiringObservation, ProgramObservation, RawBatch, StationObservation};
use crate::options::{GuideOptions, TVGUIDE_SITE_URL};

const CATEGORY_MOVIE: i64 = 1;

const LIVE_BIT: i64 = 1;
const NEW_BIT: i64 = 4;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ScheduleEntry {
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(default)]
    program_schedules: Option<Vec<ProgramSchedule>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Channel {
    #[serde(default, deserialize_with = "lenient_string")]
    source_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProgramSchedule {
    #[serde(default, deserialize_with = "lenient_string")]
    program_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    cat_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    parent_program_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    episode_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    copy_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    start_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    end_time: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64")]
    airing_attrib: Option<i64>,
    #[serde(default, rename = "TVObject")]
    tv_object: Option<TvObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TvObject {
    #[serde(default, deserialize_with = "lenient_series_number")]
    season_number: Option<SeriesNumber>,
    #[serde(default, deserialize_with = "lenient_series_number")]
    episode_number: Option<SeriesNumber>,
    #[serde(default, deserialize_with = "lenient_string")]
    episode_air_date: Option<String>,
    #[serde(default, rename = "EpisodeSEOUrl", deserialize_with = "lenient_string")]
    episode_seo_url: Option<String>,
    #[serde(default, rename = "SEOUrl", deserialize_with = "lenient_string")]
    seo_url: Option<String>,
}

/// Adapter for the `Listingsweb/ws/rest/schedules` payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct TvGuideAdapter;

impl SourceAdapter for TvGuideAdapter {
    fn kind(&self) -> &'static str {
        "schedules"
    }

    fn adapt(&self, payload: &str, options: &GuideOptions) -> Result<RawBatch, GuideError> {
        let entries: Vec<ScheduleEntry> =
            serde_json::from_str(payload).map_err(|e| GuideError::malformed(self.kind(), e))?;

        let mut batch = RawBatch::default();
        let filter_favorites = !options.all_channels && !options.favorites.is_empty();

        for entry in entries {
            let channel = entry.channel.unwrap_or_default();
            let source_id = channel.source_id.unwrap_or_default();
            let number = channel.number.unwrap_or_default();
            let key = StationKey::new(&number, &source_id);
            if filter_favorites && !options.favorites.contains(key.as_str()) {
                continue;
            }

            let call_sign = channel.name.unwrap_or_default();
            let full_name = channel.full_name.filter(|full| *full != call_sign);
            batch.stations.push(StationObservation {
                key: key.clone(),
                provider_id: source_id,
                call_sign,
                full_name,
                number,
                logo_url: None,
            });

            for schedule in entry.program_schedules.unwrap_or_default() {
                adapt_schedule(schedule, &key, options, &mut batch);
            }
        }

        Ok(batch)
    }
}

fn adapt_schedule(
    schedule: ProgramSchedule,
    station: &StationKey,
    options: &GuideOptions,
    batch: &mut RawBatch,
) {
    let Some(id) = schedule.program_id else {
        return;
    };
    let Some(start_secs) = schedule.start_time.filter(|start| *start > 0) else {
        tracing::warn!(program = %id, "skipping schedule without a start time");
        return;
    };
    let category = schedule.cat_id.unwrap_or(0);

    let mut genres = Vec::new();
    if let Some(name) = category_genre(category) {
        genres.push((String::from(name), 1));
    }
    let series = schedule.parent_program_id.unwrap_or(0) != 0
        || (options.series_category && category != CATEGORY_MOVIE);

    let mut obs = ProgramObservation {
        title: schedule.title,
        episode_title: schedule.episode_title,
        description: schedule.copy_text,
        rating: schedule.rating,
        generic: Some(category != CATEGORY_MOVIE),
        genres,
        series,
        ..ProgramObservation::new(id.clone())
    };

    if let Some(tv) = schedule.tv_object {
        if let Some(season) = tv.season_number.filter(|n| n.value != 0) {
            obs.season = Some(season);
            obs.episode = tv.episode_number.filter(|n| n.value != 0);
        }
        obs.original_air_date = tv.episode_air_date.as_deref().and_then(parse_air_date);
        obs.url = match (tv.episode_seo_url, tv.seo_url) {
            (Some(url), _) => Some(url),
            (None, Some(url)) if category == CATEGORY_MOVIE && !url.contains("movies") => {
                Some(format!("/movies{url}"))
            }
            (None, seo) => seo,
        }
        .map(|path| format!("{TVGUIDE_SITE_URL}{path}"));
    }
    batch.programs.push(obs);

    let attrib = schedule.airing_attrib.unwrap_or(0);
    let live = attrib & LIVE_BIT != 0;
    batch.airings.push(AiringObservation {
        station: station.clone(),
        program_id: id,
        start_ms: start_secs.saturating_mul(1000),
        end_ms: schedule
            .end_time
            .filter(|end| *end > 0)
            .map(|end| end.saturating_mul(1000)),
        flags: AiringFlags {
            live,
            new: !live && attrib & NEW_BIT != 0,
            ..AiringFlags::default()
        },
    });
}

const fn category_genre(category: i64) -> Option<&'static str> {
    match category {
        1 => Some("movie"),
        2 => Some("sports"),
        3 => Some("family"),
        4 => Some("news"),
        _ => None,
    }
}

/// Keeps digits and dashes, then reads the date at 12:00 UTC.
fn parse_air_date(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|t| t.and_utc().timestamp_millis())
}
