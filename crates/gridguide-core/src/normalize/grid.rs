//! Gracenote grid JSON adapter.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Deserialize;

use super::SourceAdapter;
use super::de::{lenient_bool, lenient_series_number, lenient_string, lenient_u32};
use crate::error::GuideError;
use crate::model::{AiringFlags, ProgramKind, SeriesNumber, StationKey};
use crate::observation::{AiringObservation, ProgramObservation, RawBatch, StationObservation};
use crate::options::GuideOptions;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
struct GridPayload {
    #[serde(default)]
    channels: Option<Vec<GridChannel>>,
    #[serde(default, deserialize_with = "lenient_bool")]
    expired: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridChannel {
    #[serde(default, deserialize_with = "lenient_string")]
    channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    channel_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    call_sign: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    thumbnail: Option<String>,
    #[serde(default)]
    events: Option<Vec<GridEvent>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridEvent {
    #[serde(default)]
    program: Option<GridProgram>,
    #[serde(default, deserialize_with = "lenient_string")]
    start_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    end_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    duration: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    thumbnail: Option<String>,
    #[serde(default)]
    filter: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    rating: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    flag: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridProgram {
    #[serde(default, deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    episode_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    short_desc: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    release_year: Option<String>,
    #[serde(default, deserialize_with = "lenient_series_number")]
    season: Option<SeriesNumber>,
    #[serde(default, deserialize_with = "lenient_series_number")]
    episode: Option<SeriesNumber>,
    #[serde(default, deserialize_with = "lenient_string")]
    series_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    tms_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    is_generic: Option<bool>,
}

/// Adapter for the `api/grid` payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridAdapter;

impl SourceAdapter for GridAdapter {
    fn kind(&self) -> &'static str {
        "grid"
    }

    fn adapt(&self, payload: &str, options: &GuideOptions) -> Result<RawBatch, GuideError> {
        let parsed: GridPayload =
            serde_json::from_str(payload).map_err(|e| GuideError::malformed(self.kind(), e))?;

        let mut batch = RawBatch {
            expired: parsed.expired.unwrap_or(false),
            ..RawBatch::default()
        };
        let filter_favorites = !options.all_channels && !options.favorites.is_empty();
        let mut starred: BTreeSet<String> = BTreeSet::new();

        for channel in parsed.channels.unwrap_or_default() {
            let Some(channel_id) = channel.channel_id else {
                continue;
            };
            if filter_favorites {
                if !options.favorites.contains(&channel_id) {
                    continue;
                }
                if options.first_favorite_only && !starred.insert(channel_id.clone()) {
                    continue;
                }
            }

            let raw_number = channel.channel_no.unwrap_or_default();
            let key = StationKey::new(&raw_number, &channel_id);
            batch.stations.push(StationObservation {
                key: key.clone(),
                provider_id: channel_id,
                call_sign: channel.call_sign.unwrap_or_default(),
                full_name: None,
                number: String::from(raw_number.trim_start_matches('0')),
                logo_url: channel.thumbnail.as_deref().map(logo_url),
            });

            for event in channel.events.unwrap_or_default() {
                adapt_event(event, &key, options, &mut batch);
            }
        }

        Ok(batch)
    }
}

fn adapt_event(event: GridEvent, station: &StationKey, options: &GuideOptions, batch: &mut RawBatch) {
    let Some(program) = event.program else {
        return;
    };
    let Some(id) = program.id else {
        return;
    };
    let Some(start_ms) = event.start_time.as_deref().and_then(parse_time) else {
        tracing::warn!(
            program = %id,
            start = event.start_time.as_deref().unwrap_or_default(),
            "skipping event with invalid start time"
        );
        return;
    };

    let url = match (&program.series_id, &program.tms_id) {
        (Some(series), Some(tms)) => Some(format!(
            "{}overview-affiliates.html?programSeriesId={series}&tmsId={tms}",
            options.site_url
        )),
        _ => None,
    };
    let genres = (1u32..)
        .zip(event.filter.unwrap_or_default())
        .map(|(rank, tag)| (genre_name(&tag), rank))
        .collect();
    let series = options.series_category && ProgramKind::of(&id) != ProgramKind::Movie;

    batch.programs.push(ProgramObservation {
        title: program.title,
        episode_title: program.episode_title,
        description: program.short_desc,
        rating: event.rating,
        image_url: event
            .thumbnail
            .map(|t| format!("{}{t}.jpg", options.asset_url)),
        url,
        year: program.release_year,
        season: program.season.filter(|n| n.value > 0),
        episode: program.episode.filter(|n| n.value > 0),
        duration: event.duration.filter(|n| *n > 0),
        series_id: program.series_id,
        generic: Some(program.is_generic.unwrap_or(true)),
        genres,
        series,
        ..ProgramObservation::new(id.clone())
    });

    let tags = event.tags.unwrap_or_default();
    let flags = event.flag.unwrap_or_default();
    let has = |list: &[String], name: &str| list.iter().any(|v| v == name);
    batch.airings.push(AiringObservation {
        station: station.clone(),
        program_id: id,
        start_ms,
        end_ms: event.end_time.as_deref().and_then(parse_time),
        flags: AiringFlags {
            new: has(&flags, "New"),
            live: has(&flags, "Live"),
            premiere: has(&flags, "Premiere"),
            finale: has(&flags, "Finale"),
            closed_caption: has(&tags, "CC"),
        },
    });
}

fn parse_time(raw: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT)
        .ok()
        .map(|t| t.and_utc().timestamp_millis())
}

fn logo_url(raw: &str) -> String {
    let bare = raw.split('?').next().unwrap_or(raw);
    if bare.starts_with("http") {
        String::from(bare)
    } else {
        format!("https:{bare}")
    }
}

fn genre_name(tag: &str) -> String {
    let lower = tag.to_lowercase();
    lower
        .strip_prefix("filter-")
        .map_or_else(|| lower.clone(), String::from)
}
