//! Gracenote `overviewDetails` payload.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use super::DetailAdapter;
use crate::error::GuideError;
use crate::model::{CreditEntry, CreditRole, Program, ProgramKind};
use crate::normalize::de::lenient_string;
use crate::observation::ProgramObservation;
use crate::options::GuideOptions;

/// Air date the provider uses for "unknown".
const UNKNOWN_AIR_DATE: &str = "1000-01-01T00:00Z";

const AIR_DATE_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Overview {
    #[serde(default, deserialize_with = "lenient_string")]
    series_genres: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    series_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    series_description: Option<String>,
    #[serde(default)]
    overview_tab: Option<OverviewTab>,
    #[serde(default)]
    upcoming_episode_tab: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverviewTab {
    #[serde(default)]
    cast: Option<Vec<Person>>,
    #[serde(default)]
    crew: Option<Vec<Person>>,
    #[serde(default)]
    upcoming_episode: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Person {
    #[serde(default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    role: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    character_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpcomingEpisode {
    #[serde(default, rename = "tmsID", deserialize_with = "lenient_string")]
    tms_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    original_air_date: Option<String>,
}

/// Series overview lookups against the Gracenote site API.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverviewAdapter;

impl DetailAdapter for OverviewAdapter {
    fn kind(&self) -> &'static str {
        "overview"
    }

    fn cache_prefix(&self) -> &'static str {
        "O"
    }

    fn parse(
        &self,
        program: &Program,
        payload: &str,
        options: &GuideOptions,
    ) -> Result<ProgramObservation, GuideError> {
        let overview: Overview =
            serde_json::from_str(payload).map_err(|e| GuideError::malformed(self.kind(), e))?;
        let kind = program.kind();
        let mut obs = ProgramObservation::new(program.id.clone());

        if let Some(genres) = overview.series_genres {
            obs.appended_genres = genres
                .split('|')
                .filter(|g| !g.is_empty())
                .map(str::to_lowercase)
                .collect();
        }

        let tab = overview.overview_tab;
        let (cast, crew, upcoming) = match tab {
            Some(tab) => (
                tab.cast.unwrap_or_default(),
                tab.crew.unwrap_or_default(),
                tab.upcoming_episode,
            ),
            None => (Vec::new(), Vec::new(), None),
        };
        obs.credits.extend(cast_credits(cast));
        obs.credits.extend(crew_credits(crew));

        obs.image_url = overview
            .series_image
            .map(|img| format!("{}{img}.jpg", options.asset_url));
        if matches!(kind, ProgramKind::Movie | ProgramKind::Show) {
            obs.description = overview.series_description;
        }
        if kind == ProgramKind::Episode {
            obs.original_air_date = upcoming
                .into_iter()
                .chain(overview.upcoming_episode_tab.unwrap_or_default())
                .find_map(|value| air_date_for(&program.id, value));
        }

        Ok(obs)
    }
}

fn cast_credits(cast: Vec<Person>) -> Vec<CreditEntry> {
    let mut credits = Vec::new();
    let mut rank = 1u32;
    for person in cast {
        let Some(name) = person.name else {
            continue;
        };
        let host = person
            .role
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("host"));
        credits.push(CreditEntry {
            role: if host {
                CreditRole::Presenter
            } else {
                CreditRole::Actor
            },
            name,
            rank,
            character: if host { None } else { person.character_name },
        });
        rank = rank.saturating_add(1);
    }
    credits
}

fn crew_credits(crew: Vec<Person>) -> Vec<CreditEntry> {
    let mut credits = Vec::new();
    let mut rank = 1u32;
    for person in crew {
        let Some(name) = person.name else {
            continue;
        };
        let role = person.role.unwrap_or_default().to_lowercase();
        let bucket = if role.contains("producer") {
            Some(CreditRole::Producer)
        } else if role.contains("director") {
            Some(CreditRole::Director)
        } else if role.contains("writer") {
            Some(CreditRole::Writer)
        } else {
            None
        };
        if let Some(role) = bucket {
            credits.push(CreditEntry {
                role,
                name,
                rank,
                character: None,
            });
        }
        rank = rank.saturating_add(1);
    }
    credits
}

/// Air date of the upcoming-episode record matching `program_id`.
fn air_date_for(program_id: &str, value: Value) -> Option<i64> {
    let episode: UpcomingEpisode = serde_json::from_value(value).ok()?;
    if !episode.tms_id?.eq_ignore_ascii_case(program_id) {
        return None;
    }
    let date = episode.original_air_date?;
    if date == UNKNOWN_AIR_DATE {
        return None;
    }
    NaiveDateTime::parse_from_str(&date, AIR_DATE_FORMAT)
        .ok()
        .map(|t| t.and_utc().timestamp_millis())
}
