//! TV Guide `listings/details` payload.

use serde::Deserialize;

use super::DetailAdapter;
use crate::error::GuideError;
use crate::merge::NOT_RATED;
use crate::model::Program;
use crate::normalize::de::{lenient_string, lenient_u32};
use crate::observation::ProgramObservation;
use crate::options::GuideOptions;

#[derive(Debug, Deserialize)]
struct Details {
    #[serde(default)]
    program: Option<DetailProgram>,
    #[serde(default)]
    tvobject: Option<DetailObject>,
}

#[derive(Debug, Deserialize)]
struct DetailProgram {
    #[serde(default, deserialize_with = "lenient_string")]
    release_year: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    star_rating: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailObject {
    #[serde(default)]
    photos: Option<Vec<Photo>>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default, deserialize_with = "lenient_u32")]
    width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    height: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    url: Option<String>,
}

/// Per-program detail lookups against the TV Guide mobile API.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramDetailsAdapter;

impl DetailAdapter for ProgramDetailsAdapter {
    fn kind(&self) -> &'static str {
        "details"
    }

    fn cache_prefix(&self) -> &'static str {
        "D"
    }

    fn parse(
        &self,
        program: &Program,
        payload: &str,
        _options: &GuideOptions,
    ) -> Result<ProgramObservation, GuideError> {
        let details: Details =
            serde_json::from_str(payload).map_err(|e| GuideError::malformed(self.kind(), e))?;
        let mut obs = ProgramObservation::new(program.id.clone());

        if let Some(info) = details.program {
            obs.year = info.release_year;
            obs.rating = info.rating.filter(|r| r != NOT_RATED);
            obs.star_rating = info.star_rating;
        }

        // Largest photo by area; on ties the later one wins.
        obs.image_url = details
            .tvobject
            .and_then(|tv| tv.photos)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|photo| {
                let area = u64::from(photo.width?).saturating_mul(u64::from(photo.height?));
                (area > 0).then_some((area, photo.url?))
            })
            .max_by_key(|(area, _)| *area)
            .map(|(_, url)| url);

        Ok(obs)
    }
}
