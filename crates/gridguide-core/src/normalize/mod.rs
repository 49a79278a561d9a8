//! Source normalization: provider payloads into the canonical store.
//!
//! Each provider has a [`SourceAdapter`] that turns one decompressed
//! payload into a [`RawBatch`]. [`ingest`] is the only code that writes
//! stations, programs and airings into a [`GuideStore`], so both
//! providers share the same creation and merge rules.

pub(crate) mod de;
pub mod grid;
pub mod tvguide;

use crate::error::GuideError;
use crate::merge::merge_program;
use crate::model::{Airing, ChannelNumber, DisplayOrder, GuideStore, Program, Station};
use crate::observation::RawBatch;
use crate::options::{GuideOptions, Provider};

pub use grid::GridAdapter;
pub use tvguide::TvGuideAdapter;

/// Translates one provider payload into canonical observations.
pub trait SourceAdapter {
    /// Payload kind used in logs and errors.
    fn kind(&self) -> &'static str;

    /// Decodes `payload` into a batch of observations.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::MalformedPayload`] if the payload is not valid JSON
    /// of the expected shape.
    fn adapt(&self, payload: &str, options: &GuideOptions) -> Result<RawBatch, GuideError>;
}

static GRID: GridAdapter = GridAdapter;
static TVGUIDE: TvGuideAdapter = TvGuideAdapter;

/// Returns the schedule adapter for `provider`.
#[must_use]
pub fn source_adapter(provider: Provider) -> &'static dyn SourceAdapter {
    match provider {
        Provider::Gracenote => &GRID,
        Provider::TvGuide => &TVGUIDE,
    }
}

/// What ingesting one batch revealed about its payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Some title or episode title matched the placeholder pattern.
    pub placeholder: bool,
    /// Provider flagged the payload as expired.
    pub expired: bool,
}

/// Merges a batch into the store.
///
/// Stations are created on first sight and their display order is fixed
/// then. Program observations go through the merge engine. Airings are
/// shifted by the configured offset and stored by start time.
pub fn ingest(store: &mut GuideStore, batch: RawBatch, options: &GuideOptions) -> IngestReport {
    let placeholder = batch.programs.iter().any(|p| {
        [p.title.as_deref(), p.episode_title.as_deref()]
            .into_iter()
            .flatten()
            .any(|t| options.placeholder.is_match(t))
    });

    for obs in batch.stations {
        if store.stations.contains_key(&obs.key) {
            continue;
        }
        let order = if options.retain_order {
            Some(DisplayOrder::Index(store.next_index))
        } else {
            ChannelNumber::parse(&obs.number).map(DisplayOrder::Number)
        };
        store.next_index = store.next_index.saturating_add(1);
        store.stations.insert(
            obs.key.clone(),
            Station {
                key: obs.key,
                provider_id: obs.provider_id,
                call_sign: obs.call_sign,
                full_name: obs.full_name,
                number: obs.number,
                order,
                logo_url: obs.logo_url,
                icon_path: None,
            },
        );
    }

    for obs in batch.programs {
        let program = store
            .programs
            .entry(obs.id.clone())
            .or_insert_with(|| Program::new(obs.id.clone()));
        merge_program(program, obs);
    }

    let shift_ms = options.shift_minutes.saturating_mul(60_000);
    for obs in batch.airings {
        store.insert_airing(Airing {
            station: obs.station,
            start_ms: obs.start_ms.saturating_add(shift_ms),
            end_ms: obs.end_ms.map(|end| end.saturating_add(shift_ms)),
            program_id: obs.program_id,
            flags: obs.flags,
        });
    }

    IngestReport {
        placeholder,
        expired: batch.expired,
    }
}
