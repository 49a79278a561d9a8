//! Schedule assembly: ordered, gap-closed timelines per station.

use std::collections::BTreeMap;

use crate::merge::{ProgramField, merge_value, policy_for};
use crate::model::{AiringFlags, GuideStore, ProgramKind, StationKey};

/// An airing with its end time resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAiring {
    /// Start, epoch milliseconds.
    pub start_ms: i64,
    /// End, epoch milliseconds.
    pub end_ms: i64,
    /// Program id.
    pub program_id: String,
    /// Flags.
    pub flags: AiringFlags,
}

/// Resolved timelines for every station.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssembledGuide {
    /// Airings per station, ordered by start.
    pub timelines: BTreeMap<StationKey, Vec<ResolvedAiring>>,
    /// Trailing airings dropped because no end could be inferred.
    pub dropped: usize,
}

impl AssembledGuide {
    /// Total resolved airings.
    #[must_use]
    pub fn airing_count(&self) -> usize {
        self.timelines.values().map(Vec::len).sum()
    }
}

/// Resolves every station's airings and backfills original air dates.
///
/// An airing without an explicit end ends where the next one on the same
/// station starts. A trailing airing with neither is dropped.
#[must_use]
pub fn assemble(store: &mut GuideStore) -> AssembledGuide {
    let mut guide = AssembledGuide::default();

    for (key, airings) in &store.schedules {
        let ordered: Vec<_> = airings.values().collect();
        let mut timeline = Vec::with_capacity(ordered.len());
        for (i, airing) in ordered.iter().enumerate() {
            let next_start = ordered.get(i.saturating_add(1)).map(|next| next.start_ms);
            let Some(end_ms) = airing.end_ms.or(next_start) else {
                guide.dropped = guide.dropped.saturating_add(1);
                continue;
            };
            timeline.push(ResolvedAiring {
                start_ms: airing.start_ms,
                end_ms,
                program_id: airing.program_id.clone(),
                flags: airing.flags,
            });
        }
        guide.timelines.insert(key.clone(), timeline);
    }

    backfill_air_dates(store);
    guide
}

/// First-run airings bound the original air date of dated program ids.
fn backfill_air_dates(store: &mut GuideStore) {
    let policy = policy_for(ProgramField::OriginalAirDate);

    for airing in store.schedules.values().flat_map(BTreeMap::values) {
        if !(airing.flags.new || airing.flags.live) || !has_dated_id(&airing.program_id) {
            continue;
        }
        if let Some(program) = store.programs.get_mut(&airing.program_id) {
            merge_value(
                &mut program.original_air_date,
                Some(airing.start_ms),
                policy,
            );
        }
    }
}

/// Episode, show or movie id whose embedded date component is non-zero.
fn has_dated_id(id: &str) -> bool {
    matches!(
        ProgramKind::of(id),
        ProgramKind::Episode | ProgramKind::Show | ProgramKind::Movie
    ) && id.len() >= 10
        && id.get(10..14) != Some("0000")
}
