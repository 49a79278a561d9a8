//! Channel identifier synthesis.

use crate::model::Station;

/// How `channel` ids are built. One mode is used for the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelIdMode {
    /// `I{number}.{id}.gracenote.com`.
    #[default]
    Gracenote,
    /// `I{number}.{id}.tvguide.com`.
    TvGuide,
    /// `C{number}{callsign}.gracenote.com`.
    Legacy,
    /// `I{id}.labs.gracenote.com`.
    Labs,
}

impl ChannelIdMode {
    /// Channel id for `station`.
    #[must_use]
    pub fn channel_id(self, station: &Station) -> String {
        match self {
            Self::Gracenote => format!("I{}.{}.gracenote.com", station.number, station.provider_id),
            Self::TvGuide => format!("I{}.{}.tvguide.com", station.number, station.provider_id),
            Self::Legacy => format!(
                "C{}{}.gracenote.com",
                station.number,
                station.call_sign.to_lowercase()
            ),
            Self::Labs => format!("I{}.labs.gracenote.com", station.provider_id),
        }
    }
}
