//! Enumerated option values shared by flags and the config file.

use clap::ValueEnum;
use gridguide_core::{ChannelIdMode, DocumentFormat, Provider};
use serde::{Deserialize, Serialize};

/// Listings provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderChoice {
    /// tvlistings.gracenote.com grid.
    Gracenote,
    /// tvguide.com schedules.
    Tvguide,
}

impl From<ProviderChoice> for Provider {
    fn from(choice: ProviderChoice) -> Self {
        match choice {
            ProviderChoice::Gracenote => Self::Gracenote,
            ProviderChoice::Tvguide => Self::TvGuide,
        }
    }
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatChoice {
    /// XMLTV `tv` document.
    Xmltv,
    /// XTVD document.
    Xtvd,
}

impl From<FormatChoice> for DocumentFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Xmltv => Self::Xmltv,
            FormatChoice::Xtvd => Self::Xtvd,
        }
    }
}

impl FormatChoice {
    /// Output file name used when none is configured.
    pub const fn default_file_name(self) -> &'static str {
        match self {
            Self::Xmltv => "xmltv.xml",
            Self::Xtvd => "xtvd.xml",
        }
    }
}

/// Channel id style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelIdChoice {
    /// `I{number}.{id}.gracenote.com`.
    Gracenote,
    /// `I{number}.{id}.tvguide.com`.
    Tvguide,
    /// `C{number}{callsign}.gracenote.com`.
    Legacy,
    /// `I{id}.labs.gracenote.com`.
    Labs,
}

impl From<ChannelIdChoice> for ChannelIdMode {
    fn from(choice: ChannelIdChoice) -> Self {
        match choice {
            ChannelIdChoice::Gracenote => Self::Gracenote,
            ChannelIdChoice::Tvguide => Self::TvGuide,
            ChannelIdChoice::Legacy => Self::Legacy,
            ChannelIdChoice::Labs => Self::Labs,
        }
    }
}

/// Airing flag that marks a title with ` *`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsteriskChoice {
    /// First-run airings.
    New,
    /// Live airings.
    Live,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_choice_maps_to_core_mode() {
        // Arrange & Act & Assert
        assert_eq!(
            ChannelIdMode::from(ChannelIdChoice::Tvguide),
            ChannelIdMode::TvGuide
        );
        assert_eq!(
            ChannelIdMode::from(ChannelIdChoice::Labs),
            ChannelIdMode::Labs
        );
    }

    #[test]
    fn test_default_file_name_follows_format() {
        // Arrange & Act & Assert
        assert_eq!(FormatChoice::Xmltv.default_file_name(), "xmltv.xml");
        assert_eq!(FormatChoice::Xtvd.default_file_name(), "xtvd.xml");
    }
}
