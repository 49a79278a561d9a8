//! Immutable run configuration.
//!
//! Every optional behavior of the pipeline is a named field here. The
//! CLI resolves one `GuideOptions` before the run starts; stages only
//! read it.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::error::GuideError;
use crate::render::{ChannelIdMode, EscapeSet};

/// Default placeholder-title pattern.
pub const DEFAULT_PLACEHOLDER_PATTERN: &str = r"\bTBA\b|To Be Announced";

/// Gracenote site root used for program URLs.
pub const GRACENOTE_SITE_URL: &str = "https://tvlistings.gracenote.com/";

/// Gracenote image asset root.
pub const GRACENOTE_ASSET_URL: &str = "https://zap2it.tmsimg.com/assets/";

/// TV Guide site root used for program URLs.
pub const TVGUIDE_SITE_URL: &str = "https://www.tvguide.com";

#[allow(clippy::expect_used)]
static DEFAULT_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(DEFAULT_PLACEHOLDER_PATTERN)
        .case_insensitive(true)
        .build()
        .expect("valid regex")
});

/// Listings provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    /// Gracenote grid JSON.
    #[default]
    Gracenote,
    /// TV Guide schedule JSON.
    TvGuide,
}

/// Output document schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Channel/programme document (`xmltv.dtd`).
    #[default]
    Xmltv,
    /// Multi-section TMS document (`tmsxtvd.xsd`).
    Xtvd,
}

/// Clock used to align bucket boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeAlignment {
    /// Local wall-clock boundaries.
    #[default]
    Local,
    /// Raw UTC boundaries.
    Utc,
}

/// Days whose buckets are always re-fetched, cache or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoCachePolicy {
    /// Force the last `from_end` days of the range.
    pub from_end: u32,
    /// Force the first `from_start` days of the range.
    pub from_start: u32,
    /// Force this one 1-based day.
    pub day: Option<u32>,
}

impl NoCachePolicy {
    /// Returns `true` if buckets of the 1-based `day` out of `days` must be fetched.
    #[must_use]
    pub fn forces(&self, day: u32, days: u32) -> bool {
        day > days.saturating_sub(self.from_end)
            || day <= self.from_start
            || self.day == Some(day)
    }
}

/// Which airing flags append ` *` to the title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsteriskOn {
    /// Mark new airings.
    pub new: bool,
    /// Mark live airings.
    pub live: bool,
}

/// Lineup description used by the XTVD `lineups` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineupInfo {
    /// Lineup id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Location label.
    pub location: String,
    /// Lineup type (`CABLE`, `OTA`, ...).
    pub kind: String,
    /// Postal code.
    pub postal_code: String,
}

/// Resolved run configuration.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct GuideOptions {
    /// Listings provider.
    pub provider: Provider,
    /// Output schema.
    pub format: DocumentFormat,
    /// First day, as an offset from today.
    pub start_day: u32,
    /// Number of days to fetch.
    pub days: u32,
    /// Bucket width in hours (must divide 24).
    pub grid_hours: u32,
    /// Forced re-fetch windows.
    pub no_cache: NoCachePolicy,
    /// Bucket alignment clock.
    pub alignment: TimeAlignment,
    /// Minutes added to every airing time.
    pub shift_minutes: i64,
    /// `lang` attribute for text elements.
    pub language: String,
    /// Emit UTF-8 instead of ISO-8859-1.
    pub utf8: bool,
    /// Escape every non-ASCII character numerically.
    pub encode_non_ascii: bool,
    /// Markup characters to escape.
    pub escape: EscapeSet,
    /// Put the bare station name before the numbered display names.
    pub channel_names_first: bool,
    /// Channel id synthesis mode.
    pub channel_ids: ChannelIdMode,
    /// Order stations by provider position instead of channel number.
    pub retain_order: bool,
    /// Ignore favorites and emit every channel.
    pub all_channels: bool,
    /// Favorite channel ids (empty means every channel).
    pub favorites: BTreeSet<String>,
    /// Keep only the first occurrence of a favorite channel per payload.
    pub first_favorite_only: bool,
    /// Placeholder-title pattern.
    pub placeholder: Regex,
    /// Evict cached buckets that contain placeholder titles.
    pub no_placeholder_cache: bool,
    /// Fetch per-program details.
    pub include_details: bool,
    /// Fetch details for program images.
    pub include_icons: bool,
    /// Directory for station logo references.
    pub icon_dir: Option<PathBuf>,
    /// Tag every non-movie program with the `series` genre.
    pub series_category: bool,
    /// Title marker options.
    pub asterisk: AsteriskOn,
    /// Synthesize `Movie (YEAR)` subtitles.
    pub movie_subtitle: bool,
    /// Emit `<live />` for live airings.
    pub live_tag: bool,
    /// External XMLTV document to splice in.
    pub include_xmltv: Option<PathBuf>,
    /// Lineup description.
    pub lineup: LineupInfo,
    /// Image asset root.
    pub asset_url: String,
    /// Program URL root.
    pub site_url: String,
}

impl Default for GuideOptions {
    fn default() -> Self {
        Self {
            provider: Provider::Gracenote,
            format: DocumentFormat::Xmltv,
            start_day: 0,
            days: 7,
            grid_hours: 3,
            no_cache: NoCachePolicy::default(),
            alignment: TimeAlignment::Local,
            shift_minutes: 0,
            language: String::from("en"),
            utf8: false,
            encode_non_ascii: false,
            escape: EscapeSet::default(),
            channel_names_first: false,
            channel_ids: ChannelIdMode::Gracenote,
            retain_order: false,
            all_channels: false,
            favorites: BTreeSet::new(),
            first_favorite_only: false,
            placeholder: DEFAULT_PLACEHOLDER.clone(),
            no_placeholder_cache: false,
            include_details: false,
            include_icons: false,
            icon_dir: None,
            series_category: false,
            asterisk: AsteriskOn::default(),
            movie_subtitle: false,
            live_tag: false,
            include_xmltv: None,
            lineup: LineupInfo::default(),
            asset_url: String::from(GRACENOTE_ASSET_URL),
            site_url: String::from(GRACENOTE_SITE_URL),
        }
    }
}

impl GuideOptions {
    /// Compiles a case-insensitive placeholder pattern.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::Configuration`] if the pattern is invalid.
    pub fn placeholder_from(pattern: &str) -> Result<Regex, GuideError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| GuideError::Configuration(format!("invalid placeholder pattern: {e}")))
    }

    /// Number of buckets per day.
    #[must_use]
    pub fn buckets_per_day(&self) -> u32 {
        24u32.checked_div(self.grid_hours).unwrap_or(1)
    }

    /// Checks the options before any fetch.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::Configuration`] when the lineup id is missing,
    /// the day count is zero, the bucket width does not divide a day, or
    /// the channel id mode does not match the provider.
    pub fn validate(&self) -> Result<(), GuideError> {
        if self.lineup.id.trim().is_empty() {
            return Err(GuideError::Configuration(String::from(
                "lineup id is required",
            )));
        }
        if self.days == 0 {
            return Err(GuideError::Configuration(String::from(
                "days must be at least 1",
            )));
        }
        if self.grid_hours == 0 || 24u32.checked_rem(self.grid_hours) != Some(0) {
            return Err(GuideError::Configuration(format!(
                "grid hours must divide 24, got {}",
                self.grid_hours
            )));
        }
        let tvguide_ids = self.channel_ids == ChannelIdMode::TvGuide;
        if tvguide_ids != (self.provider == Provider::TvGuide) {
            return Err(GuideError::Configuration(String::from(
                "tvguide channel ids are used exactly when the provider is tvguide",
            )));
        }
        Ok(())
    }
}
