//! `AppConfig` struct and TOML read/write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::choices::{AsteriskChoice, ChannelIdChoice, FormatChoice, ProviderChoice};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Lineup and account settings.
    #[serde(default)]
    pub lineup: LineupConfig,
    /// Fetch and cache settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Document settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Lineup identification sent to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LineupConfig {
    /// Headend id (`USA-OTA10001`, `CA04956`).
    pub id: Option<String>,
    /// Device letter appended to the headend id.
    pub device: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Country code (derived from the postal code when absent).
    pub country: Option<String>,
    /// Session token.
    pub token: Option<String>,
    /// Account preference string.
    pub pref: Option<String>,
    /// Lineup display name.
    pub name: Option<String>,
    /// Lineup location label.
    pub location: Option<String>,
    /// Lineup type (`CABLE`, `OTA`, ...).
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Fetching, caching and channel selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    /// Listings provider.
    pub provider: Option<ProviderChoice>,
    /// Days to fetch.
    pub days: Option<u32>,
    /// First day as an offset from today.
    pub start: Option<u32>,
    /// Always re-fetch the last N days.
    pub ncdays: Option<u32>,
    /// Always re-fetch the first N days.
    pub ncsdays: Option<u32>,
    /// Always re-fetch this 1-based day.
    pub ncmday: Option<u32>,
    /// Attempts per request.
    pub retries: Option<u32>,
    /// Seconds between requests.
    pub delay: Option<u64>,
    /// Cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Align buckets on UTC instead of local time.
    pub utc: Option<bool>,
    /// Minutes added to every airing.
    pub offset_minutes: Option<i64>,
    /// Fetch per-program details.
    pub details: Option<bool>,
    /// Fetch details for program images.
    pub icons: Option<bool>,
    /// Favorite channel ids.
    pub favorites: Option<Vec<String>>,
    /// Ignore favorites.
    pub all_channels: Option<bool>,
    /// Keep only the first listing of each favorite channel.
    pub first_favorite_only: Option<bool>,
    /// Placeholder-title pattern.
    pub placeholder: Option<String>,
    /// Evict cached buckets containing placeholder titles.
    pub no_placeholder_cache: Option<bool>,
}

/// Document rendering.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// Output file.
    pub file: Option<PathBuf>,
    /// Document format.
    pub format: Option<FormatChoice>,
    /// `lang` attribute.
    pub language: Option<String>,
    /// Write UTF-8 instead of ISO-8859-1.
    pub utf8: Option<bool>,
    /// Escape non-ASCII characters numerically.
    pub hex_entities: Option<bool>,
    /// Markup characters to escape (`amp,quot,apos,lt,gt`).
    pub escape: Option<String>,
    /// Bare station name first.
    pub names_first: Option<bool>,
    /// Channel id style.
    pub channel_ids: Option<ChannelIdChoice>,
    /// Keep provider channel order.
    pub retain_order: Option<bool>,
    /// Station logo directory.
    pub icon_dir: Option<PathBuf>,
    /// Add the `series` category to non-movies.
    pub series_category: Option<bool>,
    /// Flags that append ` *` to titles.
    pub asterisk: Option<Vec<AsteriskChoice>>,
    /// Synthesize `Movie (YEAR)` subtitles.
    pub movie_subtitle: Option<bool>,
    /// Emit `<live />`.
    pub live_tag: Option<bool>,
    /// XMLTV file to splice in.
    pub include: Option<PathBuf>,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}
