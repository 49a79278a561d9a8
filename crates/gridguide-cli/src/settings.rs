//! Resolves flags over the config file into run settings.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use gridguide_api::LineupParams;
use gridguide_core::options::{GRACENOTE_SITE_URL, TVGUIDE_SITE_URL};
use gridguide_core::{
    AsteriskOn, ChannelIdMode, DocumentFormat, EscapeSet, GuideOptions, LineupInfo,
    NoCachePolicy, Provider, TimeAlignment,
};

use crate::GenerateArgs;
use crate::choices::{AsteriskChoice, FormatChoice, ProviderChoice};
use crate::config::AppConfig;

/// Attempts per request when neither flag nor config sets one.
const DEFAULT_ATTEMPTS: u32 = 3;

/// Days fetched when neither flag nor config sets a count.
const DEFAULT_DAYS: u32 = 7;

/// Everything one `generate` run needs.
#[derive(Debug)]
pub struct RunSettings {
    /// Pipeline options.
    pub options: GuideOptions,
    /// Lineup parameters for the provider client.
    pub lineup: LineupParams,
    /// Attempts per request.
    pub attempts: u32,
    /// Minimum interval between requests.
    pub delay: Duration,
    /// Explicit cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Output file.
    pub output: PathBuf,
}

impl RunSettings {
    /// Overlays `args` on `config` and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the escape set or placeholder pattern is invalid.
    #[allow(clippy::too_many_lines)]
    pub fn resolve(args: &GenerateArgs, config: &AppConfig) -> Result<Self> {
        let fetch = &config.fetch;
        let out = &config.output;
        let lc = &config.lineup;

        let provider_choice = args
            .provider
            .or(fetch.provider)
            .unwrap_or(ProviderChoice::Gracenote);
        let provider = Provider::from(provider_choice);
        let format_choice = args.format.or(out.format).unwrap_or(FormatChoice::Xmltv);

        let escape = match args.escape.as_deref().or(out.escape.as_deref()) {
            Some(list) => list.parse::<EscapeSet>().context("invalid escape list")?,
            None => EscapeSet::default(),
        };
        let placeholder = match args.placeholder.as_deref().or(fetch.placeholder.as_deref()) {
            Some(pattern) => {
                GuideOptions::placeholder_from(pattern).context("invalid placeholder pattern")?
            }
            None => GuideOptions::default().placeholder,
        };
        let channel_ids = args.channel_ids.or(out.channel_ids).map_or(
            match provider {
                Provider::Gracenote => ChannelIdMode::Gracenote,
                Provider::TvGuide => ChannelIdMode::TvGuide,
            },
            ChannelIdMode::from,
        );
        let asterisk = args
            .asterisk
            .as_ref()
            .or(out.asterisk.as_ref())
            .map_or_else(AsteriskOn::default, |flags| AsteriskOn {
                new: flags.contains(&AsteriskChoice::New),
                live: flags.contains(&AsteriskChoice::Live),
            });
        let favorites: BTreeSet<String> = args
            .favorites
            .as_ref()
            .or(fetch.favorites.as_ref())
            .map(|ids| ids.iter().map(|id| String::from(id.trim())).collect())
            .unwrap_or_default();

        let headend = first(args.lineup.as_ref(), lc.id.as_ref()).unwrap_or_default();
        let lineup_id = match first(args.device.as_ref(), lc.device.as_ref()) {
            Some(device) if !headend.is_empty() => format!("{headend}:{device}"),
            _ => headend.clone(),
        };
        let postal_code = first(args.postal_code.as_ref(), lc.postal_code.as_ref());

        let mut lineup = LineupParams::new(lineup_id);
        if let Some(code) = postal_code.clone() {
            lineup = lineup.postal_code(code);
        }
        if let Some(country) = first(args.country.as_ref(), lc.country.as_ref()) {
            lineup = lineup.country(country);
        }
        if let Some(token) = first(args.token.as_ref(), lc.token.as_ref()) {
            lineup = lineup.token(token);
        }
        if let Some(pref) = first(args.pref.as_ref(), lc.pref.as_ref()) {
            lineup = lineup.pref(pref);
        }

        let options = GuideOptions {
            provider,
            format: DocumentFormat::from(format_choice),
            start_day: args.start.or(fetch.start).unwrap_or(0),
            days: args.days.or(fetch.days).unwrap_or(DEFAULT_DAYS),
            no_cache: NoCachePolicy {
                from_end: args.ncdays.or(fetch.ncdays).unwrap_or(0),
                from_start: args.ncsdays.or(fetch.ncsdays).unwrap_or(0),
                day: args.ncmday.or(fetch.ncmday),
            },
            alignment: if flag(args.utc, fetch.utc) {
                TimeAlignment::Utc
            } else {
                TimeAlignment::Local
            },
            shift_minutes: args.offset.or(fetch.offset_minutes).unwrap_or(0),
            language: first(args.lang.as_ref(), out.language.as_ref())
                .unwrap_or_else(|| String::from("en")),
            utf8: flag(args.utf8, out.utf8),
            encode_non_ascii: flag(args.hex_entities, out.hex_entities),
            escape,
            channel_names_first: flag(args.names_first, out.names_first),
            channel_ids,
            retain_order: flag(args.retain_order, out.retain_order),
            all_channels: flag(args.all_channels, fetch.all_channels),
            favorites,
            first_favorite_only: flag(args.first_favorite_only, fetch.first_favorite_only),
            placeholder,
            no_placeholder_cache: flag(args.no_placeholder_cache, fetch.no_placeholder_cache),
            include_details: flag(args.details, fetch.details),
            include_icons: flag(args.icons, fetch.icons),
            icon_dir: first(args.icon_dir.as_ref(), out.icon_dir.as_ref()),
            series_category: flag(args.series_category, out.series_category),
            asterisk,
            movie_subtitle: flag(args.movie_subtitle, out.movie_subtitle),
            live_tag: flag(args.live_tag, out.live_tag),
            include_xmltv: first(args.include.as_ref(), out.include.as_ref()),
            lineup: LineupInfo {
                id: headend,
                name: first(args.lineup_name.as_ref(), lc.name.as_ref()).unwrap_or_default(),
                location: first(args.lineup_location.as_ref(), lc.location.as_ref())
                    .unwrap_or_default(),
                kind: first(args.lineup_type.as_ref(), lc.kind.as_ref()).unwrap_or_default(),
                postal_code: postal_code.unwrap_or_default(),
            },
            site_url: String::from(match provider {
                Provider::Gracenote => GRACENOTE_SITE_URL,
                Provider::TvGuide => TVGUIDE_SITE_URL,
            }),
            ..GuideOptions::default()
        };

        Ok(Self {
            options,
            lineup,
            attempts: args.retries.or(fetch.retries).unwrap_or(DEFAULT_ATTEMPTS),
            delay: Duration::from_secs(args.delay.or(fetch.delay).unwrap_or(0)),
            cache_dir: first(args.cache_dir.as_ref(), fetch.cache_dir.as_ref()),
            output: first(args.output.as_ref(), out.file.as_ref())
                .unwrap_or_else(|| PathBuf::from(format_choice.default_file_name())),
        })
    }
}

/// Flag value, else config value.
fn first<T: Clone>(from_flag: Option<&T>, from_config: Option<&T>) -> Option<T> {
    from_flag.or(from_config).cloned()
}

/// A set switch wins; otherwise the config decides.
fn flag(set: bool, config: Option<bool>) -> bool {
    set || config.unwrap_or(false)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::choices::ChannelIdChoice;
    use crate::config::{FetchConfig, LineupConfig, OutputConfig};

    fn config() -> AppConfig {
        AppConfig {
            lineup: LineupConfig {
                id: Some(String::from("CA04956")),
                device: Some(String::from("X")),
                postal_code: Some(String::from("M5V 2T6")),
                kind: Some(String::from("CABLE")),
                ..LineupConfig::default()
            },
            fetch: FetchConfig {
                days: Some(3),
                favorites: Some(vec![String::from("10001")]),
                details: Some(true),
                ..FetchConfig::default()
            },
            output: OutputConfig {
                format: Some(FormatChoice::Xtvd),
                utf8: Some(true),
                ..OutputConfig::default()
            },
        }
    }

    #[test]
    fn test_defaults_without_config() {
        // Arrange
        let args = GenerateArgs::default();

        // Act
        let settings = RunSettings::resolve(&args, &AppConfig::default()).unwrap();

        // Assert
        assert_eq!(settings.options.days, 7);
        assert_eq!(settings.options.provider, Provider::Gracenote);
        assert_eq!(settings.options.channel_ids, ChannelIdMode::Gracenote);
        assert_eq!(settings.attempts, 3);
        assert_eq!(settings.output, PathBuf::from("xmltv.xml"));
        assert!(settings.options.lineup.id.is_empty());
    }

    #[test]
    fn test_config_values_apply() {
        // Arrange
        let args = GenerateArgs::default();

        // Act
        let settings = RunSettings::resolve(&args, &config()).unwrap();

        // Assert
        assert_eq!(settings.options.days, 3);
        assert!(settings.options.utf8);
        assert!(settings.options.include_details);
        assert!(settings.options.favorites.contains("10001"));
        assert_eq!(settings.lineup.lineup_id, "CA04956:X");
        assert_eq!(settings.lineup.country_code(), "CAN");
        assert_eq!(settings.options.lineup.id, "CA04956");
        assert_eq!(settings.options.lineup.kind, "CABLE");
        assert_eq!(settings.output, PathBuf::from("xtvd.xml"));
    }

    #[test]
    fn test_flags_override_config() {
        // Arrange
        let args = GenerateArgs {
            days: Some(1),
            format: Some(FormatChoice::Xmltv),
            lineup: Some(String::from("USA-OTA10001")),
            asterisk: Some(vec![AsteriskChoice::Live]),
            offset: Some(-60),
            utc: true,
            ..GenerateArgs::default()
        };

        // Act
        let settings = RunSettings::resolve(&args, &config()).unwrap();

        // Assert
        assert_eq!(settings.options.days, 1);
        assert_eq!(settings.options.format, DocumentFormat::Xmltv);
        assert_eq!(settings.lineup.lineup_id, "USA-OTA10001:X");
        assert!(settings.options.asterisk.live);
        assert!(!settings.options.asterisk.new);
        assert_eq!(settings.options.shift_minutes, -60);
        assert_eq!(settings.options.alignment, TimeAlignment::Utc);
    }

    #[test]
    fn test_tvguide_provider_defaults_channel_ids() {
        // Arrange
        let args = GenerateArgs {
            provider: Some(ProviderChoice::Tvguide),
            ..GenerateArgs::default()
        };

        // Act
        let settings = RunSettings::resolve(&args, &AppConfig::default()).unwrap();

        // Assert
        assert_eq!(settings.options.channel_ids, ChannelIdMode::TvGuide);
        assert_eq!(settings.options.site_url, TVGUIDE_SITE_URL);
    }

    #[test]
    fn test_explicit_channel_ids_win() {
        // Arrange
        let args = GenerateArgs {
            channel_ids: Some(ChannelIdChoice::Legacy),
            ..GenerateArgs::default()
        };

        // Act
        let settings = RunSettings::resolve(&args, &AppConfig::default()).unwrap();

        // Assert
        assert_eq!(settings.options.channel_ids, ChannelIdMode::Legacy);
    }

    #[test]
    fn test_lineup_without_token_is_valid() {
        // Arrange
        let args = GenerateArgs {
            lineup: Some(String::from("USA-OTA10001")),
            ..GenerateArgs::default()
        };

        // Act
        let settings = RunSettings::resolve(&args, &AppConfig::default()).unwrap();

        // Assert
        assert!(settings.lineup.token.is_none());
        assert!(settings.options.validate().is_ok());
    }

    #[test]
    fn test_invalid_escape_list_is_rejected() {
        // Arrange
        let args = GenerateArgs {
            escape: Some(String::from("amp,bogus")),
            ..GenerateArgs::default()
        };

        // Act
        let result = RunSettings::resolve(&args, &AppConfig::default());

        // Assert
        assert!(result.is_err());
    }
}
