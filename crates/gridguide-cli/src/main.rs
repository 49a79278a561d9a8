//! gridguide - TV listings to XMLTV/XTVD CLI.

/// Enumerated option values.
mod choices;
/// Application configuration (TOML).
mod config;
/// Flag and config file resolution.
mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use gridguide_api::LocalListingsApi;
use gridguide_api::gracenote::GracenoteClient;
use gridguide_api::tvguide::TvGuideClient;
use gridguide_core::{IconDir, IconResolver, NoIcons, Provider};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::choices::{AsteriskChoice, ChannelIdChoice, FormatChoice, ProviderChoice};
use crate::config::{AppConfig, AppPaths};
use crate::settings::RunSettings;

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Root for both config.toml and the cache (overrides $GRIDGUIDE_HOME).
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
#[allow(clippy::large_enum_variant)]
enum Commands {
    /// Fetch listings and write a guide document.
    Generate(GenerateArgs),
    /// Config file operations.
    Config(ConfigCommand),
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write an empty config file if none exists.
    Init,
    /// Show the config file location.
    Path,
}

/// Arguments for the `generate` subcommand.
///
/// Every flag overrides the matching config file value.
#[derive(clap::Args, Debug, Default)]
#[allow(clippy::struct_excessive_bools)]
struct GenerateArgs {
    /// Output file (default: xmltv.xml or xtvd.xml).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Document format.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// Listings provider.
    #[arg(long, value_enum)]
    provider: Option<ProviderChoice>,

    /// Number of days to fetch (default: 7).
    #[arg(short, long)]
    days: Option<u32>,

    /// First day to fetch, as an offset from today (default: 0).
    #[arg(short, long)]
    start: Option<u32>,

    /// Always re-fetch the last N days.
    #[arg(long)]
    ncdays: Option<u32>,

    /// Always re-fetch the first N days.
    #[arg(long)]
    ncsdays: Option<u32>,

    /// Always re-fetch this 1-based day.
    #[arg(long)]
    ncmday: Option<u32>,

    /// Attempts per request (default: 3).
    #[arg(long)]
    retries: Option<u32>,

    /// Seconds to wait between requests (default: 0).
    #[arg(long)]
    delay: Option<u64>,

    /// Cache directory (default: {dir}/cache, $GRIDGUIDE_HOME/cache or $XDG_CACHE_HOME/gridguide).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Lineup/headend id (e.g. "USA-OTA10001").
    #[arg(long)]
    lineup: Option<String>,

    /// Device letter appended to the lineup id.
    #[arg(long)]
    device: Option<String>,

    /// Postal code of the lineup.
    #[arg(long)]
    postal_code: Option<String>,

    /// Country code (default: derived from the postal code).
    #[arg(long)]
    country: Option<String>,

    /// Session token.
    #[arg(long)]
    token: Option<String>,

    /// Account preference string.
    #[arg(long)]
    pref: Option<String>,

    /// Lineup display name (XTVD).
    #[arg(long)]
    lineup_name: Option<String>,

    /// Lineup location label (XTVD).
    #[arg(long)]
    lineup_location: Option<String>,

    /// Lineup type, e.g. CABLE or OTA (XTVD).
    #[arg(long)]
    lineup_type: Option<String>,

    /// Language for the `lang` attribute (default: en).
    #[arg(long)]
    lang: Option<String>,

    /// Write UTF-8 instead of ISO-8859-1.
    #[arg(long)]
    utf8: bool,

    /// Escape every non-ASCII character numerically.
    #[arg(long)]
    hex_entities: bool,

    /// Markup characters to escape, e.g. "amp,lt,gt".
    #[arg(long)]
    escape: Option<String>,

    /// Put the bare station name before numbered display names.
    #[arg(long)]
    names_first: bool,

    /// Channel id style.
    #[arg(long, value_enum)]
    channel_ids: Option<ChannelIdChoice>,

    /// Keep provider channel order instead of sorting by number.
    #[arg(long)]
    retain_order: bool,

    /// Ignore favorites and write every channel.
    #[arg(long)]
    all_channels: bool,

    /// Comma-separated favorite channel ids.
    #[arg(long, value_delimiter = ',')]
    favorites: Option<Vec<String>>,

    /// Keep only the first listing of each favorite channel.
    #[arg(long)]
    first_favorite_only: bool,

    /// Placeholder-title pattern (case-insensitive regex).
    #[arg(long)]
    placeholder: Option<String>,

    /// Do not keep cached buckets that contain placeholder titles.
    #[arg(long)]
    no_placeholder_cache: bool,

    /// Fetch per-program details for movies and series.
    #[arg(long)]
    details: bool,

    /// Fetch per-program details for program images.
    #[arg(long)]
    icons: bool,

    /// Directory for station logo references.
    #[arg(long)]
    icon_dir: Option<PathBuf>,

    /// Add the `series` category to non-movie programs.
    #[arg(long)]
    series_category: bool,

    /// Comma-separated airing flags that append " *" to titles.
    #[arg(long, value_enum, value_delimiter = ',')]
    asterisk: Option<Vec<AsteriskChoice>>,

    /// Synthesize "Movie (YEAR)" subtitles.
    #[arg(long)]
    movie_subtitle: bool,

    /// Write `<live />` for live airings.
    #[arg(long)]
    live_tag: bool,

    /// XMLTV file whose channels and programmes are spliced in.
    #[arg(long)]
    include: Option<PathBuf>,

    /// Align buckets on UTC instead of local time.
    #[arg(long)]
    utc: bool,

    /// Minutes added to every airing time (may be negative).
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<i64>,
}

/// Runs the `generate` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, options are invalid,
/// the client fails to build, the run fails or the output cannot be written.
#[allow(clippy::future_not_send)]
#[instrument(skip_all)]
async fn run_generate(args: &GenerateArgs, dir: Option<&Path>) -> Result<()> {
    let paths = AppPaths::resolve(dir).context("failed to resolve gridguide directories")?;
    let config = AppConfig::load(&paths.config_file).context("failed to load config")?;
    let settings = RunSettings::resolve(args, &config)?;

    let cache_dir = settings.cache_dir.clone().unwrap_or(paths.cache_dir);
    let icons: Box<dyn IconResolver> = match &settings.options.icon_dir {
        Some(d) => Box::new(IconDir::new(d)),
        None => Box::new(NoIcons),
    };
    let user_agent = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

    match settings.options.provider {
        Provider::Gracenote => {
            let client = GracenoteClient::builder()
                .user_agent(user_agent)
                .lineup(settings.lineup.clone())
                .attempts(settings.attempts)
                .min_interval(settings.delay)
                .build()
                .context("failed to build Gracenote client")?;
            generate(&client, &settings, &cache_dir, icons.as_ref()).await
        }
        Provider::TvGuide => {
            let client = TvGuideClient::builder()
                .user_agent(user_agent)
                .lineup(settings.lineup.clone())
                .attempts(settings.attempts)
                .min_interval(settings.delay)
                .build()
                .context("failed to build TV Guide client")?;
            generate(&client, &settings, &cache_dir, icons.as_ref()).await
        }
    }
}

/// Runs the pipeline against `api` and writes the document.
///
/// # Errors
///
/// Returns an error if the run fails or the output file cannot be written.
#[allow(clippy::future_not_send)]
async fn generate<A: LocalListingsApi>(
    api: &A,
    settings: &RunSettings,
    cache_dir: &Path,
    icons: &dyn IconResolver,
) -> Result<()> {
    tracing::info!(
        cache = %cache_dir.display(),
        days = settings.options.days,
        "Fetching listings"
    );
    let report = gridguide_core::run(api, cache_dir, &settings.options, icons, &Local::now())
        .await
        .context("guide run failed")?;

    std::fs::write(&settings.output, &report.document)
        .with_context(|| format!("failed to write {}", settings.output.display()))?;
    if report.halted {
        tracing::warn!("Listings are incomplete, a request failed after all retries");
    }
    tracing::info!(
        path = %settings.output.display(),
        stations = report.stations,
        programs = report.programs,
        airings = report.airings,
        "Wrote guide"
    );
    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved or the file cannot be written.
fn run_config_init(dir: Option<&Path>) -> Result<()> {
    let path = AppPaths::resolve(dir)
        .context("failed to resolve config path")?
        .config_file;
    if path.exists() {
        tracing::info!(path = %path.display(), "Config file already exists");
        return Ok(());
    }
    AppConfig::default()
        .save(&path)
        .context("failed to save config")?;
    tracing::info!(path = %path.display(), "Created config file");
    Ok(())
}

/// Runs the `config path` subcommand.
///
/// # Errors
///
/// Returns an error if the path cannot be resolved.
fn run_config_path(dir: Option<&Path>) -> Result<()> {
    let paths = AppPaths::resolve(dir).context("failed to resolve config path")?;
    tracing::info!(
        exists = paths.config_file.exists(),
        cache = %paths.cache_dir.display(),
        "{}",
        paths.config_file.display()
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate(args) => run_generate(&args, cli.dir.as_deref()).await,
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Init => run_config_init(cli.dir.as_deref()),
            ConfigSubcommands::Path => run_config_path(cli.dir.as_deref()),
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use super::*;

    #[test]
    fn test_generate_flags_parse() {
        // Arrange & Act
        let cli = Cli::try_parse_from([
            "gridguide",
            "generate",
            "--lineup",
            "USA-OTA10001",
            "--favorites",
            "10001,20002",
            "--asterisk",
            "new,live",
            "--offset",
            "-30",
            "--format",
            "xtvd",
        ])
        .unwrap();

        // Assert
        assert!(matches!(cli.command, Commands::Generate(_)));
        let Commands::Generate(args) = cli.command else {
            return;
        };
        assert_eq!(args.lineup.as_deref(), Some("USA-OTA10001"));
        assert_eq!(
            args.favorites,
            Some(vec![String::from("10001"), String::from("20002")])
        );
        assert_eq!(
            args.asterisk,
            Some(vec![AsteriskChoice::New, AsteriskChoice::Live])
        );
        assert_eq!(args.offset, Some(-30));
        assert_eq!(args.format, Some(FormatChoice::Xtvd));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        // Arrange & Act
        let result = Cli::try_parse_from(["gridguide", "generate", "--provider", "teletext"]);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_delay_is_whole_seconds() {
        // Arrange
        let args = GenerateArgs {
            delay: Some(2),
            lineup: Some(String::from("X")),
            ..GenerateArgs::default()
        };

        // Act
        let settings = RunSettings::resolve(&args, &AppConfig::default()).unwrap();

        // Assert
        assert_eq!(settings.delay, Duration::from_secs(2));
    }
}
