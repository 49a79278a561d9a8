//! XMLTV `tv` document.

use std::fmt::{self, Write as _};
use std::sync::LazyLock;

use chrono::TimeZone;
use regex::Regex;

use super::{RenderInput, TextEncoder, capitalize, encoding_name, local_time, splice_section};
use crate::assemble::ResolvedAiring;
use crate::error::GuideError;
use crate::model::{CreditRole, Program, ProgramKind, Station};
use crate::options::{GuideOptions, Provider};

const GENERATOR_NAME: &str = "gridguide";
const GENERATOR_URL: &str = "https://github.com/naa0yama/gridguide";

#[allow(clippy::expect_used)]
static DD_PROGRAM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^..\d{8}\d{4}").expect("valid regex"));

/// Renders the XMLTV document.
///
/// # Errors
///
/// Returns [`GuideError::Render`] if formatting fails.
pub fn render_xmltv<Tz>(input: &RenderInput<'_, Tz>) -> Result<String, GuideError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let options = input.options;
    let enc = TextEncoder::from_options(options);
    let mut out = String::new();

    writeln!(
        out,
        "<?xml version=\"1.0\" encoding=\"{}\"?>",
        encoding_name(options.utf8)
    )?;
    writeln!(out, "<!DOCTYPE tv SYSTEM \"xmltv.dtd\">")?;
    writeln!(out)?;
    let (source_url, source_name) = match options.provider {
        Provider::Gracenote => ("http://tvlistings.gracenote.com/", "gracenote.com"),
        Provider::TvGuide => ("http://tvguide.com/", "tvguide.com"),
    };
    writeln!(
        out,
        "<tv source-info-url=\"{source_url}\" source-info-name=\"{source_name}\" \
         generator-info-name=\"{GENERATOR_NAME}\" generator-info-url=\"{GENERATOR_URL}\">"
    )?;

    let stations = input.store.sorted_stations();
    for station in &stations {
        write_channel(&mut out, station, options, &enc)?;
    }
    if let Some(include) = input.include {
        out.push_str(&splice_section(include, "<channel", "<programme"));
    }

    for station in &stations {
        let Some(timeline) = input.guide.timelines.get(&station.key) else {
            continue;
        };
        let channel = options.channel_ids.channel_id(station);
        for airing in timeline {
            let Some(program) = input.store.programs.get(&airing.program_id) else {
                continue;
            };
            write_programme(&mut out, input.tz, &channel, airing, program, options, &enc)?;
        }
    }
    if let Some(include) = input.include {
        out.push_str(&splice_section(include, "<programme", "</tv"));
    }

    writeln!(out, "</tv>")?;
    Ok(out)
}

fn write_channel(
    out: &mut String,
    station: &Station,
    options: &GuideOptions,
    enc: &TextEncoder,
) -> fmt::Result {
    let name = enc.encode(&station.call_sign);
    writeln!(
        out,
        "\t<channel id=\"{}\">",
        options.channel_ids.channel_id(station)
    )?;
    if options.channel_names_first && !name.is_empty() {
        writeln!(out, "\t\t<display-name>{name}</display-name>")?;
    }
    if !station.number.is_empty() {
        writeln!(out, "\t\t<display-name>{} {name}</display-name>", station.number)?;
        writeln!(out, "\t\t<display-name>{}</display-name>", station.number)?;
    }
    if !options.channel_names_first && !name.is_empty() {
        writeln!(out, "\t\t<display-name>{name}</display-name>")?;
    }
    if let Some(full) = &station.full_name {
        writeln!(out, "\t\t<display-name>{}</display-name>", enc.encode(full))?;
    }
    if let Some(logo) = &station.logo_url {
        writeln!(out, "\t\t<icon src=\"{}\" />", enc.encode(logo))?;
    }
    writeln!(out, "\t</channel>")
}

#[allow(clippy::too_many_lines)]
fn write_programme<Tz>(
    out: &mut String,
    tz: &Tz,
    channel: &str,
    airing: &ResolvedAiring,
    program: &Program,
    options: &GuideOptions,
    enc: &TextEncoder,
) -> fmt::Result
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let (Some(start), Some(stop)) = (
        local_time(tz, airing.start_ms),
        local_time(tz, airing.end_ms),
    ) else {
        tracing::warn!(program = %program.id, "Skipping airing with out of range time");
        return Ok(());
    };
    let lang = &options.language;
    let flags = airing.flags;

    writeln!(
        out,
        "\t<programme start=\"{}\" stop=\"{}\" channel=\"{channel}\">",
        start.format("%Y%m%d%H%M%S %z"),
        stop.format("%Y%m%d%H%M%S %z")
    )?;

    if let Some(title) = &program.title {
        let marked = (options.asterisk.new && flags.new) || (options.asterisk.live && flags.live);
        let suffix = if marked { " *" } else { "" };
        writeln!(
            out,
            "\t\t<title lang=\"{lang}\">{}{suffix}</title>",
            enc.encode(title)
        )?;
    }

    if let Some(episode) = &program.episode_title {
        writeln!(
            out,
            "\t\t<sub-title lang=\"{lang}\">{}</sub-title>",
            enc.encode(episode)
        )?;
    } else if let (true, Some(year)) = (options.movie_subtitle, &program.year) {
        writeln!(out, "\t\t<sub-title lang=\"{lang}\">Movie ({year})</sub-title>")?;
    }

    if let Some(desc) = &program.description {
        writeln!(out, "\t\t<desc lang=\"{lang}\">{}</desc>", enc.encode(desc))?;
    }

    if !program.credits.is_empty() {
        writeln!(out, "\t\t<credits>")?;
        for role in CreditRole::ALL {
            let tag = role.tag();
            for credit in program.credits_for(role) {
                let name = enc.encode(&credit.name);
                match &credit.character {
                    Some(character) if role == CreditRole::Actor => writeln!(
                        out,
                        "\t\t\t<{tag} role=\"{}\">{name}</{tag}>",
                        enc.encode(character)
                    )?,
                    _ => writeln!(out, "\t\t\t<{tag}>{name}</{tag}>")?,
                }
            }
        }
        writeln!(out, "\t\t</credits>")?;
    }

    let kind = program.kind();
    let air_date = program
        .original_air_date
        .and_then(|ms| local_time(tz, ms))
        .map(|t| t.format("%Y%m%d").to_string());
    let episodic = matches!(kind, ProgramKind::Episode | ProgramKind::Show);
    let date = match (&program.year, &air_date) {
        (Some(year), _) => Some(year.clone()),
        (None, Some(date)) if episodic => Some(date.clone()),
        _ => None,
    };
    if let Some(date) = date {
        writeln!(out, "\t\t<date>{}</date>", enc.encode(&date))?;
    }

    for genre in program.genres.sorted() {
        writeln!(
            out,
            "\t\t<category lang=\"{lang}\">{}</category>",
            enc.encode(&capitalize(genre))
        )?;
    }

    if let Some(duration) = program.duration {
        writeln!(out, "\t\t<length units=\"minutes\">{duration}</length>")?;
    }
    if let Some(image) = &program.image_url {
        writeln!(out, "\t\t<icon src=\"{}\" />", enc.encode(image))?;
    }
    if let Some(url) = &program.url {
        writeln!(out, "\t\t<url>{}</url>", enc.encode(url))?;
    }

    write_episode_numbers(out, program)?;

    let rerun_id = episodic
        || program.id.starts_with(|c: char| c.is_ascii_digit());
    if !flags.new && !flags.live && rerun_id {
        match &air_date {
            Some(date) => writeln!(out, "\t\t<previously-shown start=\"{date}000000\" />")?,
            None => writeln!(out, "\t\t<previously-shown />")?,
        }
    }

    if flags.premiere {
        writeln!(out, "\t\t<premiere>Premiere</premiere>")?;
    }
    if flags.finale {
        writeln!(out, "\t\t<last-chance>Finale</last-chance>")?;
    }
    if flags.new {
        writeln!(out, "\t\t<new />")?;
    }
    if options.live_tag && flags.live {
        writeln!(out, "\t\t<live />")?;
    }
    if flags.closed_caption {
        writeln!(out, "\t\t<subtitles type=\"teletext\" />")?;
    }

    if let Some(rating) = &program.rating {
        writeln!(
            out,
            "\t\t<rating>\n\t\t\t<value>{}</value>\n\t\t</rating>",
            enc.encode(rating)
        )?;
    }
    if let Some(stars) = &program.star_rating {
        writeln!(
            out,
            "\t\t<star-rating>\n\t\t\t<value>{}/4</value>\n\t\t</star-rating>",
            enc.encode(stars)
        )?;
    }

    writeln!(out, "\t</programme>")
}

/// `common`, `dd_progid` and `xmltv_ns` episode numbers.
fn write_episode_numbers(out: &mut String, program: &Program) -> fmt::Result {
    let numbered = match (program.season, program.episode) {
        (Some(s), Some(e)) => Some((s, e)),
        _ => None,
    };

    if let Some((s, e)) = numbered.filter(|(s, e)| s.value > 0 || e.value > 0) {
        writeln!(out, "\t\t<episode-num system=\"common\">S{s}E{e}</episode-num>")?;
    }

    if DD_PROGRAM_ID.is_match(&program.id) {
        if let (Some(series), Some(seq)) = (program.id.get(..10), program.id.get(10..14)) {
            writeln!(
                out,
                "\t\t<episode-num system=\"dd_progid\">{series}.{seq}</episode-num>"
            )?;
        }
    }

    let zero_based = numbered.and_then(|(s, e)| Some((s.zero_based()?, e.zero_based()?)));
    if let Some((s, e)) = zero_based {
        writeln!(out, "\t\t<episode-num system=\"xmltv_ns\">{s}.{e}.</episode-num>")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::model::SeriesNumber;

    #[test]
    fn test_episode_numbers_in_three_systems() {
        // Arrange
        let program = Program {
            season: Some(SeriesNumber::new(3)),
            episode: Some(SeriesNumber::new(12)),
            ..Program::new("EP012345670003")
        };
        let mut out = String::new();

        // Act
        write_episode_numbers(&mut out, &program).unwrap();

        // Assert
        assert_eq!(
            out,
            "\t\t<episode-num system=\"common\">S03E12</episode-num>\n\
             \t\t<episode-num system=\"dd_progid\">EP01234567.0003</episode-num>\n\
             \t\t<episode-num system=\"xmltv_ns\">2.11.</episode-num>\n"
        );
    }

    #[test]
    fn test_common_number_keeps_wide_provider_padding() {
        // Arrange
        let program = Program {
            season: SeriesNumber::parse("003"),
            episode: SeriesNumber::parse("1"),
            ..Program::new("SH0123456700")
        };
        let mut out = String::new();

        // Act
        write_episode_numbers(&mut out, &program).unwrap();

        // Assert
        assert!(out.starts_with("\t\t<episode-num system=\"common\">S003E01</episode-num>\n"));
        assert!(out.ends_with("<episode-num system=\"xmltv_ns\">2.0.</episode-num>\n"));
    }

    #[test]
    fn test_numeric_ids_have_no_dd_progid() {
        // Arrange
        let program = Program::new("998877");
        let mut out = String::new();

        // Act
        write_episode_numbers(&mut out, &program).unwrap();

        // Assert
        assert!(out.is_empty());
    }
}
