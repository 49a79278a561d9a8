//! XTVD document: stations, lineups, schedules, programs and genres.
//!
//! Schedule times are UTC with a `Z` suffix. The final airing of every
//! station is never written, whether or not its end is known.

use std::fmt::{self, Write as _};

use chrono::{DateTime, TimeZone, Utc};

use super::{RenderInput, TextEncoder, capitalize, encoding_name, local_time};
use crate::error::GuideError;
use crate::model::{Program, Station};

const SCHEMA_LOCATION: &str =
    "urn:TMSWebServices http://docs.tms.tribune.com/tech/xml/schemas/tmsxtvd.xsd";

/// Renders the XTVD document.
///
/// # Errors
///
/// Returns [`GuideError::Render`] if formatting fails.
pub fn render_xtvd<Tz>(input: &RenderInput<'_, Tz>) -> Result<String, GuideError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let enc = TextEncoder::from_options(input.options);
    let mut out = String::new();
    let (from, to) = input.window;

    writeln!(
        out,
        "<?xml version='1.0' encoding='{}'?>",
        encoding_name(input.options.utf8)
    )?;
    writeln!(
        out,
        "<xtvd from='{}' to='{}' schemaVersion='1.3' xmlns='urn:TMSWebServices' \
         xmlns:xsi='http://www.w3.org/2001/XMLSchema-instance' xsi:schemaLocation='{SCHEMA_LOCATION}'>",
        utc_stamp(&from),
        utc_stamp(&to)
    )?;

    let stations = input.store.sorted_stations();
    write_stations(&mut out, &stations, &enc)?;
    write_lineups(&mut out, &stations, input, &enc)?;
    write_schedules(&mut out, &stations, input)?;
    write_programs(&mut out, input, &enc)?;
    write_genres(&mut out, input, &enc)?;

    writeln!(out, "</xtvd>")?;
    Ok(out)
}

fn utc_stamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// `HH:MM:SS` for a span in milliseconds; negative spans clamp to zero.
fn duration_hms(span_ms: i64) -> String {
    let secs = span_ms.max(0).checked_div(1000).unwrap_or(0);
    let hours = secs.checked_div(3600).unwrap_or(0);
    let minutes = secs.checked_rem(3600).and_then(|r| r.checked_div(60)).unwrap_or(0);
    let seconds = secs.checked_rem(60).unwrap_or(0);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn write_stations(out: &mut String, stations: &[&Station], enc: &TextEncoder) -> fmt::Result {
    writeln!(out, "<stations>")?;
    for station in stations {
        writeln!(out, "\t<station id='{}'>", station.provider_id)?;
        if !station.number.is_empty() {
            let name = enc.encode(&station.call_sign);
            writeln!(out, "\t\t<callSign>{name}</callSign>")?;
            writeln!(out, "\t\t<name>{name}</name>")?;
            writeln!(
                out,
                "\t\t<fccChannelNumber>{}</fccChannelNumber>",
                station.number
            )?;
        }
        writeln!(out, "\t</station>")?;
    }
    writeln!(out, "</stations>")
}

fn write_lineups<Tz: TimeZone>(
    out: &mut String,
    stations: &[&Station],
    input: &RenderInput<'_, Tz>,
    enc: &TextEncoder,
) -> fmt::Result {
    let lineup = &input.options.lineup;
    writeln!(out, "<lineups>")?;
    writeln!(
        out,
        "\t<lineup id='{}' name='{}' location='{}' type='{}' postalCode='{}'>",
        enc.encode(&lineup.id),
        enc.encode(&lineup.name),
        enc.encode(&lineup.location),
        enc.encode(&lineup.kind),
        enc.encode(&lineup.postal_code)
    )?;
    for station in stations.iter().filter(|s| !s.number.is_empty()) {
        writeln!(
            out,
            "\t<map station='{}' channel='{}'></map>",
            station.provider_id, station.number
        )?;
    }
    writeln!(out, "\t</lineup>")?;
    writeln!(out, "</lineups>")
}

fn write_schedules<Tz: TimeZone>(
    out: &mut String,
    stations: &[&Station],
    input: &RenderInput<'_, Tz>,
) -> fmt::Result {
    writeln!(out, "<schedules>")?;
    for station in stations {
        let Some(timeline) = input.guide.timelines.get(&station.key) else {
            continue;
        };
        let last_start = input
            .store
            .schedules
            .get(&station.key)
            .and_then(|airings| airings.keys().next_back().copied());

        for airing in timeline.iter().filter(|a| Some(a.start_ms) != last_start) {
            let Some(start) = DateTime::from_timestamp_millis(airing.start_ms) else {
                continue;
            };
            write!(
                out,
                "\t<schedule program='{}' station='{}' time='{}' duration='{}'",
                airing.program_id,
                station.provider_id,
                utc_stamp(&start),
                duration_hms(airing.end_ms.saturating_sub(airing.start_ms))
            )?;
            if airing.flags.new || airing.flags.live {
                write!(out, " new='true'")?;
            }
            writeln!(out, "/>")?;
        }
    }
    writeln!(out, "</schedules>")
}

fn write_programs<Tz>(
    out: &mut String,
    input: &RenderInput<'_, Tz>,
    enc: &TextEncoder,
) -> fmt::Result
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    writeln!(out, "<programs>")?;
    for program in input.store.programs.values() {
        writeln!(out, "\t<program id='{}'>", program.id)?;
        if let Some(title) = &program.title {
            writeln!(out, "\t\t<title>{}</title>", enc.encode(title))?;
        }
        if let Some(episode) = &program.episode_title {
            writeln!(out, "\t\t<subtitle>{}</subtitle>", enc.encode(episode))?;
        }
        if let Some(desc) = &program.description {
            writeln!(out, "\t\t<description>{}</description>", enc.encode(desc))?;
        }
        if let Some(year) = &program.year {
            writeln!(out, "\t\t<year>{}</year>", enc.encode(year))?;
        } else {
            write_series_fields(out, input.tz, program)?;
        }
        writeln!(out, "\t</program>")?;
    }
    writeln!(out, "</programs>")
}

fn write_series_fields<Tz>(out: &mut String, tz: &Tz, program: &Program) -> fmt::Result
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let paid = program
        .title
        .as_deref()
        .is_some_and(|t| t.contains("Paid Programming"));
    let show_type = if paid { "Paid Programming" } else { "Series" };
    writeln!(out, "\t\t<showType>{show_type}</showType>")?;
    writeln!(
        out,
        "\t\t<series>EP{}</series>",
        program.id.get(2..10).unwrap_or_default()
    )?;
    if let Some(date) = program.original_air_date.and_then(|ms| local_time(tz, ms)) {
        writeln!(
            out,
            "\t\t<originalAirDate>{}</originalAirDate>",
            date.format("%Y-%m-%d")
        )?;
    }
    Ok(())
}

fn write_genres<Tz: TimeZone>(
    out: &mut String,
    input: &RenderInput<'_, Tz>,
    enc: &TextEncoder,
) -> fmt::Result {
    writeln!(out, "<genres>")?;
    let tagged = input
        .store
        .programs
        .values()
        .filter(|p| !p.genres.is_empty() && !p.genres.contains("movie"));
    for program in tagged {
        writeln!(out, "\t<programGenre program='{}'>", program.id)?;
        for genre in program.genres.sorted() {
            writeln!(out, "\t\t<genre>")?;
            writeln!(out, "\t\t\t<class>{}</class>", enc.encode(&capitalize(genre)))?;
            writeln!(out, "\t\t\t<relevance>0</relevance>")?;
            writeln!(out, "\t\t</genre>")?;
        }
        writeln!(out, "\t</programGenre>")?;
    }
    writeln!(out, "</genres>")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::assemble::assemble;
    use crate::model::{Airing, AiringFlags, GuideStore, StationKey};
    use crate::options::{DocumentFormat, GuideOptions};

    fn station(key: &StationKey) -> Station {
        Station {
            key: key.clone(),
            provider_id: String::from("10001"),
            call_sign: String::from("WAAA"),
            full_name: None,
            number: String::from("4"),
            order: None,
            logo_url: None,
            icon_path: None,
        }
    }

    fn airing(key: &StationKey, program: &str, start: i64, end: Option<i64>, new: bool) -> Airing {
        Airing {
            station: key.clone(),
            start_ms: start,
            end_ms: end,
            program_id: String::from(program),
            flags: AiringFlags {
                new,
                ..AiringFlags::default()
            },
        }
    }

    fn render(store: &mut GuideStore) -> String {
        let guide = assemble(store);
        let options = GuideOptions {
            format: DocumentFormat::Xtvd,
            ..GuideOptions::default()
        };
        let window = (
            DateTime::from_timestamp_millis(0).unwrap(),
            DateTime::from_timestamp_millis(10_799_999).unwrap(),
        );
        let input = RenderInput {
            store: &*store,
            guide: &guide,
            options: &options,
            tz: &Utc,
            window,
            include: None,
        };
        render_xtvd(&input).unwrap()
    }

    #[test]
    fn test_duration_hms() {
        // Arrange & Act & Assert
        assert_eq!(duration_hms(5_400_000), "01:30:00");
        assert_eq!(duration_hms(90_061_000), "25:01:01");
        assert_eq!(duration_hms(-1), "00:00:00");
    }

    #[test]
    fn test_final_airing_is_dropped_even_with_end() {
        // Arrange
        let mut store = GuideStore::new();
        let key = StationKey::new("4", "10001");
        store.stations.insert(key.clone(), station(&key));
        store.insert_airing(airing(&key, "EP000000010001", 0, None, true));
        store.insert_airing(airing(&key, "EP000000010002", 1_800_000, Some(3_600_000), false));

        // Act
        let doc = render(&mut store);

        // Assert
        assert_eq!(doc.matches("<schedule ").count(), 1);
        assert!(doc.contains(
            "<schedule program='EP000000010001' station='10001' time='1970-01-01T00:00:00Z' duration='00:30:00' new='true'/>"
        ));
        assert!(doc.contains("from='1970-01-01T00:00:00Z' to='1970-01-01T02:59:59Z'"));
    }

    #[test]
    fn test_programs_and_genres_sections() {
        // Arrange
        let mut store = GuideStore::new();
        let mut film = Program {
            title: Some(String::from("Heat")),
            year: Some(String::from("1995")),
            ..Program::new("MV000111220000")
        };
        film.genres.insert("movie", 1);
        let mut paid = Program {
            title: Some(String::from("Paid Programming")),
            original_air_date: Some(86_400_000),
            ..Program::new("SH012345670000")
        };
        paid.genres.insert("news", 2);
        paid.genres.insert("talk", 1);
        for program in [film, paid] {
            store.programs.insert(program.id.clone(), program);
        }

        // Act
        let doc = render(&mut store);

        // Assert
        assert!(doc.contains("\t\t<year>1995</year>\n"));
        assert!(doc.contains("\t\t<showType>Paid Programming</showType>\n"));
        assert!(doc.contains("\t\t<series>EP01234567</series>\n"));
        assert!(doc.contains("\t\t<originalAirDate>1970-01-02</originalAirDate>\n"));
        assert!(!doc.contains("<programGenre program='MV000111220000'>"));
        let talk = doc.find("<class>Talk</class>").unwrap();
        let news = doc.find("<class>News</class>").unwrap();
        assert!(talk < news);
    }

    #[test]
    fn test_stations_without_number_have_no_details() {
        // Arrange
        let mut store = GuideStore::new();
        let key = StationKey::new("", "20002");
        let bare = Station {
            provider_id: String::from("20002"),
            number: String::new(),
            ..station(&key)
        };
        store.stations.insert(key, bare);

        // Act
        let doc = render(&mut store);

        // Assert
        assert!(doc.contains("\t<station id='20002'>\n\t</station>\n"));
        assert!(!doc.contains("<map station='20002'"));
    }
}
