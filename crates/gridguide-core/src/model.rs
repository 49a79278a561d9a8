//! Canonical station, program and airing records and their repositories.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Compound station key: `{channel number}.{provider channel id}`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationKey(String);

impl StationKey {
    /// Builds the key from a raw channel number and provider id.
    #[must_use]
    pub fn new(number: &str, provider_id: &str) -> Self {
        Self(format!("{number}.{provider_id}"))
    }

    /// Key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric channel number such as `5` or `5.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelNumber {
    /// Major number.
    pub major: u32,
    /// Minor (sub-channel) number, 0 when absent.
    pub minor: u32,
}

impl ChannelNumber {
    /// Parses `"5"`, `"005"`, `"5.1"` or `"5-1"`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (major, minor) = match raw.split_once(['.', '-']) {
            Some((major, minor)) => (major, Some(minor)),
            None => (raw, None),
        };
        let major = major.parse().ok()?;
        let minor = match minor {
            Some(m) => m.parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }
}

/// Station display order, fixed when the station is first observed.
///
/// One run uses exactly one variant for every station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DisplayOrder {
    /// Position in the provider's channel list.
    Index(u32),
    /// Numeric channel number.
    Number(ChannelNumber),
}

/// A broadcast station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// Compound key.
    pub key: StationKey,
    /// Provider channel id.
    pub provider_id: String,
    /// Call sign.
    pub call_sign: String,
    /// Full station name, when it differs from the call sign.
    pub full_name: Option<String>,
    /// Channel number with leading zeros removed.
    pub number: String,
    /// Display order (`None` when the number is not numeric).
    pub order: Option<DisplayOrder>,
    /// Logo URL.
    pub logo_url: Option<String>,
    /// Local logo path recorded by the icon resolver.
    pub icon_path: Option<PathBuf>,
}

/// Output order of stations.
///
/// Stations with a display order come first, ordered by it and then by
/// provider id; stations without one follow, ordered by call sign.
#[must_use]
pub fn compare_stations(a: &Station, b: &Station) -> Ordering {
    match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.provider_id.cmp(&b.provider_id)),
        (None, None) => a
            .call_sign
            .cmp(&b.call_sign)
            .then_with(|| a.provider_id.cmp(&b.provider_id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
    }
}

/// Program kind encoded in the id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    /// `EP` episode.
    Episode,
    /// `MV` movie.
    Movie,
    /// `SH` show.
    Show,
    /// `SP` sports event.
    Sports,
    /// Anything else (numeric ids from TV Guide).
    Other,
}

impl ProgramKind {
    /// Classifies a program id.
    #[must_use]
    pub fn of(id: &str) -> Self {
        match id.get(..2) {
            Some("EP") => Self::Episode,
            Some("MV") => Self::Movie,
            Some("SH") => Self::Show,
            Some("SP") => Self::Sports,
            _ => Self::Other,
        }
    }
}

/// Credit role, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CreditRole {
    /// Director.
    Director,
    /// Actor (may carry a character name).
    Actor,
    /// Writer.
    Writer,
    /// Producer.
    Producer,
    /// Presenter or host.
    Presenter,
}

impl CreditRole {
    /// All roles in output order.
    pub const ALL: [Self; 5] = [
        Self::Director,
        Self::Actor,
        Self::Writer,
        Self::Producer,
        Self::Presenter,
    ];

    /// XML element name.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Actor => "actor",
            Self::Writer => "writer",
            Self::Producer => "producer",
            Self::Presenter => "presenter",
        }
    }
}

/// One cast or crew credit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditEntry {
    /// Role bucket.
    pub role: CreditRole,
    /// Person name.
    pub name: String,
    /// Display rank within the role.
    pub rank: u32,
    /// Character played (actors only).
    pub character: Option<String>,
}

/// Genre name to rank map.
///
/// The first rank recorded for a name is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Genres(BTreeMap<String, u32>);

impl Genres {
    /// Records `name` at `rank` unless it is already present.
    pub fn insert(&mut self, name: &str, rank: u32) {
        if !self.0.contains_key(name) {
            self.0.insert(String::from(name), rank);
        }
    }

    /// Appends new names after the current highest rank.
    ///
    /// The counter starts at `max + 1`, or at 2 when no genre is recorded yet.
    pub fn append<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let mut next = match self.max_rank() {
            0 => 2,
            max => max.saturating_add(1),
        };
        for name in names {
            if !self.0.contains_key(name) {
                self.0.insert(String::from(name), next);
                next = next.saturating_add(1);
            }
        }
    }

    /// Highest recorded rank, 0 when empty.
    #[must_use]
    pub fn max_rank(&self) -> u32 {
        self.0.values().copied().max().unwrap_or(0)
    }

    /// Returns `true` if `name` is recorded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns `true` if no genre is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names sorted by `(rank, name)`.
    #[must_use]
    pub fn sorted(&self) -> Vec<&str> {
        let mut pairs: Vec<(&str, u32)> =
            self.0.iter().map(|(name, rank)| (name.as_str(), *rank)).collect();
        pairs.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        pairs.into_iter().map(|(name, _)| name).collect()
    }
}

/// Season or episode number, keeping the digit count the provider wrote.
///
/// Renders zero-padded to that width, and to at least two digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesNumber {
    /// Numeric value.
    pub value: u32,
    /// Digits in the provider's text, leading zeros included.
    pub digits: usize,
}

impl SeriesNumber {
    /// Number written without padding.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Self {
            value,
            digits: value.to_string().len(),
        }
    }

    /// Parses a run of ASCII digits such as `"3"` or `"003"`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            value: raw.parse().ok()?,
            digits: raw.len(),
        })
    }

    /// Value counted from zero, or `None` for zero.
    #[must_use]
    pub const fn zero_based(self) -> Option<u32> {
        self.value.checked_sub(1)
    }
}

impl fmt::Display for SeriesNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.value, width = self.digits.max(2))
    }
}

/// A program, keyed by its provider id across the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    /// Provider program id.
    pub id: String,
    /// Title.
    pub title: Option<String>,
    /// Episode title.
    pub episode_title: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Genres.
    pub genres: Genres,
    /// Cast and crew.
    pub credits: Vec<CreditEntry>,
    /// Release year.
    pub year: Option<String>,
    /// Season number.
    pub season: Option<SeriesNumber>,
    /// Episode number.
    pub episode: Option<SeriesNumber>,
    /// Original air date, epoch milliseconds.
    pub original_air_date: Option<i64>,
    /// Program image URL.
    pub image_url: Option<String>,
    /// Program page URL.
    pub url: Option<String>,
    /// Parental rating.
    pub rating: Option<String>,
    /// Star rating out of 4.
    pub star_rating: Option<String>,
    /// Duration in minutes.
    pub duration: Option<u32>,
    /// Provider series id.
    pub series_id: Option<String>,
    /// Provider marks the program as generic (no episode-level details).
    pub generic: Option<bool>,
}

impl Program {
    /// Creates an empty program record.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Program kind from the id prefix.
    #[must_use]
    pub fn kind(&self) -> ProgramKind {
        ProgramKind::of(&self.id)
    }

    /// Credits of `role`, ordered by rank.
    #[must_use]
    pub fn credits_for(&self, role: CreditRole) -> Vec<&CreditEntry> {
        let mut entries: Vec<&CreditEntry> =
            self.credits.iter().filter(|c| c.role == role).collect();
        entries.sort_by_key(|c| c.rank);
        entries
    }

    /// Adds a credit unless the same person is already credited in that role.
    pub fn add_credit(&mut self, entry: CreditEntry) {
        let known = self
            .credits
            .iter()
            .any(|c| c.role == entry.role && c.name == entry.name);
        if !known {
            self.credits.push(entry);
        }
    }
}

/// Airing flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct AiringFlags {
    /// First run.
    pub new: bool,
    /// Live broadcast.
    pub live: bool,
    /// Season or series premiere.
    pub premiere: bool,
    /// Season or series finale.
    pub finale: bool,
    /// Closed captions available.
    pub closed_caption: bool,
}

/// One scheduled broadcast of a program on a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Airing {
    /// Station.
    pub station: StationKey,
    /// Start, epoch milliseconds.
    pub start_ms: i64,
    /// End, epoch milliseconds; resolved by the assembler when absent.
    pub end_ms: Option<i64>,
    /// Program id.
    pub program_id: String,
    /// Flags.
    pub flags: AiringFlags,
}

/// Entity repositories passed between pipeline stages.
#[derive(Debug, Default)]
pub struct GuideStore {
    /// Stations by key.
    pub stations: BTreeMap<StationKey, Station>,
    /// Programs by id.
    pub programs: BTreeMap<String, Program>,
    /// Airings by station, ordered by start.
    pub schedules: BTreeMap<StationKey, BTreeMap<i64, Airing>>,
    /// Next provider-order index.
    pub(crate) next_index: u32,
}

impl GuideStore {
    /// Creates empty repositories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored airings.
    #[must_use]
    pub fn airing_count(&self) -> usize {
        self.schedules.values().map(BTreeMap::len).sum()
    }

    /// Stations in output order.
    #[must_use]
    pub fn sorted_stations(&self) -> Vec<&Station> {
        let mut stations: Vec<&Station> = self.stations.values().collect();
        stations.sort_by(|a, b| compare_stations(a, b));
        stations
    }

    /// Stores an airing; a duplicate start on the same station replaces the earlier entry.
    pub fn insert_airing(&mut self, airing: Airing) {
        self.schedules
            .entry(airing.station.clone())
            .or_default()
            .insert(airing.start_ms, airing);
    }
}
