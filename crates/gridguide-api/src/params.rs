//! Lineup request parameters shared by the provider clients.

/// Affiliate id the Gracenote grid expects from web clients.
const AFFILIATE_ID: &str = "gapzap";

/// Device placeholder used when the lineup id carries none.
const DEFAULT_DEVICE: &str = "-";

/// Resolved lineup/device/postal-code parameter set.
///
/// `lineup_id` accepts either a bare headend id (`"USA-OTA12345"`) or a
/// `headend:device` pair (`"CA04956:X"`).
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct LineupParams {
    /// Headend id, optionally suffixed with `:device`.
    pub lineup_id: String,
    /// Postal code of the lineup location.
    pub postal_code: Option<String>,
    /// Explicit country code. Derived from the postal code when `None`.
    pub country: Option<String>,
    /// Session token from an authenticated login.
    pub token: Option<String>,
    /// Account preference string (`pref` query parameter).
    pub pref: String,
}

impl LineupParams {
    /// Creates parameters for `lineup_id` with no location or token.
    #[must_use]
    pub fn new(lineup_id: impl Into<String>) -> Self {
        Self {
            lineup_id: lineup_id.into(),
            postal_code: None,
            country: None,
            token: None,
            pref: String::from(DEFAULT_DEVICE),
        }
    }

    /// Sets the postal code.
    #[must_use]
    pub fn postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// Sets the country code explicitly.
    #[must_use]
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Sets the session token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the account preference string.
    #[must_use]
    pub fn pref(mut self, pref: impl Into<String>) -> Self {
        self.pref = pref.into();
        self
    }

    /// Headend part of the lineup id.
    #[must_use]
    pub fn headend(&self) -> &str {
        self.lineup_id
            .split_once(':')
            .map_or(self.lineup_id.as_str(), |(headend, _)| headend)
    }

    /// Device part of the lineup id (`"-"` when absent).
    #[must_use]
    pub fn device(&self) -> &str {
        self.lineup_id
            .split_once(':')
            .map_or(DEFAULT_DEVICE, |(_, device)| device)
    }

    /// Country code: explicit value, else `CAN` for alphanumeric postal
    /// codes and `USA` otherwise.
    #[must_use]
    pub fn country_code(&self) -> String {
        if let Some(ref country) = self.country {
            return country.clone();
        }
        let canadian = self
            .postal_code
            .as_deref()
            .is_some_and(|code| code.chars().any(|c| c.is_ascii_alphabetic()));
        String::from(if canadian { "CAN" } else { "USA" })
    }

    /// Location/device parameters common to grid and overview requests.
    fn location_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(6);
        if let Some(ref token) = self.token {
            pairs.push(("token", token.clone()));
        }
        pairs.push((
            "postalCode",
            self.postal_code.clone().unwrap_or_default(),
        ));
        pairs.push(("headendId", String::from(self.headend())));
        pairs.push(("device", String::from(self.device())));
        pairs.push(("aid", String::from(AFFILIATE_ID)));
        pairs
    }

    /// Query pairs for a Gracenote `api/grid` request.
    pub(crate) fn grid_query(&self, start_secs: i64, hours: u32) -> Vec<(&'static str, String)> {
        let country = self.country_code();
        let mut query = vec![
            ("time", start_secs.to_string()),
            ("timespan", hours.to_string()),
            ("pref", self.pref.clone()),
            (
                "lineupId",
                format!("{country}-{}-DEFAULT", self.headend()),
            ),
            ("country", country),
        ];
        query.extend(self.location_pairs());
        query.extend([
            ("TMSID", String::new()),
            ("AffiliateID", String::from(AFFILIATE_ID)),
            ("FromPage", String::from("TV Grid")),
            ("ActivityID", String::from("1")),
            ("OVDID", String::new()),
            ("isOverride", String::from("true")),
        ]);
        query
    }

    /// Form pairs for a Gracenote `api/program/overviewDetails` request.
    pub(crate) fn overview_form(&self, series_id: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![("countryCode", self.country_code())];
        form.extend(self.location_pairs());
        form.push(("programSeriesID", String::from(series_id)));
        form.push(("clickstream[FromPage]", String::from("TV Grid")));
        form
    }
}
