//! `TvGuideClient` - TV Guide listings API client implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::instrument;
use url::Url;

use crate::api::{DetailRequest, GridWindow, LocalListingsApi};
use crate::error::FetchError;
use crate::params::LineupParams;
use crate::transport::{DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY, Transport};

/// Default schedule service base URL.
pub const DEFAULT_LISTINGS_BASE_URL: &str = "http://mobilelistings.tvguide.com/";

/// Default program details base URL.
pub const DEFAULT_DETAILS_BASE_URL: &str = "http://mapi.tvguide.com/";

/// TV Guide listings API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TvGuideClient {
    /// Retrying HTTP transport.
    transport: Transport,
    /// Schedule service base URL.
    listings_url: Url,
    /// Program details base URL.
    details_url: Url,
    /// Lineup parameters (only the headend is used).
    lineup: LineupParams,
}

/// Builder for `TvGuideClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TvGuideClientBuilder {
    listings_url: Option<Url>,
    details_url: Option<Url>,
    user_agent: Option<String>,
    lineup: Option<LineupParams>,
    attempts: Option<u32>,
    retry_delay: Option<Duration>,
    min_interval: Option<Duration>,
}

impl TvGuideClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            listings_url: None,
            details_url: None,
            user_agent: None,
            lineup: None,
            attempts: None,
            retry_delay: None,
            min_interval: None,
        }
    }

    /// Overrides the schedule service URL (for wiremock in tests).
    #[must_use]
    pub fn listings_url(mut self, url: Url) -> Self {
        self.listings_url = Some(url);
        self
    }

    /// Overrides the details service URL (for wiremock in tests).
    #[must_use]
    pub fn details_url(mut self, url: Url) -> Self {
        self.details_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the lineup parameters (required).
    #[must_use]
    pub fn lineup(mut self, lineup: LineupParams) -> Self {
        self.lineup = Some(lineup);
        self
    }

    /// Sets attempts per request (default: 3, max: 20).
    #[must_use]
    pub const fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Sets the delay after a failed attempt (default: 2s).
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Sets the minimum interval between requests (default: none).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `lineup` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TvGuideClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;
        let lineup = self.lineup.context("lineup is required")?;

        let listings_url = match self.listings_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_LISTINGS_BASE_URL)
                .context("invalid default listings URL")?,
        };
        let details_url = match self.details_url {
            Some(url) => url,
            None => {
                Url::parse(DEFAULT_DETAILS_BASE_URL).context("invalid default details URL")?
            }
        };

        let transport = Transport::new(
            &user_agent,
            self.attempts.unwrap_or(DEFAULT_ATTEMPTS),
            self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
            self.min_interval.unwrap_or(Duration::ZERO),
        )?;

        Ok(TvGuideClient {
            transport,
            listings_url,
            details_url,
            lineup,
        })
    }
}

impl TvGuideClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TvGuideClientBuilder {
        TvGuideClientBuilder::new()
    }

    /// Builds the schedule URL for one bucket.
    fn schedule_url(&self, window: &GridWindow, label: &str) -> Result<Url, FetchError> {
        let path = format!(
            "Listingsweb/ws/rest/schedules/{}/start/{}/duration/{}",
            self.lineup.headend(),
            window.start_secs(),
            window.minutes(),
        );
        self.listings_url.join(&path).map_err(|source| FetchError::Url {
            label: String::from(label),
            source,
        })
    }
}

impl LocalListingsApi for TvGuideClient {
    #[instrument(skip_all, fields(start = %window.start))]
    async fn fetch_grid(&self, window: &GridWindow) -> Result<String, FetchError> {
        let label = format!("schedules@{}", window.start_secs());
        let url = self.schedule_url(window, &label)?;

        self.transport
            .request_with_retry(&label, || self.transport.http().get(url.clone()))
            .await
    }

    #[instrument(skip_all, fields(program = %request.program_id))]
    async fn fetch_details(&self, request: &DetailRequest) -> Result<String, FetchError> {
        let label = format!("details {}", request.program_id);
        let url = self
            .details_url
            .join("listings/details")
            .map_err(|source| FetchError::Url {
                label: label.clone(),
                source,
            })?;
        let query = [("program", request.program_id.as_str())];

        self.transport
            .request_with_retry(&label, || {
                self.transport.http().get(url.clone()).query(&query)
            })
            .await
    }
}
