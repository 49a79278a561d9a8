//! `GracenoteClient` - Gracenote grid API client implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::instrument;
use url::Url;

use crate::api::{DetailRequest, GridWindow, LocalListingsApi};
use crate::error::FetchError;
use crate::params::LineupParams;
use crate::transport::{DEFAULT_ATTEMPTS, DEFAULT_RETRY_DELAY, Transport};

/// Default base URL.
pub const DEFAULT_BASE_URL: &str = "https://tvlistings.gracenote.com/";

/// Gracenote grid API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct GracenoteClient {
    /// Retrying HTTP transport.
    transport: Transport,
    /// Base URL.
    base_url: Url,
    /// Lineup parameters sent with every request.
    lineup: LineupParams,
}

/// Builder for `GracenoteClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct GracenoteClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
    lineup: Option<LineupParams>,
    attempts: Option<u32>,
    retry_delay: Option<Duration>,
    min_interval: Option<Duration>,
}

impl GracenoteClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            lineup: None,
            attempts: None,
            retry_delay: None,
            min_interval: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
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
    pub fn build(self) -> Result<GracenoteClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;
        let lineup = self.lineup.context("lineup is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let transport = Transport::new(
            &user_agent,
            self.attempts.unwrap_or(DEFAULT_ATTEMPTS),
            self.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
            self.min_interval.unwrap_or(Duration::ZERO),
        )?;

        Ok(GracenoteClient {
            transport,
            base_url,
            lineup,
        })
    }
}

impl GracenoteClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> GracenoteClientBuilder {
        GracenoteClientBuilder::new()
    }

    /// Joins `path` onto the base URL.
    fn endpoint(&self, path: &str, label: &str) -> Result<Url, FetchError> {
        self.base_url.join(path).map_err(|source| FetchError::Url {
            label: String::from(label),
            source,
        })
    }
}

impl LocalListingsApi for GracenoteClient {
    #[instrument(skip_all, fields(start = %window.start))]
    async fn fetch_grid(&self, window: &GridWindow) -> Result<String, FetchError> {
        let label = format!("grid@{}", window.start_secs());
        let url = self.endpoint("api/grid", &label)?;
        let query = self.lineup.grid_query(window.start_secs(), window.hours);

        self.transport
            .request_with_retry(&label, || {
                self.transport.http().get(url.clone()).query(&query)
            })
            .await
    }

    #[instrument(skip_all, fields(program = %request.program_id))]
    async fn fetch_details(&self, request: &DetailRequest) -> Result<String, FetchError> {
        let label = format!("overview {}", request.program_id);
        let url = self.endpoint("api/program/overviewDetails", &label)?;
        let series_id = request.series_id.as_deref().unwrap_or_default();
        let form = self.lineup.overview_form(series_id);

        self.transport
            .request_with_retry(&label, || {
                self.transport
                    .http()
                    .post(url.clone())
                    .header("X-Requested-With", "XMLHttpRequest")
                    .form(&form)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer, attempts: u32) -> GracenoteClient {
        let base_url = format!("{}/", server.uri());
        GracenoteClient::builder()
            .base_url(base_url.parse().unwrap())
            .user_agent("test/0.0.0")
            .lineup(LineupParams::new("OTA10001").postal_code("10001"))
            .attempts(attempts)
            .retry_delay(Duration::ZERO)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = GracenoteClient::builder()
            .lineup(LineupParams::new("OTA10001"))
            .build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_requires_lineup() {
        // Arrange & Act
        let result = GracenoteClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("lineup is required"));
    }

    #[test]
    fn test_builder_defaults_base_url() {
        // Arrange & Act
        let client = GracenoteClient::builder()
            .user_agent("test/0.0.0")
            .lineup(LineupParams::new("OTA10001"))
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url.as_str(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn test_fetch_grid_via_http() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/grid"))
            .and(query_param("time", "1710050400"))
            .and(query_param("timespan", "3"))
            .and(query_param("lineupId", "USA-OTA10001-DEFAULT"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"channels":[]}"#))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server, 3);
        let window = GridWindow::new(Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap(), 3);

        // Act
        let body = client.fetch_grid(&window).await.unwrap();

        // Assert
        assert_eq!(body, r#"{"channels":[]}"#);
    }

    #[tokio::test]
    async fn test_fetch_grid_exhausts_retries() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/grid"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;
        let client = client_for(&server, 2);
        let window = GridWindow::new(Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap(), 3);

        // Act
        let result = client.fetch_grid(&window).await;

        // Assert
        assert!(result.unwrap_err().is_exhausted());
    }

    #[tokio::test]
    async fn test_fetch_details_posts_series_id() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/program/overviewDetails"))
            .and(header("X-Requested-With", "XMLHttpRequest"))
            .and(body_string_contains("programSeriesID=SH01234567"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"seriesGenres":"Drama"}"#))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server, 1);
        let request = DetailRequest::new("EP012345670003", Some(String::from("SH01234567")));

        // Act
        let body = client.fetch_details(&request).await.unwrap();

        // Assert
        assert!(body.contains("Drama"));
    }
}
