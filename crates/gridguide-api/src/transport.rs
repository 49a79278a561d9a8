//! Shared HTTP transport: courtesy delay plus bounded fixed-delay retry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::rate_limiter::RateLimiter;

/// Default number of attempts per request.
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Upper bound on attempts per request.
pub const MAX_ATTEMPTS: u32 = 20;

/// Delay after a failed attempt.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Body fragment the provider sends with HTTP 500 when a program has no details.
const NO_DATA_MARKER: &str = "Could not load details";

/// HTTP client plus retry policy, owned by each provider client.
#[derive(Debug)]
pub struct Transport {
    /// HTTP client (reqwest, gzip enabled).
    http_client: Client,
    /// Courtesy delay before each attempt.
    rate_limiter: Arc<Mutex<RateLimiter>>,
    /// Attempts per request, clamped to `1..=MAX_ATTEMPTS`.
    attempts: u32,
    /// Delay after a failed attempt.
    retry_delay: Duration,
}

impl Transport {
    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the `reqwest::Client` build fails.
    pub fn new(
        user_agent: &str,
        attempts: u32,
        retry_delay: Duration,
        min_interval: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            attempts: attempts.clamp(1, MAX_ATTEMPTS),
            retry_delay,
        })
    }

    /// Underlying HTTP client for building requests.
    pub const fn http(&self) -> &Client {
        &self.http_client
    }

    /// Configured attempts per request.
    #[cfg(test)]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Sends the request built by `build_request` until it yields
    /// HTTP 200 with a non-empty body or the attempt budget runs out.
    ///
    /// A 500 response carrying the provider's "no details" marker is a
    /// definitive answer and is not retried.
    pub async fn request_with_retry(
        &self,
        label: &str,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<String, FetchError> {
        let mut last = String::from("no attempt made");

        for attempt in 1..=self.attempts {
            self.rate_limiter.lock().await.wait().await;

            let send_result = build_request().send().await;
            let response = match send_result {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(%label, attempt, error = %e, "Request failed, will retry");
                    last = e.to_string();
                    self.pause(attempt).await;
                    continue;
                }
            };

            let status = response.status();
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(
                        %label,
                        attempt,
                        error = %e,
                        "Failed to read response body, will retry"
                    );
                    last = e.to_string();
                    self.pause(attempt).await;
                    continue;
                }
            };

            tracing::debug!(%label, %status, body_len = body.len(), "Response body received");

            if status == StatusCode::OK && !body.is_empty() {
                return Ok(body);
            }

            if status == StatusCode::INTERNAL_SERVER_ERROR && body.contains(NO_DATA_MARKER) {
                tracing::info!(%label, "Provider reports no data");
                return Err(FetchError::NoData {
                    label: String::from(label),
                });
            }

            tracing::warn!(
                %label,
                attempt,
                code = status.as_u16(),
                body_len = body.len(),
                "Unexpected response, will retry"
            );
            last = format!("HTTP {status} with {} byte body", body.len());
            self.pause(attempt).await;
        }

        Err(FetchError::Exhausted {
            label: String::from(label),
            attempts: self.attempts,
            last,
        })
    }

    /// Sleeps the retry delay unless `attempt` was the last one.
    async fn pause(&self, attempt: u32) {
        if attempt < self.attempts {
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn transport(attempts: u32) -> Transport {
        Transport::new("test/0.0.0", attempts, Duration::ZERO, Duration::ZERO).unwrap()
    }

    #[test]
    fn test_attempts_are_clamped() {
        // Arrange & Act
        let zero = transport(0);
        let many = transport(50);

        // Assert
        assert_eq!(zero.attempts(), 1);
        assert_eq!(many.attempts(), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/grid"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/grid"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;
        let transport = transport(3);
        let url = format!("{}/grid", server.uri());

        // Act
        let body = transport
            .request_with_retry("grid", || transport.http().get(&url))
            .await
            .unwrap();

        // Assert
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn test_empty_body_counts_as_failure() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;
        let transport = transport(2);
        let url = server.uri();

        // Act
        let result = transport
            .request_with_retry("grid", || transport.http().get(&url))
            .await;

        // Assert
        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        assert!(err.to_string().contains("after 2 attempts"));
    }

    #[tokio::test]
    async fn test_no_details_marker_is_not_retried() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(500).set_body_string("Could not load details for EP1"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let transport = transport(5);
        let url = server.uri();

        // Act
        let result = transport
            .request_with_retry("details", || transport.http().get(&url))
            .await;

        // Assert
        assert!(matches!(result, Err(FetchError::NoData { .. })));
    }
}
