//! Guide pipeline error kinds.

use gridguide_api::FetchError;

/// Errors raised by the guide pipeline.
///
/// Only [`GuideError::Configuration`] aborts a run before any fetch;
/// the other kinds are logged and skipped where they occur.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum GuideError {
    /// Missing or inconsistent run options.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A provider payload could not be decoded.
    #[error("malformed {kind} payload")]
    MalformedPayload {
        /// Payload kind (`grid`, `schedules`, `overview`, `details`).
        kind: &'static str,
        /// Decode error.
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the payload cache failed.
    #[error("cache I/O failed: {0:#}")]
    CacheIo(anyhow::Error),

    /// A provider request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Formatting the output document failed.
    #[error("failed to render document")]
    Render(#[from] std::fmt::Error),
}

impl GuideError {
    /// Wraps a JSON decode error for the given payload kind.
    #[must_use]
    pub fn malformed(kind: &'static str, source: serde_json::Error) -> Self {
        Self::MalformedPayload { kind, source }
    }
}
