//! Fetch error kinds.

/// Errors returned by [`crate::ListingsApi`] implementations.
///
/// Callers branch on the kind: exhausting the retry budget halts the
/// bucket loop, while [`FetchError::NoData`] is a definitive answer.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Every attempt failed.
    #[error("{label} failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Request label used in logs.
        label: String,
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        last: String,
    },

    /// The provider answered that it has no data for this request.
    #[error("{label}: provider has no data")]
    NoData {
        /// Request label used in logs.
        label: String,
    },

    /// The request URL could not be constructed.
    #[error("invalid request URL for {label}")]
    Url {
        /// Request label used in logs.
        label: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    /// Returns `true` if further requests in the same run are unlikely to succeed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}
