//! Listings provider clients for gridguide.
//!
//! Provides HTTP clients for the Gracenote grid API and the TV Guide
//! listings API behind one [`ListingsApi`] trait, so the guide pipeline
//! can fetch schedule buckets and per-program details without knowing
//! which provider is active.

mod api;
mod error;
mod params;
mod rate_limiter;
mod transport;

/// Gracenote (`tvlistings.gracenote.com`) grid client.
pub mod gracenote;

/// TV Guide (`tvguide.com`) listings client.
pub mod tvguide;

#[allow(clippy::module_name_repetitions)]
pub use api::{DetailRequest, GridWindow, ListingsApi, LocalListingsApi};
pub use error::FetchError;
pub use params::LineupParams;
