//! TV Guide listings client module.
//!
//! Schedules come from the mobile listings web service; per-program
//! details come from the separate `mapi` host.

mod client;

#[allow(clippy::module_name_repetitions)]
pub use client::{
    DEFAULT_DETAILS_BASE_URL, DEFAULT_LISTINGS_BASE_URL, TvGuideClient, TvGuideClientBuilder,
};
