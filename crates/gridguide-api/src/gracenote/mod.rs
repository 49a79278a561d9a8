//! Gracenote grid client module.
//!
//! Requests three-hour schedule buckets from `api/grid` and program
//! overviews from `api/program/overviewDetails`.

mod client;

#[allow(clippy::module_name_repetitions)]
pub use client::{DEFAULT_BASE_URL, GracenoteClient, GracenoteClientBuilder};
