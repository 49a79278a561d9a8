//! Application configuration module.
//!
//! Manages the TOML config file holding lineup credentials and default
//! output settings. Command-line flags override every value here.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, FetchConfig, LineupConfig, OutputConfig};
pub use paths::AppPaths;
