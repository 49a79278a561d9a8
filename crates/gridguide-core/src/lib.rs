//! Guide pipeline for gridguide.
//!
//! Fetches time-bucketed schedule payloads through a listings client,
//! caches them on disk, normalizes them into stations, programs and
//! airings, optionally enriches programs with per-program details,
//! assembles gap-free timelines and renders an XMLTV or XTVD document.

/// Timeline assembly.
pub mod assemble;
/// Per-program detail enrichment.
pub mod enrich;
/// Pipeline error kinds.
pub mod error;
/// Station logo references.
pub mod icons;
/// Field merge policies.
pub mod merge;
/// Canonical entities.
pub mod model;
/// Provider payload adapters.
pub mod normalize;
/// Canonical observations produced by adapters.
pub mod observation;
/// Run configuration.
pub mod options;
/// End-to-end run.
pub mod pipeline;
/// Document renderers.
pub mod render;
/// Bucket planning and fetching.
pub mod schedule;

pub use error::GuideError;
pub use icons::{IconDir, IconResolver, NoIcons};
pub use options::{
    AsteriskOn, DocumentFormat, GuideOptions, LineupInfo, NoCachePolicy, Provider, TimeAlignment,
};
pub use pipeline::{GuideReport, run};
pub use render::{ChannelIdMode, EscapeSet};
