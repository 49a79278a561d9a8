//! On-disk cache of raw provider payloads.
//!
//! Each payload is stored gzip-compressed under a name derived from its
//! request: the bucket start in epoch milliseconds for schedule buckets,
//! or a provider prefix plus program id for detail lookups.

mod directory;
mod payload;

#[allow(clippy::module_name_repetitions)]
pub use directory::CacheDir;
pub use payload::{compress, decompress};
