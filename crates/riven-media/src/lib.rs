#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! Core data model for the Riven acquisition pipeline: items, streams,
//! filesystem entries, torrent containers, and ranking profiles.
//!
//! This crate holds only data and the invariants that can be checked from a
//! single value (infohash normalization, dedup keys, median file size).
//! Cross-item concerns (ranking, retention, state derivation) live in their
//! own crates so this one stays a dependency-free leaf.

mod error;
mod model;

pub use error::{MediaError, MediaResult};
pub use model::{
    ActiveStream, Aliases, ContainerFile, ExternalIds, HarvestedRelease, ItemKind, MediaEntry,
    MediaItem, MediaMetadata, ParsedData, RankingProfile, Stream, TorrentContainer, TorrentInfo,
    normalize_infohash,
};
