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
#![allow(clippy::multiple_crate_versions)]

//! Download Orchestrator, File-to-Item Matcher, and MediaEntry Creation &
//! Dedup.
//!
//! Turns an item's ranked Streams into `MediaEntry` records via one or more
//! debrid providers: [`orchestrator::DownloadOrchestrator`] drives the
//! per-stream attempt loop and circuit-breaker cooldown handling,
//! [`matcher`] binds container files to concrete leaf items, and
//! [`prevalidate`] implements the high-quality profile pre-validation
//! optimization.

mod error;
mod matcher;
mod orchestrator;
mod prevalidate;

pub use error::{DownloadError, DownloadResult};
pub use matcher::{attach_entry, match_container_files, MatchedEntry};
pub use orchestrator::{DownloadOrchestrator, Outcome};
pub use prevalidate::{apply_prevalidation_order, prevalidate_hq_candidates, PrevalidatedCandidate};
