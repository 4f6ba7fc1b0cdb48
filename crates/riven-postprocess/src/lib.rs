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

//! Episode Validator: reconciles a season's actual episode count against
//! the metadata provider and targets missing episodes for re-harvest or
//! re-queue.
//!
//! [`EpisodeCountProvider`] is the metadata-provider seam; concrete
//! TMDB/TVDB/Trakt clients live outside this crate. [`EpisodeValidator`]
//! drives the gap-detection algorithm and, where a harvester is
//! configured, issues targeted single-episode harvest calls via
//! `riven-harvester`.

mod error;
mod metadata;
mod validator;

pub use error::{PostprocessError, PostprocessResult};
pub use metadata::EpisodeCountProvider;
pub use validator::EpisodeValidator;
