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

//! Ranking engine and scraper fan-in for the Riven acquisition pipeline.
//!
//! [`parser`] turns a raw release title into structured metadata, [`engine`]
//! scores that metadata into a quality rank under a profile, and [`fanin`]
//! queries scrapers in parallel, applies item-context filters, and selects
//! the top-N distinct streams per ranking profile.

pub mod engine;
pub mod fanin;
pub mod parser;

pub use engine::{RankError, rank, score_quality};
pub use fanin::{
    HarvestedReleasesScraper, ItemContext, Scraper, ScrapeError, ScrapeResult, bucket_and_sort,
    context_allows, extract_btih, merge_scraper_results, rank_and_select,
};
pub use parser::{is_trash, normalize_title_text, parse_release_title};
