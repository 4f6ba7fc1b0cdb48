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

//! W2P harvester client: wire protocol, attempt-cap/cooldown bookkeeping,
//! and the `rd-library` fallback.
//!
//! [`HarvesterClient`] sends one item per request per the wire contract;
//! [`cooldown`] tracks the 3-attempt/24-hour parking policy on an item's
//! `aliases`; [`rd_library`] implements the debrid-library substring-match
//! fallback used when the harvester reports `needs_rd_library_check` with no
//! releases.

mod client;
pub mod cooldown;
mod error;
pub mod rd_library;
mod wire;

pub use client::{HarvestOutcome, HarvestQuery, HarvesterClient};
pub use error::{HarvesterError, HarvesterResult};
