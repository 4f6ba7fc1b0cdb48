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

//! The in-memory item repository: parent/child navigation, external-id
//! dedup, and episode resolution over the item tree. Persistence (SQL
//! schema, migrations) is out of scope; this is the runtime's sole store for
//! one process lifetime.

mod error;
mod repository;

pub use error::{DataError, Result as DataResult};
pub use repository::ItemRepository;
