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

//! Process entrypoint that wires the acquisition pipeline's crates
//! (`riven-config`, `riven-data`, `riven-events`, `riven-scheduler`, and the
//! five stage crates) into one running service.
//!
//! Layout: `bootstrap.rs` (dependency wiring and the dispatch-worker boot
//! sequence), `services/` (the scheduler-facing adapter for each pipeline
//! stage), `debrid_providers.rs` (concrete `HttpDebridProvider` backends),
//! `metadata.rs` (the TMDB client backing indexing and gap detection).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Concrete debrid provider backends assembled from configuration.
pub mod debrid_providers;
/// Application-level error type.
pub mod error;
/// TMDB metadata client.
pub mod metadata;
/// Scheduler-facing adapters for the five pipeline stages.
pub mod services;

pub use bootstrap::run_app;
