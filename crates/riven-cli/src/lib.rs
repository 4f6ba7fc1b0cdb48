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

//! Command-line entrypoint for the acquisition pipeline.
//!
//! Layout: `cli.rs` (argument parsing, command dispatch) with a thin `main.rs`
//! that delegates to `run()`. There is no admin HTTP surface here: the
//! pipeline is configured entirely through an optional TOML file and
//! `RIVEN_`-prefixed environment variables, and this binary either runs the
//! pipeline in-process or inspects the resolved configuration snapshot.

pub mod cli;

pub use cli::run;
