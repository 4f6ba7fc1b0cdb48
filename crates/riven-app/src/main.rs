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

//! Binary entrypoint that wires the acquisition pipeline together and blocks
//! until a shutdown signal is received.

use anyhow::Result;

/// Bootstraps the pipeline and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<()> {
    riven_app::run_app().await.map_err(anyhow::Error::from)
}
