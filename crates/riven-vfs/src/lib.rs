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

//! VFS Registration and the Retention Enforcer.
//!
//! The FUSE/VFS host process itself (path materialization, `readdir`,
//! `open`) is external to this workspace; this crate owns the client side of
//! its registration contract ([`VfsHost`]) plus an in-memory implementation
//! for wiring and tests, and the retention policy that runs ahead of it.

mod error;
mod host;
mod registration;
mod retention;

pub use error::{VfsError, VfsResult};
pub use host::{InMemoryVfsHost, LibraryPathBuilder, PathBuilder, VfsHost};
pub use registration::VfsRegistrar;
pub use retention::RetentionEnforcer;
