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

//! The debrid provider contract and a generic REST client implementing it.
//!
//! Concrete provider instances (RealDebrid, Debrid-Link, AllDebrid) are
//! assembled by callers from [`http::HttpDebridProvider`] plus a
//! provider-specific [`http::Endpoints`] template and [`http::ResponseMapper`];
//! this crate does not hardcode any single backend's wire format.

mod cooldown;
mod error;
mod http;
mod provider;

pub use cooldown::{CooldownRegistry, CIRCUIT_BREAKER_COOLDOWN_SECONDS};
pub use error::{DebridError, DebridResult};
pub use http::{Endpoints, HttpDebridProvider, ResponseMapper};
pub use provider::{DebridProvider, DownloadEntry, UserInfo};
