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

//! An immutable configuration snapshot, loaded once at service start from an
//! optional TOML file layered under `RIVEN_`-prefixed environment variables.
//!
//! Ranking profiles, the `path_profiles` longest-prefix lookup table, debrid
//! provider credentials, harvester settings, and filesystem mount paths all
//! live here. There is no mutable global: [`ConfigService`] hands out `Arc`
//! snapshots and only swaps them wholesale on an explicit `reload`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod service;
mod validate;

pub use defaults::default_settings;
pub use error::{ConfigError, ConfigResult};
pub use model::{HarvesterConfig, MetadataConfig, PathProfile, ProvidersConfig, ScrapingConfig, Settings};
pub use service::ConfigService;
pub use validate::validate;
