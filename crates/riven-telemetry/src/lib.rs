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

//! Telemetry primitives shared across the Riven workspace.
//!
//! Layout: `init.rs` (logging setup) and `context.rs` (request/app spans).

pub mod context;
pub mod init;

pub use context::{GlobalContextGuard, current_request_id, current_route, record_app_mode, set_request_context, with_request_context};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, OpenTelemetryConfig, OpenTelemetryGuard, build_sha, init_logging, init_logging_with_otel, log_format_from_config};
