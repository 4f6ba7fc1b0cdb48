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

//! Typed event bus for the Riven acquisition pipeline.
//!
//! The bus carries domain notifications (state transitions, ranking results,
//! provider cooldowns, VFS registration) used by observability consumers and
//! by the scheduler to react to state changes. It is deliberately distinct
//! from the scheduler's own per-item work queue (`riven-scheduler`), which
//! orders and dispatches the events that actually drive a service.

mod error;
mod payloads;
mod routing;
mod topics;

pub use error::{EventBusError, EventBusResult};
pub use payloads::{DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId, ItemState};
pub use routing::{EventBus, EventStream};
pub use topics::event_kind;
